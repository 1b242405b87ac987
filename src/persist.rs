use crate::state::AppState;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Spawn a background task that writes the game snapshot whenever it has
/// unsaved changes. Phase transitions are saved immediately by the state
/// itself, this only catches the edits in between.
pub fn spawn_snapshot_flusher(state: Arc<AppState>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;

            if state.flush_if_dirty().await {
                tracing::debug!("Flushed game snapshot");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::snapshot::MemorySnapshotStore;

    #[tokio::test]
    async fn test_flusher_saves_dirty_state() {
        let store = Arc::new(MemorySnapshotStore::new());
        let state = Arc::new(AppState::new(None, store.clone()));
        state.mutate(|g| g.add_player("Ann")).await.unwrap();
        assert!(store.raw().is_none());

        let handle = spawn_snapshot_flusher(state.clone(), Duration::from_millis(10));
        for _ in 0..100 {
            if store.raw().is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        handle.abort();

        assert!(store.raw().unwrap_or_default().contains("Ann"));
        assert!(!state.is_dirty());
    }
}
