pub mod snapshot;

use crate::game::{Game, GameError, GameView};
use crate::types::GeneratedContent;
use crate::words::{WordRequest, WordSource, WordSourceError};
use snapshot::SnapshotStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Upper bound for one round's generation, covering every provider attempt
pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(90);

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub game: Arc<RwLock<Game>>,
    /// None when no word source is configured; rounds then use fallback content
    pub words: Option<Arc<dyn WordSource>>,
    pub snapshots: Arc<dyn SnapshotStore>,
    /// Set by mutations that have not been written to the snapshot yet
    dirty: Arc<AtomicBool>,
    generation_timeout: Duration,
}

impl AppState {
    pub fn new(words: Option<Arc<dyn WordSource>>, snapshots: Arc<dyn SnapshotStore>) -> Self {
        Self::with_game(Game::new(), words, snapshots)
    }

    fn with_game(
        game: Game,
        words: Option<Arc<dyn WordSource>>,
        snapshots: Arc<dyn SnapshotStore>,
    ) -> Self {
        Self {
            game: Arc::new(RwLock::new(game)),
            words,
            snapshots,
            dirty: Arc::new(AtomicBool::new(false)),
            generation_timeout: DEFAULT_GENERATION_TIMEOUT,
        }
    }

    pub fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout = timeout;
        self
    }

    /// Restore the game from the snapshot store, starting fresh when there is
    /// nothing usable
    pub async fn load(
        words: Option<Arc<dyn WordSource>>,
        snapshots: Arc<dyn SnapshotStore>,
    ) -> Self {
        let game = match snapshots.load().await {
            Ok(Some(snapshot)) => {
                let game = Game::restore(snapshot);
                tracing::info!(
                    "Restored game snapshot: {:?} with {} players",
                    game.phase(),
                    game.roster().len()
                );
                game
            }
            Ok(None) => {
                tracing::info!("No game snapshot found, starting fresh");
                Game::new()
            }
            Err(e) => {
                tracing::warn!("Failed to load game snapshot: {}. Starting fresh.", e);
                Game::new()
            }
        };
        Self::with_game(game, words, snapshots)
    }

    pub async fn view(&self) -> GameView {
        self.game.read().await.view()
    }

    /// Apply one action to the game. Phase transitions are saved right away;
    /// other changes are left to the periodic flush.
    pub async fn mutate<T>(
        &self,
        action: impl FnOnce(&mut Game) -> Result<T, GameError>,
    ) -> Result<T, GameError> {
        let (result, transitioned) = {
            let mut game = self.game.write().await;
            let before = game.phase();
            let result = action(&mut game);
            (result, game.phase() != before)
        };

        if result.is_ok() {
            if transitioned {
                self.persist().await;
            } else {
                self.dirty.store(true, Ordering::SeqCst);
            }
        }
        result
    }

    /// Ask the word source for this round's content.
    ///
    /// The request runs in its own task with the lock released, so the round
    /// is settled even if the caller goes away. Failures never surface here:
    /// the game substitutes fallback content.
    pub async fn generate_content(&self) -> Result<(), GameError> {
        let (round_id, request) = self.mutate(|game| game.begin_generation()).await?;

        let state = self.clone();
        let task_round_id = round_id.clone();
        let task = tokio::spawn(async move {
            let result = match tokio::time::timeout(
                state.generation_timeout,
                state.request_words(&request),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(WordSourceError::Unavailable(format!(
                    "generation timed out after {:?}",
                    state.generation_timeout
                ))),
            };
            state.finish_generation(&task_round_id, result).await;
        });

        if let Err(e) = task.await {
            tracing::error!("Generation task failed: {}", e);
            self.finish_generation(
                &round_id,
                Err(WordSourceError::Unavailable("generation task failed".to_string())),
            )
            .await;
        }
        Ok(())
    }

    async fn finish_generation(
        &self,
        round_id: &str,
        result: Result<GeneratedContent, WordSourceError>,
    ) {
        let applied = self
            .game
            .write()
            .await
            .complete_generation(round_id, result);
        if applied {
            self.persist().await;
        }
    }

    /// Call the configured word source, if any
    pub async fn request_words(
        &self,
        request: &WordRequest,
    ) -> Result<GeneratedContent, WordSourceError> {
        match &self.words {
            Some(source) => source.generate(request).await,
            None => Err(WordSourceError::Unavailable(
                "no word source configured".to_string(),
            )),
        }
    }

    /// Write the current game to the snapshot store. A failed save is logged
    /// and left dirty for the flusher to retry.
    pub async fn persist(&self) {
        // Cleared first so a mutation landing after the snapshot stays dirty
        self.dirty.store(false, Ordering::SeqCst);
        let snapshot = self.game.read().await.snapshot();

        if let Err(e) = self.snapshots.save(&snapshot).await {
            tracing::warn!("Failed to save game snapshot: {}", e);
            self.dirty.store(true, Ordering::SeqCst);
        }
    }

    /// Persist if anything changed since the last save. Returns whether a
    /// save was attempted.
    pub async fn flush_if_dirty(&self) -> bool {
        if self.dirty.swap(false, Ordering::SeqCst) {
            self.persist().await;
            true
        } else {
            false
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }
}
