//! Whole-game snapshots for surviving restarts.
//!
//! A snapshot is one JSON document in one slot. Reading is lenient: each
//! top-level field is decoded on its own and anything malformed falls back
//! to its default, so a half-written or hand-edited file still restores
//! whatever is usable.

use crate::game::RoundData;
use crate::types::*;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Schema version for snapshot compatibility
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Snapshot is not a JSON object")]
    NotAnObject,

    #[error("Snapshot schema version {0} is newer than supported")]
    UnsupportedVersion(u32),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub schema_version: u32,
    /// Save timestamp (RFC 3339)
    pub saved_at: String,
    pub phase: Phase,
    pub players: Vec<Player>,
    pub config: RoundConfig,
    pub round: RoundData,
    pub last_result: Option<RoundResult>,
}

/// Decode one field, falling back to the default when missing or malformed
fn lenient_field<T: DeserializeOwned + Default>(object: &Map<String, Value>, key: &str) -> T {
    let Some(value) = object.get(key) else {
        return T::default();
    };
    match serde_json::from_value(value.clone()) {
        Ok(decoded) => decoded,
        Err(e) => {
            tracing::warn!("Ignoring malformed snapshot field '{}': {}", key, e);
            T::default()
        }
    }
}

impl GameSnapshot {
    pub fn new(
        phase: Phase,
        players: Vec<Player>,
        config: RoundConfig,
        round: RoundData,
        last_result: Option<RoundResult>,
    ) -> Self {
        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            saved_at: chrono::Utc::now().to_rfc3339(),
            phase,
            players,
            config,
            round,
            last_result,
        }
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a stored snapshot field by field
    pub fn from_json(text: &str) -> Result<Self, SnapshotError> {
        let value: Value = serde_json::from_str(text)?;
        let Value::Object(object) = value else {
            return Err(SnapshotError::NotAnObject);
        };

        let schema_version = object
            .get("schemaVersion")
            .and_then(Value::as_u64)
            .unwrap_or(u64::from(SNAPSHOT_SCHEMA_VERSION));
        if schema_version > u64::from(SNAPSHOT_SCHEMA_VERSION) {
            return Err(SnapshotError::UnsupportedVersion(
                u32::try_from(schema_version).unwrap_or(u32::MAX),
            ));
        }

        // Players are kept one by one so a single bad entry doesn't drop the roster
        let players = match object.get("players") {
            Some(Value::Array(entries)) => entries
                .iter()
                .filter_map(|entry| serde_json::from_value::<Player>(entry.clone()).ok())
                .filter(|p| !p.name.trim().is_empty())
                .collect(),
            _ => Vec::new(),
        };

        Ok(Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            saved_at: lenient_field(&object, "savedAt"),
            phase: lenient_field(&object, "phase"),
            players,
            config: lenient_field(&object, "config"),
            round: lenient_field(&object, "round"),
            last_result: lenient_field(&object, "lastResult"),
        })
    }
}

/// A single named slot holding the latest snapshot
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn load(&self) -> Result<Option<GameSnapshot>, SnapshotError>;

    async fn save(&self, snapshot: &GameSnapshot) -> Result<(), SnapshotError>;
}

/// Snapshot slot backed by a JSON file
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn load(&self) -> Result<Option<GameSnapshot>, SnapshotError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => GameSnapshot::from_json(&text).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, snapshot: &GameSnapshot) -> Result<(), SnapshotError> {
        let json = snapshot.to_json()?;
        // Write then rename so a crash never leaves a truncated slot
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

/// In-memory slot, used when persistence is disabled and in tests
#[derive(Default)]
pub struct MemorySnapshotStore {
    slot: Mutex<Option<String>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw JSON currently in the slot
    pub fn raw(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }

    pub fn set_raw(&self, json: impl Into<String>) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(json.into());
        }
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn load(&self) -> Result<Option<GameSnapshot>, SnapshotError> {
        match self.raw() {
            Some(text) => GameSnapshot::from_json(&text).map(Some),
            None => Ok(None),
        }
    }

    async fn save(&self, snapshot: &GameSnapshot) -> Result<(), SnapshotError> {
        self.set_raw(snapshot.to_json()?);
        Ok(())
    }
}
