use std::path::PathBuf;
use std::time::Duration;

/// Server-level settings read from the environment
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Directory served at `/` (the host page)
    pub static_dir: PathBuf,
    pub snapshot_path: PathBuf,
    /// How often unsaved changes are flushed to the snapshot
    pub flush_interval: Duration,
    /// Root of a remote server exposing `/api/generate`. When set, it is used
    /// instead of the local LLM providers.
    pub word_source_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            static_dir: PathBuf::from("static"),
            snapshot_path: PathBuf::from("impostor-snapshot.json"),
            flush_interval: Duration::from_secs(2),
            word_source_url: None,
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            port: env_string("PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            static_dir: env_string("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            snapshot_path: env_string("SNAPSHOT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.snapshot_path),
            flush_interval: env_string("SNAPSHOT_FLUSH_SECS")
                .and_then(|s| s.parse().ok())
                .filter(|secs: &u64| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.flush_interval),
            word_source_url: env_string("WORD_SOURCE_URL"),
        }
    }
}
