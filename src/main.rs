use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use impostor::{
    api,
    config::ServerConfig,
    llm,
    persist,
    state::{snapshot::FileSnapshotStore, AppState},
    words::{HttpWordSource, LlmWordSource, WordSource},
};

/// Pick where round content comes from: a remote word server if configured,
/// otherwise the local LLM providers
fn build_word_source(config: &ServerConfig) -> Option<Arc<dyn WordSource>> {
    let llm_config = llm::LlmConfig::from_env();

    if let Some(url) = &config.word_source_url {
        tracing::info!("Using remote word source at {}", url);
        return Some(Arc::new(HttpWordSource::new(url, llm_config.default_timeout)));
    }

    match llm_config.build_manager() {
        Ok(manager) => {
            tracing::info!("LLM providers initialized successfully");
            Some(Arc::new(LlmWordSource::new(manager, &llm_config)))
        }
        Err(e) => {
            tracing::warn!(
                "Failed to initialize LLM providers: {}. Rounds will use fallback words.",
                e
            );
            None
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down...");
}

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "impostor=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Impostor...");

    let config = ServerConfig::from_env();
    let words = build_word_source(&config);

    let store = Arc::new(FileSnapshotStore::new(config.snapshot_path.clone()));
    tracing::info!("Game snapshots stored at {}", store.path().display());
    let state = Arc::new(AppState::load(words, store).await);

    let flusher = persist::spawn_snapshot_flusher(state.clone(), config.flush_interval);

    let app = api::router(state.clone(), &config.static_dir);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on http://{}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server error: {}", e);
    }

    flusher.abort();
    state.persist().await;
    tracing::info!("Final game snapshot written");
}
