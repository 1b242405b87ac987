//! HTTP routes: the word generation proxy and the host game API.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::game::GameView;
use crate::handlers::handle_message;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use crate::words::WordRequest;

const GENERATION_FAILED: &str = "LLM generation failed";

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Generate a secret word, hint and optional decoy.
///
/// POST /api/generate
///
/// The body is read leniently: unparseable JSON or fields of the wrong type
/// fall back to defaults rather than rejecting the request.
pub async fn generate_words(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let value = serde_json::from_slice::<Value>(&body).unwrap_or(Value::Null);
    let request = WordRequest::from_json(&value);

    let Some(source) = state.words.as_ref() else {
        tracing::warn!("Word generation requested but no provider is configured");
        return error_response(StatusCode::SERVICE_UNAVAILABLE, GENERATION_FAILED);
    };

    match source.generate(&request).await {
        Ok(mut content) => {
            if !request.give_impostor_fake_word {
                content.fake_word = None;
            }
            Json(content).into_response()
        }
        Err(e) => {
            tracing::error!("Word generation via {} failed: {}", source.name(), e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, GENERATION_FAILED)
        }
    }
}

/// Current game view.
///
/// GET /api/game
pub async fn get_game(State(state): State<Arc<AppState>>) -> Json<GameView> {
    Json(state.view().await)
}

/// Apply one host action.
///
/// POST /api/game
pub async fn post_game(
    State(state): State<Arc<AppState>>,
    Json(msg): Json<ClientMessage>,
) -> Response {
    let reply = handle_message(msg, &state).await;
    let status = match reply {
        ServerMessage::State { .. } => StatusCode::OK,
        ServerMessage::Error { .. } => StatusCode::BAD_REQUEST,
    };
    (status, Json(reply)).into_response()
}

pub async fn health() -> &'static str {
    "ok"
}

/// Build the application router
pub fn router(state: Arc<AppState>, static_dir: impl AsRef<Path>) -> Router {
    Router::new()
        .route("/api/generate", post(generate_words))
        .route("/api/game", get(get_game).post(post_game))
        .route("/health", get(health))
        .fallback_service(ServeDir::new(static_dir.as_ref()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
