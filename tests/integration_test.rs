use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use impostor::api;
use impostor::game::policy::render_policy;
use impostor::handlers::handle_message;
use impostor::protocol::{ClientMessage, ServerMessage};
use impostor::state::snapshot::MemorySnapshotStore;
use impostor::state::AppState;
use impostor::types::{GeneratedContent, Phase, Role};
use impostor::words::{WordRequest, WordSource, WordSourceError};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Word source returning fixed content and remembering what it was asked for
struct StubWords {
    content: GeneratedContent,
    seen: Mutex<Vec<WordRequest>>,
}

impl StubWords {
    fn new(word: &str, hint: &str, fake_word: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            content: GeneratedContent {
                word: word.to_string(),
                hint: hint.to_string(),
                fake_word: fake_word.map(str::to_string),
            },
            seen: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl WordSource for StubWords {
    async fn generate(&self, request: &WordRequest) -> Result<GeneratedContent, WordSourceError> {
        self.seen.lock().unwrap().push(request.clone());
        Ok(self.content.clone())
    }

    fn name(&self) -> &str {
        "stub"
    }
}

/// Word source whose backend is always down
struct BrokenWords;

#[async_trait]
impl WordSource for BrokenWords {
    async fn generate(&self, _request: &WordRequest) -> Result<GeneratedContent, WordSourceError> {
        Err(WordSourceError::Status {
            status: 502,
            message: "upstream down".to_string(),
        })
    }

    fn name(&self) -> &str {
        "broken"
    }
}

fn new_state(words: Option<Arc<dyn WordSource>>) -> Arc<AppState> {
    Arc::new(AppState::new(words, Arc::new(MemorySnapshotStore::new())))
}

async fn ok(state: &AppState, msg: ClientMessage) {
    match handle_message(msg.clone(), state).await {
        ServerMessage::State { .. } => {}
        ServerMessage::Error { code, msg: text } => {
            panic!("{:?} was refused with {}: {}", msg, code, text)
        }
    }
}

async fn add_players(state: &AppState, count: usize) {
    for i in 0..count {
        ok(
            state,
            ClientMessage::AddPlayer {
                name: format!("Player {}", i + 1),
            },
        )
        .await;
    }
}

/// Pass the device around once, checking every card as it is shown
async fn reveal_all(state: &AppState, mut check: impl FnMut(&impostor::game::RevealCard)) {
    loop {
        ok(state, ClientMessage::Reveal).await;
        let card = state.view().await.reveal.expect("reveal card");
        check(&card);
        let is_last = card.is_last;
        ok(state, ClientMessage::Advance).await;
        if is_last {
            break;
        }
    }
}

#[tokio::test]
async fn test_four_player_pancakes_round() {
    let words = StubWords::new("pancakes", "breakfast food", None);
    let state = new_state(Some(words.clone()));
    add_players(&state, 4).await;

    ok(
        &state,
        ClientMessage::UpdateConfig {
            category: Some("food".to_string()),
            allow_multiple_impostors: Some(false),
            give_impostor_fake_word: Some(false),
        },
    )
    .await;
    ok(&state, ClientMessage::Start).await;
    ok(&state, ClientMessage::Generate).await;
    assert_eq!(words.seen.lock().unwrap()[0].category, "food");

    ok(&state, ClientMessage::AssignRoles).await;

    let assignments = state.game.read().await.round().assignments.clone();
    assert_eq!(assignments.len(), 4);
    let holders: Vec<_> = assignments.iter().filter(|a| a.role == Role::Word).collect();
    let impostors: Vec<_> = assignments.iter().filter(|a| a.is_impostor()).collect();
    assert_eq!(holders.len(), 3);
    assert_eq!(impostors.len(), 1);
    for holder in &holders {
        assert_eq!(holder.visible_word.as_deref(), Some("pancakes"));
    }
    let impostor_index = impostors[0].player_index;

    reveal_all(&state, |card| {
        if card.player_index == impostor_index {
            assert_eq!(card.word, None);
            assert!(card.show_hint_control);
        } else {
            assert_eq!(card.word.as_deref(), Some("pancakes"));
            assert!(!card.show_hint_control);
        }
    })
    .await;

    assert_eq!(state.view().await.phase, Phase::ScoringGate);
    ok(&state, ClientMessage::ContinueToScoring).await;
    ok(
        &state,
        ClientMessage::SelectVote {
            index: impostor_index,
        },
    )
    .await;
    ok(&state, ClientMessage::SetImpostorGuessed { guessed: false }).await;
    ok(&state, ClientMessage::SubmitScores).await;

    let view = state.view().await;
    assert_eq!(view.phase, Phase::BetweenRounds);
    for (i, player) in view.players.iter().enumerate() {
        let expected = if i == impostor_index { 0 } else { 1 };
        assert_eq!(player.score, expected, "score of {}", player.name);
    }
    let result = view.last_result.expect("round result");
    assert_eq!(result.word, "pancakes");
    assert!(result.impostor_caught);
}

#[tokio::test]
async fn test_five_player_decoy_round() {
    let words = StubWords::new("pancakes", "breakfast food", Some("waffles"));
    let state = new_state(Some(words));
    add_players(&state, 5).await;

    ok(
        &state,
        ClientMessage::UpdateConfig {
            category: None,
            allow_multiple_impostors: Some(true),
            give_impostor_fake_word: Some(true),
        },
    )
    .await;
    ok(&state, ClientMessage::Start).await;
    ok(&state, ClientMessage::Generate).await;
    ok(&state, ClientMessage::AssignRoles).await;

    let (assignments, config) = {
        let game = state.game.read().await;
        (game.round().assignments.clone(), game.config().clone())
    };
    let impostor_count = assignments.iter().filter(|a| a.is_impostor()).count();
    assert!((1..5).contains(&impostor_count));

    for assignment in &assignments {
        if assignment.is_impostor() {
            assert_eq!(assignment.visible_word.as_deref(), Some("waffles"));
        }
        assert!(!render_policy(assignment, &config).show_hint_control);
    }

    reveal_all(&state, |card| {
        assert!(!card.show_hint_control);
        assert!(card.word.is_some());
    })
    .await;
    assert_eq!(state.view().await.phase, Phase::ScoringGate);
}

#[tokio::test]
async fn test_generation_failure_falls_back() {
    let state = new_state(Some(Arc::new(BrokenWords)));
    add_players(&state, 3).await;
    ok(&state, ClientMessage::Start).await;
    ok(&state, ClientMessage::Generate).await;

    let view = state.view().await;
    assert!(view.content_ready);
    assert!(view.used_fallback);
    assert_eq!(
        state.game.read().await.round().content,
        Some(GeneratedContent::fallback())
    );

    ok(&state, ClientMessage::AssignRoles).await;
    assert_eq!(state.view().await.phase, Phase::Reveal);
}

#[tokio::test]
async fn test_restart_keeps_roster_and_scores() {
    let state = new_state(None);
    add_players(&state, 3).await;
    ok(&state, ClientMessage::Start).await;
    ok(&state, ClientMessage::Generate).await;
    ok(&state, ClientMessage::AssignRoles).await;
    reveal_all(&state, |_| {}).await;
    ok(&state, ClientMessage::ContinueToScoring).await;
    ok(&state, ClientMessage::SelectVote { index: 0 }).await;
    ok(&state, ClientMessage::SubmitScores).await;

    let scores: Vec<u32> = state.view().await.players.iter().map(|p| p.score).collect();
    assert!(scores.iter().sum::<u32>() > 0);

    ok(&state, ClientMessage::Restart).await;
    let view = state.view().await;
    assert_eq!(view.phase, Phase::Setup);
    assert_eq!(view.players.iter().map(|p| p.score).collect::<Vec<_>>(), scores);
    assert!(!view.content_ready);
    assert!(view.last_result.is_none());
}

#[tokio::test]
async fn test_transitions_are_persisted() {
    let store = Arc::new(MemorySnapshotStore::new());
    let state = AppState::new(None, store.clone());
    add_players(&state, 3).await;
    ok(&state, ClientMessage::Start).await;

    let raw = store.raw().expect("snapshot written on transition");
    let value: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["phase"], "ROUND_SETUP");
    assert_eq!(value["players"].as_array().map(Vec::len), Some(3));

    let restored = AppState::load(None, store).await;
    assert_eq!(restored.view().await.phase, Phase::RoundSetup);
}

// ========== HTTP routes ==========

async fn call(state: Arc<AppState>, request: Request<Body>) -> (StatusCode, Value) {
    let static_dir = tempfile::tempdir().unwrap();
    let response = api::router(state, static_dir.path())
        .oneshot(request)
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, value)
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_generate_endpoint_coerces_request() {
    let words = StubWords::new("pancakes", "breakfast food", Some("waffles"));
    let state = new_state(Some(words.clone()));

    let (status, body) = call(
        state,
        post_json(
            "/api/generate",
            r#"{"category": 7, "allowMultipleImpostors": "yes", "giveImpostorFakeWord": false}"#,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["word"], "pancakes");
    assert_eq!(body["hint"], "breakfast food");
    assert_eq!(body["fakeWord"], Value::Null);

    let seen = words.seen.lock().unwrap();
    assert_eq!(seen[0].category, "general");
    assert!(!seen[0].allow_multiple_impostors);
    assert!(!seen[0].give_impostor_fake_word);
}

#[tokio::test]
async fn test_generate_endpoint_accepts_garbage_body() {
    let words = StubWords::new("comet", "sky", Some("meteor"));
    let state = new_state(Some(words.clone()));

    let (status, body) = call(state, post_json("/api/generate", "not json at all")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fakeWord"], "meteor");
    assert_eq!(words.seen.lock().unwrap()[0], WordRequest::default());
}

#[tokio::test]
async fn test_generate_endpoint_failures() {
    let (status, body) = call(
        new_state(Some(Arc::new(BrokenWords))),
        post_json("/api/generate", "{}"),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "LLM generation failed"}));

    let (status, body) = call(new_state(None), post_json("/api/generate", "{}")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, json!({"error": "LLM generation failed"}));
}

#[tokio::test]
async fn test_game_endpoints() {
    let state = new_state(None);

    let (status, body) = call(
        state.clone(),
        post_json("/api/game", r#"{"t": "add_player", "name": "Ann"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["t"], "state");
    assert_eq!(body["view"]["players"][0]["name"], "Ann");
    assert_eq!(body["view"]["canStart"], false);

    let (status, body) = call(state.clone(), post_json("/api/game", r#"{"t": "start"}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["t"], "error");
    assert_eq!(body["code"], "NOT_ENOUGH_PLAYERS");

    let request = Request::builder()
        .uri("/api/game")
        .body(Body::empty())
        .unwrap();
    let (status, body) = call(state, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phase"], "SETUP");
    assert_eq!(body["config"]["giveImpostorFakeWord"], true);
}

#[tokio::test]
async fn test_health() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let static_dir = tempfile::tempdir().unwrap();
    let response = api::router(new_state(None), static_dir.path())
        .oneshot(request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"ok");
}
