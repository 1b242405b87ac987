use crate::game::GameView;
use serde::{Deserialize, Serialize};

/// Host actions, posted as JSON to `/api/game`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "t", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    // Roster
    AddPlayer {
        name: String,
    },
    RemovePlayer {
        index: usize,
    },
    RenamePlayer {
        index: usize,
        name: String,
    },
    ResetScores,
    UpdateConfig {
        #[serde(default)]
        category: Option<String>,
        #[serde(default)]
        allow_multiple_impostors: Option<bool>,
        #[serde(default)]
        give_impostor_fake_word: Option<bool>,
    },
    Start,

    // Round setup
    Generate,
    SetContent {
        word: String,
        #[serde(default)]
        hint: String,
        #[serde(default)]
        fake_word: Option<String>,
    },
    AssignRoles,

    // Pass-and-play reveal
    Reveal,
    ShowHint,
    Advance,

    // Scoring
    ContinueToScoring,
    SelectVote {
        index: usize,
    },
    SetImpostorGuessed {
        guessed: bool,
    },
    SubmitScores,

    NextRound,
    Restart,
    GetState,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    State { view: GameView },
    Error { code: String, msg: String },
}
