use serde::{Deserialize, Serialize};

/// Opaque round identifier, regenerated every time a round is set up
pub type RoundId = String;

/// Minimum roster size for a round to start
pub const MIN_PLAYERS: usize = 3;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    #[default]
    Setup,
    RoundSetup,
    Reveal,
    ScoringGate,
    Scoring,
    BetweenRounds,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Player {
    pub name: String,
    pub score: u32,
}

impl Player {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            score: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct RoundConfig {
    pub allow_multiple_impostors: bool,
    pub give_impostor_fake_word: bool,
    pub category: String,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            allow_multiple_impostors: false,
            give_impostor_fake_word: true,
            category: String::new(),
        }
    }
}

/// Word, hint and optional decoy produced once per round by a word source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedContent {
    pub word: String,
    pub hint: String,
    pub fake_word: Option<String>,
}

pub const FALLBACK_WORD: &str = "aurora";
pub const FALLBACK_HINT: &str = "Common but not the first guess";

impl GeneratedContent {
    /// Placeholder content used whenever generation fails
    pub fn fallback() -> Self {
        Self {
            word: FALLBACK_WORD.to_string(),
            hint: FALLBACK_HINT.to_string(),
            fake_word: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Word,
    Impostor,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub player_index: usize,
    pub role: Role,
    /// Secret word for word-holders, decoy (if any) for impostors
    pub visible_word: Option<String>,
    pub hint: String,
}

impl Assignment {
    pub fn is_impostor(&self) -> bool {
        self.role == Role::Impostor
    }
}

/// Indices of every impostor in an assignment list
pub fn impostor_indices(assignments: &[Assignment]) -> Vec<usize> {
    assignments
        .iter()
        .filter(|a| a.is_impostor())
        .map(|a| a.player_index)
        .collect()
}

/// The vote being scored; built from the staged selection at submit time
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoundOutcome {
    pub voted_player_index: usize,
    pub impostor_guessed_correctly: bool,
}

/// Summary of the last scored round, shown between rounds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoundResult {
    pub word: String,
    pub fake_word: Option<String>,
    pub impostors: Vec<usize>,
    pub voted_player_index: usize,
    pub impostor_caught: bool,
    pub impostor_guessed_correctly: bool,
    /// Points gained this round, indexed like the roster
    pub deltas: Vec<u32>,
}
