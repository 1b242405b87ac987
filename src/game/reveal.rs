use super::GameError;
use serde::{Deserialize, Serialize};

/// Result of advancing past the current player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealStep {
    /// The device moves on to this player
    Next(usize),
    /// Every player has seen their card
    Complete,
}

/// Pass-the-device reveal progress.
///
/// Only moves forward: each player must reveal before the sequencer advances,
/// and the two flags reset on every advance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RevealState {
    player_count: usize,
    current_index: usize,
    current_revealed: bool,
    hint_visible: bool,
}

impl RevealState {
    pub fn new(player_count: usize) -> Self {
        Self {
            player_count,
            current_index: 0,
            current_revealed: false,
            hint_visible: false,
        }
    }

    pub fn player_count(&self) -> usize {
        self.player_count
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn is_revealed(&self) -> bool {
        self.current_revealed
    }

    pub fn is_hint_visible(&self) -> bool {
        self.hint_visible
    }

    pub fn is_last(&self) -> bool {
        self.current_index + 1 >= self.player_count
    }

    /// Whether restored progress still fits a roster of `player_count`
    pub fn is_valid_for(&self, player_count: usize) -> bool {
        self.player_count == player_count
            && self.current_index < player_count
            && (self.current_revealed || !self.hint_visible)
    }

    pub fn reveal(&mut self) -> Result<(), GameError> {
        if self.current_revealed {
            return Err(GameError::AlreadyRevealed);
        }
        self.current_revealed = true;
        Ok(())
    }

    /// Show the hint for the current player. `hint_allowed` comes from the
    /// render policy of the current assignment.
    pub fn show_hint(&mut self, hint_allowed: bool) -> Result<(), GameError> {
        if !self.current_revealed {
            return Err(GameError::NotRevealed);
        }
        if !hint_allowed {
            return Err(GameError::HintNotAvailable);
        }
        self.hint_visible = true;
        Ok(())
    }

    pub fn advance(&mut self) -> Result<RevealStep, GameError> {
        if !self.current_revealed {
            return Err(GameError::NotRevealed);
        }
        if self.is_last() {
            return Ok(RevealStep::Complete);
        }
        self.current_index += 1;
        self.current_revealed = false;
        self.hint_visible = false;
        Ok(RevealStep::Next(self.current_index))
    }
}
