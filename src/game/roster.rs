use super::GameError;
use crate::types::Player;
use serde::{Deserialize, Serialize};

/// Longest accepted player name, in characters
pub const MAX_NAME_CHARS: usize = 40;

/// Trim a user-supplied name and cap its length
fn clean_name(name: &str) -> Result<String, GameError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(GameError::EmptyPlayerName);
    }
    Ok(trimmed.chars().take(MAX_NAME_CHARS).collect())
}

/// Ordered list of players. Rounds refer to players by index.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Roster {
    players: Vec<Player>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_players(players: Vec<Player>) -> Self {
        Self { players }
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn players_mut(&mut self) -> &mut [Player] {
        &mut self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.players.get(index).map(|p| p.name.as_str())
    }

    /// Add a player with a zero score, returning its index
    pub fn add(&mut self, name: &str) -> Result<usize, GameError> {
        let name = clean_name(name)?;
        self.players.push(Player::new(name));
        Ok(self.players.len() - 1)
    }

    pub fn remove(&mut self, index: usize) -> Result<Player, GameError> {
        if index >= self.players.len() {
            return Err(GameError::PlayerOutOfRange(index));
        }
        Ok(self.players.remove(index))
    }

    pub fn rename(&mut self, index: usize, name: &str) -> Result<(), GameError> {
        let name = clean_name(name)?;
        let player = self
            .players
            .get_mut(index)
            .ok_or(GameError::PlayerOutOfRange(index))?;
        player.name = name;
        Ok(())
    }

    pub fn reset_scores(&mut self) {
        for player in &mut self.players {
            player.score = 0;
        }
    }
}
