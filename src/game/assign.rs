//! Role assignment for a round.
//!
//! The first index of a shuffled permutation is always an impostor. When
//! multiple impostors are allowed, later candidates are admitted with a
//! geometrically decaying chance, so one impostor is by far the most common
//! outcome and three or more is rare.

use super::GameError;
use crate::types::{Assignment, Role, MIN_PLAYERS};
use rand::seq::SliceRandom;
use rand::Rng;

/// Chance that the second candidate in the permutation becomes an impostor
pub const FIRST_EXTRA_IMPOSTOR_CHANCE: f64 = 0.25;
/// Factor applied to the chance for each further candidate
pub const EXTRA_IMPOSTOR_DECAY: f64 = 0.25;

/// Produce one assignment per player.
///
/// `fake_word` is handed to impostors as their visible word; pass `None` when
/// the decoy option is off.
pub fn assign<R: Rng + ?Sized>(
    player_count: usize,
    secret_word: &str,
    hint: &str,
    fake_word: Option<&str>,
    allow_multiple_impostors: bool,
    rng: &mut R,
) -> Result<Vec<Assignment>, GameError> {
    if player_count < MIN_PLAYERS {
        return Err(GameError::NotEnoughPlayers);
    }
    let secret_word = secret_word.trim();
    if secret_word.is_empty() {
        return Err(GameError::EmptySecretWord);
    }

    let impostors = pick_impostors(player_count, allow_multiple_impostors, rng);

    let assignments = (0..player_count)
        .map(|player_index| {
            if impostors.contains(&player_index) {
                Assignment {
                    player_index,
                    role: Role::Impostor,
                    visible_word: fake_word.map(str::to_string),
                    hint: hint.to_string(),
                }
            } else {
                Assignment {
                    player_index,
                    role: Role::Word,
                    visible_word: Some(secret_word.to_string()),
                    hint: hint.to_string(),
                }
            }
        })
        .collect();

    Ok(assignments)
}

/// Sorted impostor indices. `player_count` must be at least `MIN_PLAYERS`.
fn pick_impostors<R: Rng + ?Sized>(
    player_count: usize,
    allow_multiple_impostors: bool,
    rng: &mut R,
) -> Vec<usize> {
    if !allow_multiple_impostors {
        return vec![rng.random_range(0..player_count)];
    }

    let mut order: Vec<usize> = (0..player_count).collect();
    order.shuffle(rng);

    let mut impostors = vec![order[0]];
    let mut chance = FIRST_EXTRA_IMPOSTOR_CHANCE;
    // The final candidate is skipped so at least one word-holder remains
    for &candidate in &order[1..player_count - 1] {
        if rng.random_bool(chance) {
            impostors.push(candidate);
        }
        chance *= EXTRA_IMPOSTOR_DECAY;
    }

    impostors.sort_unstable();
    impostors
}
