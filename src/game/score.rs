use super::GameError;
use crate::types::{Assignment, Player, RoundOutcome};

/// Compute and apply the points for one round.
///
/// Catching an impostor gives every word-holder a point; voting out a
/// word-holder gives every impostor a point. An impostor who guessed the
/// secret word earns one more on top. Returns the per-player deltas.
pub fn apply_scores(
    players: &mut [Player],
    assignments: &[Assignment],
    outcome: &RoundOutcome,
) -> Result<Vec<u32>, GameError> {
    let RoundOutcome {
        voted_player_index: voted_index,
        impostor_guessed_correctly,
    } = *outcome;

    if players.len() != assignments.len() {
        return Err(GameError::RosterChanged);
    }
    if voted_index >= players.len() {
        return Err(GameError::VoteOutOfRange(voted_index));
    }

    let impostor_caught = assignments[voted_index].is_impostor();

    let deltas: Vec<u32> = assignments
        .iter()
        .map(|a| {
            let mut delta = 0;
            if a.is_impostor() {
                if !impostor_caught {
                    delta += 1;
                }
                if impostor_guessed_correctly {
                    delta += 1;
                }
            } else if impostor_caught {
                delta += 1;
            }
            delta
        })
        .collect();

    for (player, delta) in players.iter_mut().zip(&deltas) {
        player.score = player.score.saturating_add(*delta);
    }

    Ok(deltas)
}
