//! Host action dispatch
//!
//! Every action runs against the shared game and answers with the fresh view,
//! or with an error notice when the game refused it.

use crate::game::reveal::RevealStep;
use crate::game::{ConfigUpdate, GameError};
use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;

fn error_message(err: &GameError) -> ServerMessage {
    ServerMessage::Error {
        code: err.code().to_string(),
        msg: err.to_string(),
    }
}

/// Handle one host action and return the response to send back
pub async fn handle_message(msg: ClientMessage, state: &AppState) -> ServerMessage {
    let result = match msg {
        ClientMessage::AddPlayer { name } => state
            .mutate(|game| game.add_player(&name))
            .await
            .map(|index| tracing::info!("Added player {} at {}", name.trim(), index)),

        ClientMessage::RemovePlayer { index } => state
            .mutate(|game| game.remove_player(index))
            .await
            .map(|player| tracing::info!("Removed player {}", player.name)),

        ClientMessage::RenamePlayer { index, name } => {
            state.mutate(|game| game.rename_player(index, &name)).await
        }

        ClientMessage::ResetScores => state.mutate(|game| game.reset_scores()).await,

        ClientMessage::UpdateConfig {
            category,
            allow_multiple_impostors,
            give_impostor_fake_word,
        } => {
            let update = ConfigUpdate {
                category,
                allow_multiple_impostors,
                give_impostor_fake_word,
            };
            state.mutate(|game| game.update_config(update)).await
        }

        ClientMessage::Start => state.mutate(|game| game.start()).await,

        ClientMessage::Generate => state.generate_content().await,

        ClientMessage::SetContent {
            word,
            hint,
            fake_word,
        } => {
            state
                .mutate(|game| game.set_content(&word, &hint, fake_word.as_deref()))
                .await
        }

        ClientMessage::AssignRoles => state.mutate(|game| game.assign_roles()).await,

        ClientMessage::Reveal => state.mutate(|game| game.reveal()).await,

        ClientMessage::ShowHint => state.mutate(|game| game.show_hint()).await,

        ClientMessage::Advance => state
            .mutate(|game| game.advance())
            .await
            .map(|step| {
                if step == RevealStep::Complete {
                    tracing::info!("All cards revealed, waiting for discussion");
                }
            }),

        ClientMessage::ContinueToScoring => {
            state.mutate(|game| game.continue_to_scoring()).await
        }

        ClientMessage::SelectVote { index } => {
            state.mutate(|game| game.select_vote(index)).await
        }

        ClientMessage::SetImpostorGuessed { guessed } => {
            state
                .mutate(|game| game.set_impostor_guessed(guessed))
                .await
        }

        ClientMessage::SubmitScores => state
            .mutate(|game| {
                let result = game.submit_scores()?;
                Ok(result.impostor_caught)
            })
            .await
            .map(|caught| tracing::info!("Round scored, impostor caught: {}", caught)),

        ClientMessage::NextRound => state.mutate(|game| game.next_round()).await,

        ClientMessage::Restart => state.mutate(|game| game.restart()).await,

        ClientMessage::GetState => Ok(()),
    };

    match result {
        Ok(()) => ServerMessage::State {
            view: state.view().await,
        },
        Err(e) => {
            tracing::debug!("Action refused: {}", e);
            error_message(&e)
        }
    }
}
