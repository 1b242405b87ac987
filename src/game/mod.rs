//! Game core: roster, role assignment, reveal sequencing, scoring and the
//! phase controller tying them together.
//!
//! Everything here is synchronous and free of I/O. The server wraps a [`Game`]
//! in a lock and feeds it word-source results.

pub mod assign;
pub mod policy;
pub mod reveal;
pub mod roster;
pub mod score;

use crate::state::snapshot::GameSnapshot;
use crate::types::*;
use crate::words::{sanitize_category, WordRequest, WordSourceError};
use policy::{render_policy, RenderPolicy};
use rand::Rng;
use reveal::{RevealState, RevealStep};
use roster::Roster;
use serde::{Deserialize, Serialize};

/// Errors surfaced to the user as a blocking notice. The action is refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("Need at least 3 players")]
    NotEnoughPlayers,

    #[error("Generate or enter the secret word first")]
    EmptySecretWord,

    #[error("Player name must not be empty")]
    EmptyPlayerName,

    #[error("No player at index {0}")]
    PlayerOutOfRange(usize),

    #[error("Vote for player {0} is out of range")]
    VoteOutOfRange(usize),

    #[error("Select who was voted out first")]
    NoVoteSelected,

    #[error("Roster changed during the round")]
    RosterChanged,

    #[error("This card is already revealed")]
    AlreadyRevealed,

    #[error("Reveal the card first")]
    NotRevealed,

    #[error("No hint is available for this card")]
    HintNotAvailable,

    #[error("A word is already being generated")]
    GenerationInProgress,

    #[error("Cannot {action} during {phase:?}")]
    InvalidAction { action: &'static str, phase: Phase },
}

impl GameError {
    /// Stable machine-readable code for clients
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotEnoughPlayers => "NOT_ENOUGH_PLAYERS",
            Self::EmptySecretWord => "EMPTY_SECRET_WORD",
            Self::EmptyPlayerName => "EMPTY_PLAYER_NAME",
            Self::PlayerOutOfRange(_) => "PLAYER_OUT_OF_RANGE",
            Self::VoteOutOfRange(_) => "VOTE_OUT_OF_RANGE",
            Self::NoVoteSelected => "NO_VOTE_SELECTED",
            Self::RosterChanged => "ROSTER_CHANGED",
            Self::AlreadyRevealed => "ALREADY_REVEALED",
            Self::NotRevealed => "NOT_REVEALED",
            Self::HintNotAvailable => "HINT_NOT_AVAILABLE",
            Self::GenerationInProgress => "GENERATION_IN_PROGRESS",
            Self::InvalidAction { .. } => "INVALID_PHASE",
        }
    }
}

/// Round-scoped state, cleared every time a round is set up
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct RoundData {
    pub id: RoundId,
    pub content: Option<GeneratedContent>,
    /// Set when the content is the placeholder after a failed generation
    pub used_fallback: bool,
    /// Never persisted: a restored game has no request in flight
    #[serde(skip)]
    pub generating: bool,
    pub assignments: Vec<Assignment>,
    pub reveal: Option<RevealState>,
    pub voted_player_index: Option<usize>,
    pub impostor_guessed_correctly: bool,
}

impl RoundData {
    fn fresh() -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            ..Self::default()
        }
    }
}

/// Partial update to the round options; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigUpdate {
    pub category: Option<String>,
    pub allow_multiple_impostors: Option<bool>,
    pub give_impostor_fake_word: Option<bool>,
}

/// The current player's card during the reveal phase.
///
/// Before `reveal()` only the name is exposed so the device can be handed
/// over without leaking anything.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RevealCard {
    pub player_index: usize,
    pub player_name: String,
    pub player_count: usize,
    pub is_last: bool,
    pub revealed: bool,
    pub label: Option<&'static str>,
    pub word: Option<String>,
    pub show_hint_control: bool,
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScoringView {
    pub voted_player_index: Option<usize>,
    pub impostor_guessed_correctly: bool,
}

/// Client-facing projection of the game
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub phase: Phase,
    pub players: Vec<Player>,
    pub config: RoundConfig,
    pub can_start: bool,
    pub generating: bool,
    pub content_ready: bool,
    pub used_fallback: bool,
    pub reveal: Option<RevealCard>,
    pub scoring: Option<ScoringView>,
    pub last_result: Option<RoundResult>,
}

/// Phase controller for one shared-device game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    phase: Phase,
    roster: Roster,
    config: RoundConfig,
    round: RoundData,
    last_result: Option<RoundResult>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    pub fn new() -> Self {
        Self {
            phase: Phase::Setup,
            roster: Roster::new(),
            config: RoundConfig::default(),
            round: RoundData::fresh(),
            last_result: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn config(&self) -> &RoundConfig {
        &self.config
    }

    pub fn round(&self) -> &RoundData {
        &self.round
    }

    pub fn last_result(&self) -> Option<&RoundResult> {
        self.last_result.as_ref()
    }

    fn require(&self, action: &'static str, allowed: &[Phase]) -> Result<(), GameError> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(GameError::InvalidAction {
                action,
                phase: self.phase,
            })
        }
    }

    fn require_idle(&self) -> Result<(), GameError> {
        if self.round.generating {
            Err(GameError::GenerationInProgress)
        } else {
            Ok(())
        }
    }

    fn enter_round_setup(&mut self) {
        self.round = RoundData::fresh();
        self.phase = Phase::RoundSetup;
    }

    fn enter_setup(&mut self) {
        self.round = RoundData::fresh();
        self.phase = Phase::Setup;
    }

    // ========== Roster ==========

    const ROSTER_PHASES: &'static [Phase] = &[Phase::Setup, Phase::RoundSetup, Phase::BetweenRounds];

    pub fn add_player(&mut self, name: &str) -> Result<usize, GameError> {
        self.require("add a player", Self::ROSTER_PHASES)?;
        let index = self.roster.add(name)?;
        self.last_result = None;
        Ok(index)
    }

    /// Remove a player. Falling below the minimum outside `Setup` sends the
    /// game back to `Setup`.
    pub fn remove_player(&mut self, index: usize) -> Result<Player, GameError> {
        self.require("remove a player", Self::ROSTER_PHASES)?;
        let removed = self.roster.remove(index)?;
        self.last_result = None;
        if self.phase != Phase::Setup && self.roster.len() < MIN_PLAYERS {
            tracing::info!("Roster below minimum, returning to setup");
            self.enter_setup();
        }
        Ok(removed)
    }

    pub fn rename_player(&mut self, index: usize, name: &str) -> Result<(), GameError> {
        self.require("rename a player", Self::ROSTER_PHASES)?;
        self.roster.rename(index, name)
    }

    pub fn reset_scores(&mut self) -> Result<(), GameError> {
        self.require("reset scores", &[Phase::Setup, Phase::BetweenRounds])?;
        self.roster.reset_scores();
        self.last_result = None;
        Ok(())
    }

    // ========== Round options ==========

    pub fn update_config(&mut self, update: ConfigUpdate) -> Result<(), GameError> {
        self.require("change round options", Self::ROSTER_PHASES)?;
        self.require_idle()?;

        let before = self.config.clone();
        if let Some(category) = update.category {
            self.config.category = clean_category(&category);
        }
        if let Some(allow) = update.allow_multiple_impostors {
            self.config.allow_multiple_impostors = allow;
        }
        if let Some(fake) = update.give_impostor_fake_word {
            self.config.give_impostor_fake_word = fake;
        }

        // Content was generated for the old options
        if self.phase == Phase::RoundSetup && self.config != before && self.round.content.is_some()
        {
            tracing::debug!("Round options changed, discarding generated content");
            self.round.content = None;
            self.round.used_fallback = false;
        }
        Ok(())
    }

    // ========== Round lifecycle ==========

    /// Setup -> RoundSetup
    pub fn start(&mut self) -> Result<(), GameError> {
        self.require("start", &[Phase::Setup])?;
        if self.roster.len() < MIN_PLAYERS {
            return Err(GameError::NotEnoughPlayers);
        }
        self.enter_round_setup();
        Ok(())
    }

    /// Mark a generation request as in flight and return what to ask for.
    ///
    /// The returned round id must be handed back to
    /// [`complete_generation`](Self::complete_generation).
    pub fn begin_generation(&mut self) -> Result<(RoundId, WordRequest), GameError> {
        self.require("generate a word", &[Phase::RoundSetup])?;
        self.require_idle()?;

        self.round.generating = true;
        let request = WordRequest {
            category: sanitize_category(&self.config.category),
            allow_multiple_impostors: self.config.allow_multiple_impostors,
            give_impostor_fake_word: self.config.give_impostor_fake_word,
        };
        Ok((self.round.id.clone(), request))
    }

    /// Store the outcome of a generation request. Failures are replaced by
    /// fallback content so the round can go on. Returns false when the result
    /// belongs to a round that no longer exists.
    pub fn complete_generation(
        &mut self,
        round_id: &str,
        result: Result<GeneratedContent, WordSourceError>,
    ) -> bool {
        if round_id != self.round.id || !self.round.generating {
            tracing::debug!("Discarding generation result for stale round {}", round_id);
            return false;
        }
        self.round.generating = false;

        let (mut content, used_fallback) = match result {
            Ok(content) if !content.word.trim().is_empty() => (content, false),
            Ok(_) => {
                tracing::warn!("Word source returned an empty word, using fallback");
                (GeneratedContent::fallback(), true)
            }
            Err(e) => {
                tracing::warn!("Word generation failed: {}, using fallback", e);
                (GeneratedContent::fallback(), true)
            }
        };
        if !self.config.give_impostor_fake_word {
            content.fake_word = None;
        }

        self.round.content = Some(content);
        self.round.used_fallback = used_fallback;
        true
    }

    /// Enter the word by hand instead of generating it
    pub fn set_content(
        &mut self,
        word: &str,
        hint: &str,
        fake_word: Option<&str>,
    ) -> Result<(), GameError> {
        self.require("set the word", &[Phase::RoundSetup])?;
        self.require_idle()?;

        let word = word.trim();
        if word.is_empty() {
            return Err(GameError::EmptySecretWord);
        }
        let fake_word = fake_word
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string);

        self.round.content = Some(GeneratedContent {
            word: word.to_string(),
            hint: hint.trim().to_string(),
            fake_word,
        });
        self.round.used_fallback = false;
        Ok(())
    }

    /// RoundSetup -> Reveal
    pub fn assign_roles(&mut self) -> Result<(), GameError> {
        self.assign_roles_with(&mut rand::rng())
    }

    pub fn assign_roles_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), GameError> {
        self.require("assign roles", &[Phase::RoundSetup])?;
        self.require_idle()?;
        let content = self
            .round
            .content
            .as_ref()
            .ok_or(GameError::EmptySecretWord)?;

        let fake_word = if self.config.give_impostor_fake_word {
            content.fake_word.as_deref()
        } else {
            None
        };

        let assignments = assign::assign(
            self.roster.len(),
            &content.word,
            &content.hint,
            fake_word,
            self.config.allow_multiple_impostors,
            rng,
        )?;

        tracing::info!(
            round_id = %self.round.id,
            players = assignments.len(),
            impostors = impostor_indices(&assignments).len(),
            "Roles assigned"
        );

        self.round.reveal = Some(RevealState::new(assignments.len()));
        self.round.assignments = assignments;
        self.phase = Phase::Reveal;
        Ok(())
    }

    fn reveal_state(&mut self, action: &'static str) -> Result<&mut RevealState, GameError> {
        self.require(action, &[Phase::Reveal])?;
        let phase = self.phase;
        self.round
            .reveal
            .as_mut()
            .ok_or(GameError::InvalidAction { action, phase })
    }

    fn current_policy(&self) -> Option<RenderPolicy> {
        let reveal = self.round.reveal.as_ref()?;
        let assignment = self.round.assignments.get(reveal.current_index())?;
        Some(render_policy(assignment, &self.config))
    }

    pub fn reveal(&mut self) -> Result<(), GameError> {
        self.reveal_state("reveal")?.reveal()
    }

    pub fn show_hint(&mut self) -> Result<(), GameError> {
        self.require("show the hint", &[Phase::Reveal])?;
        let allowed = self
            .current_policy()
            .map(|p| p.show_hint_control)
            .unwrap_or(false);
        self.reveal_state("show the hint")?.show_hint(allowed)
    }

    /// Pass the device on. After the last player the game moves to the
    /// scoring gate.
    pub fn advance(&mut self) -> Result<RevealStep, GameError> {
        let step = self.reveal_state("advance")?.advance()?;
        if step == RevealStep::Complete {
            self.phase = Phase::ScoringGate;
        }
        Ok(step)
    }

    /// ScoringGate -> Scoring
    pub fn continue_to_scoring(&mut self) -> Result<(), GameError> {
        self.require("continue to scoring", &[Phase::ScoringGate])?;
        self.phase = Phase::Scoring;
        Ok(())
    }

    pub fn select_vote(&mut self, index: usize) -> Result<(), GameError> {
        self.require("vote", &[Phase::Scoring])?;
        if index >= self.roster.len() {
            return Err(GameError::VoteOutOfRange(index));
        }
        self.round.voted_player_index = Some(index);
        Ok(())
    }

    pub fn set_impostor_guessed(&mut self, guessed: bool) -> Result<(), GameError> {
        self.require("record the impostor's guess", &[Phase::Scoring])?;
        self.round.impostor_guessed_correctly = guessed;
        Ok(())
    }

    /// Scoring -> BetweenRounds
    pub fn submit_scores(&mut self) -> Result<&RoundResult, GameError> {
        self.require("submit scores", &[Phase::Scoring])?;
        let outcome = RoundOutcome {
            voted_player_index: self
                .round
                .voted_player_index
                .ok_or(GameError::NoVoteSelected)?,
            impostor_guessed_correctly: self.round.impostor_guessed_correctly,
        };

        let deltas =
            score::apply_scores(self.roster.players_mut(), &self.round.assignments, &outcome)?;
        let voted = outcome.voted_player_index;

        let impostors = impostor_indices(&self.round.assignments);
        let content = self.round.content.clone().unwrap_or_else(GeneratedContent::fallback);
        let result = RoundResult {
            word: content.word,
            fake_word: content.fake_word,
            impostor_caught: impostors.contains(&voted),
            impostors,
            voted_player_index: voted,
            impostor_guessed_correctly: outcome.impostor_guessed_correctly,
            deltas,
        };
        tracing::info!(
            round_id = %self.round.id,
            caught = result.impostor_caught,
            guessed = result.impostor_guessed_correctly,
            "Round scored"
        );

        self.phase = Phase::BetweenRounds;
        Ok(self.last_result.insert(result))
    }

    /// BetweenRounds -> RoundSetup
    pub fn next_round(&mut self) -> Result<(), GameError> {
        self.require("start the next round", &[Phase::BetweenRounds])?;
        if self.roster.len() < MIN_PLAYERS {
            return Err(GameError::NotEnoughPlayers);
        }
        self.enter_round_setup();
        Ok(())
    }

    /// BetweenRounds -> Setup. Roster and scores are kept.
    pub fn restart(&mut self) -> Result<(), GameError> {
        self.require("restart", &[Phase::BetweenRounds])?;
        self.enter_setup();
        self.last_result = None;
        Ok(())
    }

    // ========== Views ==========

    fn reveal_card(&self) -> Option<RevealCard> {
        if self.phase != Phase::Reveal {
            return None;
        }
        let reveal = self.round.reveal.as_ref()?;
        let index = reveal.current_index();
        let assignment = self.round.assignments.get(index)?;
        let policy = render_policy(assignment, &self.config);
        let revealed = reveal.is_revealed();

        Some(RevealCard {
            player_index: index,
            player_name: self.roster.name(index).unwrap_or_default().to_string(),
            player_count: reveal.player_count(),
            is_last: reveal.is_last(),
            revealed,
            label: revealed.then_some(policy.label),
            word: if revealed && policy.show_word {
                assignment.visible_word.clone()
            } else {
                None
            },
            show_hint_control: revealed && policy.show_hint_control && !reveal.is_hint_visible(),
            hint: reveal
                .is_hint_visible()
                .then(|| assignment.hint.clone()),
        })
    }

    pub fn view(&self) -> GameView {
        GameView {
            phase: self.phase,
            players: self.roster.players().to_vec(),
            config: self.config.clone(),
            can_start: self.roster.len() >= MIN_PLAYERS,
            generating: self.round.generating,
            content_ready: self.round.content.is_some(),
            used_fallback: self.round.used_fallback,
            reveal: self.reveal_card(),
            scoring: (self.phase == Phase::Scoring).then(|| ScoringView {
                voted_player_index: self.round.voted_player_index,
                impostor_guessed_correctly: self.round.impostor_guessed_correctly,
            }),
            last_result: if self.phase == Phase::BetweenRounds {
                self.last_result.clone()
            } else {
                None
            },
        }
    }

    // ========== Persistence ==========

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot::new(
            self.phase,
            self.roster.players().to_vec(),
            self.config.clone(),
            self.round.clone(),
            self.last_result.clone(),
        )
    }

    /// Rebuild a game from a snapshot, falling back to the nearest safe phase
    /// when the stored round no longer fits the roster.
    pub fn restore(snapshot: GameSnapshot) -> Self {
        let mut game = Self {
            phase: snapshot.phase,
            roster: Roster::from_players(snapshot.players),
            config: snapshot.config,
            round: snapshot.round,
            last_result: snapshot.last_result,
        };
        game.round.generating = false;
        if game.round.id.is_empty() {
            game.round.id = ulid::Ulid::new().to_string();
        }
        game.config.category = clean_category(&game.config.category);

        let enough_players = game.roster.len() >= MIN_PLAYERS;
        let round_intact = game.round_is_consistent();

        game.phase = match game.phase {
            Phase::Setup => Phase::Setup,
            _ if !enough_players => Phase::Setup,
            Phase::RoundSetup | Phase::BetweenRounds => game.phase,
            Phase::Reveal | Phase::ScoringGate | Phase::Scoring if round_intact => game.phase,
            _ => Phase::RoundSetup,
        };

        match game.phase {
            Phase::Setup => {
                game.round = RoundData::fresh();
            }
            Phase::RoundSetup => {
                let content = game.round.content.take();
                let used_fallback = game.round.used_fallback;
                game.round = RoundData::fresh();
                game.round.content = content.filter(|c| !c.word.trim().is_empty());
                game.round.used_fallback = used_fallback;
            }
            _ => {}
        }

        if game
            .round
            .voted_player_index
            .is_some_and(|i| i >= game.roster.len())
        {
            game.round.voted_player_index = None;
        }

        if game.phase != snapshot.phase {
            tracing::warn!(
                "Restored snapshot was inconsistent, resuming in {:?} instead of {:?}",
                game.phase,
                snapshot.phase
            );
        }
        game
    }

    fn round_is_consistent(&self) -> bool {
        let count = self.roster.len();
        let assignments = &self.round.assignments;
        let impostors = impostor_indices(assignments).len();

        self.round.content.is_some()
            && assignments.len() == count
            && assignments
                .iter()
                .enumerate()
                .all(|(i, a)| a.player_index == i)
            && impostors >= 1
            && impostors < count
            && self
                .round
                .reveal
                .as_ref()
                .is_some_and(|r| r.is_valid_for(count))
    }
}

/// Trim a category and cap its length. Empty stays empty; the default is
/// applied when a request is built.
fn clean_category(raw: &str) -> String {
    let cleaned = raw.trim();
    if cleaned.is_empty() {
        String::new()
    } else {
        sanitize_category(cleaned)
    }
}
