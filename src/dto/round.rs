use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::phase::VisibleRoundPhase,
    state::{
        effects::MatchExit,
        round::Choice,
        score::Scores,
        state_machine::{MatchState, RoundPhase},
    },
};

/// Answer details, only filled once the round outcome reveals them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RevealedAnswer {
    /// Song identifier.
    pub id: u32,
    /// Song title.
    pub title: String,
    /// Composer credited for the song.
    pub composer: String,
}

/// Immutable view of a match handed to renderers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RoundSnapshot {
    /// Identifier of the match.
    pub match_id: Uuid,
    /// Increases with every accepted event.
    pub version: usize,
    pub phase: VisibleRoundPhase,
    /// 1-based round counter.
    pub round_number: u32,
    pub max_rounds: u32,
    pub scores: Scores,
    /// Player holding the answering turn (1 or 2).
    pub answering_player: Option<u8>,
    pub time_remaining_seconds: u32,
    /// Choices of the loaded round, in display order.
    pub choices: Vec<Choice>,
    /// Whether a hint request would be granted right now.
    pub hint_available: bool,
    /// Hint text, once revealed.
    pub hint: Option<String>,
    pub revealed_answer: Option<RevealedAnswer>,
    /// Choice picked by the last answer of the round.
    pub last_selection: Option<u32>,
    /// Why the match failed.
    pub failure: Option<String>,
    /// Where the renderer should go once the match is left.
    pub exit: Option<MatchExit>,
}

impl RoundSnapshot {
    /// Build the view of `state` at `version`.
    pub fn capture(state: &MatchState, version: usize) -> Self {
        let answer = state.correct_answer.as_ref();
        let revealed_answer = answer
            .filter(|_| state.answer_revealed())
            .map(|answer| RevealedAnswer {
                id: answer.id,
                title: answer.title.clone(),
                composer: answer.composer.clone(),
            });
        let hint = answer
            .filter(|_| state.hint_used_this_round)
            .and_then(|answer| answer.hint.clone());
        let showing_result = matches!(state.phase, RoundPhase::ShowingResult(_));

        Self {
            match_id: state.match_id,
            version,
            phase: state.phase.into(),
            round_number: state.round_number,
            max_rounds: state.max_rounds,
            scores: state.scores.scores(),
            answering_player: state.answering_player.map(u8::from),
            time_remaining_seconds: state.time_remaining_seconds,
            choices: state.choices.clone(),
            hint_available: state.hint_available(),
            hint,
            revealed_answer,
            last_selection: state.last_selection.filter(|_| showing_result),
            failure: state.failure.clone(),
            exit: state.exit.clone(),
        }
    }
}

/// Request body of `POST /api/round/buzz`.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BuzzRequest {
    /// Player buzzing in (1 or 2).
    #[validate(range(min = 1, max = 2))]
    pub player: u8,
}

/// Request body of `POST /api/round/answer`. Exactly one of the fields must be set.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AnswerRequest {
    /// Song identifier of the chosen answer.
    pub choice_id: Option<u32>,
    /// 1-based position of the chosen answer.
    #[validate(range(min = 1, max = 4))]
    pub position: Option<usize>,
}

/// Request body of `POST /api/round/key`.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct KeyRequest {
    /// Key name as reported by `KeyboardEvent.key`.
    #[validate(length(min = 1, max = 32))]
    pub key: String,
}

/// Result of sending an input event to the running match.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EventResponse {
    /// False when the event did not apply to the current phase and was ignored.
    pub accepted: bool,
    pub snapshot: RoundSnapshot,
}
