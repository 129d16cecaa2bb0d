use serde::Serialize;
use utoipa::ToSchema;

use crate::state::state_machine::{RoundOutcome, RoundPhase};

/// Publicly visible round phase exposed to clients (REST/SSE).
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleRoundPhase {
    /// Waiting for quiz content.
    Loading,
    /// Round loaded, waiting for the start key.
    ReadyToPlay,
    /// Question cue playing.
    PlayingCue,
    /// Excerpt playing, buzzers open.
    PlayingExcerpt,
    /// A player is choosing an answer.
    Answering,
    /// The answer was right.
    ResultCorrect,
    /// The answer was wrong; play resumes shortly.
    ResultWrong,
    /// Time ran out.
    ResultTimeout,
    /// Match over, scores being submitted.
    Ended,
    /// Something went wrong; reload required.
    Failed,
}

impl From<RoundPhase> for VisibleRoundPhase {
    fn from(value: RoundPhase) -> Self {
        match value {
            RoundPhase::Loading => VisibleRoundPhase::Loading,
            RoundPhase::ReadyToPlay => VisibleRoundPhase::ReadyToPlay,
            RoundPhase::PlayingCue => VisibleRoundPhase::PlayingCue,
            RoundPhase::PlayingExcerpt => VisibleRoundPhase::PlayingExcerpt,
            RoundPhase::Answering => VisibleRoundPhase::Answering,
            RoundPhase::ShowingResult(RoundOutcome::Correct) => VisibleRoundPhase::ResultCorrect,
            RoundPhase::ShowingResult(RoundOutcome::Wrong) => VisibleRoundPhase::ResultWrong,
            RoundPhase::ShowingResult(RoundOutcome::Timeout) => VisibleRoundPhase::ResultTimeout,
            RoundPhase::Ended => VisibleRoundPhase::Ended,
            RoundPhase::Failed => VisibleRoundPhase::Failed,
        }
    }
}
