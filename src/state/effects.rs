use std::time::Duration;

use serde::Serialize;
use utoipa::ToSchema;

use crate::state::{
    score::Scores,
    timers::{TimerMode, TimerRole},
};

/// Short sound effects marking round events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CueKind {
    /// A round is starting.
    Question,
    /// A player buzzed in.
    Answer,
    /// The selected answer is right.
    Correct,
    /// The selected answer is wrong, or time ran out.
    Incorrect,
}

/// How the match was left.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchExit {
    /// Final scores were accepted; the renderer should follow `redirect`.
    Submitted {
        /// Result view returned by the quiz service.
        redirect: String,
    },
    /// A player quit before the match was over.
    Quit,
}

/// Side effect requested by a state machine transition, executed by the round controller
/// in the order returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Request content for `round`, excluding songs already played.
    FetchQuiz {
        /// Round number the answer must be tagged with.
        round: u32,
        /// Song ids that must not be picked again.
        exclude: Vec<u32>,
    },
    /// Arm (or re-arm) a timer.
    Schedule {
        /// Timer role.
        role: TimerRole,
        /// Delay, or period for periodic timers.
        delay: Duration,
        /// One-shot or periodic.
        mode: TimerMode,
    },
    /// Cancel a single timer.
    Cancel(TimerRole),
    /// Cancel every timer.
    CancelAll,
    /// Play a sound effect.
    PlayCue(CueKind),
    /// Play the excerpt from its beginning.
    PlayExcerpt {
        /// Audio resource of the excerpt.
        excerpt_ref: String,
    },
    /// Pause the excerpt and rewind it.
    StopExcerpt,
    /// Submit the final scores.
    SubmitScores(Scores),
    /// Tell the renderer to leave the match view.
    Navigate(MatchExit),
}
