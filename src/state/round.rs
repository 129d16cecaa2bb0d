use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::dao::quiz::models::{QuizEntity, SongEntity};

/// Number of choices every round must offer.
pub const CHOICES_PER_ROUND: usize = 4;

/// One of the two competing players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Player {
    /// Player bound to the left buzzer.
    One,
    /// Player bound to the right buzzer.
    Two,
}

impl Player {
    /// Zero-based slot used to index per-player storage.
    pub fn index(self) -> usize {
        match self {
            Player::One => 0,
            Player::Two => 1,
        }
    }
}

impl TryFrom<u8> for Player {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Player::One),
            2 => Ok(Player::Two),
            other => Err(format!("unknown player `{other}` (expected 1 or 2)")),
        }
    }
}

impl From<Player> for u8 {
    fn from(value: Player) -> Self {
        match value {
            Player::One => 1,
            Player::Two => 2,
        }
    }
}

/// Answer record of the song being guessed in the current round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRecord {
    /// Song identifier, matched against the selected choice.
    pub id: u32,
    /// Song title.
    pub title: String,
    /// Composer credited for the song.
    pub composer: String,
    /// Reference to the audio resource played as the excerpt.
    pub excerpt_ref: String,
    /// Optional hint players may reveal once per round.
    pub hint: Option<String>,
}

/// A selectable answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Choice {
    /// Song identifier.
    pub id: u32,
    /// Title displayed on the answer button.
    pub title: String,
}

/// Validated content of a single round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    /// The song to guess.
    pub answer: AnswerRecord,
    /// The four choices, exactly one of which matches `answer.id`.
    pub choices: Vec<Choice>,
}

/// Reasons a quiz payload is rejected before it reaches the state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizValidationError {
    /// The service did not return the expected number of choices.
    #[error("expected {expected} choices, got {actual}")]
    ChoiceCount {
        /// Required count.
        expected: usize,
        /// Received count.
        actual: usize,
    },
    /// Two choices share the same identifier.
    #[error("duplicate choice id {0}")]
    DuplicateChoice(u32),
    /// None of the choices is the correct answer.
    #[error("correct answer {0} is not among the choices")]
    MissingAnswer(u32),
}

impl TryFrom<QuizEntity> for Quiz {
    type Error = QuizValidationError;

    fn try_from(value: QuizEntity) -> Result<Self, Self::Error> {
        let QuizEntity {
            correct_answer,
            choices,
        } = value;

        if choices.len() != CHOICES_PER_ROUND {
            return Err(QuizValidationError::ChoiceCount {
                expected: CHOICES_PER_ROUND,
                actual: choices.len(),
            });
        }

        let mut seen = HashSet::new();
        for choice in &choices {
            if !seen.insert(choice.music_id) {
                return Err(QuizValidationError::DuplicateChoice(choice.music_id));
            }
        }

        if !seen.contains(&correct_answer.music_id) {
            return Err(QuizValidationError::MissingAnswer(correct_answer.music_id));
        }

        Ok(Self {
            answer: correct_answer.into(),
            choices: choices
                .into_iter()
                .map(|choice| Choice {
                    id: choice.music_id,
                    title: choice.title,
                })
                .collect(),
        })
    }
}

impl From<SongEntity> for AnswerRecord {
    fn from(value: SongEntity) -> Self {
        Self {
            id: value.music_id,
            title: value.title,
            composer: value.composer,
            excerpt_ref: value.audio_file,
            hint: value.hint.filter(|hint| !hint.trim().is_empty()),
        }
    }
}
