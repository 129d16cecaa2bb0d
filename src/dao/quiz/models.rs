//! Wire representation of the quiz service payloads.

use serde::{Deserialize, Serialize};

use crate::state::score::Scores;

/// Body of `POST /api/quiz`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizRequest {
    /// Song ids already played in this match.
    pub exclude: Vec<u32>,
}

/// Response of `POST /api/quiz`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QuizEntity {
    /// Song to guess.
    pub correct_answer: SongEntity,
    /// Candidate answers.
    pub choices: Vec<ChoiceEntity>,
}

/// Full song record of the correct answer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SongEntity {
    /// Song identifier.
    pub music_id: u32,
    /// Song title.
    pub title: String,
    /// Composer credited for the song.
    pub composer: String,
    /// Path or URL of the excerpt audio file.
    pub audio_file: String,
    /// Optional hint text; may be blank.
    #[serde(default)]
    pub hint: Option<String>,
}

/// Candidate answer as listed by the service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChoiceEntity {
    /// Song identifier.
    pub music_id: u32,
    /// Title shown on the choice.
    pub title: String,
}

/// Body of `POST /api/submit_scores`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitScoresRequest {
    /// Final score of player 1.
    pub player1_score: u32,
    /// Final score of player 2.
    pub player2_score: u32,
}

impl From<Scores> for SubmitScoresRequest {
    fn from(value: Scores) -> Self {
        Self {
            player1_score: value.player1,
            player2_score: value.player2,
        }
    }
}

/// Outcome of an accepted score submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReceipt {
    /// Result view the renderer should navigate to.
    pub redirect: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quiz_response() {
        let payload = r#"{
            "correct_answer": {"music_id": 7, "title": "Gymnopédie No.1", "composer": "Satie",
                               "audio_file": "audio/gymnopedie.mp3", "hint": null},
            "choices": [{"music_id": 7, "title": "Gymnopédie No.1"}, {"music_id": 2, "title": "Clair de lune"},
                        {"music_id": 3, "title": "Boléro"}, {"music_id": 4, "title": "Canon"}]
        }"#;
        let entity: QuizEntity = serde_json::from_str(payload).unwrap();
        assert_eq!(entity.correct_answer.music_id, 7);
        assert_eq!(entity.correct_answer.hint, None);
        assert_eq!(entity.choices.len(), 4);
    }

    #[test]
    fn submit_body_uses_camel_case_keys() {
        let body = SubmitScoresRequest::from(Scores {
            player1: 40,
            player2: 10,
        });
        let json = serde_json::to_value(body).unwrap();
        assert_eq!(json, serde_json::json!({"player1Score": 40, "player2Score": 10}));
    }
}
