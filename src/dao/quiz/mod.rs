pub mod error;
/// HTTP implementation of [`QuizClient`].
pub mod http;
pub mod models;

use futures::future::BoxFuture;

use self::{
    error::QuizResult,
    models::SubmitReceipt,
};
use crate::state::{round::Quiz, score::Scores};

pub use self::http::HttpQuizClient;

/// Abstraction over the service that hands out quiz rounds and records final scores.
pub trait QuizClient: Send + Sync {
    /// Fetch and validate the content of a round, never picking a song from `exclude`.
    fn fetch_quiz(&self, exclude: Vec<u32>) -> BoxFuture<'static, QuizResult<Quiz>>;
    /// Record the final scores of a match.
    fn submit_scores(&self, scores: Scores) -> BoxFuture<'static, QuizResult<SubmitReceipt>>;
}
