//! Error types of the quiz service client.

use reqwest::StatusCode;
use thiserror::Error;

use crate::state::round::QuizValidationError;

/// Convenient result alias returning [`QuizClientError`] failures.
pub type QuizResult<T> = Result<T, QuizClientError>;

/// Failures that can occur while talking to the quiz service.
#[derive(Debug, Error)]
pub enum QuizClientError {
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build quiz service client")]
    ClientBuilder {
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },
    /// The request could not be sent.
    #[error("failed to send request to `{path}`")]
    RequestSend {
        /// Request path relative to the service base URL.
        path: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },
    /// The service answered with an unexpected status code.
    #[error("unexpected quiz service response status {status} for `{path}`")]
    RequestStatus {
        /// Request path relative to the service base URL.
        path: String,
        /// Status returned by the service.
        status: StatusCode,
    },
    /// Response payload could not be parsed into JSON.
    #[error("failed to decode quiz service response for `{path}`")]
    DecodeResponse {
        /// Request path relative to the service base URL.
        path: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },
    /// The payload parsed but breaks the round contract.
    #[error("invalid quiz payload: {0}")]
    InvalidPayload(#[from] QuizValidationError),
}
