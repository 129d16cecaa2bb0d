use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use reqwest::{Client, StatusCode, header::LOCATION, redirect::Policy};
use serde::Serialize;
use tracing::debug;

use crate::{
    dao::quiz::{
        QuizClient,
        error::{QuizClientError, QuizResult},
        models::{QuizEntity, QuizRequest, SubmitReceipt, SubmitScoresRequest},
    },
    state::{round::Quiz, score::Scores},
};

const QUIZ_PATH: &str = "api/quiz";
const SUBMIT_PATH: &str = "api/submit_scores";
/// Result view used when the service accepts scores without redirecting.
const DEFAULT_RESULT_VIEW: &str = "/result";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// [`QuizClient`] talking JSON over HTTP.
#[derive(Clone)]
pub struct HttpQuizClient {
    client: Client,
    base_url: Arc<str>,
}

impl HttpQuizClient {
    /// Build a client for the service rooted at `base_url`.
    pub fn new(base_url: impl AsRef<str>) -> QuizResult<Self> {
        // Redirects are surfaced to the renderer instead of being followed here.
        let client = Client::builder()
            .redirect(Policy::none())
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| QuizClientError::ClientBuilder { source })?;

        Ok(Self {
            client,
            base_url: Arc::from(base_url.as_ref().trim_end_matches('/')),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post<T>(&self, path: &str, body: &T) -> QuizResult<reqwest::Response>
    where
        T: ?Sized + Serialize,
    {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|source| QuizClientError::RequestSend {
                path: path.to_string(),
                source,
            })
    }

    async fn fetch(&self, exclude: Vec<u32>) -> QuizResult<Quiz> {
        let response = self.post(QUIZ_PATH, &QuizRequest { exclude }).await?;

        if !response.status().is_success() {
            return Err(QuizClientError::RequestStatus {
                path: QUIZ_PATH.to_string(),
                status: response.status(),
            });
        }

        let entity = response.json::<QuizEntity>().await.map_err(|source| {
            QuizClientError::DecodeResponse {
                path: QUIZ_PATH.to_string(),
                source,
            }
        })?;

        Ok(Quiz::try_from(entity)?)
    }

    async fn submit(&self, scores: Scores) -> QuizResult<SubmitReceipt> {
        let response = self
            .post(SUBMIT_PATH, &SubmitScoresRequest::from(scores))
            .await?;

        let status = response.status();
        if !(status.is_success() || status.is_redirection()) {
            return Err(QuizClientError::RequestStatus {
                path: SUBMIT_PATH.to_string(),
                status,
            });
        }

        Ok(SubmitReceipt {
            redirect: redirect_target(status, response.headers().get(LOCATION)),
        })
    }
}

impl QuizClient for HttpQuizClient {
    fn fetch_quiz(&self, exclude: Vec<u32>) -> BoxFuture<'static, QuizResult<Quiz>> {
        let client = self.clone();
        Box::pin(async move { client.fetch(exclude).await })
    }

    fn submit_scores(&self, scores: Scores) -> BoxFuture<'static, QuizResult<SubmitReceipt>> {
        let client = self.clone();
        Box::pin(async move { client.submit(scores).await })
    }
}

fn redirect_target(status: StatusCode, location: Option<&reqwest::header::HeaderValue>) -> String {
    match location.and_then(|value| value.to_str().ok()) {
        Some(target) if !target.trim().is_empty() => target.to_string(),
        _ => {
            debug!(%status, "score submission returned no redirect; using default result view");
            DEFAULT_RESULT_VIEW.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use reqwest::header::HeaderValue;

    use super::*;

    #[test]
    fn base_url_is_normalised() {
        let client = HttpQuizClient::new("http://quiz.local:5000/").unwrap();
        assert_eq!(client.url(QUIZ_PATH), "http://quiz.local:5000/api/quiz");
    }

    #[test]
    fn redirect_uses_location_header() {
        let location = HeaderValue::from_static("/result?p1=40&p2=10");
        assert_eq!(
            redirect_target(StatusCode::SEE_OTHER, Some(&location)),
            "/result?p1=40&p2=10"
        );
        assert_eq!(redirect_target(StatusCode::OK, None), DEFAULT_RESULT_VIEW);
    }

    #[tokio::test]
    async fn unreachable_service_is_a_send_error() {
        // Port 9 (discard) is not expected to accept HTTP connections.
        let client = HttpQuizClient::new("http://127.0.0.1:9").unwrap();
        let err = client.fetch_quiz(vec![1, 2]).await.unwrap_err();
        assert!(matches!(err, QuizClientError::RequestSend { .. }));
    }
}
