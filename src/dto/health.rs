use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status, always "ok" while the server answers.
    pub status: String,
    /// Whether a match is currently running.
    pub match_active: bool,
    /// Number of renderers connected to the round stream.
    pub renderers: usize,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(match_active: bool, renderers: usize) -> Self {
        Self {
            status: "ok".to_string(),
            match_active,
            renderers,
        }
    }
}
