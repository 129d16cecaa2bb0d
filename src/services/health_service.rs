use crate::{dto::health::HealthResponse, state::SharedState};

/// Report liveness together with the match and renderer status.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let match_active = state.current_match().await.is_some();
    HealthResponse::ok(match_active, state.public_sse().subscriber_count())
}
