use std::convert::Infallible;

use axum::{Router, extract::State, response::sse::Sse, routing::get};
use futures::Stream;
use tracing::info;

use crate::{
    services::{sse_events, sse_service},
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/sse/round",
    tag = "sse",
    responses((status = 200, description = "Round snapshots and audio commands", content_type = "text/event-stream", body = String))
)]
/// Stream round snapshots, audio commands and navigation requests to renderers.
pub async fn round_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let receiver = sse_service::subscribe_public(&state);
    info!("New round SSE connection");

    let current = state.current_match().await;
    sse_events::broadcast_handshake(state.public_sse(), current.is_some());
    if let Some(controller) = current {
        sse_events::broadcast_snapshot(state.public_sse(), &controller.snapshot());
    }
    sse_service::to_sse_stream(receiver)
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sse/round", get(round_stream))
}
