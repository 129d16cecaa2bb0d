use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use validator::Validate;

use crate::{
    dto::round::{AnswerRequest, BuzzRequest, EventResponse, KeyRequest, RoundSnapshot},
    error::AppError,
    services::round_service,
    state::{SharedState, state_machine::RoundEvent},
};

/// Match lifecycle and round input endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/match", post(start_match))
        .route("/api/round", get(get_round))
        .route("/api/round/start", post(start_round))
        .route("/api/round/buzz", post(buzz))
        .route("/api/round/answer", post(answer))
        .route("/api/round/hint", post(hint))
        .route("/api/round/advance", post(advance))
        .route("/api/round/quit", post(quit))
        .route("/api/round/key", post(press_key))
}

#[utoipa::path(
    post,
    path = "/api/match",
    tag = "round",
    responses((status = 201, description = "Match started; the first round is loading", body = RoundSnapshot))
)]
/// Start a new match, replacing the running one.
pub async fn start_match(
    State(state): State<SharedState>,
) -> (StatusCode, Json<RoundSnapshot>) {
    let snapshot = round_service::start_match(&state).await;
    (StatusCode::CREATED, Json(snapshot))
}

#[utoipa::path(
    get,
    path = "/api/round",
    tag = "round",
    responses(
        (status = 200, description = "Current round snapshot", body = RoundSnapshot),
        (status = 404, description = "No match is running")
    )
)]
/// Return the snapshot of the running match.
pub async fn get_round(State(state): State<SharedState>) -> Result<Json<RoundSnapshot>, AppError> {
    let snapshot = round_service::current_snapshot(&state).await?;
    Ok(Json(snapshot))
}

#[utoipa::path(
    post,
    path = "/api/round/start",
    tag = "round",
    responses(
        (status = 200, description = "Event handled", body = EventResponse),
        (status = 404, description = "No match is running")
    )
)]
/// Start the loaded round.
pub async fn start_round(
    State(state): State<SharedState>,
) -> Result<Json<EventResponse>, AppError> {
    send(&state, RoundEvent::StartRound).await
}

#[utoipa::path(
    post,
    path = "/api/round/buzz",
    tag = "round",
    request_body = BuzzRequest,
    responses(
        (status = 200, description = "Event handled", body = EventResponse),
        (status = 400, description = "Unknown player"),
        (status = 404, description = "No match is running")
    )
)]
/// Buzz in for a player.
pub async fn buzz(
    State(state): State<SharedState>,
    Json(payload): Json<BuzzRequest>,
) -> Result<Json<EventResponse>, AppError> {
    payload.validate()?;
    let outcome = round_service::buzz(&state, payload).await?;
    Ok(Json(outcome.into()))
}

#[utoipa::path(
    post,
    path = "/api/round/answer",
    tag = "round",
    request_body = AnswerRequest,
    responses(
        (status = 200, description = "Event handled", body = EventResponse),
        (status = 400, description = "Malformed selection"),
        (status = 404, description = "No match is running")
    )
)]
/// Select an answer by song id or by position.
pub async fn answer(
    State(state): State<SharedState>,
    Json(payload): Json<AnswerRequest>,
) -> Result<Json<EventResponse>, AppError> {
    payload.validate()?;
    let outcome = round_service::answer(&state, payload).await?;
    Ok(Json(outcome.into()))
}

#[utoipa::path(
    post,
    path = "/api/round/hint",
    tag = "round",
    responses(
        (status = 200, description = "Event handled", body = EventResponse),
        (status = 404, description = "No match is running")
    )
)]
/// Reveal the hint of the current round.
pub async fn hint(State(state): State<SharedState>) -> Result<Json<EventResponse>, AppError> {
    send(&state, RoundEvent::RequestHint).await
}

#[utoipa::path(
    post,
    path = "/api/round/advance",
    tag = "round",
    responses(
        (status = 200, description = "Event handled", body = EventResponse),
        (status = 404, description = "No match is running")
    )
)]
/// Move on to the next round, or end the match after the last one.
pub async fn advance(State(state): State<SharedState>) -> Result<Json<EventResponse>, AppError> {
    send(&state, RoundEvent::Advance).await
}

#[utoipa::path(
    post,
    path = "/api/round/quit",
    tag = "round",
    responses(
        (status = 200, description = "Event handled", body = EventResponse),
        (status = 404, description = "No match is running")
    )
)]
/// Leave the match.
pub async fn quit(State(state): State<SharedState>) -> Result<Json<EventResponse>, AppError> {
    send(&state, RoundEvent::Quit).await
}

#[utoipa::path(
    post,
    path = "/api/round/key",
    tag = "round",
    request_body = KeyRequest,
    responses(
        (status = 200, description = "Key handled; unbound keys are not accepted", body = EventResponse),
        (status = 404, description = "No match is running")
    )
)]
/// Forward a key press through the configured key bindings.
pub async fn press_key(
    State(state): State<SharedState>,
    Json(payload): Json<KeyRequest>,
) -> Result<Json<EventResponse>, AppError> {
    payload.validate()?;
    let outcome = round_service::press_key(&state, &payload.key).await?;
    Ok(Json(outcome.into()))
}

async fn send(state: &SharedState, event: RoundEvent) -> Result<Json<EventResponse>, AppError> {
    let outcome = round_service::send_event(state, event).await?;
    Ok(Json(outcome.into()))
}
