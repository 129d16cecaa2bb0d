use axum::{Json, Router, extract::State, routing::get};
use validator::Validate;

use crate::{
    dto::preferences::PreferencesPayload, error::AppError, services::preferences_service,
    state::SharedState,
};

/// Preference endpoints.
pub fn router() -> Router<SharedState> {
    Router::new().route(
        "/api/preferences",
        get(get_preferences).put(update_preferences),
    )
}

#[utoipa::path(
    get,
    path = "/api/preferences",
    tag = "preferences",
    responses((status = 200, description = "Stored preferences", body = PreferencesPayload))
)]
/// Return the stored volume and sound effect settings.
pub async fn get_preferences(
    State(state): State<SharedState>,
) -> Result<Json<PreferencesPayload>, AppError> {
    let payload = preferences_service::get_preferences(&state).await?;
    Ok(Json(payload))
}

#[utoipa::path(
    put,
    path = "/api/preferences",
    tag = "preferences",
    request_body = PreferencesPayload,
    responses(
        (status = 200, description = "Preferences saved", body = PreferencesPayload),
        (status = 400, description = "Volume out of range")
    )
)]
/// Save volume and sound effect settings, applying them to the running match.
pub async fn update_preferences(
    State(state): State<SharedState>,
    Json(payload): Json<PreferencesPayload>,
) -> Result<Json<PreferencesPayload>, AppError> {
    payload.validate()?;
    let saved = preferences_service::update_preferences(&state, payload).await?;
    Ok(Json(saved))
}
