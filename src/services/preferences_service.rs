use tracing::info;

use crate::{
    dao::preferences::Preferences, dto::preferences::PreferencesPayload, error::ServiceError,
    state::SharedState,
};

/// Read the stored preferences.
pub async fn get_preferences(state: &SharedState) -> Result<PreferencesPayload, ServiceError> {
    let preferences = state.preferences().load().await?;
    Ok(preferences.into())
}

/// Persist `payload` and apply it to the running match, if any.
pub async fn update_preferences(
    state: &SharedState,
    payload: PreferencesPayload,
) -> Result<PreferencesPayload, ServiceError> {
    let preferences = Preferences::from(payload).clamped();
    state.preferences().save(preferences).await?;
    info!(
        main_volume = preferences.main_volume,
        se_enabled = preferences.se_enabled,
        se_volume = preferences.se_volume,
        "preferences updated"
    );

    if let Some(controller) = state.current_match().await {
        controller.update_preferences(preferences);
    }
    Ok(preferences.into())
}
