use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::dao::preferences::Preferences;

/// Volume and sound effect settings exchanged with clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesPayload {
    /// Excerpt volume, 0 to 100.
    #[validate(range(max = 100))]
    pub main_volume: u8,
    /// Whether sound effects play at all.
    pub se_enabled: bool,
    /// Sound effect volume, 0 to 100.
    #[validate(range(max = 100))]
    pub se_volume: u8,
}

impl From<Preferences> for PreferencesPayload {
    fn from(value: Preferences) -> Self {
        Self {
            main_volume: value.main_volume,
            se_enabled: value.se_enabled,
            se_volume: value.se_volume,
        }
    }
}

impl From<PreferencesPayload> for Preferences {
    fn from(value: PreferencesPayload) -> Self {
        Self {
            main_volume: value.main_volume,
            se_enabled: value.se_enabled,
            se_volume: value.se_volume,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_volumes_above_hundred() {
        let payload: PreferencesPayload =
            serde_json::from_str(r#"{"mainVolume": 101, "seEnabled": true, "seVolume": 40}"#)
                .unwrap();
        let err = payload.validate().unwrap_err();
        assert!(err.field_errors().contains_key("main_volume"));
    }
}
