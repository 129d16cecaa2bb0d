/// Persisted user preferences (volumes, sound effect toggle).
pub mod preferences;
/// Client for the external quiz content service.
pub mod quiz;
