/// Audio playback commands and the cue controller.
pub mod audio;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Key binding resolution.
pub mod input;
/// Reading and updating user preferences.
pub mod preferences_service;
/// Match lifecycle and the round controller task.
pub mod round_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events streaming service.
pub mod sse_service;
