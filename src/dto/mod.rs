//! Wire types exchanged over REST and SSE.

/// Health check payload.
pub mod health;
/// Phase names shown to renderers.
pub mod phase;
/// Preference payloads.
pub mod preferences;
/// Round snapshots and input requests.
pub mod round;
/// SSE payloads.
pub mod sse;
