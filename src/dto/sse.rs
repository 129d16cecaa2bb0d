use serde::Serialize;
use utoipa::ToSchema;

use crate::state::effects::{CueKind, MatchExit};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    /// SSE event name; `None` sends an unnamed message.
    pub event: Option<String>,
    /// Serialized payload.
    pub data: String,
}

impl ServerEvent {
    /// Event carrying a plain text payload.
    pub fn new(event: Option<String>, data: String) -> Self {
        Self { event, data }
    }

    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Whether a match is currently running.
    pub match_active: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Asks the renderer to play a sound effect.
pub struct AudioCueEvent {
    /// Which effect to play.
    pub cue: CueKind,
    /// URL of the effect asset.
    pub url: String,
    /// Effect volume, 0 to 100.
    pub volume: u8,
}

#[derive(Debug, Serialize, ToSchema)]
/// Asks the renderer to play the excerpt from its beginning.
pub struct AudioExcerptEvent {
    /// URL of the excerpt.
    pub url: String,
    /// Excerpt volume, 0 to 100.
    pub volume: u8,
}

#[derive(Debug, Serialize, ToSchema)]
/// Asks the renderer to pause the excerpt and rewind it.
pub struct AudioStopEvent {
    /// Whether playback returns to the start.
    pub rewind: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
/// Tells the renderer to leave the match view.
pub struct NavigateEvent(pub MatchExit);
