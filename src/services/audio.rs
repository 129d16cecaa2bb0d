//! Audio playback commands for the renderer.
//!
//! The backend never decodes audio itself: [`AudioCueController`] turns round effects into
//! playback commands and hands them to an [`AudioSink`]. The production sink forwards them
//! to the browser over SSE.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    config::CueAssets,
    dao::preferences::Preferences,
    dto::sse::{AudioCueEvent, AudioExcerptEvent, AudioStopEvent, ServerEvent},
    state::{SseHub, effects::CueKind},
};

pub(crate) const EVENT_AUDIO_CUE: &str = "audio.cue";
pub(crate) const EVENT_AUDIO_EXCERPT: &str = "audio.excerpt";
pub(crate) const EVENT_AUDIO_STOP: &str = "audio.stop";

/// Reasons a playback command could not be delivered.
#[derive(Debug, Error)]
pub enum AudioError {
    /// No renderer is connected, so nothing can play.
    #[error("no renderer is listening")]
    NoListener,
    /// The command could not be encoded.
    #[error("failed to encode audio command")]
    Encode(#[from] serde_json::Error),
}

/// Destination of playback commands.
pub trait AudioSink: Send + Sync {
    /// Play a short effect from `url` at `volume` (0 to 100).
    fn play_effect(&self, kind: CueKind, url: &str, volume: u8) -> Result<(), AudioError>;
    /// Play the excerpt at `url` from its beginning.
    fn play_excerpt(&self, url: &str, volume: u8) -> Result<(), AudioError>;
    /// Pause the excerpt and rewind it.
    fn stop_excerpt(&self) -> Result<(), AudioError>;
}

/// Sink publishing playback commands on the round SSE stream.
#[derive(Clone)]
pub struct BroadcastAudioSink {
    hub: Arc<SseHub>,
}

impl BroadcastAudioSink {
    /// Sink writing to `hub`.
    pub fn new(hub: Arc<SseHub>) -> Self {
        Self { hub }
    }

    fn send(&self, name: &str, payload: &impl serde::Serialize) -> Result<(), AudioError> {
        let event = ServerEvent::json(Some(name.to_string()), payload)?;
        match self.hub.broadcast(event) {
            0 => Err(AudioError::NoListener),
            _ => Ok(()),
        }
    }
}

impl AudioSink for BroadcastAudioSink {
    fn play_effect(&self, kind: CueKind, url: &str, volume: u8) -> Result<(), AudioError> {
        self.send(
            EVENT_AUDIO_CUE,
            &AudioCueEvent {
                cue: kind,
                url: url.to_string(),
                volume,
            },
        )
    }

    fn play_excerpt(&self, url: &str, volume: u8) -> Result<(), AudioError> {
        self.send(
            EVENT_AUDIO_EXCERPT,
            &AudioExcerptEvent {
                url: url.to_string(),
                volume,
            },
        )
    }

    fn stop_excerpt(&self) -> Result<(), AudioError> {
        self.send(EVENT_AUDIO_STOP, &AudioStopEvent { rewind: true })
    }
}

/// Plays round cues and the excerpt according to the user preferences.
///
/// Failures are logged and swallowed: a missing renderer must never stall a round.
pub struct AudioCueController {
    sink: Arc<dyn AudioSink>,
    cues: CueAssets,
    preferences: Preferences,
}

impl AudioCueController {
    /// Controller writing to `sink` with default preferences.
    pub fn new(sink: Arc<dyn AudioSink>, cues: CueAssets) -> Self {
        Self {
            sink,
            cues,
            preferences: Preferences::default(),
        }
    }

    /// Currently applied preferences.
    pub fn preferences(&self) -> Preferences {
        self.preferences
    }

    /// Replace volumes and the effect toggle.
    pub fn apply_preferences(&mut self, preferences: Preferences) {
        self.preferences = preferences.clamped();
        debug!(preferences = ?self.preferences, "audio preferences applied");
    }

    /// Play a sound effect, unless effects are disabled.
    pub fn play_cue(&self, kind: CueKind) {
        if !self.preferences.se_enabled {
            debug!(?kind, "sound effects disabled; cue skipped");
            return;
        }
        let url = self.cues.url(kind);
        if let Err(err) = self
            .sink
            .play_effect(kind, url, self.preferences.se_volume)
        {
            warn!(?kind, error = %err, "failed to play cue");
        }
    }

    /// Start the excerpt from its beginning at the main volume.
    pub fn play_excerpt(&self, excerpt_ref: &str) {
        if let Err(err) = self
            .sink
            .play_excerpt(excerpt_ref, self.preferences.main_volume)
        {
            warn!(excerpt = excerpt_ref, error = %err, "failed to play excerpt");
        }
    }

    /// Pause and rewind the excerpt.
    pub fn stop_excerpt(&self) {
        if let Err(err) = self.sink.stop_excerpt() {
            warn!(error = %err, "failed to stop excerpt");
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Command recorded by [`RecordingSink`].
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) enum Played {
        Effect(CueKind, u8),
        Excerpt(String, u8),
        Stop,
    }

    /// Sink remembering every command, optionally rejecting them all.
    #[derive(Default)]
    pub(crate) struct RecordingSink {
        pub(crate) played: Mutex<Vec<Played>>,
        pub(crate) reject: bool,
    }

    impl RecordingSink {
        pub(crate) fn take(&self) -> Vec<Played> {
            std::mem::take(&mut *self.played.lock().unwrap())
        }

        fn record(&self, played: Played) -> Result<(), AudioError> {
            self.played.lock().unwrap().push(played);
            if self.reject {
                Err(AudioError::NoListener)
            } else {
                Ok(())
            }
        }
    }

    impl AudioSink for RecordingSink {
        fn play_effect(&self, kind: CueKind, _url: &str, volume: u8) -> Result<(), AudioError> {
            self.record(Played::Effect(kind, volume))
        }

        fn play_excerpt(&self, url: &str, volume: u8) -> Result<(), AudioError> {
            self.record(Played::Excerpt(url.to_string(), volume))
        }

        fn stop_excerpt(&self) -> Result<(), AudioError> {
            self.record(Played::Stop)
        }
    }

    #[test]
    fn effects_and_excerpt_use_independent_volumes() {
        let sink = Arc::new(RecordingSink::default());
        let mut audio = AudioCueController::new(sink.clone(), CueAssets::default());
        audio.apply_preferences(Preferences {
            main_volume: 80,
            se_enabled: true,
            se_volume: 30,
        });

        audio.play_cue(CueKind::Question);
        audio.play_excerpt("/audio/1.mp3");
        audio.stop_excerpt();

        assert_eq!(
            sink.take(),
            vec![
                Played::Effect(CueKind::Question, 30),
                Played::Excerpt("/audio/1.mp3".into(), 80),
                Played::Stop,
            ]
        );
    }

    #[test]
    fn disabled_effects_do_not_reach_the_sink() {
        let sink = Arc::new(RecordingSink::default());
        let mut audio = AudioCueController::new(sink.clone(), CueAssets::default());
        audio.apply_preferences(Preferences {
            se_enabled: false,
            ..Preferences::default()
        });

        audio.play_cue(CueKind::Correct);
        audio.play_excerpt("/audio/2.mp3");
        assert_eq!(sink.take(), vec![Played::Excerpt("/audio/2.mp3".into(), 50)]);
    }

    #[test]
    fn sink_failures_are_swallowed() {
        let sink = Arc::new(RecordingSink {
            reject: true,
            ..RecordingSink::default()
        });
        let audio = AudioCueController::new(sink.clone(), CueAssets::default());
        audio.play_cue(CueKind::Incorrect);
        audio.stop_excerpt();
        assert_eq!(sink.take().len(), 2);
    }

    #[tokio::test]
    async fn broadcast_sink_requires_a_listener() {
        let hub = Arc::new(SseHub::new(8));
        let sink = BroadcastAudioSink::new(hub.clone());
        assert!(matches!(sink.stop_excerpt(), Err(AudioError::NoListener)));

        let mut receiver = hub.subscribe();
        sink.play_effect(CueKind::Answer, "/static/se/answer.mp3", 40)
            .unwrap();
        let event = receiver.recv().await.unwrap();
        assert_eq!(event.event.as_deref(), Some(EVENT_AUDIO_CUE));
        let payload: serde_json::Value = serde_json::from_str(&event.data).unwrap();
        assert_eq!(payload["cue"], "answer");
        assert_eq!(payload["volume"], 40);
    }
}
