/// Side effects requested by round transitions.
pub mod effects;
/// Players, choices and validated round content.
pub mod round;
/// Per-player scores.
pub mod score;
mod sse;
/// The round state machine.
pub mod state_machine;
/// Named, cancellable timers.
pub mod timers;

use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::{preferences::PreferenceStore, quiz::QuizClient},
    error::ServiceError,
    services::{
        audio::{AudioSink, BroadcastAudioSink},
        round_service::{RoundController, RoundDeps},
    },
};

pub use self::sse::SseHub;

/// Application state shared by every handler.
pub type SharedState = Arc<AppState>;

const SSE_CAPACITY: usize = 64;

/// Central application state: configuration, collaborators and the running match.
pub struct AppState {
    config: AppConfig,
    sse: Arc<SseHub>,
    quiz: Arc<dyn QuizClient>,
    preferences: Arc<dyn PreferenceStore>,
    audio: Arc<dyn AudioSink>,
    current_match: RwLock<Option<RoundController>>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// Audio commands are published on the same SSE hub as snapshots.
    pub fn new(
        config: AppConfig,
        quiz: Arc<dyn QuizClient>,
        preferences: Arc<dyn PreferenceStore>,
    ) -> SharedState {
        let sse = Arc::new(SseHub::new(SSE_CAPACITY));
        let audio = Arc::new(BroadcastAudioSink::new(sse.clone()));
        Arc::new(Self {
            config,
            sse,
            quiz,
            preferences,
            audio,
            current_match: RwLock::new(None),
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Broadcast hub used for the round SSE stream.
    pub fn public_sse(&self) -> &SseHub {
        &self.sse
    }

    /// Preference store shared by every match.
    pub fn preferences(&self) -> &Arc<dyn PreferenceStore> {
        &self.preferences
    }

    /// Collaborators for a new match.
    pub fn round_deps(&self) -> RoundDeps {
        RoundDeps {
            rules: self.config.rules.clone(),
            cues: self.config.cues.clone(),
            quiz: self.quiz.clone(),
            preferences: self.preferences.clone(),
            audio: self.audio.clone(),
            hub: self.sse.clone(),
        }
    }

    /// Controller of the running match, if any.
    pub async fn current_match(&self) -> Option<RoundController> {
        self.current_match.read().await.clone()
    }

    /// Controller of the running match, failing when none was started.
    pub async fn require_match(&self) -> Result<RoundController, ServiceError> {
        self.current_match()
            .await
            .ok_or(ServiceError::NoActiveMatch)
    }

    /// Install `controller` as the running match, returning the one it replaces.
    pub async fn replace_match(&self, controller: RoundController) -> Option<RoundController> {
        self.current_match.write().await.replace(controller)
    }

    /// Stop the running match, if any, returning its id once it has shut down.
    pub async fn stop_match(&self) -> Option<Uuid> {
        let controller = self.current_match.write().await.take()?;
        controller.shutdown().await;
        Some(controller.match_id())
    }
}
