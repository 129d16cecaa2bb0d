//! Application-level configuration loading: round rules, collaborators and key bindings.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::state::effects::CueKind;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "INTRO_QUIZ_CONFIG_PATH";
const DEFAULT_QUIZ_BASE_URL: &str = "http://localhost:5000";
const DEFAULT_PREFERENCES_PATH: &str = "config/preferences.json";

/// Timing and scoring rules applied to every round of a match.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RoundRules {
    /// Seconds players have to buzz in, counted down once the excerpt starts.
    pub time_limit_secs: u32,
    /// Rounds per match before scores are submitted.
    pub max_rounds: u32,
    /// Points awarded for a correct answer.
    pub correct_points: i32,
    /// Points withdrawn for a wrong answer (floored at zero).
    pub wrong_penalty: i32,
    /// Delay between the question cue and the excerpt.
    pub cue_lead_ms: u64,
    /// How long the excerpt plays before it is stopped.
    pub excerpt_duration_ms: u64,
    /// How long the wrong-answer message stays before play resumes.
    pub wrong_answer_pause_ms: u64,
    /// Countdown tick period.
    pub countdown_interval_ms: u64,
}

impl RoundRules {
    /// Delay between the question cue and the excerpt.
    pub fn cue_lead(&self) -> Duration {
        Duration::from_millis(self.cue_lead_ms)
    }

    /// Fixed excerpt duration.
    pub fn excerpt_duration(&self) -> Duration {
        Duration::from_millis(self.excerpt_duration_ms)
    }

    /// Pause after a wrong answer.
    pub fn wrong_answer_pause(&self) -> Duration {
        Duration::from_millis(self.wrong_answer_pause_ms)
    }

    /// Countdown tick period.
    pub fn countdown_interval(&self) -> Duration {
        Duration::from_millis(self.countdown_interval_ms)
    }

    /// Replace out-of-range values with their defaults, logging each correction.
    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if self.time_limit_secs == 0 {
            warn!("time_limit_secs must be positive; using default");
            self.time_limit_secs = defaults.time_limit_secs;
        }
        if self.max_rounds == 0 {
            warn!("max_rounds must be positive; using default");
            self.max_rounds = defaults.max_rounds;
        }
        if self.correct_points < 0 || self.wrong_penalty < 0 {
            warn!("point values must not be negative; using defaults");
            self.correct_points = defaults.correct_points;
            self.wrong_penalty = defaults.wrong_penalty;
        }
        if self.countdown_interval_ms == 0 {
            warn!("countdown_interval_ms must be positive; using default");
            self.countdown_interval_ms = defaults.countdown_interval_ms;
        }
        self
    }
}

impl Default for RoundRules {
    fn default() -> Self {
        Self {
            time_limit_secs: 30,
            max_rounds: 10,
            correct_points: 20,
            wrong_penalty: 10,
            cue_lead_ms: 1_500,
            excerpt_duration_ms: 5_000,
            wrong_answer_pause_ms: 2_000,
            countdown_interval_ms: 1_000,
        }
    }
}

/// URLs of the short sound effects played by the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CueAssets {
    /// Round start cue.
    pub question: String,
    /// Buzz-in cue.
    pub answer: String,
    /// Correct answer cue.
    pub correct: String,
    /// Incorrect answer and timeout cue.
    pub incorrect: String,
}

impl CueAssets {
    /// Asset URL for a cue kind.
    pub fn url(&self, kind: CueKind) -> &str {
        match kind {
            CueKind::Question => &self.question,
            CueKind::Answer => &self.answer,
            CueKind::Correct => &self.correct,
            CueKind::Incorrect => &self.incorrect,
        }
    }
}

impl Default for CueAssets {
    fn default() -> Self {
        Self {
            question: "/static/se/question.mp3".into(),
            answer: "/static/se/answer.mp3".into(),
            correct: "/static/se/correct.mp3".into(),
            incorrect: "/static/se/incorrect.mp3".into(),
        }
    }
}

/// Key names (as reported by the browser `KeyboardEvent.key`) bound to round inputs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    /// Starts a loaded round.
    pub start_round: String,
    /// Moves on after a result.
    pub advance: String,
    /// Player 1 buzzer.
    pub player1_buzz: String,
    /// Player 2 buzzer.
    pub player2_buzz: String,
    /// Reveals the hint.
    pub hint: String,
    /// Leaves the match.
    pub quit: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            start_round: " ".into(),
            advance: "Enter".into(),
            player1_buzz: "a".into(),
            player2_buzz: "l".into(),
            hint: "h".into(),
            quit: "Escape".into(),
        }
    }
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Rules applied to every match.
    pub rules: RoundRules,
    /// Base URL of the quiz content service.
    pub quiz_base_url: String,
    /// JSON file holding the persisted user preferences.
    pub preferences_path: PathBuf,
    /// Sound effect asset URLs.
    pub cues: CueAssets,
    /// Keyboard shortcuts.
    pub keys: KeyBindings,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to baked-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        max_rounds = app_config.rules.max_rounds,
                        time_limit_secs = app_config.rules.time_limit_secs,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a JSON document, filling omitted sections with defaults.
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    rules: RoundRules,
    quiz_base_url: Option<String>,
    preferences_path: Option<PathBuf>,
    cues: CueAssets,
    keys: KeyBindings,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            rules: value.rules.sanitized(),
            quiz_base_url: value
                .quiz_base_url
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_QUIZ_BASE_URL.into()),
            preferences_path: value
                .preferences_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PREFERENCES_PATH)),
            cues: value.cues,
            keys: value.keys,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = AppConfig::from_json("{}").unwrap();
        assert_eq!(config.rules, RoundRules::default());
        assert_eq!(config.quiz_base_url, DEFAULT_QUIZ_BASE_URL);
        assert_eq!(config.keys.quit, "Escape");
    }

    #[test]
    fn partial_rules_keep_remaining_defaults() {
        let config =
            AppConfig::from_json(r#"{"rules": {"max_rounds": 3}, "quiz_base_url": "http://quiz"}"#)
                .unwrap();
        assert_eq!(config.rules.max_rounds, 3);
        assert_eq!(config.rules.time_limit_secs, 30);
        assert_eq!(config.quiz_base_url, "http://quiz");
    }

    #[test]
    fn invalid_rules_are_replaced() {
        let config = AppConfig::from_json(
            r#"{"rules": {"max_rounds": 0, "time_limit_secs": 0, "wrong_penalty": -5}}"#,
        )
        .unwrap();
        assert_eq!(config.rules.max_rounds, 10);
        assert_eq!(config.rules.time_limit_secs, 30);
        assert_eq!(config.rules.wrong_penalty, 10);
    }

    #[test]
    fn cue_urls_follow_kind() {
        let cues = CueAssets::default();
        assert!(cues.url(CueKind::Correct).ends_with("correct.mp3"));
        assert!(cues.url(CueKind::Incorrect).ends_with("incorrect.mp3"));
    }
}
