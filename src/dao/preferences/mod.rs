//! Persisted user preferences and the stores that keep them.

mod file;
mod memory;

use std::{error::Error, path::PathBuf};

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use self::{file::JsonFilePreferenceStore, memory::InMemoryPreferenceStore};

/// Upper bound of both volume sliders.
pub const MAX_VOLUME: u8 = 100;
const DEFAULT_VOLUME: u8 = 50;

/// Result alias for preference store operations.
pub type PreferenceResult<T> = Result<T, PreferenceError>;

/// Error raised by preference stores regardless of the backing medium.
#[derive(Debug, Error)]
pub enum PreferenceError {
    /// Reading the persisted preferences failed.
    #[error("failed to read preferences from `{path}`")]
    Read {
        /// File backing the store.
        path: PathBuf,
        /// Underlying I/O or serialization error.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// Writing the preferences failed.
    #[error("failed to write preferences to `{path}`")]
    Write {
        /// File backing the store.
        path: PathBuf,
        /// Underlying I/O or serialization error.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

/// Volume and sound effect settings, stored under the `mainVolume`, `seEnabled` and
/// `seVolume` keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    /// Excerpt volume, 0 to 100.
    pub main_volume: u8,
    /// Whether sound effects play at all.
    pub se_enabled: bool,
    /// Sound effect volume, 0 to 100.
    pub se_volume: u8,
}

impl Preferences {
    /// Clamp both volumes into `0..=MAX_VOLUME`.
    pub fn clamped(self) -> Self {
        Self {
            main_volume: self.main_volume.min(MAX_VOLUME),
            se_volume: self.se_volume.min(MAX_VOLUME),
            ..self
        }
    }
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            main_volume: DEFAULT_VOLUME,
            se_enabled: true,
            se_volume: DEFAULT_VOLUME,
        }
    }
}

/// Key-value store holding the user preferences.
pub trait PreferenceStore: Send + Sync {
    /// Load the stored preferences, defaulting every missing key.
    fn load(&self) -> BoxFuture<'static, PreferenceResult<Preferences>>;
    /// Persist `preferences`, replacing previous values.
    fn save(&self, preferences: Preferences) -> BoxFuture<'static, PreferenceResult<()>>;
}
