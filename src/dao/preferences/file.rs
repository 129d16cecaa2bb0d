use std::{io::ErrorKind, path::PathBuf, sync::Arc};

use futures::future::BoxFuture;
use tokio::{fs, sync::Mutex};
use tracing::{info, warn};

use super::{PreferenceError, PreferenceResult, PreferenceStore, Preferences};

/// Preferences persisted as a small JSON document on disk.
#[derive(Clone)]
pub struct JsonFilePreferenceStore {
    path: Arc<PathBuf>,
    write_lock: Arc<Mutex<()>>,
}

impl JsonFilePreferenceStore {
    /// Store backed by the file at `path`; the file is created on first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(path.into()),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    async fn read(&self) -> PreferenceResult<Preferences> {
        let path = self.path.as_ref();
        let contents = match fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "preferences file not found; using defaults");
                return Ok(Preferences::default());
            }
            Err(err) => {
                return Err(PreferenceError::Read {
                    path: path.clone(),
                    source: Box::new(err),
                });
            }
        };

        match serde_json::from_str::<Preferences>(&contents) {
            Ok(preferences) => Ok(preferences.clamped()),
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to parse preferences; falling back to defaults"
                );
                Ok(Preferences::default())
            }
        }
    }

    async fn write(&self, preferences: Preferences) -> PreferenceResult<()> {
        let path = self.path.as_ref();
        let write_error = |source: Box<dyn std::error::Error + Send + Sync>| {
            PreferenceError::Write {
                path: path.clone(),
                source,
            }
        };

        let payload = serde_json::to_vec_pretty(&preferences.clamped())
            .map_err(|err| write_error(Box::new(err)))?;

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|err| write_error(Box::new(err)))?;
        }
        fs::write(path, payload)
            .await
            .map_err(|err| write_error(Box::new(err)))
    }
}

impl PreferenceStore for JsonFilePreferenceStore {
    fn load(&self) -> BoxFuture<'static, PreferenceResult<Preferences>> {
        let store = self.clone();
        Box::pin(async move { store.read().await })
    }

    fn save(&self, preferences: Preferences) -> BoxFuture<'static, PreferenceResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.write(preferences).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("intro-quiz-prefs-{}", uuid::Uuid::new_v4().simple()))
            .join(name)
    }

    #[tokio::test]
    async fn missing_file_loads_defaults() {
        let store = JsonFilePreferenceStore::new(scratch_path("none.json"));
        assert_eq!(store.load().await.unwrap(), Preferences::default());
    }

    #[tokio::test]
    async fn saved_preferences_are_loaded_back() {
        let path = scratch_path("prefs.json");
        let store = JsonFilePreferenceStore::new(&path);
        let prefs = Preferences {
            main_volume: 80,
            se_enabled: false,
            se_volume: 10,
        };

        store.save(prefs).await.unwrap();
        assert_eq!(store.load().await.unwrap(), prefs);

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"mainVolume\": 80"));
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn malformed_file_falls_back_to_defaults() {
        let path = scratch_path("broken.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "not json").unwrap();

        let store = JsonFilePreferenceStore::new(&path);
        assert_eq!(store.load().await.unwrap(), Preferences::default());
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
