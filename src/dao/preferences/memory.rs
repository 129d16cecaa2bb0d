use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::RwLock;

use super::{PreferenceResult, PreferenceStore, Preferences};

/// Volatile store, used when no preference file is configured and in tests.
#[derive(Clone, Default)]
pub struct InMemoryPreferenceStore {
    inner: Arc<RwLock<Preferences>>,
}

impl InMemoryPreferenceStore {
    /// Store seeded with `preferences`.
    pub fn new(preferences: Preferences) -> Self {
        Self {
            inner: Arc::new(RwLock::new(preferences.clamped())),
        }
    }
}

impl PreferenceStore for InMemoryPreferenceStore {
    fn load(&self) -> BoxFuture<'static, PreferenceResult<Preferences>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(*inner.read().await) })
    }

    fn save(&self, preferences: Preferences) -> BoxFuture<'static, PreferenceResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            *inner.write().await = preferences.clamped();
            Ok(())
        })
    }
}
