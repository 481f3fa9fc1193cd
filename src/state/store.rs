//! State store trait definition.

use async_trait::async_trait;

use crate::error::Result;
use super::types::ProviderState;

/// Trait for state storage backends.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Loads the recorded state.
    ///
    /// Returns `None` if no state exists yet.
    async fn load(&self) -> Result<Option<ProviderState>>;

    /// Saves the recorded state.
    async fn save(&self, state: &ProviderState) -> Result<()>;

    /// Deletes the recorded state.
    async fn delete(&self) -> Result<()>;

    /// Checks if state exists.
    async fn exists(&self) -> Result<bool>;

    /// Gets the backend type name.
    fn backend_type(&self) -> &'static str;

    /// Loads the recorded state, or an empty one when none exists.
    async fn load_or_default(&self) -> Result<ProviderState> {
        let state = self.load().await?.unwrap_or_default();
        state.check_version()?;
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore(Mutex<Option<ProviderState>>);

    #[async_trait]
    impl StateStore for MemoryStore {
        async fn load(&self) -> Result<Option<ProviderState>> {
            Ok(self.0.lock().unwrap().clone())
        }

        async fn save(&self, state: &ProviderState) -> Result<()> {
            *self.0.lock().unwrap() = Some(state.clone());
            Ok(())
        }

        async fn delete(&self) -> Result<()> {
            *self.0.lock().unwrap() = None;
            Ok(())
        }

        async fn exists(&self) -> Result<bool> {
            Ok(self.0.lock().unwrap().is_some())
        }

        fn backend_type(&self) -> &'static str {
            "memory"
        }
    }

    #[test]
    fn test_load_or_default_starts_empty() {
        let store = MemoryStore::default();
        let state = tokio_test::block_on(store.load_or_default()).unwrap();
        assert!(state.resources.is_empty());
    }

    #[test]
    fn test_load_or_default_rejects_other_versions() {
        let store = MemoryStore::default();
        let mut state = ProviderState::new();
        state.version = String::from("0");
        tokio_test::block_on(store.save(&state)).unwrap();

        let err = tokio_test::block_on(store.load_or_default()).unwrap_err();
        assert!(err.to_string().starts_with("State error:"));
    }
}
