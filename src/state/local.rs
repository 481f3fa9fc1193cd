//! Local file-based state storage backend.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{ProviderError, Result, StateError};

use super::store::StateStore;
use super::types::ProviderState;

/// Default state directory name.
pub const STATE_DIR: &str = ".gocd-provider";

/// State file name.
const STATE_FILE: &str = "state.json";

/// Local file-based state store.
#[derive(Debug)]
pub struct LocalStateStore {
    /// Base directory for state files.
    base_dir: PathBuf,
    /// Path to the state file.
    state_path: PathBuf,
}

impl LocalStateStore {
    /// Creates a store under the current directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the current directory cannot be determined.
    pub fn new() -> Result<Self> {
        let base_dir = std::env::current_dir()
            .map_err(|e| ProviderError::internal(format!("Cannot determine current directory: {e}")))?
            .join(STATE_DIR);

        Ok(Self::with_base_dir(base_dir))
    }

    /// Creates a store next to the given manifest file.
    #[must_use]
    pub fn for_manifest(manifest_path: &Path) -> Self {
        let dir = manifest_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

        Self::with_base_dir(dir.join(STATE_DIR))
    }

    /// Creates a store with a custom base directory.
    #[must_use]
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        let state_path = base_dir.join(STATE_FILE);

        Self {
            base_dir,
            state_path,
        }
    }

    /// Path of the state file.
    #[must_use]
    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    async fn ensure_dir(&self) -> Result<()> {
        if !self.base_dir.exists() {
            debug!("Creating state directory: {}", self.base_dir.display());
            fs::create_dir_all(&self.base_dir)
                .await
                .map_err(|e| StateError::write(format!("Failed to create state directory: {e}")))?;
        }
        Ok(())
    }
}

#[async_trait]
impl StateStore for LocalStateStore {
    async fn load(&self) -> Result<Option<ProviderState>> {
        if !self.state_path.exists() {
            debug!("State file does not exist: {}", self.state_path.display());
            return Ok(None);
        }

        info!("Loading state from: {}", self.state_path.display());

        let content = fs::read_to_string(&self.state_path).await.map_err(|e| {
            ProviderError::State(StateError::Corrupted {
                message: format!("Failed to read state file: {e}"),
            })
        })?;

        let state: ProviderState = serde_json::from_str(&content).map_err(|e| {
            ProviderError::State(StateError::Corrupted {
                message: format!("Failed to parse state file: {e}"),
            })
        })?;

        Ok(Some(state))
    }

    async fn save(&self, state: &ProviderState) -> Result<()> {
        self.ensure_dir().await?;

        debug!("Saving state to: {}", self.state_path.display());

        let content = serde_json::to_string_pretty(state)
            .map_err(|e| StateError::serialization(format!("Failed to serialize state: {e}")))?;

        // Temp file, then rename over the old state.
        let temp_path = self.state_path.with_extension("tmp");

        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| StateError::write(format!("Failed to create temp state file: {e}")))?;

        file.write_all(content.as_bytes())
            .await
            .map_err(|e| StateError::write(format!("Failed to write state file: {e}")))?;

        file.sync_all()
            .await
            .map_err(|e| StateError::write(format!("Failed to sync state file: {e}")))?;

        fs::rename(&temp_path, &self.state_path)
            .await
            .map_err(|e| StateError::write(format!("Failed to rename state file: {e}")))?;

        debug!("State saved successfully");
        Ok(())
    }

    async fn delete(&self) -> Result<()> {
        if self.state_path.exists() {
            info!("Deleting state file: {}", self.state_path.display());
            fs::remove_file(&self.state_path)
                .await
                .map_err(|e| StateError::write(format!("Failed to delete state file: {e}")))?;
        }
        Ok(())
    }

    async fn exists(&self) -> Result<bool> {
        Ok(self.state_path.exists())
    }

    fn backend_type(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::InstanceState;
    use serde_json::{json, Map};
    use tempfile::TempDir;

    fn create_test_store() -> (LocalStateStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = LocalStateStore::with_base_dir(temp_dir.path().join(STATE_DIR));
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let (store, _temp) = create_test_store();

        let mut attributes = Map::new();
        attributes.insert(String::from("etag"), json!("\"e1\""));
        let mut state = ProviderState::new();
        state.set_resource("gocd_environment", "prod", InstanceState::new("prod", attributes));
        store.save(&state).await.expect("Failed to save state");

        let loaded = store
            .load()
            .await
            .expect("Failed to load state")
            .expect("State should exist");

        let recorded = loaded.get_resource("gocd_environment.prod").unwrap();
        assert_eq!(recorded.instance.id, "prod");
        assert_eq!(recorded.instance.get("etag"), &json!("\"e1\""));
        assert!(!store.state_path().with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn test_load_nonexistent() {
        let (store, _temp) = create_test_store();

        assert!(store.load().await.expect("Load should not fail").is_none());
        assert!(store.load_or_default().await.unwrap().resources.is_empty());
    }

    #[tokio::test]
    async fn test_exists_and_delete() {
        let (store, _temp) = create_test_store();

        assert!(!store.exists().await.expect("exists check failed"));

        store.save(&ProviderState::new()).await.expect("Failed to save state");
        assert!(store.exists().await.expect("exists check failed"));

        store.delete().await.expect("Failed to delete state");
        assert!(!store.exists().await.expect("exists check failed"));
    }

    #[tokio::test]
    async fn test_corrupted_state_is_reported() {
        let (store, _temp) = create_test_store();
        std::fs::create_dir_all(store.state_path().parent().unwrap()).unwrap();
        std::fs::write(store.state_path(), "{not json").unwrap();

        let err = store.load().await.unwrap_err();
        assert!(matches!(
            err,
            ProviderError::State(StateError::Corrupted { .. })
        ));
    }

    #[test]
    fn test_store_sits_next_to_manifest() {
        let store = LocalStateStore::for_manifest(Path::new("/srv/gocd/gocd.provider.yaml"));
        assert_eq!(
            store.state_path(),
            Path::new("/srv/gocd/.gocd-provider/state.json")
        );

        let store = LocalStateStore::for_manifest(Path::new("gocd.provider.yaml"));
        assert_eq!(store.state_path(), Path::new("./.gocd-provider/state.json"));
    }
}
