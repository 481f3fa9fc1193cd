//! Manifest parser for loading provider manifests.
//!
//! Manifests are YAML (JSON being a subset of it is accepted as well). A
//! `.env` file next to the manifest is loaded so environment defaults of the
//! provider block can live there.

use crate::error::{ConfigError, ProviderError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::spec::Manifest;

/// Environment variable naming the manifest file.
pub const MANIFEST_ENV: &str = "GOCD_PROVIDER_MANIFEST";

/// Parser for provider manifests.
#[derive(Debug, Default)]
pub struct ManifestParser {
    /// Base path for resolving the `.env` file.
    base_path: Option<PathBuf>,
}

impl ManifestParser {
    /// Creates a new manifest parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the base path for resolving the `.env` file.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Loads a manifest from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<Manifest> {
        let path = path.as_ref();
        info!("Loading manifest from: {}", path.display());

        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }
            .into());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            ProviderError::Config(ConfigError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: Some(path.display().to_string()),
            })
        })?;

        self.parse_yaml(&content, Some(path))
    }

    /// Parses a manifest from a YAML or JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is invalid.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<Manifest> {
        debug!("Parsing manifest");

        let manifest: Manifest = serde_yaml::from_str(content).map_err(|e| {
            let location = source.map(|p| p.display().to_string());
            ProviderError::Config(ConfigError::ParseError {
                message: format!("YAML parse error: {e}"),
                location,
            })
        })?;

        debug!(
            "Parsed manifest with {} resources and {} data sources",
            manifest.resources.len(),
            manifest.data.len()
        );
        Ok(manifest)
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| PathBuf::from(".env"), |p| p.join(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                ProviderError::Config(ConfigError::ParseError {
                    message: format!("Failed to load .env file: {e}"),
                    location: Some(env_path.display().to_string()),
                })
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }
}

/// Default manifest file names to search for.
pub const DEFAULT_MANIFEST_FILES: &[&str] = &[
    "gocd.provider.yaml",
    "gocd.provider.yml",
    "gocd.provider.json",
];

/// Finds the manifest in the given directory or its parents.
///
/// # Errors
///
/// Returns an error if no manifest is found.
pub fn find_manifest_file(start_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let start = start_dir.as_ref();
    let mut current = start.to_path_buf();

    loop {
        for filename in DEFAULT_MANIFEST_FILES {
            let manifest_path = current.join(filename);
            if manifest_path.exists() {
                info!("Found manifest file: {}", manifest_path.display());
                return Ok(manifest_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    Err(ConfigError::FileNotFound {
        path: start.join(DEFAULT_MANIFEST_FILES[0]),
    }
    .into())
}
