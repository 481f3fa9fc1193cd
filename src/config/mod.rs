//! Configuration module for the GoCD provider.
//!
//! This module handles all configuration-related functionality:
//! - Parsing the manifest (`gocd.provider.yaml`) and `.env` files
//! - Provider settings with their environment defaults
//! - Validation of every block against the provider's schemas

mod parser;
mod spec;
mod validator;

pub use parser::{find_manifest_file, ManifestParser, DEFAULT_MANIFEST_FILES, MANIFEST_ENV};
pub use spec::{Block, LogLevel, Manifest, ProviderConfig};
pub use validator::{ManifestValidator, ValidationError, ValidationResult};
