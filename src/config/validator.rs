//! Manifest validation.
//!
//! Every block is checked against the schema of its type; all problems are
//! collected before anything is sent to the server.

use std::collections::HashSet;
use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::provider::{Diagnostics, GoCdProvider};
use crate::schema::names;

use super::spec::{Block, Manifest};

/// Validator for manifests.
#[derive(Debug)]
pub struct ManifestValidator<'a> {
    provider: &'a GoCdProvider,
}

/// Validation result containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl<'a> ManifestValidator<'a> {
    /// Creates a validator backed by the provider's schemas.
    #[must_use]
    pub const fn new(provider: &'a GoCdProvider) -> Self {
        Self { provider }
    }

    /// Validates a manifest, failing on the first error found.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn validate(&self, manifest: &Manifest) -> Result<ValidationResult> {
        let result = self.check(manifest);

        if let Some(first_error) = result.errors.first() {
            return Err(ConfigError::ValidationError {
                message: first_error.message.clone(),
                field: Some(first_error.field.clone()),
            }
            .into());
        }

        debug!("Manifest validation passed");
        Ok(result)
    }

    /// Collects every error and warning of a manifest.
    #[must_use]
    pub fn check(&self, manifest: &Manifest) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_provider(manifest, &mut result);
        self.validate_blocks(&manifest.resources, BlockKind::Resource, &mut result);
        self.validate_blocks(&manifest.data, BlockKind::Data, &mut result);

        if manifest.resources.is_empty() && manifest.data.is_empty() {
            result
                .warnings
                .push(String::from("No resources or data sources defined in manifest"));
        }

        result
    }

    fn validate_provider(manifest: &Manifest, result: &mut ValidationResult) {
        let diagnostics = GoCdProvider::provider_schema().validate(&manifest.provider);
        result.absorb("provider", &diagnostics);

        if manifest.provider.contains_key(names::PASSWORD) {
            result.warnings.push(String::from(
                "provider.password: Storing the password in the manifest is not recommended, use GOCD_PASSWORD instead",
            ));
        }
    }

    fn validate_blocks(&self, blocks: &[Block], kind: BlockKind, result: &mut ValidationResult) {
        let mut seen = HashSet::new();

        for (i, block) in blocks.iter().enumerate() {
            let prefix = format!("{}[{i}]", kind.section());
            let address = kind.address(block);

            if !seen.insert(address.clone()) {
                result.errors.push(ValidationError {
                    field: format!("{prefix}.name"),
                    message: ConfigError::DuplicateAddress {
                        kind: kind.label().to_string(),
                        address: address.clone(),
                    }
                    .to_string(),
                });
            }

            if !is_valid_name(&block.name) {
                result.errors.push(ValidationError {
                    field: format!("{prefix}.name"),
                    message: format!(
                        "Name '{}' is invalid. Must start with a letter or underscore and contain only letters, digits, underscores and hyphens.",
                        block.name
                    ),
                });
            }

            let diagnostics = match kind {
                BlockKind::Resource => self
                    .provider
                    .validate_resource_config(&block.type_name, &block.config),
                BlockKind::Data => self
                    .provider
                    .validate_data_source_config(&block.type_name, &block.config),
            };
            result.absorb(&address, &diagnostics);
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum BlockKind {
    Resource,
    Data,
}

impl BlockKind {
    const fn section(self) -> &'static str {
        match self {
            Self::Resource => "resources",
            Self::Data => "data",
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Resource => "resource",
            Self::Data => "data source",
        }
    }

    fn address(self, block: &Block) -> String {
        match self {
            Self::Resource => block.resource_address(),
            Self::Data => block.data_address(),
        }
    }
}

/// Names follow the identifier rules of resource addresses.
fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();

    let Some(first) = chars.next() else {
        return false;
    };

    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

impl ValidationResult {
    /// Returns true if validation passed (no errors).
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of errors.
    #[must_use]
    pub const fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Returns the number of warnings.
    #[must_use]
    pub const fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    fn absorb(&mut self, address: &str, diagnostics: &Diagnostics) {
        for diagnostic in diagnostics {
            let field = diagnostic
                .attribute
                .as_ref()
                .map_or_else(|| address.to_string(), |a| format!("{address}.{a}"));
            let message = if diagnostic.detail.is_empty() {
                diagnostic.summary.clone()
            } else {
                format!("{}: {}", diagnostic.summary, diagnostic.detail)
            };

            if diagnostic.is_error() {
                self.errors.push(ValidationError { field, message });
            } else {
                self.warnings.push(format!("{field}: {message}"));
            }
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}
