//! Error types for the GoCD provider.
//!
//! Every failure raised while configuring the provider, talking to the GoCD
//! server, decoding schema values, persisting state or applying a plan ends up
//! in [`ProviderError`]. At the provider boundary errors are turned into
//! diagnostics and surfaced to the user unchanged.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the GoCD provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Provider or manifest configuration errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// GoCD API errors.
    #[error("GoCD API error: {0}")]
    GoCd(#[from] GoCdError),

    /// Schema decoding and attribute errors.
    #[error("{0}")]
    Schema(#[from] SchemaError),

    /// Local state errors.
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// Planning and apply errors.
    #[error("Planning error: {0}")]
    Plan(#[from] PlanError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A lifecycle step failed; `action` names what was being done.
    #[error("{action} errored with: {source}")]
    Operation {
        /// Description of the step, e.g. `creating config repo sample`.
        action: String,
        /// Underlying failure.
        source: Box<ProviderError>,
    },

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Provider and manifest configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The manifest file was not found.
    #[error("Manifest file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The manifest could not be parsed.
    #[error("Failed to parse manifest: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Validation failed.
    #[error("Manifest validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },

    /// A required provider setting is neither configured nor in the environment.
    #[error("Missing provider setting '{name}' (set it in the provider block or via {env})")]
    MissingSetting {
        /// Attribute name.
        name: String,
        /// Environment variable consulted as default.
        env: String,
    },

    /// The CA certificate contents could not be loaded.
    #[error("Invalid CA certificate: {message}")]
    InvalidCertificate {
        /// Description of the certificate issue.
        message: String,
    },

    /// Unsupported log level.
    #[error("Invalid loglevel '{value}', expected one of trace, debug, info, warn, error")]
    InvalidLogLevel {
        /// The rejected value.
        value: String,
    },

    /// Two manifest blocks share an address.
    #[error("Duplicate {kind} address: {address}")]
    DuplicateAddress {
        /// `resource` or `data`.
        kind: String,
        /// The duplicated address.
        address: String,
    },
}

/// GoCD API errors.
#[derive(Debug, Error)]
pub enum GoCdError {
    /// Authentication failed.
    #[error("GoCD authentication failed: {message}")]
    AuthenticationFailed {
        /// Description of the auth failure.
        message: String,
    },

    /// The requested object does not exist on the server.
    #[error("{kind} '{id}' not found")]
    NotFound {
        /// Object kind, e.g. `config repo`.
        kind: String,
        /// Identifier that was looked up.
        id: String,
    },

    /// The ETag sent with an update no longer matches the server's.
    #[error("GoCD rejected the request, the object was modified concurrently: {message}")]
    PreconditionFailed {
        /// Message returned by the server.
        message: String,
    },

    /// API request failed.
    #[error("GoCD API request failed: {status} - {message}")]
    ApiRequestFailed {
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// Network error.
    #[error("Network error communicating with GoCD: {message}")]
    NetworkError {
        /// Description of the network error.
        message: String,
    },

    /// Invalid response from the API.
    #[error("Invalid response from GoCD API: {message}")]
    InvalidResponse {
        /// Description of the response issue.
        message: String,
    },

    /// The base URL cannot be used to build API URLs.
    #[error("Invalid GoCD base url '{url}': {message}")]
    InvalidUrl {
        /// The configured base URL.
        url: String,
        /// Parse failure.
        message: String,
    },
}

/// Errors raised while reading or writing schema values.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The attribute is not part of the resource schema.
    #[error("attribute '{name}' is not defined in the schema")]
    UnknownAttribute {
        /// Attribute name.
        name: String,
    },

    /// An attribute value could not be decoded into the client's types.
    #[error("decoding '{attribute}' failed: {message}")]
    InvalidValue {
        /// Attribute name.
        attribute: String,
        /// What went wrong.
        message: String,
    },

    /// A required nested block is absent.
    #[error("block '{attribute}' must contain exactly one element")]
    MissingBlock {
        /// Attribute name.
        attribute: String,
    },

    /// Pipeline config content is neither JSON nor YAML.
    #[error("pipeline config type is unknown")]
    UnknownContentType,

    /// The pipeline name attribute and the name inside the config differ.
    #[error(
        "pipeline name passed under attribute and pipeline config are not same, make sure to pass the same values, current values: 'attribute:{attribute} config:{config}'"
    )]
    NameMismatch {
        /// Name given as attribute.
        attribute: String,
        /// Name found inside the config.
        config: String,
    },

    /// The resource has no identifier.
    #[error("resource with the ID '{id}' not found")]
    MissingId {
        /// The (empty) identifier.
        id: String,
    },
}

/// Local state errors.
#[derive(Debug, Error)]
pub enum StateError {
    /// State is corrupted.
    #[error("State is corrupted: {message}")]
    Corrupted {
        /// Description of the corruption.
        message: String,
    },

    /// Serialization error.
    #[error("State serialization error: {message}")]
    SerializationError {
        /// Description of the serialization error.
        message: String,
    },

    /// Writing the state file failed.
    #[error("Failed to write state: {message}")]
    WriteFailed {
        /// Description of the failure.
        message: String,
    },

    /// No state entry exists for the address.
    #[error("No state recorded for {address}")]
    NotFound {
        /// Resource address.
        address: String,
    },

    /// State version mismatch.
    #[error("State version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Expected state version.
        expected: String,
        /// Found state version.
        found: String,
    },
}

/// Planning and apply errors.
#[derive(Debug, Error)]
pub enum PlanError {
    /// The resource type is not served by this provider.
    #[error("Unknown resource type: {type_name}")]
    UnknownResourceType {
        /// Requested type.
        type_name: String,
    },

    /// The data source type is not served by this provider.
    #[error("Unknown data source type: {type_name}")]
    UnknownDataSourceType {
        /// Requested type.
        type_name: String,
    },

    /// A planned action failed.
    #[error("Failed to apply {address}: {reason}")]
    ActionFailed {
        /// Resource address.
        address: String,
        /// Reason for the failure.
        reason: String,
    },
}

/// Result type alias for provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;

impl ProviderError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Wraps `source` with the lifecycle step that failed.
    #[must_use]
    pub fn operation(action: impl Into<String>, source: impl Into<Self>) -> Self {
        Self::Operation {
            action: action.into(),
            source: Box::new(source.into()),
        }
    }

    /// Returns the attribute this error refers to, if any.
    #[must_use]
    pub fn attribute(&self) -> Option<&str> {
        match self {
            Self::Schema(
                SchemaError::UnknownAttribute { name: attribute }
                | SchemaError::InvalidValue { attribute, .. }
                | SchemaError::MissingBlock { attribute },
            ) => Some(attribute.as_str()),
            Self::Operation { source, .. } => source.attribute(),
            _ => None,
        }
    }
}

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Creates a validation error without a specific field.
    #[must_use]
    pub fn validation_general(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: None,
        }
    }
}

impl GoCdError {
    /// Creates an API request error.
    #[must_use]
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiRequestFailed {
            status,
            message: message.into(),
        }
    }

    /// Creates a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkError {
            message: message.into(),
        }
    }

    /// Creates an invalid response error.
    #[must_use]
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }
}

impl SchemaError {
    /// Creates a decoding error for an attribute.
    #[must_use]
    pub fn invalid(attribute: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            attribute: attribute.into(),
            message: message.into(),
        }
    }
}

impl StateError {
    /// Creates a serialization error with the given message.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }

    /// Creates a write error with the given message.
    #[must_use]
    pub fn write(message: impl Into<String>) -> Self {
        Self::WriteFailed {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_message_wraps_cause() {
        let err = ProviderError::operation(
            "creating config repo sample",
            GoCdError::api_error(500, "boom"),
        );

        assert_eq!(
            err.to_string(),
            "creating config repo sample errored with: GoCD API error: GoCD API request failed: 500 - boom"
        );
    }

    #[test]
    fn test_attribute_is_found_through_operation() {
        let err = ProviderError::operation(
            "reading rules",
            SchemaError::invalid("rules", "expected a string"),
        );

        assert_eq!(err.attribute(), Some("rules"));
        assert_eq!(ProviderError::internal("x").attribute(), None);
    }

    #[test]
    fn test_missing_id_message() {
        let err = SchemaError::MissingId { id: String::new() };
        assert_eq!(err.to_string(), "resource with the ID '' not found");
    }
}
