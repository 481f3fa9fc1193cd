//! Manifest and provider configuration types.
//!
//! A manifest declares the provider block, the managed resources and the data
//! sources to read. Block contents stay dynamic; they are checked against the
//! provider's schemas by the validator.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// The root manifest structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Manifest {
    /// Provider settings; unset ones fall back to environment defaults.
    #[serde(default)]
    pub provider: Map<String, Value>,
    /// Managed resources, applied in order.
    #[serde(default)]
    pub resources: Vec<Block>,
    /// Data sources to read.
    #[serde(default)]
    pub data: Vec<Block>,
}

/// A resource or data source declaration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Block {
    /// Type name, e.g. `gocd_environment`.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Local name, unique per type.
    pub name: String,
    /// Attribute values.
    #[serde(default)]
    pub config: Map<String, Value>,
}

impl Block {
    /// Address of the block as a resource, e.g. `gocd_environment.prod`.
    #[must_use]
    pub fn resource_address(&self) -> String {
        format!("{}.{}", self.type_name, self.name)
    }

    /// Address of the block as a data source, e.g. `data.gocd_environment.prod`.
    #[must_use]
    pub fn data_address(&self) -> String {
        format!("data.{}.{}", self.type_name, self.name)
    }
}

impl Manifest {
    /// Returns the resource declared at `address`.
    #[must_use]
    pub fn resource(&self, address: &str) -> Option<&Block> {
        self.resources
            .iter()
            .find(|block| block.resource_address() == address)
    }

    /// Returns all resource addresses in declaration order.
    #[must_use]
    pub fn resource_addresses(&self) -> Vec<String> {
        self.resources.iter().map(Block::resource_address).collect()
    }
}

/// Log level of the GoCD API client.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Everything, including responses.
    Trace,
    /// Every API call.
    Debug,
    /// Lifecycle messages.
    #[default]
    Info,
    /// Warnings only.
    Warn,
    /// Errors only.
    Error,
}

impl LogLevel {
    /// Returns the `tracing` directive for the level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(ConfigError::InvalidLogLevel {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved provider settings.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Server URL, e.g. `https://gocd.example.com/go`.
    pub base_url: String,
    /// PEM contents of an extra CA certificate.
    pub ca_file: Option<String>,
    /// Basic auth username.
    pub username: Option<String>,
    /// Basic auth password.
    pub password: Option<String>,
    /// Log level of API calls.
    pub loglevel: LogLevel,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("base_url", &self.base_url)
            .field("ca_file", &self.ca_file.as_ref().map(|_| "<pem>"))
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("loglevel", &self.loglevel)
            .finish()
    }
}
