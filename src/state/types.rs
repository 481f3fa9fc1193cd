//! State types recording what the provider manages.
//!
//! Resources are keyed by their address (`<type>.<name>`), data sources by
//! `data.<type>.<name>`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Result, StateError};
use crate::provider::InstanceState;

/// Current version of the state format.
pub const STATE_VERSION: &str = "1";

/// Number of history entries kept.
const MAX_HISTORY: usize = 100;

/// The complete recorded state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderState {
    /// State format version.
    pub version: String,
    /// Managed resources by address.
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceState>,
    /// Data source results by address.
    #[serde(default)]
    pub data: BTreeMap<String, ResourceState>,
    /// When the state was last updated.
    pub last_updated: DateTime<Utc>,
    /// Recent operations.
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

/// One recorded resource or data source instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceState {
    /// Resource type, e.g. `gocd_environment`.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Local name from the manifest.
    pub name: String,
    /// Identifier and attributes.
    pub instance: InstanceState,
    /// When the instance was last written.
    pub updated_at: DateTime<Utc>,
}

/// A single entry in the operation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// When the operation ran.
    pub timestamp: DateTime<Utc>,
    /// Kind of operation.
    pub operation: Operation,
    /// Addresses touched.
    pub addresses: Vec<String>,
    /// Whether every action succeeded.
    pub success: bool,
    /// First error message, if any.
    #[serde(default)]
    pub error: Option<String>,
}

/// Kinds of recorded operations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Manifest applied.
    Apply,
    /// Recorded instances read back from the server.
    Refresh,
    /// Every managed resource deleted.
    Destroy,
    /// Entries dropped from state without touching the server.
    Remove,
}

impl ProviderState {
    /// Creates an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            version: STATE_VERSION.to_string(),
            resources: BTreeMap::new(),
            data: BTreeMap::new(),
            last_updated: Utc::now(),
            history: Vec::new(),
        }
    }

    /// Fails when the state was written by an incompatible format version.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::VersionMismatch`] on a different version.
    pub fn check_version(&self) -> Result<()> {
        if self.version != STATE_VERSION {
            return Err(StateError::VersionMismatch {
                expected: STATE_VERSION.to_string(),
                found: self.version.clone(),
            }
            .into());
        }
        Ok(())
    }

    /// Gets a resource by address.
    #[must_use]
    pub fn get_resource(&self, address: &str) -> Option<&ResourceState> {
        self.resources.get(address)
    }

    /// Records a resource instance.
    pub fn set_resource(&mut self, type_name: &str, name: &str, instance: InstanceState) {
        let address = format!("{type_name}.{name}");
        self.resources
            .insert(address, ResourceState::new(type_name, name, instance));
        self.last_updated = Utc::now();
    }

    /// Removes a resource by address.
    pub fn remove_resource(&mut self, address: &str) -> Option<ResourceState> {
        let result = self.resources.remove(address);
        if result.is_some() {
            self.last_updated = Utc::now();
        }
        result
    }

    /// Records a data source result.
    pub fn set_data(&mut self, type_name: &str, name: &str, instance: InstanceState) {
        let address = format!("data.{type_name}.{name}");
        self.data
            .insert(address, ResourceState::new(type_name, name, instance));
        self.last_updated = Utc::now();
    }

    /// Removes a resource or data source entry, whichever the address names.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::NotFound`] when nothing is recorded there.
    pub fn remove(&mut self, address: &str) -> Result<ResourceState> {
        let removed = if address.starts_with("data.") {
            self.data.remove(address)
        } else {
            self.resources.remove(address)
        };

        let removed = removed.ok_or_else(|| StateError::NotFound {
            address: address.to_string(),
        })?;
        self.last_updated = Utc::now();
        Ok(removed)
    }

    /// Looks up a resource or data source entry.
    #[must_use]
    pub fn lookup(&self, address: &str) -> Option<&ResourceState> {
        if address.starts_with("data.") {
            self.data.get(address)
        } else {
            self.resources.get(address)
        }
    }

    /// Every recorded address, resources first.
    #[must_use]
    pub fn addresses(&self) -> Vec<&str> {
        self.resources
            .keys()
            .chain(self.data.keys())
            .map(String::as_str)
            .collect()
    }

    /// Adds a history entry.
    pub fn add_history(&mut self, entry: HistoryEntry) {
        if self.history.len() >= MAX_HISTORY {
            self.history.remove(0);
        }
        self.history.push(entry);
    }
}

impl Default for ProviderState {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceState {
    /// Creates a record stamped with the current time.
    #[must_use]
    pub fn new(type_name: &str, name: &str, instance: InstanceState) -> Self {
        Self {
            type_name: type_name.to_string(),
            name: name.to_string(),
            instance,
            updated_at: Utc::now(),
        }
    }

    /// The resource address.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}.{}", self.type_name, self.name)
    }
}

impl HistoryEntry {
    /// Creates a successful history entry.
    #[must_use]
    pub fn new(operation: Operation, addresses: Vec<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            operation,
            addresses,
            success: true,
            error: None,
        }
    }

    /// Creates a failed history entry.
    #[must_use]
    pub fn failed(operation: Operation, addresses: Vec<String>, error: &str) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
            ..Self::new(operation, addresses)
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let op = match self {
            Self::Apply => "apply",
            Self::Refresh => "refresh",
            Self::Destroy => "destroy",
            Self::Remove => "remove",
        };
        write!(f, "{op}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn instance(id: &str) -> InstanceState {
        InstanceState::new(id, Map::new())
    }

    #[test]
    fn test_resources_and_data_are_addressed_separately() {
        let mut state = ProviderState::new();
        state.set_resource("gocd_environment", "prod", instance("prod"));
        state.set_data("gocd_environment", "prod", instance("random"));

        assert_eq!(
            state.addresses(),
            vec!["gocd_environment.prod", "data.gocd_environment.prod"]
        );
        assert_eq!(state.lookup("data.gocd_environment.prod").unwrap().instance.id, "random");
        assert_eq!(
            state.get_resource("gocd_environment.prod").unwrap().address(),
            "gocd_environment.prod"
        );
    }

    #[test]
    fn test_remove_unknown_address_fails() {
        let mut state = ProviderState::new();
        state.set_resource("gocd_environment", "prod", instance("prod"));

        assert!(state.remove("gocd_environment.prod").is_ok());
        let err = state.remove("gocd_environment.prod").unwrap_err();
        assert_eq!(err.to_string(), "State error: No state recorded for gocd_environment.prod");
    }

    #[test]
    fn test_history_is_capped() {
        let mut state = ProviderState::new();
        for i in 0..(MAX_HISTORY + 5) {
            state.add_history(HistoryEntry::new(Operation::Apply, vec![i.to_string()]));
        }

        assert_eq!(state.history.len(), MAX_HISTORY);
        assert_eq!(state.history[0].addresses, vec![String::from("5")]);
    }

    #[test]
    fn test_version_check() {
        let mut state = ProviderState::new();
        assert!(state.check_version().is_ok());

        state.version = String::from("0");
        assert!(state.check_version().is_err());
    }
}
