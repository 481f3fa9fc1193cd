//! Diff engine comparing the manifest with recorded state.
//!
//! Every manifest resource is planned against its recorded instance through
//! the provider; recorded resources missing from the manifest become deletes.

use serde::Serialize;
use tracing::debug;

use crate::config::Manifest;
use crate::error::Result;
use crate::provider::{GoCdProvider, PlanAction};
use crate::state::ProviderState;

/// Engine for computing diffs between the manifest and state.
#[derive(Debug)]
pub struct DiffEngine<'a> {
    provider: &'a GoCdProvider,
}

/// Difference for a single resource.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceDiff {
    /// Resource address.
    pub address: String,
    /// Resource type.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Local name.
    pub name: String,
    /// What applying will do.
    pub action: PlanAction,
    /// Attributes whose value changes.
    pub changed: Vec<String>,
    /// Changed attributes that force a replacement.
    pub requires_replace: Vec<String>,
}

/// Complete diff result.
#[derive(Debug, Default, Serialize)]
pub struct DiffResult {
    /// All resource diffs, manifest order first, then orphans.
    pub diffs: Vec<ResourceDiff>,
    /// Number of resources to create.
    pub creates: usize,
    /// Number of resources to update in place.
    pub updates: usize,
    /// Number of resources to replace.
    pub replaces: usize,
    /// Number of resources to delete.
    pub deletes: usize,
    /// Number of unchanged resources.
    pub unchanged: usize,
}

impl<'a> DiffEngine<'a> {
    /// Creates a diff engine planning through `provider`.
    #[must_use]
    pub const fn new(provider: &'a GoCdProvider) -> Self {
        Self { provider }
    }

    /// Computes the diff between the manifest and recorded state.
    ///
    /// # Errors
    ///
    /// Returns an error if a block or recorded entry names an unknown type.
    pub fn compute_diff(&self, manifest: &Manifest, state: &ProviderState) -> Result<DiffResult> {
        let mut diffs = Vec::new();

        for block in &manifest.resources {
            let address = block.resource_address();
            let prior = state.get_resource(&address).map(|r| &r.instance);
            let plan = self
                .provider
                .plan_resource(&block.type_name, prior, Some(&block.config))?;

            diffs.push(ResourceDiff {
                address,
                type_name: block.type_name.clone(),
                name: block.name.clone(),
                action: plan.action,
                changed: plan.changed,
                requires_replace: plan.requires_replace,
            });
        }

        for (address, recorded) in &state.resources {
            if manifest.resource(address).is_some() {
                continue;
            }

            debug!("Found orphaned resource: {address}");
            let plan = self
                .provider
                .plan_resource(&recorded.type_name, Some(&recorded.instance), None)?;

            diffs.push(ResourceDiff {
                address: address.clone(),
                type_name: recorded.type_name.clone(),
                name: recorded.name.clone(),
                action: plan.action,
                changed: Vec::new(),
                requires_replace: Vec::new(),
            });
        }

        Ok(DiffResult::from_diffs(diffs))
    }
}

impl DiffResult {
    fn from_diffs(diffs: Vec<ResourceDiff>) -> Self {
        let count = |action: PlanAction| diffs.iter().filter(|d| d.action == action).count();

        Self {
            creates: count(PlanAction::Create),
            updates: count(PlanAction::Update),
            replaces: count(PlanAction::Replace),
            deletes: count(PlanAction::Delete),
            unchanged: count(PlanAction::NoOp),
            diffs,
        }
    }

    /// Returns true if there are any changes.
    #[must_use]
    pub const fn has_changes(&self) -> bool {
        self.creates > 0 || self.updates > 0 || self.replaces > 0 || self.deletes > 0
    }

    /// Returns only the diffs that change something.
    #[must_use]
    pub fn changes(&self) -> Vec<&ResourceDiff> {
        self.diffs.iter().filter(|d| d.action.is_change()).collect()
    }
}

impl std::fmt::Display for DiffResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to create, {} to update, {} to replace, {} to delete, {} unchanged",
            self.creates, self.updates, self.replaces, self.deletes, self.unchanged
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ManifestParser;
    use crate::provider::InstanceState;
    use serde_json::{json, Map};

    fn manifest() -> Manifest {
        ManifestParser::new()
            .parse_yaml(
                r"
resources:
  - type: gocd_environment
    name: prod
    config:
      name: prod
      pipelines: [build]
  - type: gocd_environment
    name: staging
    config:
      name: staging
  - type: gocd_environment
    name: qa
    config:
      name: qa-renamed
",
                None,
            )
            .unwrap()
    }

    fn recorded(value: serde_json::Value) -> InstanceState {
        let attributes: Map<String, serde_json::Value> = value.as_object().cloned().unwrap();
        let id = attributes["name"].as_str().unwrap().to_string();
        InstanceState::new(id, attributes)
    }

    #[test]
    fn test_diff_covers_every_action() {
        let provider = GoCdProvider::new();
        let mut state = ProviderState::new();
        state.set_resource(
            "gocd_environment",
            "prod",
            recorded(json!({ "name": "prod", "pipelines": ["build", "deploy"], "etag": "e" })),
        );
        state.set_resource("gocd_environment", "qa", recorded(json!({ "name": "qa" })));
        state.set_resource("gocd_environment", "old", recorded(json!({ "name": "old" })));

        let diff = DiffEngine::new(&provider).compute_diff(&manifest(), &state).unwrap();

        let actions: Vec<(&str, PlanAction)> = diff
            .diffs
            .iter()
            .map(|d| (d.address.as_str(), d.action))
            .collect();
        assert_eq!(
            actions,
            vec![
                ("gocd_environment.prod", PlanAction::Update),
                ("gocd_environment.staging", PlanAction::Create),
                ("gocd_environment.qa", PlanAction::Replace),
                ("gocd_environment.old", PlanAction::Delete),
            ]
        );
        assert_eq!(diff.diffs[0].changed, vec![String::from("pipelines")]);
        assert_eq!(diff.diffs[2].requires_replace, vec![String::from("name")]);
        assert!(diff.has_changes());
        assert_eq!(diff.to_string(), "1 to create, 1 to update, 1 to replace, 1 to delete, 0 unchanged");
    }

    #[test]
    fn test_matching_state_has_no_changes() {
        let provider = GoCdProvider::new();
        let mut state = ProviderState::new();
        state.set_resource(
            "gocd_environment",
            "prod",
            recorded(json!({ "name": "prod", "pipelines": ["build"] })),
        );

        let manifest = ManifestParser::new()
            .parse_yaml(
                "resources:\n  - type: gocd_environment\n    name: prod\n    config:\n      name: prod\n      pipelines: [build]\n",
                None,
            )
            .unwrap();

        let diff = DiffEngine::new(&provider).compute_diff(&manifest, &state).unwrap();
        assert!(!diff.has_changes());
        assert_eq!(diff.unchanged, 1);
        assert!(diff.changes().is_empty());
    }
}
