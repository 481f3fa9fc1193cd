//! Apply plan types and construction.
//!
//! Deletes of resources no longer declared run first, then the declared
//! resources in manifest order.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::Manifest;
use crate::provider::{PlanAction, ResourcePlan};
use crate::state::ProviderState;

use super::diff::{DiffResult, ResourceDiff};

/// A complete apply plan.
#[derive(Debug, Serialize)]
pub struct ApplyPlan {
    /// When the plan was created.
    pub created_at: DateTime<Utc>,
    /// Planned actions in execution order.
    pub actions: Vec<PlannedAction>,
}

/// A single planned action.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedAction {
    /// Resource address.
    pub address: String,
    /// Resource type.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Local name.
    pub name: String,
    /// Planned change handed to the provider.
    pub plan: ResourcePlan,
    /// Configuration to apply; absent for deletes.
    #[serde(skip)]
    pub config: Option<Map<String, Value>>,
}

impl ApplyPlan {
    /// Creates a plan from a diff result.
    #[must_use]
    pub fn from_diff(diff: &DiffResult, manifest: &Manifest) -> Self {
        let deletes = diff
            .diffs
            .iter()
            .filter(|d| d.action == PlanAction::Delete)
            .map(|d| PlannedAction::from_diff(d, None));

        let changes = diff
            .diffs
            .iter()
            .filter(|d| d.action.is_change() && d.action != PlanAction::Delete)
            .filter_map(|d| {
                manifest
                    .resource(&d.address)
                    .map(|block| PlannedAction::from_diff(d, Some(block.config.clone())))
            });

        Self {
            created_at: Utc::now(),
            actions: deletes.chain(changes).collect(),
        }
    }

    /// Creates a plan deleting every recorded resource, newest declarations first.
    #[must_use]
    pub fn destroy(state: &ProviderState, manifest: Option<&Manifest>) -> Self {
        let mut addresses: Vec<&String> = state.resources.keys().collect();

        // Reverse manifest order; undeclared resources last.
        if let Some(manifest) = manifest {
            let declared = manifest.resource_addresses();
            let position = |address: &String| declared.iter().position(|a| a == address);
            addresses.sort_by_key(|address| std::cmp::Reverse(position(address)));
        }

        let actions = addresses
            .into_iter()
            .filter_map(|address| state.get_resource(address).map(|r| (address, r)))
            .map(|(address, recorded)| PlannedAction {
                address: address.clone(),
                type_name: recorded.type_name.clone(),
                name: recorded.name.clone(),
                plan: ResourcePlan {
                    action: PlanAction::Delete,
                    changed: Vec::new(),
                    requires_replace: Vec::new(),
                },
                config: None,
            })
            .collect();

        Self {
            created_at: Utc::now(),
            actions,
        }
    }

    /// Returns true if the plan is empty (no changes).
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Returns the number of actions.
    #[must_use]
    pub const fn action_count(&self) -> usize {
        self.actions.len()
    }

    /// Returns the number of actions of the given kind.
    #[must_use]
    pub fn count(&self, action: PlanAction) -> usize {
        self.actions.iter().filter(|a| a.plan.action == action).count()
    }

    /// Returns the addresses of all actions.
    #[must_use]
    pub fn addresses(&self) -> Vec<String> {
        self.actions.iter().map(|a| a.address.clone()).collect()
    }
}

impl PlannedAction {
    fn from_diff(diff: &ResourceDiff, config: Option<Map<String, Value>>) -> Self {
        Self {
            address: diff.address.clone(),
            type_name: diff.type_name.clone(),
            name: diff.name.clone(),
            plan: ResourcePlan {
                action: diff.action,
                changed: diff.changed.clone(),
                requires_replace: diff.requires_replace.clone(),
            },
            config,
        }
    }

    /// Returns a human-readable description of the action.
    #[must_use]
    pub fn description(&self) -> String {
        match self.plan.action {
            PlanAction::Create => format!("Create {}", self.address),
            PlanAction::Update => format!("Update {} in place", self.address),
            PlanAction::Replace => format!(
                "Replace {} ({} forces replacement)",
                self.address,
                self.plan.requires_replace.join(", ")
            ),
            PlanAction::Delete => format!("Delete {}", self.address),
            PlanAction::NoOp => format!("No change for {}", self.address),
        }
    }
}

impl std::fmt::Display for PlannedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.plan.action, self.address)?;
        if !self.plan.changed.is_empty() {
            write!(f, " ({})", self.plan.changed.join(", "))?;
        }
        Ok(())
    }
}

impl std::fmt::Display for ApplyPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.actions.is_empty() {
            return write!(f, "No changes required");
        }

        writeln!(f, "Apply Plan ({} actions):", self.actions.len())?;
        for (i, action) in self.actions.iter().enumerate() {
            writeln!(f, "  {i}. {action}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ManifestParser;
    use crate::planner::DiffEngine;
    use crate::provider::{GoCdProvider, InstanceState};
    use serde_json::json;

    fn instance(name: &str) -> InstanceState {
        InstanceState::new(
            name,
            json!({ "name": name }).as_object().cloned().unwrap_or_default(),
        )
    }

    #[test]
    fn test_deletes_run_first() {
        let provider = GoCdProvider::new();
        let manifest = ManifestParser::new()
            .parse_yaml(
                r"
resources:
  - type: gocd_environment
    name: a
    config:
      name: a
  - type: gocd_environment
    name: b
    config:
      name: b
",
                None,
            )
            .unwrap();
        let mut state = ProviderState::new();
        state.set_resource("gocd_environment", "b", instance("b"));
        state.set_resource("gocd_environment", "gone", instance("gone"));

        let diff = DiffEngine::new(&provider).compute_diff(&manifest, &state).unwrap();
        let plan = ApplyPlan::from_diff(&diff, &manifest);

        assert_eq!(
            plan.addresses(),
            vec![
                String::from("gocd_environment.gone"),
                String::from("gocd_environment.a")
            ]
        );
        assert!(plan.actions[0].config.is_none());
        assert_eq!(plan.actions[1].config.as_ref().unwrap()["name"], "a");
        assert_eq!(plan.count(PlanAction::Create), 1);
        assert_eq!(plan.actions[1].to_string(), "create gocd_environment.a");
    }

    #[test]
    fn test_destroy_reverses_manifest_order() {
        let manifest = ManifestParser::new()
            .parse_yaml(
                r"
resources:
  - type: gocd_environment
    name: a
  - type: gocd_environment
    name: b
",
                None,
            )
            .unwrap();
        let mut state = ProviderState::new();
        state.set_resource("gocd_environment", "a", instance("a"));
        state.set_resource("gocd_environment", "b", instance("b"));
        state.set_resource("gocd_environment", "z", instance("z"));

        let plan = ApplyPlan::destroy(&state, Some(&manifest));

        assert_eq!(
            plan.addresses(),
            vec![
                String::from("gocd_environment.b"),
                String::from("gocd_environment.a"),
                String::from("gocd_environment.z"),
            ]
        );
        assert_eq!(plan.count(PlanAction::Delete), 3);
    }

    #[test]
    fn test_empty_plan_display() {
        let plan = ApplyPlan::destroy(&ProviderState::new(), None);
        assert!(plan.is_empty());
        assert_eq!(plan.to_string(), "No changes required");
    }
}
