//! Plan executor for applying plans, refreshing state and reading data sources.
//!
//! State is saved after every action so an interrupted run never loses track
//! of objects already created on the server.

use tracing::{error, info, warn};

use crate::config::Manifest;
use crate::error::Result;
use crate::provider::{Diagnostics, GoCdProvider, Outcome, PlanAction};
use crate::state::{HistoryEntry, Operation, ProviderState, StateStore};

use super::plan::{ApplyPlan, PlannedAction};

/// Executor for apply plans.
pub struct PlanExecutor<'a> {
    provider: &'a GoCdProvider,
    store: &'a dyn StateStore,
    continue_on_error: bool,
}

/// Result of executing a single action.
#[derive(Debug)]
pub struct ActionResult {
    /// Resource or data source address.
    pub address: String,
    /// What was done, e.g. `create` or `read`.
    pub action: String,
    /// Whether the action succeeded.
    pub success: bool,
    /// Error message (if failed).
    pub error: Option<String>,
    /// Warnings reported by the handler.
    pub warnings: Vec<String>,
}

/// Result of executing a whole plan.
#[derive(Debug, Default)]
pub struct ExecutionResult {
    /// Individual action results.
    pub results: Vec<ActionResult>,
    /// Total actions executed.
    pub total_executed: usize,
    /// Number of successful actions.
    pub successful: usize,
    /// Number of failed actions.
    pub failed: usize,
    /// Number of actions not run after a failure.
    pub skipped: usize,
    /// Whether the entire plan succeeded.
    pub success: bool,
}

impl std::fmt::Debug for PlanExecutor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanExecutor")
            .field("provider", &self.provider)
            .field("backend", &self.store.backend_type())
            .field("continue_on_error", &self.continue_on_error)
            .finish()
    }
}

impl<'a> PlanExecutor<'a> {
    /// Creates a new plan executor.
    #[must_use]
    pub const fn new(provider: &'a GoCdProvider, store: &'a dyn StateStore) -> Self {
        Self {
            provider,
            store,
            continue_on_error: false,
        }
    }

    /// Sets whether to continue on errors.
    #[must_use]
    pub const fn with_continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }

    /// Executes a plan, recording it in history as `operation`.
    ///
    /// # Errors
    ///
    /// Returns an error if state cannot be saved. Failed actions are reported
    /// in the result.
    pub async fn execute(
        &self,
        plan: &ApplyPlan,
        state: &mut ProviderState,
        operation: Operation,
    ) -> Result<ExecutionResult> {
        info!("Executing plan with {} actions", plan.actions.len());

        if plan.is_empty() {
            return Ok(ExecutionResult {
                success: true,
                ..ExecutionResult::default()
            });
        }

        let mut results = Vec::new();

        for action in &plan.actions {
            let result = self.execute_action(action, state).await;
            self.store.save(state).await?;

            let failed = !result.success;
            results.push(result);

            if failed && !self.continue_on_error {
                break;
            }
        }

        let execution = ExecutionResult::from_results(results, plan.action_count());
        self.record(state, operation, plan.addresses(), &execution).await?;

        Ok(execution)
    }

    async fn execute_action(&self, action: &PlannedAction, state: &mut ProviderState) -> ActionResult {
        info!("{}", action.description());

        let prior = state.get_resource(&action.address).map(|r| r.instance.clone());
        let outcome = self
            .provider
            .apply_resource(
                &action.type_name,
                &action.plan,
                prior.as_ref(),
                action.config.as_ref(),
            )
            .await;

        let keep_prior = outcome.has_errors() && action.plan.action == PlanAction::Update;
        if !keep_prior {
            match &outcome.state {
                Some(instance) => state.set_resource(&action.type_name, &action.name, instance.clone()),
                None => {
                    state.remove_resource(&action.address);
                }
            }
        }

        ActionResult::from_outcome(&action.address, &action.plan.action.to_string(), &outcome)
    }

    /// Reads every recorded resource back from the server.
    ///
    /// Instances that no longer exist keep their recorded state; the failure
    /// is reported.
    ///
    /// # Errors
    ///
    /// Returns an error if state cannot be saved.
    pub async fn refresh(&self, state: &mut ProviderState) -> Result<ExecutionResult> {
        let recorded: Vec<_> = state.resources.values().cloned().collect();
        let mut results = Vec::new();

        for entry in recorded {
            let address = entry.address();
            info!("Refreshing {address}");

            let outcome = self
                .provider
                .read_resource(&entry.type_name, &entry.instance)
                .await;

            if !outcome.has_errors() {
                match &outcome.state {
                    Some(instance) => state.set_resource(&entry.type_name, &entry.name, instance.clone()),
                    None => {
                        state.remove_resource(&address);
                    }
                }
            }

            results.push(ActionResult::from_outcome(&address, "read", &outcome));
        }

        let total = results.len();
        let addresses = results.iter().map(|r| r.address.clone()).collect();
        let execution = ExecutionResult::from_results(results, total);
        self.record(state, Operation::Refresh, addresses, &execution).await?;

        Ok(execution)
    }

    /// Reads the manifest's data sources into state.
    ///
    /// # Errors
    ///
    /// Returns an error if state cannot be saved.
    pub async fn read_data_sources(
        &self,
        manifest: &Manifest,
        state: &mut ProviderState,
    ) -> Result<ExecutionResult> {
        let mut results = Vec::new();

        for block in &manifest.data {
            let address = block.data_address();
            info!("Reading {address}");

            let outcome = self
                .provider
                .read_data_source(&block.type_name, &block.config)
                .await;

            if let Some(instance) = &outcome.state
                && !outcome.has_errors()
            {
                state.set_data(&block.type_name, &block.name, instance.clone());
            }

            results.push(ActionResult::from_outcome(&address, "read", &outcome));
        }

        let total = results.len();
        let execution = ExecutionResult::from_results(results, total);
        self.store.save(state).await?;

        Ok(execution)
    }

    async fn record(
        &self,
        state: &mut ProviderState,
        operation: Operation,
        addresses: Vec<String>,
        execution: &ExecutionResult,
    ) -> Result<()> {
        let entry = match execution.first_error() {
            None => HistoryEntry::new(operation, addresses),
            Some(message) => HistoryEntry::failed(operation, addresses, message),
        };
        state.add_history(entry);
        self.store.save(state).await
    }
}

impl ActionResult {
    fn from_outcome(address: &str, action: &str, outcome: &Outcome) -> Self {
        let warnings = messages(outcome.diagnostics.warnings());
        let errors = messages(outcome.diagnostics.errors());

        for warning in &warnings {
            warn!("{address}: {warning}");
        }

        let error = if errors.is_empty() {
            None
        } else {
            let message = errors.join("; ");
            error!("{action} {address} failed: {message}");
            Some(message)
        };

        Self {
            address: address.to_string(),
            action: action.to_string(),
            success: error.is_none(),
            error,
            warnings,
        }
    }
}

fn messages<'d>(diagnostics: impl Iterator<Item = &'d crate::provider::Diagnostic>) -> Vec<String> {
    diagnostics
        .map(|d| {
            if d.detail.is_empty() {
                d.summary.clone()
            } else {
                format!("{}: {}", d.summary, d.detail)
            }
        })
        .collect()
}

impl ExecutionResult {
    fn from_results(results: Vec<ActionResult>, planned: usize) -> Self {
        let successful = results.iter().filter(|r| r.success).count();
        let failed = results.len() - successful;

        Self {
            total_executed: results.len(),
            successful,
            failed,
            skipped: planned.saturating_sub(results.len()),
            success: failed == 0,
            results,
        }
    }

    /// Returns true if all actions succeeded.
    #[must_use]
    pub const fn all_successful(&self) -> bool {
        self.success && self.failed == 0 && self.skipped == 0
    }

    /// Returns the first error message, if any.
    #[must_use]
    pub fn first_error(&self) -> Option<&str> {
        self.results.iter().find_map(|r| r.error.as_deref())
    }

    /// Returns every warning with its address.
    #[must_use]
    pub fn warnings(&self) -> Diagnostics {
        self.results
            .iter()
            .flat_map(|r| {
                r.warnings.iter().map(|w| {
                    crate::provider::Diagnostic::warning(w.clone()).with_attribute(r.address.clone())
                })
            })
            .fold(Diagnostics::new(), |mut all, d| {
                all.push(d);
                all
            })
    }
}

impl std::fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Executed {} actions: {} successful, {} failed, {} skipped",
            self.total_executed, self.successful, self.failed, self.skipped
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ManifestParser;
    use crate::error::GoCdError;
    use crate::gocd::{Environment, MockGoCdApi, PluginSettings};
    use crate::planner::DiffEngine;
    use crate::provider::InstanceState;
    use crate::state::LocalStateStore;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn manifest(yaml: &str) -> Manifest {
        ManifestParser::new().parse_yaml(yaml, None).unwrap()
    }

    fn fetched_environment(name: &str) -> crate::error::Result<Environment> {
        Ok(Environment {
            name: name.to_string(),
            etag: String::from("\"v1\""),
            ..Environment::default()
        })
    }

    #[tokio::test]
    async fn test_apply_records_state_and_history() {
        let temp = TempDir::new().unwrap();
        let store = LocalStateStore::with_base_dir(temp.path());

        let mut mock = MockGoCdApi::new();
        mock.expect_create_environment()
            .times(2)
            .returning(|env| Ok(env.clone()));
        mock.expect_get_environment().returning(fetched_environment);
        let provider = GoCdProvider::new().with_client(Arc::new(mock));

        let manifest = manifest(
            r"
resources:
  - type: gocd_environment
    name: prod
    config:
      name: prod
  - type: gocd_environment
    name: qa
    config:
      name: qa
",
        );
        let mut state = ProviderState::new();
        let diff = DiffEngine::new(&provider).compute_diff(&manifest, &state).unwrap();
        let plan = ApplyPlan::from_diff(&diff, &manifest);

        let result = PlanExecutor::new(&provider, &store)
            .execute(&plan, &mut state, Operation::Apply)
            .await
            .unwrap();

        assert!(result.all_successful());
        assert_eq!(result.to_string(), "Executed 2 actions: 2 successful, 0 failed, 0 skipped");

        let saved = store.load().await.unwrap().unwrap();
        assert_eq!(
            saved.get_resource("gocd_environment.qa").unwrap().instance.get("etag"),
            &json!("\"v1\"")
        );
        assert_eq!(saved.history.len(), 1);
        assert!(saved.history[0].success);
    }

    #[tokio::test]
    async fn test_failure_stops_unless_continuing() {
        let temp = TempDir::new().unwrap();
        let store = LocalStateStore::with_base_dir(temp.path());

        let manifest = manifest(
            r"
resources:
  - type: gocd_environment
    name: prod
    config:
      name: prod
  - type: gocd_environment
    name: qa
    config:
      name: qa
",
        );

        for (continue_on_error, executed) in [(false, 1), (true, 2)] {
            let mut mock = MockGoCdApi::new();
            mock.expect_create_environment().returning(|_| {
                Err(GoCdError::api_error(500, "boom").into())
            });
            let provider = GoCdProvider::new().with_client(Arc::new(mock));

            let mut state = ProviderState::new();
            let diff = DiffEngine::new(&provider).compute_diff(&manifest, &state).unwrap();
            let plan = ApplyPlan::from_diff(&diff, &manifest);

            let result = PlanExecutor::new(&provider, &store)
                .with_continue_on_error(continue_on_error)
                .execute(&plan, &mut state, Operation::Apply)
                .await
                .unwrap();

            assert!(!result.success);
            assert_eq!(result.total_executed, executed);
            assert_eq!(result.skipped, 2 - executed);
            assert!(state.resources.is_empty());
            assert!(!state.history[0].success);
            assert!(result
                .first_error()
                .unwrap()
                .starts_with("creating environment 'prod' errored with:"));
        }
    }

    #[tokio::test]
    async fn test_failed_update_keeps_prior_state() {
        let temp = TempDir::new().unwrap();
        let store = LocalStateStore::with_base_dir(temp.path());

        let mut mock = MockGoCdApi::new();
        mock.expect_update_environment()
            .withf(|env: &Environment| env.name == "prod" && env.etag == "\"v1\"")
            .times(1)
            .returning(|_| Err(GoCdError::api_error(412, "stale etag").into()));
        let provider = GoCdProvider::new().with_client(Arc::new(mock));

        let mut state = ProviderState::new();
        state.set_resource(
            "gocd_environment",
            "prod",
            InstanceState::new(
                "prod",
                json!({ "name": "prod", "pipelines": ["build"], "etag": "\"v1\"" })
                    .as_object()
                    .cloned()
                    .unwrap(),
            ),
        );

        let manifest = manifest(
            "resources:\n  - type: gocd_environment\n    name: prod\n    config:\n      name: prod\n      pipelines: [build, deploy]\n",
        );
        let diff = DiffEngine::new(&provider).compute_diff(&manifest, &state).unwrap();
        let plan = ApplyPlan::from_diff(&diff, &manifest);
        assert_eq!(plan.count(PlanAction::Update), 1);

        let result = PlanExecutor::new(&provider, &store)
            .execute(&plan, &mut state, Operation::Apply)
            .await
            .unwrap();

        assert!(!result.success);
        let recorded = &state.get_resource("gocd_environment.prod").unwrap().instance;
        assert_eq!(recorded.get("etag"), &json!("\"v1\""));
        assert_eq!(recorded.get("pipelines"), &json!(["build"]));
    }

    #[tokio::test]
    async fn test_plugin_setting_delete_warns_and_forgets() {
        let temp = TempDir::new().unwrap();
        let store = LocalStateStore::with_base_dir(temp.path());
        let provider = GoCdProvider::new().with_client(Arc::new(MockGoCdApi::new()));

        let mut state = ProviderState::new();
        state.set_resource(
            "gocd_plugin_setting",
            "github",
            InstanceState::new(
                "github.oauth.login",
                json!({ "plugin_id": "github.oauth.login" })
                    .as_object()
                    .cloned()
                    .unwrap(),
            ),
        );

        let plan = ApplyPlan::destroy(&state, None);
        let result = PlanExecutor::new(&provider, &store)
            .execute(&plan, &mut state, Operation::Destroy)
            .await
            .unwrap();

        assert!(result.success);
        assert!(state.resources.is_empty());
        assert_eq!(result.warnings().len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_and_data_sources() {
        let temp = TempDir::new().unwrap();
        let store = LocalStateStore::with_base_dir(temp.path());

        let mut mock = MockGoCdApi::new();
        mock.expect_get_environment().returning(fetched_environment);
        mock.expect_get_plugin_settings().returning(|id| {
            Ok(PluginSettings {
                plugin_id: id.to_string(),
                configuration: Vec::new(),
                etag: String::from("\"g1\""),
            })
        });
        let provider = GoCdProvider::new().with_client(Arc::new(mock));

        let mut state = ProviderState::new();
        state.set_resource(
            "gocd_environment",
            "prod",
            InstanceState::new("prod", json!({ "name": "prod" }).as_object().cloned().unwrap()),
        );

        let executor = PlanExecutor::new(&provider, &store);
        let refreshed = executor.refresh(&mut state).await.unwrap();
        assert!(refreshed.success);
        assert_eq!(
            state.get_resource("gocd_environment.prod").unwrap().instance.get("etag"),
            &json!("\"v1\"")
        );

        let manifest = manifest(
            "data:\n  - type: gocd_plugin_setting\n    name: github\n    config:\n      plugin_id: github.oauth.login\n",
        );
        let read = executor.read_data_sources(&manifest, &mut state).await.unwrap();
        assert!(read.success);
        assert_eq!(
            state.lookup("data.gocd_plugin_setting.github").unwrap().instance.get("etag"),
            &json!("\"g1\"")
        );
    }
}
