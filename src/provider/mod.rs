//! Resource lifecycle adapters.
//!
//! The [`GoCdProvider`] owns the registry of resources and data sources, the
//! provider schema and the configured GoCD client. It plans changes between
//! recorded state and configuration and dispatches them to the matching
//! [`Resource`] or [`DataSource`] handler.

mod data;
mod diagnostics;
pub mod flatten;

pub use data::{InstanceState, ResourceData};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::{LogLevel, ProviderConfig};
use crate::error::{ConfigError, PlanError, ProviderError, Result};
use crate::gocd::{GoCdApi, GoCdClient};
use crate::resources;
use crate::schema::{names, Attribute, Schema};

/// A managed GoCD object.
#[async_trait]
pub trait Resource: Send + Sync {
    /// Type name, e.g. `gocd_config_repository`.
    fn type_name(&self) -> &'static str;

    /// Attribute schema.
    fn schema(&self) -> Schema;

    /// Creates the object and records its state.
    async fn create(&self, data: &mut ResourceData<'_>, client: &dyn GoCdApi) -> Result<()>;

    /// Refreshes the recorded state from the server.
    async fn read(&self, data: &mut ResourceData<'_>, client: &dyn GoCdApi) -> Result<()>;

    /// Applies configuration changes.
    async fn update(&self, data: &mut ResourceData<'_>, client: &dyn GoCdApi) -> Result<()>;

    /// Deletes the object and clears its id.
    async fn delete(&self, data: &mut ResourceData<'_>, client: &dyn GoCdApi) -> Result<()>;
}

/// A read-only view of a GoCD object.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Type name, e.g. `gocd_plugin_setting`.
    fn type_name(&self) -> &'static str;

    /// Attribute schema.
    fn schema(&self) -> Schema;

    /// Reads the object into the data.
    async fn read(&self, data: &mut ResourceData<'_>, client: &dyn GoCdApi) -> Result<()>;
}

/// What applying a configuration to an instance will do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanAction {
    /// Create a new object.
    Create,
    /// Update the object in place.
    Update,
    /// Delete and create again.
    Replace,
    /// Delete the object.
    Delete,
    /// Nothing to do.
    NoOp,
}

impl PlanAction {
    /// Returns true when the action touches the server.
    #[must_use]
    pub const fn is_change(self) -> bool {
        !matches!(self, Self::NoOp)
    }
}

impl fmt::Display for PlanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Replace => "replace",
            Self::Delete => "delete",
            Self::NoOp => "no-op",
        };
        f.write_str(label)
    }
}

/// Planned change of one instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePlan {
    /// Action to take.
    pub action: PlanAction,
    /// Attributes whose value changes.
    #[serde(default)]
    pub changed: Vec<String>,
    /// Changed attributes that force a replacement.
    #[serde(default)]
    pub requires_replace: Vec<String>,
}

impl ResourcePlan {
    const fn simple(action: PlanAction) -> Self {
        Self {
            action,
            changed: Vec::new(),
            requires_replace: Vec::new(),
        }
    }
}

/// Result of a lifecycle call: the resulting state and what to tell the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    /// State after the call, `None` when the instance is gone.
    pub state: Option<InstanceState>,
    /// Errors and warnings.
    pub diagnostics: Diagnostics,
}

impl Outcome {
    fn failed(state: Option<InstanceState>, err: &ProviderError) -> Self {
        Self {
            state,
            diagnostics: Diagnostic::from(err).into(),
        }
    }

    fn from_data(data: ResourceData<'_>, result: Result<()>) -> Self {
        let (state, mut diagnostics) = data.finish();
        if let Err(err) = result {
            diagnostics.push(Diagnostic::from(&err));
        }
        Self { state, diagnostics }
    }

    /// Returns true if the call failed.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }
}

/// Serializable description of everything the provider serves.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderSchema {
    /// Provider configuration schema.
    pub provider: Schema,
    /// Resource schemas by type name.
    pub resources: BTreeMap<String, Schema>,
    /// Data source schemas by type name.
    pub data_sources: BTreeMap<String, Schema>,
}

struct Registered<T: ?Sized> {
    handler: Box<T>,
    schema: Schema,
}

/// The GoCD provider.
pub struct GoCdProvider {
    resources: BTreeMap<&'static str, Registered<dyn Resource>>,
    data_sources: BTreeMap<&'static str, Registered<dyn DataSource>>,
    client: Option<Arc<dyn GoCdApi>>,
}

impl fmt::Debug for GoCdProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoCdProvider")
            .field("resources", &self.resources.keys().collect::<Vec<_>>())
            .field("data_sources", &self.data_sources.keys().collect::<Vec<_>>())
            .field("configured", &self.client.is_some())
            .finish()
    }
}

impl Default for GoCdProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl GoCdProvider {
    /// Creates an unconfigured provider with every resource and data source registered.
    #[must_use]
    pub fn new() -> Self {
        let resources = resources::resources()
            .into_iter()
            .map(|handler| {
                let schema = handler.schema();
                (handler.type_name(), Registered { handler, schema })
            })
            .collect();

        let data_sources = resources::data_sources()
            .into_iter()
            .map(|handler| {
                let schema = handler.schema();
                (handler.type_name(), Registered { handler, schema })
            })
            .collect();

        Self {
            resources,
            data_sources,
            client: None,
        }
    }

    /// Uses the given client instead of building one from configuration.
    #[must_use]
    pub fn with_client(mut self, client: Arc<dyn GoCdApi>) -> Self {
        self.client = Some(client);
        self
    }

    /// Schema of the provider block.
    #[must_use]
    pub fn provider_schema() -> Schema {
        Schema::new("Manages GoCD server objects.")
            .attribute(
                names::BASE_URL,
                Attribute::string(
                    "base url of GoCD server, which this terraform provider can interact with",
                )
                .required()
                .env_default("GOCD_BASE_URL", None),
            )
            .attribute(
                names::CA_FILE,
                Attribute::string(
                    "CA file contents, to be used while connecting to GoCD server when CA based auth is enabled",
                )
                .optional()
                .env_default("GOCD_CAFILE_CONTENT", None),
            )
            .attribute(
                names::USERNAME,
                Attribute::string("username to be used while connecting with GoCD")
                    .optional()
                    .env_default("GOCD_USERNAME", None),
            )
            .attribute(
                names::PASSWORD,
                Attribute::string("password to be used while connecting with GoCD")
                    .optional()
                    .sensitive()
                    .env_default("GOCD_PASSWORD", None),
            )
            .attribute(
                names::LOGLEVEL,
                Attribute::string("loglevel to be set for the api calls made to GoCD")
                    .optional()
                    .env_default("GOCD_LOGLEVEL", Some(LogLevel::Info.as_str())),
            )
    }

    /// Resolves the provider block against its schema and environment defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the block is invalid, `base_url` is missing or the
    /// log level is not recognised.
    pub fn resolve_config(block: &Map<String, Value>) -> Result<ProviderConfig> {
        let schema = Self::provider_schema();

        if let Some(diagnostic) = schema.validate(block).errors().next() {
            return Err(ConfigError::validation(
                format!("{}: {}", diagnostic.summary, diagnostic.detail),
                diagnostic.attribute.clone().unwrap_or_default(),
            )
            .into());
        }

        let setting = |name: &str| -> Option<String> {
            block
                .get(name)
                .map(flatten::to_string)
                .filter(|v| !v.is_empty())
                .or_else(|| {
                    schema
                        .get(name)
                        .and_then(|attribute| attribute.env_default.as_ref())
                        .and_then(|default| default.resolve())
                })
        };

        let base_url = setting(names::BASE_URL).ok_or_else(|| ConfigError::MissingSetting {
            name: names::BASE_URL.to_string(),
            env: String::from("GOCD_BASE_URL"),
        })?;

        let loglevel = setting(names::LOGLEVEL)
            .map(|level| level.parse::<LogLevel>())
            .transpose()?
            .unwrap_or_default();

        Ok(ProviderConfig {
            base_url,
            ca_file: setting(names::CA_FILE),
            username: setting(names::USERNAME),
            password: setting(names::PASSWORD),
            loglevel,
        })
    }

    /// Builds the GoCD client from the resolved configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn configure(&mut self, config: &ProviderConfig) -> Result<()> {
        info!("Configuring GoCD provider for {}", config.base_url);
        let client = GoCdClient::new(config)?;
        self.client = Some(Arc::new(client));
        Ok(())
    }

    /// Returns true once a client is available.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    fn client(&self) -> Result<&dyn GoCdApi> {
        self.client
            .as_deref()
            .ok_or_else(|| ProviderError::internal("provider is not configured"))
    }

    fn resource(&self, type_name: &str) -> Result<&Registered<dyn Resource>> {
        self.resources.get(type_name).ok_or_else(|| {
            PlanError::UnknownResourceType {
                type_name: type_name.to_string(),
            }
            .into()
        })
    }

    fn data_source(&self, type_name: &str) -> Result<&Registered<dyn DataSource>> {
        self.data_sources.get(type_name).ok_or_else(|| {
            PlanError::UnknownDataSourceType {
                type_name: type_name.to_string(),
            }
            .into()
        })
    }

    /// Names of all resource types.
    pub fn resource_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.resources.keys().copied()
    }

    /// Names of all data source types.
    pub fn data_source_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.data_sources.keys().copied()
    }

    /// Schema of a resource type.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown types.
    pub fn resource_schema(&self, type_name: &str) -> Result<&Schema> {
        self.resource(type_name).map(|r| &r.schema)
    }

    /// Schema of a data source type.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown types.
    pub fn data_source_schema(&self, type_name: &str) -> Result<&Schema> {
        self.data_source(type_name).map(|d| &d.schema)
    }

    /// Full schema of the provider.
    #[must_use]
    pub fn schema(&self) -> ProviderSchema {
        ProviderSchema {
            provider: Self::provider_schema(),
            resources: self
                .resources
                .iter()
                .map(|(name, r)| ((*name).to_string(), r.schema.clone()))
                .collect(),
            data_sources: self
                .data_sources
                .iter()
                .map(|(name, d)| ((*name).to_string(), d.schema.clone()))
                .collect(),
        }
    }

    /// Validates a resource configuration block.
    #[must_use]
    pub fn validate_resource_config(&self, type_name: &str, config: &Map<String, Value>) -> Diagnostics {
        match self.resource(type_name) {
            Ok(registered) => registered.schema.validate(config),
            Err(err) => err.into(),
        }
    }

    /// Validates a data source configuration block.
    #[must_use]
    pub fn validate_data_source_config(
        &self,
        type_name: &str,
        config: &Map<String, Value>,
    ) -> Diagnostics {
        match self.data_source(type_name) {
            Ok(registered) => registered.schema.validate(config),
            Err(err) => err.into(),
        }
    }

    /// Plans the change from `prior` state to `config`.
    ///
    /// A missing prior state plans a create, a missing config a delete.
    /// Otherwise every configurable attribute is compared; computed attributes
    /// the configuration leaves unset are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown types.
    pub fn plan_resource(
        &self,
        type_name: &str,
        prior: Option<&InstanceState>,
        config: Option<&Map<String, Value>>,
    ) -> Result<ResourcePlan> {
        let schema = &self.resource(type_name)?.schema;

        let (prior, config) = match (prior, config) {
            (None, None) => return Ok(ResourcePlan::simple(PlanAction::NoOp)),
            (None, Some(_)) => return Ok(ResourcePlan::simple(PlanAction::Create)),
            (Some(_), None) => return Ok(ResourcePlan::simple(PlanAction::Delete)),
            (Some(prior), Some(config)) => (prior, config),
        };

        let planned = schema.normalize(config);
        let changed: Vec<String> = schema
            .attributes
            .iter()
            .filter(|(_, attribute)| !attribute.is_computed_only())
            .filter(|(name, attribute)| !(attribute.computed && !planned.contains_key(*name)))
            .filter(|(name, _)| prior.get(name) != planned.get(*name).unwrap_or(&Value::Null))
            .map(|(name, _)| name.clone())
            .collect();

        let requires_replace: Vec<String> = changed
            .iter()
            .filter(|name| schema.get(name).is_some_and(|a| a.force_new))
            .cloned()
            .collect();

        let action = if !requires_replace.is_empty() {
            PlanAction::Replace
        } else if changed.is_empty() {
            PlanAction::NoOp
        } else {
            PlanAction::Update
        };

        debug!("planned {action} for {type_name} {}", prior.id);

        Ok(ResourcePlan {
            action,
            changed,
            requires_replace,
        })
    }

    /// Applies a planned change.
    pub async fn apply_resource(
        &self,
        type_name: &str,
        plan: &ResourcePlan,
        prior: Option<&InstanceState>,
        config: Option<&Map<String, Value>>,
    ) -> Outcome {
        let found = self
            .resource(type_name)
            .and_then(|r| self.client().map(|client| (r, client)));
        let (registered, client) = match found {
            Ok(found) => found,
            Err(err) => return Outcome::failed(prior.cloned(), &err),
        };
        let handler = registered.handler.as_ref();
        let schema = &registered.schema;
        let empty = Map::new();
        let config = config.unwrap_or(&empty);

        match (plan.action, prior) {
            (PlanAction::NoOp, _) => Outcome {
                state: prior.cloned(),
                diagnostics: Diagnostics::new(),
            },
            (PlanAction::Create, _) | (PlanAction::Replace | PlanAction::Update, None) => {
                let mut data = ResourceData::for_create(schema, config);
                let result = handler.create(&mut data, client).await;
                Outcome::from_data(data, result)
            }
            (PlanAction::Update, Some(prior)) => {
                let mut data = ResourceData::for_update(schema, prior, config);
                let result = handler.update(&mut data, client).await;
                Outcome::from_data(data, result)
            }
            (PlanAction::Replace, Some(prior)) => {
                let mut removal = ResourceData::from_state(schema, prior);
                let result = handler.delete(&mut removal, client).await;
                let deleted = Outcome::from_data(removal, result);
                if deleted.has_errors() {
                    return deleted;
                }

                let mut data = ResourceData::for_create(schema, config);
                let result = handler.create(&mut data, client).await;
                let mut created = Outcome::from_data(data, result);
                let mut diagnostics = deleted.diagnostics;
                diagnostics.extend(created.diagnostics);
                created.diagnostics = diagnostics;
                created
            }
            (PlanAction::Delete, Some(prior)) => {
                let mut data = ResourceData::from_state(schema, prior);
                let result = handler.delete(&mut data, client).await;
                Outcome::from_data(data, result)
            }
            (PlanAction::Delete, None) => Outcome::default(),
        }
    }

    /// Refreshes a recorded instance from the server.
    pub async fn read_resource(&self, type_name: &str, state: &InstanceState) -> Outcome {
        let found = self
            .resource(type_name)
            .and_then(|r| self.client().map(|client| (r, client)));
        let (registered, client) = match found {
            Ok(found) => found,
            Err(err) => return Outcome::failed(Some(state.clone()), &err),
        };

        let mut data = ResourceData::from_state(&registered.schema, state);
        let result = registered.handler.read(&mut data, client).await;
        Outcome::from_data(data, result)
    }

    /// Reads a data source.
    pub async fn read_data_source(&self, type_name: &str, config: &Map<String, Value>) -> Outcome {
        let found = self
            .data_source(type_name)
            .and_then(|d| self.client().map(|client| (d, client)));
        let (registered, client) = match found {
            Ok(found) => found,
            Err(err) => return Outcome::failed(None, &err),
        };

        let mut data = ResourceData::for_data_source(&registered.schema, config);
        let result = registered.handler.read(&mut data, client).await;
        Outcome::from_data(data, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gocd::{ClusterProfile, MockGoCdApi};
    use serde_json::json;

    fn config(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_registry_serves_every_type() {
        let provider = GoCdProvider::new();

        let resources: Vec<&str> = provider.resource_types().collect();
        assert_eq!(resources.len(), 9);
        assert!(resources.contains(&"gocd_pipeline"));
        assert!(resources.contains(&"gocd_encrypt_value"));

        let data_sources: Vec<&str> = provider.data_source_types().collect();
        assert_eq!(data_sources.len(), 7);
        assert!(!data_sources.contains(&"gocd_pipeline"));
    }

    #[test]
    fn test_unknown_type_is_reported() {
        let provider = GoCdProvider::new();
        let diagnostics = provider.validate_resource_config("gocd_agent", &Map::new());

        assert!(diagnostics.has_errors());
        assert!(
            diagnostics
                .iter()
                .any(|d| d.summary.contains("Unknown resource type: gocd_agent"))
        );
    }

    #[test]
    fn test_resolve_config_prefers_block_values() {
        let resolved = GoCdProvider::resolve_config(&config(json!({
            "base_url": "https://gocd.example.com/go",
            "username": "admin",
            "password": "secret",
            "loglevel": "debug"
        })))
        .unwrap();

        assert_eq!(resolved.base_url, "https://gocd.example.com/go");
        assert_eq!(resolved.username.as_deref(), Some("admin"));
        assert_eq!(resolved.loglevel, LogLevel::Debug);
    }

    #[test]
    fn test_resolve_config_rejects_bad_loglevel() {
        let err = GoCdProvider::resolve_config(&config(json!({
            "base_url": "https://gocd.example.com/go",
            "loglevel": "verbose"
        })))
        .unwrap_err();

        assert!(err.to_string().contains("Invalid loglevel 'verbose'"));
    }

    #[test]
    fn test_plan_detects_replace_update_and_noop() {
        let provider = GoCdProvider::new();
        let prior = InstanceState::new(
            "prod",
            config(json!({
                "profile_id": "prod",
                "plugin_id": "cd.go.contrib.elastic-agent.docker",
                "etag": "e1",
                "properties": [{ "key": "GoServerUrl", "value": "https://gocd/go" }]
            })),
        );

        let same = config(json!({
            "profile_id": "prod",
            "plugin_id": "cd.go.contrib.elastic-agent.docker",
            "properties": [{ "key": "GoServerUrl", "value": "https://gocd/go" }]
        }));
        let plan = provider
            .plan_resource("gocd_cluster_profile", Some(&prior), Some(&same))
            .unwrap();
        assert_eq!(plan.action, PlanAction::NoOp);

        let mut updated = same.clone();
        updated.insert(String::from("properties"), json!([]));
        let plan = provider
            .plan_resource("gocd_cluster_profile", Some(&prior), Some(&updated))
            .unwrap();
        assert_eq!(plan.action, PlanAction::Update);
        assert_eq!(plan.changed, vec![String::from("properties")]);

        let mut renamed = same;
        renamed.insert(String::from("profile_id"), json!("staging"));
        let plan = provider
            .plan_resource("gocd_cluster_profile", Some(&prior), Some(&renamed))
            .unwrap();
        assert_eq!(plan.action, PlanAction::Replace);
        assert_eq!(plan.requires_replace, vec![String::from("profile_id")]);

        let plan = provider
            .plan_resource("gocd_cluster_profile", Some(&prior), None)
            .unwrap();
        assert_eq!(plan.action, PlanAction::Delete);
    }

    #[tokio::test]
    async fn test_apply_create_records_state() {
        let mut mock = MockGoCdApi::new();
        mock.expect_create_cluster_profile()
            .withf(|profile: &ClusterProfile| profile.id == "prod")
            .times(1)
            .returning(|profile| Ok(profile.clone()));
        mock.expect_get_cluster_profile()
            .returning(|id| {
                Ok(ClusterProfile {
                    id: id.to_string(),
                    etag: String::from("\"e1\""),
                    ..ClusterProfile::default()
                })
            });

        let provider = GoCdProvider::new().with_client(Arc::new(mock));
        let config = config(json!({
            "profile_id": "prod",
            "plugin_id": "cd.go.contrib.elastic-agent.docker"
        }));

        let plan = provider
            .plan_resource("gocd_cluster_profile", None, Some(&config))
            .unwrap();
        let outcome = provider
            .apply_resource("gocd_cluster_profile", &plan, None, Some(&config))
            .await;

        assert!(!outcome.has_errors());
        let state = outcome.state.unwrap();
        assert_eq!(state.id, "prod");
        assert_eq!(state.get("etag"), &json!("\"e1\""));
    }

    #[test]
    fn test_plan_keeps_rule_order_but_not_pipeline_order() {
        let provider = GoCdProvider::new();
        let allow = json!({ "directive": "allow", "action": "refer", "type": "environment", "resource": "prod" });
        let deny = json!({ "directive": "deny", "action": "refer", "type": "environment", "resource": "*" });

        let secret = |rules: Value| {
            config(json!({
                "profile_id": "vault",
                "plugin_id": "cd.go.secrets.vault",
                "rules": rules
            }))
        };
        let prior = InstanceState::new("vault", secret(json!([allow.clone(), deny.clone()])));
        let plan = provider
            .plan_resource("gocd_secret_config", Some(&prior), Some(&secret(json!([deny, allow]))))
            .unwrap();
        assert_eq!(plan.action, PlanAction::Update);
        assert_eq!(plan.changed, vec![String::from("rules")]);

        let prior = InstanceState::new(
            "prod",
            config(json!({ "name": "prod", "pipelines": ["build", "deploy"] })),
        );
        let reordered = config(json!({ "name": "prod", "pipelines": ["deploy", "build"] }));
        let plan = provider
            .plan_resource("gocd_environment", Some(&prior), Some(&reordered))
            .unwrap();
        assert_eq!(plan.action, PlanAction::NoOp);
    }

    #[tokio::test]
    async fn test_apply_replace_deletes_then_creates() {
        let mut seq = mockall::Sequence::new();
        let mut mock = MockGoCdApi::new();
        mock.expect_delete_cluster_profile()
            .withf(|id: &str| id == "prod")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        mock.expect_create_cluster_profile()
            .withf(|profile: &ClusterProfile| profile.id == "staging")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|profile| Ok(profile.clone()));
        mock.expect_get_cluster_profile()
            .withf(|id: &str| id == "staging")
            .times(1)
            .returning(|id| {
                Ok(ClusterProfile {
                    id: id.to_string(),
                    etag: String::from("\"e2\""),
                    ..ClusterProfile::default()
                })
            });

        let provider = GoCdProvider::new().with_client(Arc::new(mock));
        let prior = InstanceState::new(
            "prod",
            config(json!({
                "profile_id": "prod",
                "plugin_id": "cd.go.contrib.elastic-agent.docker",
                "etag": "\"e1\""
            })),
        );
        let renamed = config(json!({
            "profile_id": "staging",
            "plugin_id": "cd.go.contrib.elastic-agent.docker"
        }));

        let plan = provider
            .plan_resource("gocd_cluster_profile", Some(&prior), Some(&renamed))
            .unwrap();
        assert_eq!(plan.action, PlanAction::Replace);

        let outcome = provider
            .apply_resource("gocd_cluster_profile", &plan, Some(&prior), Some(&renamed))
            .await;

        assert!(!outcome.has_errors());
        let state = outcome.state.unwrap();
        assert_eq!(state.id, "staging");
        assert_eq!(state.get("etag"), &json!("\"e2\""));
    }

    #[tokio::test]
    async fn test_apply_without_client_fails() {
        let provider = GoCdProvider::new();
        let plan = ResourcePlan::simple(PlanAction::Create);

        let outcome = provider
            .apply_resource("gocd_cluster_profile", &plan, None, None)
            .await;

        assert!(outcome.has_errors());
        assert!(outcome.state.is_none());
    }
}
