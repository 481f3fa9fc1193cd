//! Resource and data source adapters, one module per GoCD object.
//!
//! Every resource follows the same lifecycle: create builds the client
//! struct from the configured attributes and delegates to read, read stores
//! the ETag the server returned, update only calls the server when a
//! change-sensitive attribute changed, and delete clears the id.

mod auth_config;
mod cluster_profile;
mod config_repository;
mod elastic_agent_profile;
mod encrypt_value;
mod environment;
mod pipeline;
mod plugin_setting;
mod secret_config;

pub use auth_config::{AuthConfigDataSource, AuthConfigResource};
pub use cluster_profile::{ClusterProfileDataSource, ClusterProfileResource};
pub use config_repository::{ConfigRepositoryDataSource, ConfigRepositoryResource};
pub use elastic_agent_profile::{ElasticAgentProfileDataSource, ElasticAgentProfileResource};
pub use encrypt_value::EncryptValueResource;
pub use environment::{EnvironmentDataSource, EnvironmentResource};
pub use pipeline::PipelineResource;
pub use plugin_setting::{PluginSettingDataSource, PluginSettingResource};
pub use secret_config::{SecretConfigDataSource, SecretConfigResource};

use tracing::info;

use crate::error::{ProviderError, Result, SchemaError};
use crate::provider::{flatten, DataSource, Resource, ResourceData};

/// All managed resource types.
#[must_use]
pub fn resources() -> Vec<Box<dyn Resource>> {
    vec![
        Box::new(PipelineResource),
        Box::new(ConfigRepositoryResource),
        Box::new(PluginSettingResource),
        Box::new(ClusterProfileResource),
        Box::new(ElasticAgentProfileResource),
        Box::new(AuthConfigResource),
        Box::new(EnvironmentResource),
        Box::new(SecretConfigResource),
        Box::new(EncryptValueResource),
    ]
}

/// All data source types.
#[must_use]
pub fn data_sources() -> Vec<Box<dyn DataSource>> {
    vec![
        Box::new(PluginSettingDataSource),
        Box::new(AuthConfigDataSource),
        Box::new(ClusterProfileDataSource),
        Box::new(ElasticAgentProfileDataSource),
        Box::new(ConfigRepositoryDataSource),
        Box::new(EnvironmentDataSource),
        Box::new(SecretConfigDataSource),
    ]
}

/// Attaches the failed lifecycle step to an error.
trait WithAction<T> {
    fn with_action(self, action: impl FnOnce() -> String) -> Result<T>;
}

impl<T> WithAction<T> for Result<T> {
    fn with_action(self, action: impl FnOnce() -> String) -> Result<T> {
        self.map_err(|err| ProviderError::operation(action(), err))
    }
}

/// Fails when the instance has no id.
fn ensure_id(data: &ResourceData<'_>) -> Result<()> {
    if data.id().is_empty() {
        return Err(SchemaError::MissingId {
            id: data.id().to_string(),
        }
        .into());
    }
    Ok(())
}

/// The current id, or the value of `attribute` for new instances.
fn id_or(data: &ResourceData<'_>, attribute: &str) -> String {
    if data.id().is_empty() {
        data.get_str(attribute)
    } else {
        data.id().to_string()
    }
}

/// The current id, or a random one for data sources read for the first time.
fn data_source_id(data: &ResourceData<'_>) -> String {
    if data.id().is_empty() {
        flatten::random_id()
    } else {
        data.id().to_string()
    }
}

fn skip_update() -> Result<()> {
    info!("nothing to update so skipping");
    Ok(())
}

#[cfg(test)]
pub(crate) fn object(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    value.as_object().cloned().unwrap_or_default()
}
