//! The typed operations the provider needs from a GoCD server.
//!
//! Resources only ever talk to the server through this trait, so they can be
//! exercised against a mock in tests.

use async_trait::async_trait;

use crate::error::Result;

use super::types::{
    AuthConfig, ClusterProfile, ConfigRepo, ElasticAgentProfile, EncryptedValue, Environment,
    PipelineConfig, PluginSettings, SecretConfig,
};

/// Typed CRUD operations against a GoCD server.
///
/// Getters return the object with its current ETag; updates send the ETag
/// they were given back as a precondition.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GoCdApi: Send + Sync {
    /// Creates a pipeline inside its group.
    async fn create_pipeline(&self, pipeline: &PipelineConfig) -> Result<PipelineConfig>;

    /// Fetches a pipeline config.
    async fn get_pipeline_config(&self, name: &str) -> Result<PipelineConfig>;

    /// Replaces a pipeline config.
    async fn update_pipeline_config(&self, pipeline: &PipelineConfig) -> Result<PipelineConfig>;

    /// Deletes a pipeline.
    async fn delete_pipeline(&self, name: &str) -> Result<()>;

    /// Creates a config repo.
    async fn create_config_repo(&self, repo: &ConfigRepo) -> Result<()>;

    /// Fetches a config repo.
    async fn get_config_repo(&self, id: &str) -> Result<ConfigRepo>;

    /// Replaces a config repo and returns the updated object.
    async fn update_config_repo(&self, repo: &ConfigRepo) -> Result<ConfigRepo>;

    /// Deletes a config repo.
    async fn delete_config_repo(&self, id: &str) -> Result<()>;

    /// Fetches the settings of a plugin.
    async fn get_plugin_settings(&self, plugin_id: &str) -> Result<PluginSettings>;

    /// Creates the settings of a plugin.
    async fn create_plugin_settings(&self, settings: &PluginSettings) -> Result<PluginSettings>;

    /// Replaces the settings of a plugin.
    async fn update_plugin_settings(&self, settings: &PluginSettings) -> Result<PluginSettings>;

    /// Fetches a cluster profile.
    async fn get_cluster_profile(&self, id: &str) -> Result<ClusterProfile>;

    /// Creates a cluster profile.
    async fn create_cluster_profile(&self, profile: &ClusterProfile) -> Result<ClusterProfile>;

    /// Replaces a cluster profile.
    async fn update_cluster_profile(&self, profile: &ClusterProfile) -> Result<ClusterProfile>;

    /// Deletes a cluster profile.
    async fn delete_cluster_profile(&self, id: &str) -> Result<()>;

    /// Fetches an elastic agent profile.
    async fn get_elastic_agent_profile(&self, id: &str) -> Result<ElasticAgentProfile>;

    /// Creates an elastic agent profile.
    async fn create_elastic_agent_profile(
        &self,
        profile: &ElasticAgentProfile,
    ) -> Result<ElasticAgentProfile>;

    /// Replaces an elastic agent profile.
    async fn update_elastic_agent_profile(
        &self,
        profile: &ElasticAgentProfile,
    ) -> Result<ElasticAgentProfile>;

    /// Deletes an elastic agent profile.
    async fn delete_elastic_agent_profile(&self, id: &str) -> Result<()>;

    /// Fetches an authorization config.
    async fn get_auth_config(&self, id: &str) -> Result<AuthConfig>;

    /// Creates an authorization config.
    async fn create_auth_config(&self, config: &AuthConfig) -> Result<AuthConfig>;

    /// Replaces an authorization config.
    async fn update_auth_config(&self, config: &AuthConfig) -> Result<AuthConfig>;

    /// Deletes an authorization config.
    async fn delete_auth_config(&self, id: &str) -> Result<()>;

    /// Fetches an environment.
    async fn get_environment(&self, name: &str) -> Result<Environment>;

    /// Creates an environment.
    async fn create_environment(&self, environment: &Environment) -> Result<Environment>;

    /// Replaces an environment.
    async fn update_environment(&self, environment: &Environment) -> Result<Environment>;

    /// Deletes an environment.
    async fn delete_environment(&self, name: &str) -> Result<()>;

    /// Fetches a secret config.
    async fn get_secret_config(&self, id: &str) -> Result<SecretConfig>;

    /// Creates a secret config.
    async fn create_secret_config(&self, config: &SecretConfig) -> Result<SecretConfig>;

    /// Replaces a secret config.
    async fn update_secret_config(&self, config: &SecretConfig) -> Result<SecretConfig>;

    /// Deletes a secret config.
    async fn delete_secret_config(&self, id: &str) -> Result<()>;

    /// Encrypts a plain-text value with the server's cipher.
    async fn encrypt_value(&self, value: &str) -> Result<EncryptedValue>;
}
