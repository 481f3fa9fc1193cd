//! GoCD API integration.
//!
//! This module provides:
//! - [`GoCdApi`]: the typed operations resources rely on
//! - [`GoCdClient`]: the HTTP implementation of those operations
//! - The request and response types of the GoCD admin API

mod api;
mod client;
mod types;

#[cfg(test)]
pub use api::MockGoCdApi;
pub use api::GoCdApi;
pub use client::GoCdClient;
pub use types::{
    AuthConfig, ClusterProfile, ConfigRepo, ElasticAgentProfile, EncryptedValue, Environment,
    EnvironmentPipeline, EnvironmentVariable, Material, MaterialAttributes, PipelineConfig,
    PipelineCreateOptions, PluginConfiguration, PluginSettings, Rule, SecretConfig,
};
