//! GoCD API types and data structures.
//!
//! These mirror the JSON payloads of the GoCD admin API. ETags travel in HTTP
//! headers rather than bodies, so every `etag` field is skipped by serde and
//! filled in by the client.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Treats an explicit JSON `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A single rule restricting what a config repo or secret config may refer to.
///
/// Rules are free-form string maps (`directive`, `action`, `type`, `resource`).
pub type Rule = BTreeMap<String, String>;

/// A plugin configuration property.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginConfiguration {
    /// Property key.
    pub key: String,
    /// Plain-text value.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub value: String,
    /// Encrypted value, set for secure properties.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub encrypted_value: String,
    /// Whether the property is secure; derived locally, never sent.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing)]
    pub is_secure: bool,
}

/// Pipeline creation options sent as request headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineCreateOptions {
    /// Pause the pipeline right after creation.
    pub pause_pipeline: bool,
    /// Reason recorded for the pause.
    pub pause_reason: String,
}

/// A pipeline definition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineConfig {
    /// Pipeline name.
    pub name: String,
    /// Pipeline group.
    pub group: String,
    /// Raw pipeline config as accepted by the API.
    pub config: Map<String, Value>,
    /// Options used only on creation.
    pub create_options: PipelineCreateOptions,
    /// ETag of the pipeline config.
    pub etag: String,
}

/// Material attributes; which ones apply depends on the material type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialAttributes {
    /// Repository URL.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub url: String,
    /// Username for the repository.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub username: String,
    /// Plain-text password.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub password: String,
    /// Encrypted password.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub encrypted_password: String,
    /// Branch to poll.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub branch: String,
    /// Poll the material automatically.
    #[serde(default = "default_auto_update", deserialize_with = "null_as_auto_update")]
    pub auto_update: bool,
    /// Subversion: check externals.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "std::ops::Not::not")]
    pub check_externals: bool,
    /// Perforce: use tickets.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "std::ops::Not::not")]
    pub use_tickets: bool,
    /// Perforce view.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub view: String,
    /// Perforce port.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub port: String,
    /// TFS project path.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub project_path: String,
    /// TFS domain.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub domain: String,
    /// Package or plugin material reference.
    #[serde(rename = "ref", default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub reference: String,
    /// Material name.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Dependency material: upstream stage.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub stage: String,
    /// Dependency material: upstream pipeline.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub pipeline: String,
    /// Dependency material: do not trigger on changes.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "std::ops::Not::not")]
    pub ignore_for_scheduling: bool,
    /// Checkout destination folder.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub destination: String,
    /// Invert the material filter.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "std::ops::Not::not")]
    pub invert_filter: bool,
}

const fn default_auto_update() -> bool {
    true
}

fn null_as_auto_update<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or_else(default_auto_update))
}

impl Default for MaterialAttributes {
    fn default() -> Self {
        Self {
            url: String::new(),
            username: String::new(),
            password: String::new(),
            encrypted_password: String::new(),
            branch: String::new(),
            auto_update: default_auto_update(),
            check_externals: false,
            use_tickets: false,
            view: String::new(),
            port: String::new(),
            project_path: String::new(),
            domain: String::new(),
            reference: String::new(),
            name: String::new(),
            stage: String::new(),
            pipeline: String::new(),
            ignore_for_scheduling: false,
            destination: String::new(),
            invert_filter: false,
        }
    }
}

/// A source-control reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    /// Material type (`git`, `hg`, `svn`, `p4`, `tfs`, ...).
    #[serde(rename = "type")]
    pub material_type: String,
    /// Fingerprint computed by the server.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub fingerprint: String,
    /// Type specific attributes.
    #[serde(default, deserialize_with = "null_as_default")]
    pub attributes: MaterialAttributes,
}

/// A config repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigRepo {
    /// Repository identifier.
    pub id: String,
    /// Config repo plugin identifier.
    pub plugin_id: String,
    /// Source material.
    pub material: Material,
    /// Plugin configuration.
    #[serde(default, deserialize_with = "null_as_default")]
    pub configuration: Vec<PluginConfiguration>,
    /// Rules restricting referenced entities.
    #[serde(default, deserialize_with = "null_as_default")]
    pub rules: Vec<Rule>,
    /// ETag of the config repo.
    #[serde(skip)]
    pub etag: String,
}

/// Settings of an installed plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginSettings {
    /// Plugin identifier.
    pub plugin_id: String,
    /// Plugin configuration.
    #[serde(default, deserialize_with = "null_as_default")]
    pub configuration: Vec<PluginConfiguration>,
    /// ETag of the settings.
    #[serde(skip)]
    pub etag: String,
}

/// An elastic agent cluster profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterProfile {
    /// Profile identifier.
    pub id: String,
    /// Elastic agent plugin identifier.
    pub plugin_id: String,
    /// Plugin properties.
    #[serde(default, deserialize_with = "null_as_default")]
    pub properties: Vec<PluginConfiguration>,
    /// ETag of the profile.
    #[serde(skip)]
    pub etag: String,
}

/// An elastic agent profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElasticAgentProfile {
    /// Profile identifier.
    pub id: String,
    /// Cluster profile the agents run in.
    pub cluster_profile_id: String,
    /// Plugin properties.
    #[serde(default, deserialize_with = "null_as_default")]
    pub properties: Vec<PluginConfiguration>,
    /// ETag of the profile.
    #[serde(skip)]
    pub etag: String,
}

/// An authorization configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Configuration identifier.
    pub id: String,
    /// Authorization plugin identifier.
    pub plugin_id: String,
    /// Only users already known to GoCD may log in.
    #[serde(default, deserialize_with = "null_as_default")]
    pub allow_only_known_users_to_login: bool,
    /// Plugin properties.
    #[serde(default, deserialize_with = "null_as_default")]
    pub properties: Vec<PluginConfiguration>,
    /// ETag of the configuration.
    #[serde(skip)]
    pub etag: String,
}

/// A pipeline reference inside an environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentPipeline {
    /// Pipeline name.
    pub name: String,
}

/// An environment variable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentVariable {
    /// Variable name.
    pub name: String,
    /// Plain-text value.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub value: String,
    /// Encrypted value.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub encrypted_value: String,
    /// Whether the variable is secure.
    #[serde(default, deserialize_with = "null_as_default")]
    pub secure: bool,
}

/// A GoCD environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    /// Environment name.
    pub name: String,
    /// Pipelines in the environment.
    #[serde(default, deserialize_with = "null_as_default")]
    pub pipelines: Vec<EnvironmentPipeline>,
    /// Environment variables.
    #[serde(default, deserialize_with = "null_as_default")]
    pub environment_variables: Vec<EnvironmentVariable>,
    /// ETag of the environment.
    #[serde(skip)]
    pub etag: String,
}

/// A secret configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretConfig {
    /// Configuration identifier.
    pub id: String,
    /// Secrets plugin identifier.
    pub plugin_id: String,
    /// Free-form description.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Plugin properties.
    #[serde(default, deserialize_with = "null_as_default")]
    pub properties: Vec<PluginConfiguration>,
    /// Rules restricting which entities may use the secrets.
    #[serde(default, deserialize_with = "null_as_default")]
    pub rules: Vec<Rule>,
    /// ETag of the configuration.
    #[serde(skip)]
    pub etag: String,
}

/// Response of the encryption endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedValue {
    /// The encrypted text.
    pub encrypted_value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_repo_serializes_only_set_attributes() {
        let repo = ConfigRepo {
            id: String::from("sample"),
            plugin_id: String::from("yaml.config.plugin"),
            material: Material {
                material_type: String::from("git"),
                fingerprint: String::new(),
                attributes: MaterialAttributes {
                    url: String::from("https://github.com/gocd/sample.git"),
                    branch: String::from("main"),
                    ..MaterialAttributes::default()
                },
            },
            configuration: vec![],
            rules: vec![],
            etag: String::from("ignored"),
        };

        let json = serde_json::to_value(&repo).expect("serialize");
        assert_eq!(
            json["material"]["attributes"],
            serde_json::json!({
                "url": "https://github.com/gocd/sample.git",
                "branch": "main",
                "auto_update": true
            })
        );
        assert!(json.get("etag").is_none());
    }

    #[test]
    fn test_material_reference_uses_ref_key() {
        let material: Material = serde_json::from_value(serde_json::json!({
            "type": "plugin",
            "attributes": { "ref": "scm-id", "auto_update": false }
        }))
        .expect("deserialize");

        assert_eq!(material.attributes.reference, "scm-id");
        assert!(!material.attributes.auto_update);
    }

    #[test]
    fn test_null_fields_read_as_empty() {
        let repo: ConfigRepo = serde_json::from_value(serde_json::json!({
            "id": "sample",
            "plugin_id": "yaml.config.plugin",
            "material": {
                "type": "git",
                "fingerprint": null,
                "attributes": {
                    "url": "https://github.com/gocd/sample.git",
                    "name": null,
                    "branch": null,
                    "username": null,
                    "auto_update": null,
                    "invert_filter": null
                }
            },
            "configuration": null,
            "rules": null
        }))
        .expect("deserialize");

        assert_eq!(repo.material.attributes.url, "https://github.com/gocd/sample.git");
        assert!(repo.material.attributes.name.is_empty());
        assert!(repo.material.attributes.branch.is_empty());
        assert!(repo.material.attributes.auto_update);
        assert!(!repo.material.attributes.invert_filter);
        assert!(repo.configuration.is_empty());
        assert!(repo.rules.is_empty());
    }

    #[test]
    fn test_secure_property_flag_is_not_sent() {
        let property = PluginConfiguration {
            key: String::from("password"),
            value: String::new(),
            encrypted_value: String::from("AES:abc"),
            is_secure: true,
        };

        let json = serde_json::to_value(&property).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({ "key": "password", "encrypted_value": "AES:abc" })
        );
    }
}
