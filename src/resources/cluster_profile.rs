//! `gocd_cluster_profile`: elastic agent cluster profiles.

use async_trait::async_trait;

use crate::error::Result;
use crate::gocd::{ClusterProfile, GoCdApi};
use crate::provider::{flatten, DataSource, Resource, ResourceData};
use crate::schema::names::{ETAG, PLUGIN_ID, PROFILE_ID, PROPERTIES};
use crate::schema::{properties_attribute, properties_data_attribute, Attribute, Schema};

use super::{data_source_id, ensure_id, id_or, skip_update, WithAction};

/// Manages a cluster profile.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClusterProfileResource;

/// Reads a cluster profile.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClusterProfileDataSource;

#[async_trait]
impl Resource for ClusterProfileResource {
    fn type_name(&self) -> &'static str {
        "gocd_cluster_profile"
    }

    fn schema(&self) -> Schema {
        Schema::new("Creates and manages the cluster profiles elastic agents are started in.")
            .attribute(
                PROFILE_ID,
                Attribute::string("The identifier of the cluster profile.")
                    .required()
                    .force_new(),
            )
            .attribute(
                PLUGIN_ID,
                Attribute::string("The plugin identifier of the cluster profile.")
                    .required()
                    .force_new(),
            )
            .attribute(
                PROPERTIES,
                properties_attribute("The list of configuration properties that represent the configuration of this profile."),
            )
            .attribute(
                ETAG,
                Attribute::string("Etag used to track the cluster profile.")
                    .optional()
                    .computed(),
            )
    }

    async fn create(&self, data: &mut ResourceData<'_>, client: &dyn GoCdApi) -> Result<()> {
        if !data.is_new_resource() {
            return Ok(());
        }

        let id = id_or(data, PROFILE_ID);
        let profile = ClusterProfile {
            id: id.clone(),
            plugin_id: data.get_str(PLUGIN_ID),
            properties: flatten::plugin_configuration(data.get(PROPERTIES)),
            etag: String::new(),
        };

        client
            .create_cluster_profile(&profile)
            .await
            .with_action(|| format!("creating cluster profile '{id}'"))?;

        data.set_id(id);

        self.read(data, client).await
    }

    async fn read(&self, data: &mut ResourceData<'_>, client: &dyn GoCdApi) -> Result<()> {
        let profile_id = data.get_str(PROFILE_ID);

        let response = client
            .get_cluster_profile(&profile_id)
            .await
            .with_action(|| format!("getting cluster profile {profile_id}"))?;

        data.set(ETAG, response.etag)
    }

    async fn update(&self, data: &mut ResourceData<'_>, client: &dyn GoCdApi) -> Result<()> {
        if !data.has_change(PROPERTIES) {
            return skip_update();
        }

        let profile = ClusterProfile {
            id: data.id().to_string(),
            plugin_id: data.get_str(PLUGIN_ID),
            properties: flatten::plugin_configuration(data.get(PROPERTIES)),
            etag: data.get_str(ETAG),
        };

        client
            .update_cluster_profile(&profile)
            .await
            .with_action(|| format!("updating cluster profile '{}'", profile.id))?;

        self.read(data, client).await
    }

    async fn delete(&self, data: &mut ResourceData<'_>, client: &dyn GoCdApi) -> Result<()> {
        ensure_id(data)?;

        let profile_id = data.id().to_string();

        client
            .delete_cluster_profile(&profile_id)
            .await
            .with_action(|| format!("deleting cluster profile {profile_id}"))?;

        data.set_id("");
        Ok(())
    }
}

#[async_trait]
impl DataSource for ClusterProfileDataSource {
    fn type_name(&self) -> &'static str {
        "gocd_cluster_profile"
    }

    fn schema(&self) -> Schema {
        Schema::new("Reads an existing cluster profile.")
            .attribute(
                PROFILE_ID,
                Attribute::string("The identifier of the cluster profile.").required(),
            )
            .attribute(
                PLUGIN_ID,
                Attribute::string("The plugin identifier of the cluster profile.").computed(),
            )
            .attribute(
                PROPERTIES,
                properties_data_attribute("The configuration properties of this profile."),
            )
            .attribute(
                ETAG,
                Attribute::string("Etag used to track the cluster profile.").computed(),
            )
    }

    async fn read(&self, data: &mut ResourceData<'_>, client: &dyn GoCdApi) -> Result<()> {
        let id = data_source_id(data);
        let profile_id = data.get_str(PROFILE_ID);

        let response = client
            .get_cluster_profile(&profile_id)
            .await
            .with_action(|| format!("getting cluster profile {profile_id}"))?;

        data.set_id(id);
        data.set(PLUGIN_ID, response.plugin_id)?;
        data.set(
            PROPERTIES,
            flatten::flatten_plugin_configuration(&response.properties),
        )?;
        data.set(ETAG, response.etag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gocd::{MockGoCdApi, PluginConfiguration};
    use crate::provider::InstanceState;
    use crate::resources::object;
    use serde_json::json;

    fn config() -> serde_json::Value {
        json!({
            "profile_id": "k8s",
            "plugin_id": "cd.go.contrib.elasticagent.kubernetes",
            "properties": [
                { "key": "go_server_url", "value": "https://gocd.example.com/go" },
                { "key": "security_token", "encrypted_value": "AES:abc" }
            ]
        })
    }

    #[tokio::test]
    async fn test_create_sends_properties() {
        let mut mock = MockGoCdApi::new();
        mock.expect_create_cluster_profile()
            .withf(|p: &ClusterProfile| {
                p.id == "k8s"
                    && p.properties.len() == 2
                    && p.properties
                        .iter()
                        .any(|c| c.key == "security_token" && c.encrypted_value == "AES:abc")
            })
            .times(1)
            .returning(|p| Ok(p.clone()));
        mock.expect_get_cluster_profile().returning(|id| {
            Ok(ClusterProfile {
                id: id.to_string(),
                etag: String::from("\"k1\""),
                ..ClusterProfile::default()
            })
        });

        let schema = ClusterProfileResource.schema();
        let mut data = ResourceData::for_create(&schema, &object(config()));
        ClusterProfileResource.create(&mut data, &mock).await.unwrap();

        let state = data.into_state().unwrap();
        assert_eq!(state.id, "k8s");
        assert_eq!(state.get("etag"), &json!("\"k1\""));
    }

    #[tokio::test]
    async fn test_update_without_property_changes_is_skipped() {
        let schema = ClusterProfileResource.schema();
        let prior = InstanceState::new("k8s", schema.normalize(&object(config())));
        let mock = MockGoCdApi::new();

        let mut data = ResourceData::for_update(&schema, &prior, &object(config()));
        ClusterProfileResource.update(&mut data, &mock).await.unwrap();
    }

    #[tokio::test]
    async fn test_read_failure_names_the_step() {
        let mut mock = MockGoCdApi::new();
        mock.expect_get_cluster_profile().returning(|id| {
            Err(crate::error::GoCdError::NotFound {
                kind: String::from("cluster profile"),
                id: id.to_string(),
            }
            .into())
        });

        let schema = ClusterProfileResource.schema();
        let state = InstanceState::new("k8s", object(config()));
        let mut data = ResourceData::from_state(&schema, &state);

        let err = ClusterProfileResource.read(&mut data, &mock).await.unwrap_err();
        assert!(err.to_string().starts_with("getting cluster profile k8s errored with:"));
    }

    #[tokio::test]
    async fn test_data_source_reads_properties() {
        let mut mock = MockGoCdApi::new();
        mock.expect_get_cluster_profile().returning(|id| {
            Ok(ClusterProfile {
                id: id.to_string(),
                plugin_id: String::from("cd.go.contrib.elasticagent.docker"),
                properties: vec![PluginConfiguration {
                    key: String::from("max_docker_containers"),
                    value: String::from("10"),
                    ..PluginConfiguration::default()
                }],
                etag: String::from("\"k2\""),
            })
        });

        let schema = ClusterProfileDataSource.schema();
        let mut data =
            ResourceData::for_data_source(&schema, &object(json!({ "profile_id": "docker" })));
        ClusterProfileDataSource.read(&mut data, &mock).await.unwrap();

        assert_eq!(data.get_str("plugin_id"), "cd.go.contrib.elasticagent.docker");
        assert_eq!(
            data.get("properties"),
            &json!([{ "key": "max_docker_containers", "value": "10" }])
        );
        assert_eq!(data.get_str("etag"), "\"k2\"");
    }
}
