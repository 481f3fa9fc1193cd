//! `gocd_elastic_agent_profile`: elastic agent profiles bound to a cluster profile.

use async_trait::async_trait;

use crate::error::Result;
use crate::gocd::{ElasticAgentProfile, GoCdApi};
use crate::provider::{flatten, DataSource, Resource, ResourceData};
use crate::schema::names::{CLUSTER_PROFILE_ID, ETAG, PROFILE_ID, PROPERTIES};
use crate::schema::{properties_attribute, properties_data_attribute, Attribute, Schema};

use super::{data_source_id, ensure_id, id_or, skip_update, WithAction};

/// Manages an elastic agent profile.
#[derive(Debug, Clone, Copy, Default)]
pub struct ElasticAgentProfileResource;

/// Reads an elastic agent profile.
#[derive(Debug, Clone, Copy, Default)]
pub struct ElasticAgentProfileDataSource;

fn profile(data: &ResourceData<'_>, id: String, etag: String) -> ElasticAgentProfile {
    ElasticAgentProfile {
        id,
        cluster_profile_id: data.get_str(CLUSTER_PROFILE_ID),
        properties: flatten::plugin_configuration(data.get(PROPERTIES)),
        etag,
    }
}

#[async_trait]
impl Resource for ElasticAgentProfileResource {
    fn type_name(&self) -> &'static str {
        "gocd_elastic_agent_profile"
    }

    fn schema(&self) -> Schema {
        Schema::new("Creates and manages elastic agent profiles.")
            .attribute(
                PROFILE_ID,
                Attribute::string("The identifier of the elastic agent profile.")
                    .required()
                    .force_new(),
            )
            .attribute(
                CLUSTER_PROFILE_ID,
                Attribute::string("The identifier of the cluster profile to which current elastic agent profile belongs.")
                    .required(),
            )
            .attribute(
                PROPERTIES,
                properties_attribute("The list of configuration properties that represent the configuration of this profile."),
            )
            .attribute(
                ETAG,
                Attribute::string("Etag used to track the elastic agent profile.")
                    .optional()
                    .computed(),
            )
    }

    async fn create(&self, data: &mut ResourceData<'_>, client: &dyn GoCdApi) -> Result<()> {
        if !data.is_new_resource() {
            return Ok(());
        }

        let id = id_or(data, PROFILE_ID);
        let request = profile(data, id.clone(), String::new());

        client
            .create_elastic_agent_profile(&request)
            .await
            .with_action(|| format!("creating elastic agent profile '{id}'"))?;

        data.set_id(id);

        self.read(data, client).await
    }

    async fn read(&self, data: &mut ResourceData<'_>, client: &dyn GoCdApi) -> Result<()> {
        let profile_id = data.get_str(PROFILE_ID);

        let response = client
            .get_elastic_agent_profile(&profile_id)
            .await
            .with_action(|| format!("getting elastic agent profile {profile_id}"))?;

        data.set(ETAG, response.etag)
    }

    async fn update(&self, data: &mut ResourceData<'_>, client: &dyn GoCdApi) -> Result<()> {
        if !data.has_changes(&[CLUSTER_PROFILE_ID, PROPERTIES]) {
            return skip_update();
        }

        let request = profile(data, data.id().to_string(), data.get_str(ETAG));

        client
            .update_elastic_agent_profile(&request)
            .await
            .with_action(|| format!("updating elastic agent profile '{}'", request.id))?;

        self.read(data, client).await
    }

    async fn delete(&self, data: &mut ResourceData<'_>, client: &dyn GoCdApi) -> Result<()> {
        ensure_id(data)?;

        let profile_id = data.id().to_string();

        client
            .delete_elastic_agent_profile(&profile_id)
            .await
            .with_action(|| format!("deleting elastic agent profile {profile_id}"))?;

        data.set_id("");
        Ok(())
    }
}

#[async_trait]
impl DataSource for ElasticAgentProfileDataSource {
    fn type_name(&self) -> &'static str {
        "gocd_elastic_agent_profile"
    }

    fn schema(&self) -> Schema {
        Schema::new("Reads an existing elastic agent profile.")
            .attribute(
                PROFILE_ID,
                Attribute::string("The identifier of the elastic agent profile.").required(),
            )
            .attribute(
                CLUSTER_PROFILE_ID,
                Attribute::string("The cluster profile the elastic agent profile belongs to.")
                    .computed(),
            )
            .attribute(
                PROPERTIES,
                properties_data_attribute("The configuration properties of this profile."),
            )
            .attribute(
                ETAG,
                Attribute::string("Etag used to track the elastic agent profile.").computed(),
            )
    }

    async fn read(&self, data: &mut ResourceData<'_>, client: &dyn GoCdApi) -> Result<()> {
        let id = data_source_id(data);
        let profile_id = data.get_str(PROFILE_ID);

        let response = client
            .get_elastic_agent_profile(&profile_id)
            .await
            .with_action(|| format!("getting elastic agent profile {profile_id}"))?;

        data.set_id(id);
        data.set(CLUSTER_PROFILE_ID, response.cluster_profile_id)?;
        data.set(
            PROPERTIES,
            flatten::flatten_plugin_configuration(&response.properties),
        )?;
        data.set(ETAG, response.etag)
    }
}
