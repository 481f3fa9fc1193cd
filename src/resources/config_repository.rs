//! `gocd_config_repository`: pipeline-as-code sources.

use async_trait::async_trait;

use crate::error::{ProviderError, Result};
use crate::gocd::{ConfigRepo, GoCdApi};
use crate::provider::{flatten, DataSource, Resource, ResourceData};
use crate::schema::names::{CONFIGURATION, ETAG, MATERIAL, PLUGIN_ID, PROFILE_ID, RULES};
use crate::schema::{
    material_attribute, properties_attribute, properties_data_attribute, rules_attribute,
    Attribute, Schema,
};

use super::{data_source_id, ensure_id, id_or, skip_update, WithAction};

const RULES_DESCRIPTION: &str = "The list of rules, which allows restricting the entities that the config repo can refer to.";

/// Manages a config repository.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigRepositoryResource;

/// Reads a config repository.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigRepositoryDataSource;

fn config_repo(data: &ResourceData<'_>, id: String) -> Result<ConfigRepo> {
    let rules = flatten::rules(RULES, data.get(RULES)).with_action(|| String::from("reading rules"))?;

    Ok(ConfigRepo {
        id,
        plugin_id: data.get_str(PLUGIN_ID),
        material: flatten::material(data.get(MATERIAL))?,
        configuration: flatten::plugin_configuration(data.get(CONFIGURATION)),
        rules,
        etag: String::new(),
    })
}

#[async_trait]
impl Resource for ConfigRepositoryResource {
    fn type_name(&self) -> &'static str {
        "gocd_config_repository"
    }

    fn schema(&self) -> Schema {
        Schema::new("Registers a config repository from which GoCD loads pipeline definitions.")
            .attribute(
                PROFILE_ID,
                Attribute::string("The identifier of the config repository.")
                    .required()
                    .force_new(),
            )
            .attribute(
                PLUGIN_ID,
                Attribute::string("The name of the config repo plugin.")
                    .required()
                    .force_new(),
            )
            .attribute(MATERIAL, material_attribute())
            .attribute(
                CONFIGURATION,
                properties_attribute("The list of configuration properties that represent the configuration of config repositories."),
            )
            .attribute(RULES, rules_attribute(RULES_DESCRIPTION))
            .attribute(
                ETAG,
                Attribute::string("Etag used to track the config repository")
                    .optional()
                    .computed(),
            )
    }

    async fn create(&self, data: &mut ResourceData<'_>, client: &dyn GoCdApi) -> Result<()> {
        if !data.is_new_resource() {
            return Ok(());
        }

        let id = id_or(data, PROFILE_ID);
        let repo = config_repo(data, id.clone())?;

        client
            .create_config_repo(&repo)
            .await
            .with_action(|| format!("creating config repository '{id}'"))?;

        data.set_id(id);

        self.read(data, client).await
    }

    async fn read(&self, data: &mut ResourceData<'_>, client: &dyn GoCdApi) -> Result<()> {
        let profile_id = data.get_str(PROFILE_ID);

        let response = client
            .get_config_repo(&profile_id)
            .await
            .with_action(|| format!("getting config repository {profile_id}"))?;

        data.set(ETAG, response.etag)
    }

    async fn update(&self, data: &mut ResourceData<'_>, client: &dyn GoCdApi) -> Result<()> {
        if !data.has_changes(&[MATERIAL, RULES, CONFIGURATION]) {
            return skip_update();
        }

        let mut repo = config_repo(data, data.id().to_string())?;
        repo.etag = data.get_str(ETAG);

        client
            .update_config_repo(&repo)
            .await
            .with_action(|| format!("updating config repository '{}'", repo.id))?;

        self.read(data, client).await
    }

    async fn delete(&self, data: &mut ResourceData<'_>, client: &dyn GoCdApi) -> Result<()> {
        ensure_id(data)?;

        let profile_id = data.id().to_string();

        client
            .delete_config_repo(&profile_id)
            .await
            .with_action(|| format!("deleting config repository {profile_id}"))?;

        data.set_id("");
        Ok(())
    }
}

#[async_trait]
impl DataSource for ConfigRepositoryDataSource {
    fn type_name(&self) -> &'static str {
        "gocd_config_repository"
    }

    fn schema(&self) -> Schema {
        Schema::new("Reads an existing config repository.")
            .attribute(
                PROFILE_ID,
                Attribute::string("The identifier of the config repository.").required(),
            )
            .attribute(
                PLUGIN_ID,
                Attribute::string("The name of the config repo plugin.").computed(),
            )
            .attribute(MATERIAL, material_attribute().into_computed())
            .attribute(
                CONFIGURATION,
                properties_data_attribute("The configuration properties of the config repository."),
            )
            .attribute(RULES, rules_attribute(RULES_DESCRIPTION).into_computed())
            .attribute(
                ETAG,
                Attribute::string("Etag used to track the config repository").computed(),
            )
    }

    async fn read(&self, data: &mut ResourceData<'_>, client: &dyn GoCdApi) -> Result<()> {
        let id = data_source_id(data);
        let profile_id = data.get_str(PROFILE_ID);

        let response = client
            .get_config_repo(&profile_id)
            .await
            .with_action(|| format!("getting config repository {profile_id}"))?;

        let material = flatten::flatten_material(&response.material).map_err(|err| {
            data.set_id("");
            ProviderError::operation("flattening material obtained", err)
        })?;
        let rules = flatten::flattened(data, RULES, &response.rules)?;

        data.set_id(id);
        data.set(PLUGIN_ID, response.plugin_id)?;
        data.set(MATERIAL, material)?;
        data.set(
            CONFIGURATION,
            flatten::flatten_plugin_configuration(&response.configuration),
        )?;
        data.set(RULES, rules)?;
        data.set(ETAG, response.etag)
    }
}
