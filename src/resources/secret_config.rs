//! `gocd_secret_config`: secret manager configurations.

use async_trait::async_trait;

use crate::error::Result;
use crate::gocd::{GoCdApi, SecretConfig};
use crate::provider::{flatten, DataSource, Resource, ResourceData};
use crate::schema::names::{DESCRIPTION, ETAG, PLUGIN_ID, PROFILE_ID, PROPERTIES, RULES};
use crate::schema::{
    properties_attribute, properties_data_attribute, rules_attribute, Attribute, Schema,
};

use super::{data_source_id, ensure_id, id_or, skip_update, WithAction};

const RULES_DESCRIPTION: &str = "The list of rules, which allows restricting the usage of the secret config.";

/// Manages a secret configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecretConfigResource;

/// Reads a secret configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecretConfigDataSource;

fn secret_config(data: &ResourceData<'_>, id: String, etag: String) -> Result<SecretConfig> {
    let rules = flatten::rules(RULES, data.get(RULES)).with_action(|| String::from("reading rules"))?;

    Ok(SecretConfig {
        id,
        plugin_id: data.get_str(PLUGIN_ID),
        description: data.get_str(DESCRIPTION),
        properties: flatten::plugin_configuration(data.get(PROPERTIES)),
        rules,
        etag,
    })
}

#[async_trait]
impl Resource for SecretConfigResource {
    fn type_name(&self) -> &'static str {
        "gocd_secret_config"
    }

    fn schema(&self) -> Schema {
        Schema::new("Creates and manages secret configurations used to look up secrets.")
            .attribute(
                PROFILE_ID,
                Attribute::string("The identifier of the secret config.")
                    .required()
                    .force_new(),
            )
            .attribute(
                PLUGIN_ID,
                Attribute::string("The identifier of the secret manager plugin.")
                    .required()
                    .force_new(),
            )
            .attribute(
                DESCRIPTION,
                Attribute::string("The description for this secret config.").optional(),
            )
            .attribute(
                PROPERTIES,
                properties_attribute("The list of configuration properties that represent the configuration of this secret config."),
            )
            .attribute(RULES, rules_attribute(RULES_DESCRIPTION))
            .attribute(
                ETAG,
                Attribute::string("Etag used to track the secret config.")
                    .optional()
                    .computed(),
            )
    }

    async fn create(&self, data: &mut ResourceData<'_>, client: &dyn GoCdApi) -> Result<()> {
        if !data.is_new_resource() {
            return Ok(());
        }

        let id = id_or(data, PROFILE_ID);
        let request = secret_config(data, id.clone(), String::new())?;

        client
            .create_secret_config(&request)
            .await
            .with_action(|| format!("creating secret config '{id}'"))?;

        data.set_id(id);

        self.read(data, client).await
    }

    async fn read(&self, data: &mut ResourceData<'_>, client: &dyn GoCdApi) -> Result<()> {
        let profile_id = data.get_str(PROFILE_ID);

        let response = client
            .get_secret_config(&profile_id)
            .await
            .with_action(|| format!("getting secret config {profile_id}"))?;

        data.set(ETAG, response.etag)
    }

    async fn update(&self, data: &mut ResourceData<'_>, client: &dyn GoCdApi) -> Result<()> {
        if !data.has_changes(&[DESCRIPTION, PROPERTIES, RULES]) {
            return skip_update();
        }

        let request = secret_config(data, data.id().to_string(), data.get_str(ETAG))?;

        client
            .update_secret_config(&request)
            .await
            .with_action(|| format!("updating secret config '{}'", request.id))?;

        self.read(data, client).await
    }

    async fn delete(&self, data: &mut ResourceData<'_>, client: &dyn GoCdApi) -> Result<()> {
        ensure_id(data)?;

        let profile_id = data.id().to_string();

        client
            .delete_secret_config(&profile_id)
            .await
            .with_action(|| format!("deleting secret config {profile_id}"))?;

        data.set_id("");
        Ok(())
    }
}

#[async_trait]
impl DataSource for SecretConfigDataSource {
    fn type_name(&self) -> &'static str {
        "gocd_secret_config"
    }

    fn schema(&self) -> Schema {
        Schema::new("Reads an existing secret config.")
            .attribute(
                PROFILE_ID,
                Attribute::string("The identifier of the secret config.").required(),
            )
            .attribute(
                PLUGIN_ID,
                Attribute::string("The identifier of the secret manager plugin.").computed(),
            )
            .attribute(
                DESCRIPTION,
                Attribute::string("The description for this secret config.").computed(),
            )
            .attribute(
                PROPERTIES,
                properties_data_attribute("The configuration properties of this secret config."),
            )
            .attribute(RULES, rules_attribute(RULES_DESCRIPTION).into_computed())
            .attribute(
                ETAG,
                Attribute::string("Etag used to track the secret config.").computed(),
            )
    }

    async fn read(&self, data: &mut ResourceData<'_>, client: &dyn GoCdApi) -> Result<()> {
        let id = data_source_id(data);
        let profile_id = data.get_str(PROFILE_ID);

        let response = client
            .get_secret_config(&profile_id)
            .await
            .with_action(|| format!("getting secret config {profile_id}"))?;

        let rules = flatten::flattened(data, RULES, &response.rules)?;

        data.set_id(id);
        data.set(PLUGIN_ID, response.plugin_id)?;
        data.set(DESCRIPTION, response.description)?;
        data.set(
            PROPERTIES,
            flatten::flatten_plugin_configuration(&response.properties),
        )?;
        data.set(RULES, rules)?;
        data.set(ETAG, response.etag)
    }
}
