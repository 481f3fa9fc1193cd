//! `gocd_auth_config`: authorization configurations.

use async_trait::async_trait;

use crate::error::Result;
use crate::gocd::{AuthConfig, GoCdApi};
use crate::provider::{flatten, DataSource, Resource, ResourceData};
use crate::schema::names::{ALLOW_KNOWN_USERS, ETAG, PLUGIN_ID, PROFILE_ID, PROPERTIES};
use crate::schema::{properties_attribute, properties_data_attribute, Attribute, Schema};

use super::{data_source_id, ensure_id, id_or, skip_update, WithAction};

/// Manages an authorization configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthConfigResource;

/// Reads an authorization configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthConfigDataSource;

fn auth_config(data: &ResourceData<'_>, id: String, etag: String) -> AuthConfig {
    AuthConfig {
        id,
        plugin_id: data.get_str(PLUGIN_ID),
        allow_only_known_users_to_login: data.get_bool(ALLOW_KNOWN_USERS),
        properties: flatten::plugin_configuration(data.get(PROPERTIES)),
        etag,
    }
}

#[async_trait]
impl Resource for AuthConfigResource {
    fn type_name(&self) -> &'static str {
        "gocd_auth_config"
    }

    fn schema(&self) -> Schema {
        Schema::new("Creates and manages authorization configurations.")
            .attribute(
                PROFILE_ID,
                Attribute::string("The identifier of the authorization configuration.")
                    .required()
                    .force_new(),
            )
            .attribute(
                PLUGIN_ID,
                Attribute::string("The plugin identifier of the authorization plugin.")
                    .required()
                    .force_new(),
            )
            .attribute(
                ALLOW_KNOWN_USERS,
                Attribute::bool("Allow only those users to login who have been explicitly added by an administrator.")
                    .optional(),
            )
            .attribute(
                PROPERTIES,
                properties_attribute("The list of configuration properties that represent the configuration of this authorization configuration."),
            )
            .attribute(
                ETAG,
                Attribute::string("Etag used to track the authorization configuration.")
                    .optional()
                    .computed(),
            )
    }

    async fn create(&self, data: &mut ResourceData<'_>, client: &dyn GoCdApi) -> Result<()> {
        if !data.is_new_resource() {
            return Ok(());
        }

        let id = id_or(data, PROFILE_ID);
        let request = auth_config(data, id.clone(), String::new());

        client
            .create_auth_config(&request)
            .await
            .with_action(|| format!("creating authorization configuration '{id}'"))?;

        data.set_id(id);

        self.read(data, client).await
    }

    async fn read(&self, data: &mut ResourceData<'_>, client: &dyn GoCdApi) -> Result<()> {
        let profile_id = data.get_str(PROFILE_ID);

        let response = client
            .get_auth_config(&profile_id)
            .await
            .with_action(|| format!("getting authorization configuration {profile_id}"))?;

        data.set(ETAG, response.etag)
    }

    async fn update(&self, data: &mut ResourceData<'_>, client: &dyn GoCdApi) -> Result<()> {
        if !data.has_changes(&[PROPERTIES, ALLOW_KNOWN_USERS]) {
            return skip_update();
        }

        let request = auth_config(data, data.id().to_string(), data.get_str(ETAG));

        client
            .update_auth_config(&request)
            .await
            .with_action(|| format!("updating authorization configuration '{}'", request.id))?;

        self.read(data, client).await
    }

    async fn delete(&self, data: &mut ResourceData<'_>, client: &dyn GoCdApi) -> Result<()> {
        ensure_id(data)?;

        let profile_id = data.id().to_string();

        client
            .delete_auth_config(&profile_id)
            .await
            .with_action(|| format!("deleting authorization configuration {profile_id}"))?;

        data.set_id("");
        Ok(())
    }
}

#[async_trait]
impl DataSource for AuthConfigDataSource {
    fn type_name(&self) -> &'static str {
        "gocd_auth_config"
    }

    fn schema(&self) -> Schema {
        Schema::new("Reads an existing authorization configuration.")
            .attribute(
                PROFILE_ID,
                Attribute::string("The identifier of the authorization configuration.").required(),
            )
            .attribute(
                PLUGIN_ID,
                Attribute::string("The plugin identifier of the authorization plugin.").computed(),
            )
            .attribute(
                ALLOW_KNOWN_USERS,
                Attribute::bool("Whether only known users may log in.").computed(),
            )
            .attribute(
                PROPERTIES,
                properties_data_attribute("The configuration properties of this authorization configuration."),
            )
            .attribute(
                ETAG,
                Attribute::string("Etag used to track the authorization configuration.").computed(),
            )
    }

    async fn read(&self, data: &mut ResourceData<'_>, client: &dyn GoCdApi) -> Result<()> {
        let id = data_source_id(data);
        let profile_id = data.get_str(PROFILE_ID);

        let response = client
            .get_auth_config(&profile_id)
            .await
            .with_action(|| format!("getting authorization configuration {profile_id}"))?;

        data.set_id(id);
        data.set(PLUGIN_ID, response.plugin_id)?;
        data.set(ALLOW_KNOWN_USERS, response.allow_only_known_users_to_login)?;
        data.set(
            PROPERTIES,
            flatten::flatten_plugin_configuration(&response.properties),
        )?;
        data.set(ETAG, response.etag)
    }
}
