//! `gocd_plugin_setting`: settings of installed plugins.
//!
//! GoCD cannot delete plugin settings, so deleting the resource only forgets
//! it locally.

use async_trait::async_trait;
use tracing::warn;

use crate::error::Result;
use crate::gocd::{GoCdApi, PluginSettings};
use crate::provider::{flatten, DataSource, Resource, ResourceData};
use crate::schema::names::{CONFIGURATION, ETAG, PLUGIN_CONFIGURATIONS, PLUGIN_ID};
use crate::schema::{properties_attribute, properties_data_attribute, Attribute, Schema};

use super::{data_source_id, id_or, skip_update, WithAction};

/// Manages the settings of a plugin.
#[derive(Debug, Clone, Copy, Default)]
pub struct PluginSettingResource;

/// Reads the settings of a plugin.
#[derive(Debug, Clone, Copy, Default)]
pub struct PluginSettingDataSource;

#[async_trait]
impl Resource for PluginSettingResource {
    fn type_name(&self) -> &'static str {
        "gocd_plugin_setting"
    }

    fn schema(&self) -> Schema {
        Schema::new("Configures the settings of an installed plugin.")
            .attribute(
                PLUGIN_ID,
                Attribute::string("The ID of the plugin.").required().force_new(),
            )
            .attribute(
                PLUGIN_CONFIGURATIONS,
                properties_attribute("List of plugin configurations to be applied."),
            )
            .attribute(
                ETAG,
                Attribute::string("Etag used to track the plugin settings")
                    .optional()
                    .computed(),
            )
    }

    async fn create(&self, data: &mut ResourceData<'_>, client: &dyn GoCdApi) -> Result<()> {
        if !data.is_new_resource() {
            return Ok(());
        }

        let id = id_or(data, PLUGIN_ID);
        let settings = PluginSettings {
            plugin_id: id.clone(),
            configuration: flatten::plugin_configuration(data.get(PLUGIN_CONFIGURATIONS)),
            etag: String::new(),
        };

        client
            .create_plugin_settings(&settings)
            .await
            .with_action(|| format!("creating plugin setting '{id}'"))?;

        data.set_id(id);

        self.read(data, client).await
    }

    async fn read(&self, data: &mut ResourceData<'_>, client: &dyn GoCdApi) -> Result<()> {
        let plugin_id = data.get_str(PLUGIN_ID);

        let response = client
            .get_plugin_settings(&plugin_id)
            .await
            .with_action(|| format!("getting plugin setting {plugin_id}"))?;

        data.set(ETAG, response.etag)
    }

    async fn update(&self, data: &mut ResourceData<'_>, client: &dyn GoCdApi) -> Result<()> {
        if !data.has_change(PLUGIN_CONFIGURATIONS) {
            return skip_update();
        }

        let settings = PluginSettings {
            plugin_id: data.id().to_string(),
            configuration: flatten::plugin_configuration(data.get(PLUGIN_CONFIGURATIONS)),
            etag: data.get_str(ETAG),
        };

        client
            .update_plugin_settings(&settings)
            .await
            .with_action(|| format!("updating plugin setting '{}'", settings.plugin_id))?;

        self.read(data, client).await
    }

    async fn delete(&self, data: &mut ResourceData<'_>, _client: &dyn GoCdApi) -> Result<()> {
        let plugin_id = data.id().to_string();

        warn!(plugin_id = %plugin_id, "GoCD has no API to delete plugin settings");
        data.warn(
            "GoCD has no API to delete plugin settings",
            format!(
                "plugin settings of '{plugin_id}' were removed from state only and stay configured on the server"
            ),
        );

        data.set_id("");
        Ok(())
    }
}

#[async_trait]
impl DataSource for PluginSettingDataSource {
    fn type_name(&self) -> &'static str {
        "gocd_plugin_setting"
    }

    fn schema(&self) -> Schema {
        Schema::new("Reads the settings of an installed plugin.")
            .attribute(
                PLUGIN_ID,
                Attribute::string("The ID of the plugin.").required(),
            )
            .attribute(
                CONFIGURATION,
                properties_data_attribute("The configuration of the plugin."),
            )
            .attribute(
                ETAG,
                Attribute::string("Etag used to track the plugin settings").computed(),
            )
    }

    async fn read(&self, data: &mut ResourceData<'_>, client: &dyn GoCdApi) -> Result<()> {
        let id = data_source_id(data);
        let plugin_id = data.get_str(PLUGIN_ID);

        let response = client
            .get_plugin_settings(&plugin_id)
            .await
            .with_action(|| format!("getting plugin setting {plugin_id}"))?;

        data.set_id(id);
        data.set(
            CONFIGURATION,
            flatten::flatten_plugin_configuration(&response.configuration),
        )?;
        data.set(ETAG, response.etag)
    }
}
