//! `gocd_pipeline`: a pipeline defined by JSON or YAML content.

use async_trait::async_trait;

use crate::error::{Result, SchemaError};
use crate::gocd::{GoCdApi, PipelineConfig, PipelineCreateOptions};
use crate::provider::flatten::{self, ContentType};
use crate::provider::{Resource, ResourceData};
use crate::schema::names::{CONFIG, ETAG, GROUP, NAME, PAUSE_ON_CREATION, PAUSE_REASON, YAML};
use crate::schema::{Attribute, Schema};

use super::{ensure_id, id_or, skip_update, WithAction};

/// Manages a pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineResource;

#[async_trait]
impl Resource for PipelineResource {
    fn type_name(&self) -> &'static str {
        "gocd_pipeline"
    }

    fn schema(&self) -> Schema {
        Schema::new("Creates and manages a GoCD pipeline from its JSON or YAML config.")
            .attribute(
                NAME,
                Attribute::string(
                    "The name of the pipeline to be created (this should be the same that would be passed under `config`).",
                )
                .required()
                .force_new(),
            )
            .attribute(
                GROUP,
                Attribute::string("Name of the pipeline group that this pipeline should be part of.")
                    .required()
                    .force_new(),
            )
            .attribute(
                CONFIG,
                Attribute::string(
                    "The config of the pipeline to be created (it can take in yaml/json data based on the attribute set).",
                )
                .required(),
            )
            .attribute(
                PAUSE_ON_CREATION,
                Attribute::bool("Enabling this would have the pipeline paused on creation")
                    .optional()
                    .force_new(),
            )
            .attribute(
                PAUSE_REASON,
                Attribute::string("Reason for pausing the pipeline on start")
                    .optional()
                    .force_new(),
            )
            .attribute(
                YAML,
                Attribute::bool(
                    "Would be set to true when pipeline config declared under `config` is of type yaml.",
                )
                .optional()
                .computed()
                .force_new(),
            )
            .attribute(
                ETAG,
                Attribute::string("Etag used to track the pipeline config")
                    .optional()
                    .computed(),
            )
    }

    async fn create(&self, data: &mut ResourceData<'_>, client: &dyn GoCdApi) -> Result<()> {
        if !data.is_new_resource() {
            return Ok(());
        }

        let id = id_or(data, NAME);

        let (config, content_type) = flatten::parse_pipeline_config(&data.get_str(CONFIG))?;
        data.set(YAML, content_type == ContentType::Yaml)?;

        let config_name = config.get(NAME).map(flatten::to_string).unwrap_or_default();
        if config_name != id {
            return Err(SchemaError::NameMismatch {
                attribute: id,
                config: config_name,
            }
            .into());
        }

        let pipeline = PipelineConfig {
            name: id.clone(),
            group: data.get_str(GROUP),
            config,
            create_options: PipelineCreateOptions {
                pause_pipeline: data.get_bool(PAUSE_ON_CREATION),
                pause_reason: data.get_str(PAUSE_REASON),
            },
            etag: String::new(),
        };

        client
            .create_pipeline(&pipeline)
            .await
            .with_action(|| format!("creating pipeline '{id}'"))?;

        data.set_id(id);

        self.read(data, client).await
    }

    async fn read(&self, data: &mut ResourceData<'_>, client: &dyn GoCdApi) -> Result<()> {
        let name = data.get_str(NAME);

        let response = client
            .get_pipeline_config(&name)
            .await
            .with_action(|| format!("getting pipeline config {name}"))?;

        data.set(ETAG, response.etag)
    }

    async fn update(&self, data: &mut ResourceData<'_>, client: &dyn GoCdApi) -> Result<()> {
        if !data.has_changes(&[CONFIG]) {
            return skip_update();
        }

        let config = flatten::decode_pipeline_config(&data.get_str(CONFIG), data.get_bool(YAML))?;

        let pipeline = PipelineConfig {
            name: data.get_str(NAME),
            group: data.get_str(GROUP),
            config,
            create_options: PipelineCreateOptions::default(),
            etag: data.get_str(ETAG),
        };

        client
            .update_pipeline_config(&pipeline)
            .await
            .with_action(|| format!("updating pipeline '{}'", pipeline.name))?;

        self.read(data, client).await
    }

    async fn delete(&self, data: &mut ResourceData<'_>, client: &dyn GoCdApi) -> Result<()> {
        ensure_id(data)?;

        let name = data.get_str(NAME);

        client
            .delete_pipeline(&name)
            .await
            .with_action(|| format!("deleting pipeline {name}"))?;

        data.set_id("");
        Ok(())
    }
}
