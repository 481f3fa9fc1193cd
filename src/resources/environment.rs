//! `gocd_environment`: environments grouping pipelines and variables.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::gocd::{Environment, GoCdApi};
use crate::provider::{flatten, DataSource, Resource, ResourceData};
use crate::schema::names::{ENVIRONMENT_VARIABLES, ETAG, NAME, PIPELINES};
use crate::schema::{environment_variables_attribute, Attribute, Elem, Schema, ValueType};

use super::{data_source_id, ensure_id, id_or, skip_update, WithAction};

/// Manages an environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvironmentResource;

/// Reads an environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvironmentDataSource;

fn environment(data: &ResourceData<'_>, name: String, etag: String) -> Environment {
    Environment {
        name,
        pipelines: flatten::environment_pipelines(data.get(PIPELINES)),
        environment_variables: flatten::environment_variables(data.get(ENVIRONMENT_VARIABLES)),
        etag,
    }
}

#[async_trait]
impl Resource for EnvironmentResource {
    fn type_name(&self) -> &'static str {
        "gocd_environment"
    }

    fn schema(&self) -> Schema {
        Schema::new("Creates and manages GoCD environments.")
            .attribute(
                NAME,
                Attribute::string("The name of the environment.")
                    .required()
                    .force_new(),
            )
            .attribute(
                PIPELINES,
                Attribute::set(
                    "List of pipeline names that should be added to this environment.",
                    Elem::Primitive(ValueType::String),
                )
                .optional(),
            )
            .attribute(ENVIRONMENT_VARIABLES, environment_variables_attribute())
            .attribute(
                ETAG,
                Attribute::string("Etag used to track the environment.")
                    .optional()
                    .computed(),
            )
    }

    async fn create(&self, data: &mut ResourceData<'_>, client: &dyn GoCdApi) -> Result<()> {
        if !data.is_new_resource() {
            return Ok(());
        }

        let name = id_or(data, NAME);
        let request = environment(data, name.clone(), String::new());

        client
            .create_environment(&request)
            .await
            .with_action(|| format!("creating environment '{name}'"))?;

        data.set_id(name);

        self.read(data, client).await
    }

    async fn read(&self, data: &mut ResourceData<'_>, client: &dyn GoCdApi) -> Result<()> {
        let name = data.get_str(NAME);

        let response = client
            .get_environment(&name)
            .await
            .with_action(|| format!("getting environment {name}"))?;

        data.set(ETAG, response.etag)
    }

    async fn update(&self, data: &mut ResourceData<'_>, client: &dyn GoCdApi) -> Result<()> {
        if !data.has_changes(&[PIPELINES, ENVIRONMENT_VARIABLES]) {
            return skip_update();
        }

        let request = environment(data, data.id().to_string(), data.get_str(ETAG));

        client
            .update_environment(&request)
            .await
            .with_action(|| format!("updating environment '{}'", request.name))?;

        self.read(data, client).await
    }

    async fn delete(&self, data: &mut ResourceData<'_>, client: &dyn GoCdApi) -> Result<()> {
        ensure_id(data)?;

        let name = data.id().to_string();

        client
            .delete_environment(&name)
            .await
            .with_action(|| format!("deleting environment {name}"))?;

        data.set_id("");
        Ok(())
    }
}

#[async_trait]
impl DataSource for EnvironmentDataSource {
    fn type_name(&self) -> &'static str {
        "gocd_environment"
    }

    fn schema(&self) -> Schema {
        Schema::new("Reads an existing environment.")
            .attribute(
                NAME,
                Attribute::string("The name of the environment.").required(),
            )
            .attribute(
                PIPELINES,
                Attribute::list(
                    "Pipelines that are part of this environment.",
                    Elem::Primitive(ValueType::String),
                )
                .computed(),
            )
            .attribute(
                ENVIRONMENT_VARIABLES,
                environment_variables_attribute().into_computed(),
            )
            .attribute(
                ETAG,
                Attribute::string("Etag used to track the environment.").computed(),
            )
    }

    async fn read(&self, data: &mut ResourceData<'_>, client: &dyn GoCdApi) -> Result<()> {
        let id = data_source_id(data);
        let name = data.get_str(NAME);

        let response = client
            .get_environment(&name)
            .await
            .with_action(|| format!("getting environment {name}"))?;

        let variables = flatten::flattened(data, ENVIRONMENT_VARIABLES, &response.environment_variables)?;
        let pipelines: Vec<Value> = response
            .pipelines
            .into_iter()
            .map(|pipeline| Value::String(pipeline.name))
            .collect();

        data.set_id(id);
        data.set(PIPELINES, pipelines)?;
        data.set(ENVIRONMENT_VARIABLES, variables)?;
        data.set(ETAG, response.etag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gocd::{EnvironmentPipeline, EnvironmentVariable, MockGoCdApi};
    use crate::provider::InstanceState;
    use crate::resources::object;
    use serde_json::json;

    fn config(pipelines: &[&str]) -> serde_json::Map<String, serde_json::Value> {
        object(json!({
            "name": "prod",
            "pipelines": pipelines,
            "environment_variables": [
                { "name": "REGION", "value": "eu-west-1" },
                { "name": "TOKEN", "encrypted_value": "AES:tok", "secure": true }
            ]
        }))
    }

    fn fetched(etag: &'static str) -> impl Fn(&str) -> Result<Environment> + Send + 'static {
        move |name| {
            Ok(Environment {
                name: name.to_string(),
                etag: etag.to_string(),
                ..Environment::default()
            })
        }
    }

    #[tokio::test]
    async fn test_create_sends_pipelines_and_variables() {
        let mut mock = MockGoCdApi::new();
        mock.expect_create_environment()
            .withf(|env: &Environment| {
                env.name == "prod"
                    && env.pipelines.len() == 2
                    && env
                        .environment_variables
                        .iter()
                        .any(|v| v.name == "TOKEN" && v.secure && v.encrypted_value == "AES:tok")
            })
            .times(1)
            .returning(|env| Ok(env.clone()));
        mock.expect_get_environment().returning(fetched("\"v1\""));

        let schema = EnvironmentResource.schema();
        let mut data = ResourceData::for_create(&schema, &config(&["deploy", "build"]));
        EnvironmentResource.create(&mut data, &mock).await.unwrap();

        let state = data.into_state().unwrap();
        assert_eq!(state.id, "prod");
        assert_eq!(state.get("pipelines"), &json!(["build", "deploy"]));
    }

    #[tokio::test]
    async fn test_reordered_pipelines_are_not_a_change() {
        let schema = EnvironmentResource.schema();
        let prior = InstanceState::new("prod", schema.normalize(&config(&["build", "deploy"])));
        let mock = MockGoCdApi::new();

        let mut data = ResourceData::for_update(&schema, &prior, &config(&["deploy", "build"]));
        EnvironmentResource.update(&mut data, &mock).await.unwrap();
    }

    #[tokio::test]
    async fn test_added_pipeline_updates_environment() {
        let schema = EnvironmentResource.schema();
        let mut attributes = schema.normalize(&config(&["build"]));
        attributes.insert(String::from("etag"), json!("\"v1\""));
        let prior = InstanceState::new("prod", attributes);

        let mut mock = MockGoCdApi::new();
        mock.expect_update_environment()
            .withf(|env: &Environment| env.pipelines.len() == 2 && env.etag == "\"v1\"")
            .times(1)
            .returning(|env| Ok(env.clone()));
        mock.expect_get_environment().returning(fetched("\"v2\""));

        let mut data = ResourceData::for_update(&schema, &prior, &config(&["build", "deploy"]));
        EnvironmentResource.update(&mut data, &mock).await.unwrap();

        assert_eq!(data.get_str("etag"), "\"v2\"");
    }

    #[tokio::test]
    async fn test_data_source_flattens_environment() {
        let mut mock = MockGoCdApi::new();
        mock.expect_get_environment().returning(|name| {
            Ok(Environment {
                name: name.to_string(),
                pipelines: vec![EnvironmentPipeline {
                    name: String::from("build"),
                }],
                environment_variables: vec![EnvironmentVariable {
                    name: String::from("REGION"),
                    value: String::from("eu-west-1"),
                    ..EnvironmentVariable::default()
                }],
                etag: String::from("\"v3\""),
            })
        });

        let schema = EnvironmentDataSource.schema();
        let mut data = ResourceData::for_data_source(&schema, &object(json!({ "name": "prod" })));
        EnvironmentDataSource.read(&mut data, &mock).await.unwrap();

        assert_eq!(data.get("pipelines"), &json!(["build"]));
        assert_eq!(
            data.get("environment_variables"),
            &json!([{ "name": "REGION", "value": "eu-west-1", "secure": false }])
        );
        assert_eq!(data.get_str("etag"), "\"v3\"");
    }
}
