//! Conversions between schema values and the GoCD client types.

use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::error::{ProviderError, Result, SchemaError};
use crate::gocd::{
    EnvironmentPipeline, EnvironmentVariable, Material, MaterialAttributes, PluginConfiguration,
    Rule,
};
use crate::schema::names;

use super::data::ResourceData;

static NULL: Value = Value::Null;

/// Formats of pipeline config content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    /// JSON document.
    Json,
    /// YAML document.
    Yaml,
}

/// Reads a value as a string; absent values become empty.
#[must_use]
pub fn to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Reads a value as a boolean; absent values become false.
#[must_use]
pub fn to_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s == "true",
        _ => false,
    }
}

fn elements(value: &Value) -> impl Iterator<Item = &Map<String, Value>> {
    value
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
}

fn field<'a>(block: &'a Map<String, Value>, name: &str) -> &'a Value {
    block.get(name).unwrap_or(&NULL)
}

/// Builds plugin properties from a `properties` style block list.
#[must_use]
pub fn plugin_configuration(value: &Value) -> Vec<PluginConfiguration> {
    elements(value)
        .map(|block| PluginConfiguration {
            key: to_string(field(block, names::KEY)),
            value: to_string(field(block, names::VALUE)),
            encrypted_value: to_string(field(block, names::ENCRYPTED_VALUE)),
            is_secure: to_bool(field(block, names::IS_SECURE)),
        })
        .collect()
}

/// Turns plugin properties into a block list.
#[must_use]
pub fn flatten_plugin_configuration(properties: &[PluginConfiguration]) -> Value {
    properties
        .iter()
        .map(|property| {
            let mut block = Map::new();
            block.insert(names::KEY.to_string(), json!(property.key));
            if !property.value.is_empty() {
                block.insert(names::VALUE.to_string(), json!(property.value));
            }
            if !property.encrypted_value.is_empty() {
                block.insert(
                    names::ENCRYPTED_VALUE.to_string(),
                    json!(property.encrypted_value),
                );
                block.insert(names::IS_SECURE.to_string(), json!(true));
            }
            Value::Object(block)
        })
        .collect()
}

/// Decodes a list of string maps.
///
/// # Errors
///
/// Returns an error when the value is not a list of maps or a map value is
/// not a string.
pub fn rules(attribute: &str, value: &Value) -> Result<Vec<Rule>> {
    let items = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Array(items) => items,
        _ => {
            return Err(ProviderError::from(SchemaError::invalid(
                attribute,
                "expected a list of maps",
            )));
        }
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let Value::Object(entries) = item else {
                return Err(ProviderError::from(SchemaError::invalid(
                    attribute,
                    format!("element {index} is not a map"),
                )));
            };

            entries
                .iter()
                .map(|(key, value)| match value {
                    Value::String(s) => Ok((key.clone(), s.clone())),
                    _ => Err(ProviderError::from(SchemaError::invalid(
                        attribute,
                        format!("value of '{key}' in element {index} is not a string"),
                    ))),
                })
                .collect::<Result<Rule>>()
        })
        .collect()
}

/// Builds the material from its one-element block.
///
/// # Errors
///
/// Returns an error when the material block or its `attributes` block is
/// missing.
pub fn material(value: &Value) -> Result<Material> {
    let missing = |attribute: &str| -> ProviderError {
        SchemaError::MissingBlock {
            attribute: attribute.to_string(),
        }
        .into()
    };

    let block = elements(value).next().ok_or_else(|| missing(names::MATERIAL))?;
    let attributes = elements(field(block, names::ATTRIBUTES))
        .next()
        .ok_or_else(|| missing(names::ATTRIBUTES))?;

    let text = |name: &str| to_string(field(attributes, name));
    let flag = |name: &str| to_bool(field(attributes, name));

    Ok(Material {
        material_type: to_string(field(block, names::TYPE)),
        fingerprint: to_string(field(block, names::FINGERPRINT)),
        attributes: MaterialAttributes {
            url: text(names::URL),
            username: text(names::USERNAME),
            password: text(names::PASSWORD),
            encrypted_password: text(names::ENCRYPTED_PASSWORD),
            branch: text(names::BRANCH),
            auto_update: attributes
                .get(names::AUTO_UPDATE)
                .filter(|v| !v.is_null())
                .is_none_or(to_bool),
            check_externals: flag(names::CHECK_EXTERNALS),
            use_tickets: flag(names::USE_TICKETS),
            view: text(names::VIEW),
            port: text(names::PORT),
            project_path: text(names::PROJECT_PATH),
            domain: text(names::DOMAIN),
            reference: text(names::REF),
            name: text(names::NAME),
            stage: text(names::STAGE),
            pipeline: text(names::PIPELINE),
            ignore_for_scheduling: flag(names::IGNORE_FOR_SCHEDULING),
            destination: text(names::DESTINATION),
            invert_filter: flag(names::INVERT_FILTER),
        },
    })
}

/// Turns a material into its one-element block.
///
/// # Errors
///
/// Returns an error if the material cannot be represented as a value.
pub fn flatten_material(material: &Material) -> Result<Value> {
    let attributes = to_value(names::ATTRIBUTES, &material.attributes)?;

    let mut block = Map::new();
    block.insert(names::TYPE.to_string(), json!(material.material_type));
    if !material.fingerprint.is_empty() {
        block.insert(names::FINGERPRINT.to_string(), json!(material.fingerprint));
    }
    block.insert(names::ATTRIBUTES.to_string(), json!([attributes]));

    Ok(json!([block]))
}

/// Builds environment variables from their block list.
#[must_use]
pub fn environment_variables(value: &Value) -> Vec<EnvironmentVariable> {
    elements(value)
        .map(|block| EnvironmentVariable {
            name: to_string(field(block, names::NAME)),
            value: to_string(field(block, names::VALUE)),
            encrypted_value: to_string(field(block, names::ENCRYPTED_VALUE)),
            secure: to_bool(field(block, names::SECURE)),
        })
        .collect()
}

/// Builds environment pipeline references from a list of names.
#[must_use]
pub fn environment_pipelines(value: &Value) -> Vec<EnvironmentPipeline> {
    value
        .as_array()
        .into_iter()
        .flatten()
        .map(|name| EnvironmentPipeline {
            name: to_string(name),
        })
        .collect()
}

/// Serializes a value for state.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_value<T: Serialize + ?Sized>(attribute: &str, value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| {
        ProviderError::from(SchemaError::invalid(
            attribute,
            format!("flattening failed: {e}"),
        ))
    })
}

/// Serializes a response field for a data source, clearing the id on failure.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn flattened<T: Serialize + ?Sized>(
    data: &mut ResourceData<'_>,
    attribute: &str,
    value: &T,
) -> Result<Value> {
    to_value(attribute, value).map_err(|err| {
        data.set_id("");
        ProviderError::operation(format!("flattening {attribute} obtained"), err)
    })
}

/// Detects and parses pipeline config content.
///
/// JSON is tried first, then YAML; the content must describe a mapping.
///
/// # Errors
///
/// Returns [`SchemaError::UnknownContentType`] when the content is neither.
pub fn parse_pipeline_config(content: &str) -> Result<(Map<String, Value>, ContentType)> {
    if let Ok(config) = serde_json::from_str::<Map<String, Value>>(content) {
        debug!("pipeline config detected as JSON");
        return Ok((config, ContentType::Json));
    }

    if let Ok(Value::Object(config)) = serde_yaml::from_str::<Value>(content) {
        debug!("pipeline config detected as YAML");
        return Ok((config, ContentType::Yaml));
    }

    Err(SchemaError::UnknownContentType.into())
}

/// Parses pipeline config content of a known format.
///
/// # Errors
///
/// Returns an error if the content does not decode into a mapping.
pub fn decode_pipeline_config(content: &str, yaml: bool) -> Result<Map<String, Value>> {
    let decoded = if yaml {
        serde_yaml::from_str::<Map<String, Value>>(content)
            .map_err(|e| SchemaError::invalid(names::CONFIG, format!("decoding yaml pipeline config: {e}")))
    } else {
        serde_json::from_str::<Map<String, Value>>(content)
            .map_err(|e| SchemaError::invalid(names::CONFIG, format!("decoding json pipeline config: {e}")))
    };

    Ok(decoded?)
}

/// Generates an identifier for objects without a natural one.
#[must_use]
pub fn random_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
