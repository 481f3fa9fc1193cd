//! Schema surface of resources and data sources.
//!
//! A [`Schema`] describes the attributes a block accepts. It is used to
//! validate manifest blocks, to bring set-typed values into a canonical order,
//! and to tell which attribute changes force a replacement.

mod fragments;
pub mod names;

pub use fragments::{
    environment_variables_attribute, material_attribute, properties_attribute,
    properties_data_attribute, properties_schema, rules_attribute,
};

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::provider::{Diagnostic, Diagnostics};

/// Type of an attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// UTF-8 string.
    String,
    /// Boolean.
    Bool,
    /// Ordered collection.
    List,
    /// Unordered collection without duplicates.
    Set,
    /// String keyed map.
    Map,
}

impl ValueType {
    /// Returns the name used in diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Bool => "bool",
            Self::List => "list",
            Self::Set => "set",
            Self::Map => "map",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string() || value.is_number() || value.is_boolean(),
            Self::Bool => {
                value.is_boolean() || matches!(value.as_str(), Some("true" | "false"))
            }
            Self::List | Self::Set => value.is_array(),
            Self::Map => value.is_object(),
        }
    }
}

/// Element schema of a collection attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Elem {
    /// Elements are plain values.
    Primitive(ValueType),
    /// Elements are nested blocks.
    Block(Schema),
}

/// Environment variable consulted when an attribute is not configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvDefault {
    /// Variable name.
    pub var: String,
    /// Value used when the variable is unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
}

impl EnvDefault {
    /// Resolves the default from the process environment.
    #[must_use]
    pub fn resolve(&self) -> Option<String> {
        std::env::var(&self.var)
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| self.fallback.clone())
    }
}

/// A single attribute of a schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    /// Value type.
    #[serde(rename = "type")]
    pub value_type: ValueType,
    /// Human readable description.
    pub description: String,
    /// Must be configured.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    /// May be configured.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
    /// May be set by the provider.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub computed: bool,
    /// Changing the value replaces the object.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub force_new: bool,
    /// Value is hidden from output.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub sensitive: bool,
    /// Maximum number of collection elements.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    /// Element schema for collections.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elem: Option<Elem>,
    /// Environment default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env_default: Option<EnvDefault>,
}

impl Attribute {
    fn new(value_type: ValueType, description: impl Into<String>, elem: Option<Elem>) -> Self {
        Self {
            value_type,
            description: description.into(),
            required: false,
            optional: false,
            computed: false,
            force_new: false,
            sensitive: false,
            max_items: None,
            elem,
            env_default: None,
        }
    }

    /// A string attribute.
    #[must_use]
    pub fn string(description: impl Into<String>) -> Self {
        Self::new(ValueType::String, description, None)
    }

    /// A boolean attribute.
    #[must_use]
    pub fn bool(description: impl Into<String>) -> Self {
        Self::new(ValueType::Bool, description, None)
    }

    /// An ordered collection.
    #[must_use]
    pub fn list(description: impl Into<String>, elem: Elem) -> Self {
        Self::new(ValueType::List, description, Some(elem))
    }

    /// An unordered collection.
    #[must_use]
    pub fn set(description: impl Into<String>, elem: Elem) -> Self {
        Self::new(ValueType::Set, description, Some(elem))
    }

    /// A map with values of the given type.
    #[must_use]
    pub fn map(description: impl Into<String>, value_type: ValueType) -> Self {
        Self::new(
            ValueType::Map,
            description,
            Some(Elem::Primitive(value_type)),
        )
    }

    /// Marks the attribute as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Marks the attribute as optional.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Marks the attribute as computed.
    #[must_use]
    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    /// Changes to this attribute replace the object.
    #[must_use]
    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    /// Hides the value from output.
    #[must_use]
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// Limits the number of collection elements.
    #[must_use]
    pub fn max_items(mut self, max: usize) -> Self {
        self.max_items = Some(max);
        self
    }

    /// Reads the value from `var` when unset, falling back to `fallback`.
    #[must_use]
    pub fn env_default(mut self, var: &str, fallback: Option<&str>) -> Self {
        self.env_default = Some(EnvDefault {
            var: var.to_string(),
            fallback: fallback.map(str::to_string),
        });
        self
    }

    /// Turns the attribute into one only the provider sets, as data sources expose it.
    #[must_use]
    pub fn into_computed(mut self) -> Self {
        self.required = false;
        self.optional = false;
        self.force_new = false;
        self.max_items = None;
        self.computed = true;
        self
    }

    /// Returns true when the attribute can only be set by the provider.
    #[must_use]
    pub const fn is_computed_only(&self) -> bool {
        self.computed && !self.optional && !self.required
    }

    fn check(&self, value: &Value, path: &str, diagnostics: &mut Diagnostics) {
        if !self.value_type.accepts(value) {
            diagnostics.push(
                Diagnostic::error("Incorrect attribute value type")
                    .with_detail(format!(
                        "Inappropriate value for attribute \"{path}\": {} required.",
                        self.value_type.as_str()
                    ))
                    .with_attribute(path),
            );
            return;
        }

        match (self.value_type, &self.elem, value) {
            (ValueType::List | ValueType::Set, Some(elem), Value::Array(items)) => {
                if let Some(max) = self.max_items.filter(|max| items.len() > *max) {
                    diagnostics.push(
                        Diagnostic::error("Too many list items")
                            .with_detail(format!(
                                "Attribute \"{path}\" supports {max} item maximum, but config has {}.",
                                items.len()
                            ))
                            .with_attribute(path),
                    );
                }
                for (index, item) in items.iter().enumerate() {
                    check_elem(elem, item, &format!("{path}[{index}]"), diagnostics);
                }
            }
            (ValueType::Map, Some(elem), Value::Object(entries)) => {
                for (key, item) in entries {
                    check_elem(elem, item, &format!("{path}.{key}"), diagnostics);
                }
            }
            _ => {}
        }
    }
}

fn check_elem(elem: &Elem, value: &Value, path: &str, diagnostics: &mut Diagnostics) {
    match elem {
        Elem::Primitive(value_type) => {
            if !value.is_null() && !value_type.accepts(value) {
                diagnostics.push(
                    Diagnostic::error("Incorrect attribute value type")
                        .with_detail(format!(
                            "Inappropriate value for element \"{path}\": {} required.",
                            value_type.as_str()
                        ))
                        .with_attribute(path),
                );
            }
        }
        Elem::Block(schema) => match value {
            Value::Object(block) => schema.validate_block(block, Some(path), diagnostics),
            _ => diagnostics.push(
                Diagnostic::error("Incorrect attribute value type")
                    .with_detail(format!("Element \"{path}\" must be a block."))
                    .with_attribute(path),
            ),
        },
    }
}

/// The attributes of a resource, data source, provider or nested block.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Schema {
    /// Human readable description.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Attributes by name.
    pub attributes: BTreeMap<String, Attribute>,
}

impl Schema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Adds an attribute.
    #[must_use]
    pub fn attribute(mut self, name: &str, attribute: Attribute) -> Self {
        self.attributes.insert(name.to_string(), attribute);
        self
    }

    /// Looks up an attribute.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Returns true if the attribute exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Names of the attributes whose change forces a replacement.
    #[must_use]
    pub fn force_new_attributes(&self) -> Vec<&str> {
        self.attributes
            .iter()
            .filter(|(_, attribute)| attribute.force_new)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Validates a configuration block.
    ///
    /// Reports unknown attributes, missing required attributes (unless an
    /// environment default may supply them), values for computed-only
    /// attributes and type mismatches, recursing into nested blocks.
    #[must_use]
    pub fn validate(&self, config: &Map<String, Value>) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        self.validate_block(config, None, &mut diagnostics);
        diagnostics
    }

    fn validate_block(
        &self,
        config: &Map<String, Value>,
        prefix: Option<&str>,
        diagnostics: &mut Diagnostics,
    ) {
        let path_of = |name: &str| prefix.map_or_else(|| name.to_string(), |p| format!("{p}.{name}"));

        for (name, value) in config {
            let path = path_of(name);

            let Some(attribute) = self.get(name) else {
                diagnostics.push(
                    Diagnostic::error("Unsupported argument")
                        .with_detail(format!("An argument named \"{name}\" is not expected here."))
                        .with_attribute(path),
                );
                continue;
            };

            if value.is_null() {
                continue;
            }

            if attribute.is_computed_only() {
                diagnostics.push(
                    Diagnostic::error("Value for unconfigurable attribute")
                        .with_detail(format!(
                            "Can't configure a value for \"{name}\": its value will be decided automatically."
                        ))
                        .with_attribute(path),
                );
                continue;
            }

            attribute.check(value, &path, diagnostics);
        }

        for (name, attribute) in &self.attributes {
            let missing = config.get(name).is_none_or(Value::is_null);
            if attribute.required && attribute.env_default.is_none() && missing {
                diagnostics.push(
                    Diagnostic::error("Missing required argument")
                        .with_detail(format!(
                            "The argument \"{name}\" is required, but no definition was found."
                        ))
                        .with_attribute(path_of(name)),
                );
            }
        }
    }

    /// Brings values into a canonical form.
    ///
    /// Null values are dropped, nested blocks are normalized recursively and
    /// set elements are deduplicated and sorted, so two configurations that
    /// differ only in set order compare equal.
    #[must_use]
    pub fn normalize(&self, values: &Map<String, Value>) -> Map<String, Value> {
        values
            .iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(name, value)| {
                let normalized = self
                    .get(name)
                    .map_or_else(|| value.clone(), |attribute| normalize_value(attribute, value));
                (name.clone(), normalized)
            })
            .collect()
    }
}

/// Normalizes a single attribute value.
#[must_use]
pub fn normalize_value(attribute: &Attribute, value: &Value) -> Value {
    let Value::Array(items) = value else {
        return value.clone();
    };

    let mut items: Vec<Value> = match &attribute.elem {
        Some(Elem::Block(schema)) => items
            .iter()
            .map(|item| match item {
                Value::Object(block) => Value::Object(schema.normalize(block)),
                other => other.clone(),
            })
            .collect(),
        _ => items.clone(),
    };

    if attribute.value_type == ValueType::Set {
        items.sort_by_cached_key(Value::to_string);
        items.dedup();
    }

    Value::Array(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_schema() -> Schema {
        Schema::new("sample")
            .attribute("name", Attribute::string("name").required().force_new())
            .attribute("etag", Attribute::string("etag").computed())
            .attribute(
                "properties",
                Attribute::set("properties", Elem::Block(properties_schema())).optional(),
            )
            .attribute(
                "tags",
                Attribute::map("tags", ValueType::String).optional(),
            )
    }

    fn as_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_validate_accepts_valid_config() {
        let config = as_map(json!({
            "name": "sample",
            "properties": [{ "key": "Url", "value": "https://example.com" }],
            "tags": { "team": "ci" }
        }));

        assert!(sample_schema().validate(&config).is_empty());
    }

    #[test]
    fn test_validate_reports_every_problem() {
        let config = as_map(json!({
            "etag": "abc",
            "unknown": true,
            "properties": [{ "key": 42, "value": "x", "bogus": "y" }]
        }));

        let diagnostics = sample_schema().validate(&config);
        let summaries: Vec<&str> = diagnostics.iter().map(|d| d.summary.as_str()).collect();

        assert!(summaries.contains(&"Unsupported argument"));
        assert!(summaries.contains(&"Value for unconfigurable attribute"));
        assert!(summaries.contains(&"Missing required argument"));
        assert!(
            diagnostics
                .iter()
                .any(|d| d.attribute.as_deref() == Some("properties[0].bogus"))
        );
    }

    #[test]
    fn test_validate_rejects_wrong_types() {
        let config = as_map(json!({ "name": ["a"], "tags": { "team": ["ci"] } }));
        let diagnostics = sample_schema().validate(&config);

        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics.iter().all(|d| d.summary == "Incorrect attribute value type"));
    }

    #[test]
    fn test_required_with_env_default_is_not_missing() {
        let schema = Schema::new("provider").attribute(
            "base_url",
            Attribute::string("url").required().env_default("GOCD_BASE_URL", None),
        );

        assert!(schema.validate(&Map::new()).is_empty());
    }

    #[test]
    fn test_normalize_sorts_sets() {
        let schema = sample_schema();
        let first = as_map(json!({
            "name": "sample",
            "properties": [{ "key": "b", "value": "2" }, { "key": "a", "value": "1" }],
            "etag": null
        }));
        let second = as_map(json!({
            "properties": [{ "value": "1", "key": "a" }, { "key": "b", "value": "2" }],
            "name": "sample"
        }));

        assert_eq!(schema.normalize(&first), schema.normalize(&second));
        assert!(!schema.normalize(&first).contains_key("etag"));
    }

    #[test]
    fn test_force_new_attributes() {
        assert_eq!(sample_schema().force_new_attributes(), vec!["name"]);
    }
}
