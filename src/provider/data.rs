//! The attribute bag handed to resource and data source handlers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, SchemaError};
use crate::schema::{self, Schema};

use super::diagnostics::{Diagnostic, Diagnostics};
use super::flatten;

static NULL: Value = Value::Null;

/// Recorded state of one resource instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceState {
    /// Identifier of the instance.
    pub id: String,
    /// Attribute values, including the computed ones such as the ETag.
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl InstanceState {
    /// Creates a state record.
    #[must_use]
    pub fn new(id: impl Into<String>, attributes: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            attributes,
        }
    }

    /// Returns an attribute value, `null` when absent.
    #[must_use]
    pub fn get(&self, name: &str) -> &Value {
        self.attributes.get(name).unwrap_or(&NULL)
    }
}

/// Prior and planned attribute values of one instance.
///
/// Handlers read the planned values with [`ResourceData::get`], compare them
/// with the prior ones through [`ResourceData::has_change`] and record what
/// the server returned with [`ResourceData::set`].
#[derive(Debug)]
pub struct ResourceData<'a> {
    schema: &'a Schema,
    id: String,
    prior: Map<String, Value>,
    planned: Map<String, Value>,
    new_resource: bool,
    diagnostics: Diagnostics,
}

impl<'a> ResourceData<'a> {
    fn build(
        schema: &'a Schema,
        id: String,
        prior: Map<String, Value>,
        planned: Map<String, Value>,
        new_resource: bool,
    ) -> Self {
        Self {
            schema,
            id,
            prior,
            planned,
            new_resource,
            diagnostics: Diagnostics::new(),
        }
    }

    /// Data for creating a new instance from its configuration.
    #[must_use]
    pub fn for_create(schema: &'a Schema, config: &Map<String, Value>) -> Self {
        Self::build(schema, String::new(), Map::new(), schema.normalize(config), true)
    }

    /// Data for updating an existing instance to a new configuration.
    ///
    /// Computed attributes the configuration leaves unset keep their prior
    /// values.
    #[must_use]
    pub fn for_update(
        schema: &'a Schema,
        prior: &InstanceState,
        config: &Map<String, Value>,
    ) -> Self {
        let mut planned = schema.normalize(config);

        for (name, attribute) in &schema.attributes {
            if attribute.computed && !planned.contains_key(name) {
                if let Some(value) = prior.attributes.get(name) {
                    planned.insert(name.clone(), value.clone());
                }
            }
        }

        Self::build(
            schema,
            prior.id.clone(),
            prior.attributes.clone(),
            planned,
            false,
        )
    }

    /// Data for reading or deleting a recorded instance.
    #[must_use]
    pub fn from_state(schema: &'a Schema, state: &InstanceState) -> Self {
        Self::build(
            schema,
            state.id.clone(),
            state.attributes.clone(),
            state.attributes.clone(),
            false,
        )
    }

    /// Data for reading a data source.
    #[must_use]
    pub fn for_data_source(schema: &'a Schema, config: &Map<String, Value>) -> Self {
        let planned = schema.normalize(config);
        Self::build(schema, String::new(), planned.clone(), planned, false)
    }

    /// Identifier of the instance, empty until one is assigned.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Assigns the identifier; an empty one drops the instance from state.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// Returns true while the instance is being created.
    #[must_use]
    pub const fn is_new_resource(&self) -> bool {
        self.new_resource
    }

    /// Returns the planned value of an attribute, `null` when absent.
    #[must_use]
    pub fn get(&self, name: &str) -> &Value {
        self.planned.get(name).unwrap_or(&NULL)
    }

    /// Returns an attribute as a string, empty when absent.
    #[must_use]
    pub fn get_str(&self, name: &str) -> String {
        flatten::to_string(self.get(name))
    }

    /// Returns an attribute as a boolean, false when absent.
    #[must_use]
    pub fn get_bool(&self, name: &str) -> bool {
        flatten::to_bool(self.get(name))
    }

    /// Sets an attribute value.
    ///
    /// # Errors
    ///
    /// Returns an error if the attribute is not part of the schema.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let Some(attribute) = self.schema.get(name) else {
            return Err(SchemaError::UnknownAttribute {
                name: name.to_string(),
            }
            .into());
        };

        let value = schema::normalize_value(attribute, &value.into());
        self.planned.insert(name.to_string(), value);
        Ok(())
    }

    /// Returns true if the planned value differs from the prior one.
    #[must_use]
    pub fn has_change(&self, name: &str) -> bool {
        let (old, new) = self.get_change(name);
        old != new
    }

    /// Returns true if any of the attributes changed.
    #[must_use]
    pub fn has_changes(&self, names: &[&str]) -> bool {
        names.iter().any(|name| self.has_change(name))
    }

    /// Returns the prior and planned value of an attribute.
    #[must_use]
    pub fn get_change(&self, name: &str) -> (&Value, &Value) {
        (self.prior.get(name).unwrap_or(&NULL), self.get(name))
    }

    /// Records a warning for the user.
    pub fn warn(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.diagnostics
            .push(Diagnostic::warning(summary).with_detail(detail));
    }

    /// Warnings recorded so far.
    #[must_use]
    pub const fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Splits into the resulting state and the recorded warnings.
    ///
    /// The state is `None` once the identifier has been cleared.
    #[must_use]
    pub fn finish(self) -> (Option<InstanceState>, Diagnostics) {
        let state = if self.id.is_empty() {
            None
        } else {
            Some(InstanceState::new(self.id, self.planned))
        };
        (state, self.diagnostics)
    }

    /// Turns the data into the resulting state, `None` once the id is cleared.
    #[must_use]
    pub fn into_state(self) -> Option<InstanceState> {
        self.finish().0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{properties_attribute, Attribute};
    use serde_json::json;

    fn schema() -> Schema {
        Schema::new("test")
            .attribute("profile_id", Attribute::string("id").required().force_new())
            .attribute("properties", properties_attribute("props"))
            .attribute("etag", Attribute::string("etag").computed())
    }

    fn config(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_create_data_starts_without_id() {
        let schema = schema();
        let data = ResourceData::for_create(&schema, &config(json!({ "profile_id": "p1" })));

        assert!(data.is_new_resource());
        assert_eq!(data.id(), "");
        assert_eq!(data.get_str("profile_id"), "p1");
        assert!(data.get("etag").is_null());
        assert!(data.into_state().is_none());
    }

    #[test]
    fn test_set_rejects_unknown_attribute() {
        let schema = schema();
        let mut data = ResourceData::for_create(&schema, &Map::new());

        assert!(data.set("etag", "abc").is_ok());
        assert!(data.set("bogus", "abc").is_err());
    }

    #[test]
    fn test_update_keeps_computed_values_and_detects_changes() {
        let schema = schema();
        let prior = InstanceState::new(
            "p1",
            config(json!({
                "profile_id": "p1",
                "etag": "e1",
                "properties": [{ "key": "a", "value": "1" }, { "key": "b", "value": "2" }]
            })),
        );

        let same = ResourceData::for_update(
            &schema,
            &prior,
            &config(json!({
                "profile_id": "p1",
                "properties": [{ "key": "b", "value": "2" }, { "key": "a", "value": "1" }]
            })),
        );
        assert_eq!(same.get_str("etag"), "e1");
        assert!(!same.has_changes(&["properties", "profile_id"]));

        let changed = ResourceData::for_update(
            &schema,
            &prior,
            &config(json!({
                "profile_id": "p1",
                "properties": [{ "key": "a", "value": "3" }]
            })),
        );
        assert!(changed.has_change("properties"));
        assert!(!changed.has_change("profile_id"));
    }

    #[test]
    fn test_cleared_id_drops_state() {
        let schema = schema();
        let state = InstanceState::new("p1", config(json!({ "profile_id": "p1" })));
        let mut data = ResourceData::from_state(&schema, &state);

        data.set_id("");
        data.warn("gone", "cleared");

        let (state, diagnostics) = data.finish();
        assert!(state.is_none());
        assert_eq!(diagnostics.len(), 1);
    }
}
