//! `gocd_encrypt_value`: values encrypted with the server's cipher.
//!
//! Only creation talks to the server; the encrypted value is kept in state
//! until one of the inputs changes.

use async_trait::async_trait;

use crate::error::Result;
use crate::gocd::GoCdApi;
use crate::provider::{flatten, Resource, ResourceData};
use crate::schema::names::{ENCRYPTED_VALUE, VALUE};
use crate::schema::{Attribute, Schema};

use super::WithAction;

/// Encrypts a plain-text value.
#[derive(Debug, Clone, Copy, Default)]
pub struct EncryptValueResource;

#[async_trait]
impl Resource for EncryptValueResource {
    fn type_name(&self) -> &'static str {
        "gocd_encrypt_value"
    }

    fn schema(&self) -> Schema {
        Schema::new("Encrypts a value so it can be used as a secure property or variable.")
            .attribute(
                VALUE,
                Attribute::string("Plain text value to be encrypted.")
                    .required()
                    .force_new()
                    .sensitive(),
            )
            .attribute(
                ENCRYPTED_VALUE,
                Attribute::string("The encrypted value of the plain text.")
                    .computed()
                    .sensitive(),
            )
    }

    async fn create(&self, data: &mut ResourceData<'_>, client: &dyn GoCdApi) -> Result<()> {
        let response = client
            .encrypt_value(&data.get_str(VALUE))
            .await
            .with_action(|| String::from("encrypting value"))?;

        data.set(ENCRYPTED_VALUE, response.encrypted_value)?;
        data.set_id(flatten::random_id());
        Ok(())
    }

    async fn read(&self, _data: &mut ResourceData<'_>, _client: &dyn GoCdApi) -> Result<()> {
        Ok(())
    }

    async fn update(&self, _data: &mut ResourceData<'_>, _client: &dyn GoCdApi) -> Result<()> {
        Ok(())
    }

    async fn delete(&self, data: &mut ResourceData<'_>, _client: &dyn GoCdApi) -> Result<()> {
        data.set_id("");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gocd::{EncryptedValue, MockGoCdApi};
    use crate::provider::InstanceState;
    use crate::resources::object;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_stores_encrypted_value() {
        let mut mock = MockGoCdApi::new();
        mock.expect_encrypt_value()
            .withf(|value: &str| value == "s3cret")
            .times(1)
            .returning(|_| {
                Ok(EncryptedValue {
                    encrypted_value: String::from("AES:abc:def"),
                })
            });

        let schema = EncryptValueResource.schema();
        let mut data = ResourceData::for_create(&schema, &object(json!({ "value": "s3cret" })));
        EncryptValueResource.create(&mut data, &mock).await.unwrap();

        let state = data.into_state().unwrap();
        assert!(!state.id.is_empty());
        assert_eq!(state.get("encrypted_value"), &json!("AES:abc:def"));
    }

    #[tokio::test]
    async fn test_read_and_delete_stay_local() {
        let mock = MockGoCdApi::new();
        let schema = EncryptValueResource.schema();
        let state = InstanceState::new(
            "id-1",
            object(json!({ "value": "s3cret", "encrypted_value": "AES:abc:def" })),
        );

        let mut data = ResourceData::from_state(&schema, &state);
        EncryptValueResource.read(&mut data, &mock).await.unwrap();
        assert_eq!(data.get_str("encrypted_value"), "AES:abc:def");

        EncryptValueResource.delete(&mut data, &mock).await.unwrap();
        assert!(data.into_state().is_none());
    }

    #[test]
    fn test_every_input_forces_replacement() {
        let schema = EncryptValueResource.schema();
        assert_eq!(schema.force_new_attributes(), vec!["value"]);
    }
}
