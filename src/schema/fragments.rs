//! Schema blocks reused by several resources.

use super::names::{
    ATTRIBUTES, AUTO_UPDATE, BRANCH, CHECK_EXTERNALS, DESTINATION, DOMAIN, ENCRYPTED_PASSWORD,
    ENCRYPTED_VALUE, FINGERPRINT, IGNORE_FOR_SCHEDULING, INVERT_FILTER, IS_SECURE, KEY, NAME,
    PASSWORD, PIPELINE, PORT, PROJECT_PATH, REF, SECURE, STAGE, TYPE, URL, USERNAME, USE_TICKETS,
    VALUE, VIEW,
};
use super::{Attribute, Elem, Schema, ValueType};

/// A plugin property: `key` with a plain or encrypted value.
#[must_use]
pub fn properties_schema() -> Schema {
    Schema::new("")
        .attribute(
            KEY,
            Attribute::string("the name of the property key.").required(),
        )
        .attribute(
            VALUE,
            Attribute::string("the value of the property").optional(),
        )
        .attribute(
            ENCRYPTED_VALUE,
            Attribute::string(
                "The encrypted value of the property, use `gocd_encrypt_value` to obtain one.",
            )
            .optional()
            .sensitive(),
        )
        .attribute(
            IS_SECURE,
            Attribute::bool(
                "Specify whether the given property is secure or not. If true and encrypted_value is not specified, GoCD will store the value in encrypted format.",
            )
            .optional(),
        )
}

/// Plugin properties of a managed object.
#[must_use]
pub fn properties_attribute(description: &str) -> Attribute {
    Attribute::set(description, Elem::Block(properties_schema())).optional()
}

/// Plugin properties as read by a data source.
#[must_use]
pub fn properties_data_attribute(description: &str) -> Attribute {
    Attribute::list(description, Elem::Block(properties_schema()))
        .optional()
        .computed()
}

fn material_attributes_schema() -> Schema {
    let string = |description: &str| Attribute::string(description).optional();
    let flag = |description: &str| Attribute::bool(description).optional();

    Schema::new("")
        .attribute(URL, string("The URL of the material repository."))
        .attribute(USERNAME, string("The user account for the remote repository."))
        .attribute(
            PASSWORD,
            string("The password for the specified user.").sensitive(),
        )
        .attribute(
            ENCRYPTED_PASSWORD,
            string("The encrypted password for the specified user.").sensitive(),
        )
        .attribute(BRANCH, string("The branch of the repository to poll."))
        .attribute(
            AUTO_UPDATE,
            flag("Whether to poll for new changes or not.").computed(),
        )
        .attribute(
            CHECK_EXTERNALS,
            flag("Whether the changes to the externals will trigger the pipeline automatically or not."),
        )
        .attribute(USE_TICKETS, flag("Whether to work with the Perforce tickets or not."))
        .attribute(VIEW, string("The Perforce view."))
        .attribute(PORT, string("Perforce server connection to use ([transport:]host:port)."))
        .attribute(PROJECT_PATH, string("The project path within the TFS collection."))
        .attribute(DOMAIN, string("The domain name for TFS authentication credentials."))
        .attribute(REF, string("The unique package repository id or SCM id."))
        .attribute(NAME, string("The name of this material."))
        .attribute(STAGE, string("The name of a stage which will trigger this pipeline once it is successful."))
        .attribute(PIPELINE, string("The name of a pipeline that this pipeline depends on."))
        .attribute(
            IGNORE_FOR_SCHEDULING,
            flag("Whether the pipeline should be triggered when there are changes in this material."),
        )
        .attribute(
            DESTINATION,
            string("The directory (relative to the pipeline directory) in which source code will be checked out."),
        )
        .attribute(
            INVERT_FILTER,
            flag("Invert filter to enable whitelist."),
        )
}

/// The single source material of a config repository.
#[must_use]
pub fn material_attribute() -> Attribute {
    let material = Schema::new("")
        .attribute(
            TYPE,
            Attribute::string("The type of a material. Can be one of git, svn, hg, p4, tfs.")
                .required(),
        )
        .attribute(
            FINGERPRINT,
            Attribute::string("The fingerprint of the material.")
                .optional()
                .computed(),
        )
        .attribute(
            ATTRIBUTES,
            Attribute::set(
                "The attributes for each material type.",
                Elem::Block(material_attributes_schema()),
            )
            .required()
            .max_items(1),
        );

    Attribute::set(
        "The material to be used by the config repo.",
        Elem::Block(material),
    )
    .required()
    .max_items(1)
}

/// Rules restricting what an object may refer to.
#[must_use]
pub fn rules_attribute(description: &str) -> Attribute {
    Attribute::list(description, Elem::Primitive(ValueType::Map)).optional()
}

/// Environment variables of an environment.
#[must_use]
pub fn environment_variables_attribute() -> Attribute {
    let variable = Schema::new("")
        .attribute(NAME, Attribute::string("The name of environment variable.").required())
        .attribute(
            VALUE,
            Attribute::string("The value of environment variable.").optional(),
        )
        .attribute(
            ENCRYPTED_VALUE,
            Attribute::string("The encrypted value of the environment variable.")
                .optional()
                .sensitive(),
        )
        .attribute(
            SECURE,
            Attribute::bool("Whether environment variable is secure or not.").optional(),
        );

    Attribute::set(
        "The list of environment variables that will be passed to all tasks (commands) that are part of this environment.",
        Elem::Block(variable),
    )
    .optional()
}
