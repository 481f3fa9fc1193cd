//! Attribute names shared by resources and data sources.

#![allow(missing_docs)]

pub const PROFILE_ID: &str = "profile_id";
pub const PLUGIN_ID: &str = "plugin_id";
pub const CLUSTER_PROFILE_ID: &str = "cluster_profile_id";
pub const CONFIGURATION: &str = "configuration";
pub const PLUGIN_CONFIGURATIONS: &str = "plugin_configurations";
pub const PROPERTIES: &str = "properties";
pub const KEY: &str = "key";
pub const VALUE: &str = "value";
pub const ENCRYPTED_VALUE: &str = "encrypted_value";
pub const IS_SECURE: &str = "is_secure";
pub const SECURE: &str = "secure";
pub const RULES: &str = "rules";
pub const MATERIAL: &str = "material";
pub const ATTRIBUTES: &str = "attributes";
pub const TYPE: &str = "type";
pub const FINGERPRINT: &str = "fingerprint";
pub const URL: &str = "url";
pub const USERNAME: &str = "username";
pub const PASSWORD: &str = "password";
pub const ENCRYPTED_PASSWORD: &str = "encrypted_password";
pub const BRANCH: &str = "branch";
pub const AUTO_UPDATE: &str = "auto_update";
pub const CHECK_EXTERNALS: &str = "check_externals";
pub const USE_TICKETS: &str = "use_tickets";
pub const VIEW: &str = "view";
pub const PORT: &str = "port";
pub const PROJECT_PATH: &str = "project_path";
pub const DOMAIN: &str = "domain";
pub const REF: &str = "ref";
pub const NAME: &str = "name";
pub const STAGE: &str = "stage";
pub const PIPELINE: &str = "pipeline";
pub const IGNORE_FOR_SCHEDULING: &str = "ignore_for_scheduling";
pub const DESTINATION: &str = "destination";
pub const INVERT_FILTER: &str = "invert_filter";
pub const ALLOW_KNOWN_USERS: &str = "allow_only_known_users_to_login";
pub const DESCRIPTION: &str = "description";
pub const PIPELINES: &str = "pipelines";
pub const ENVIRONMENT_VARIABLES: &str = "environment_variables";
pub const GROUP: &str = "group";
pub const CONFIG: &str = "config";
pub const PAUSE_ON_CREATION: &str = "pause_on_creation";
pub const PAUSE_REASON: &str = "pause_reason";
pub const YAML: &str = "yaml";
pub const ETAG: &str = "etag";

// Provider block.
pub const BASE_URL: &str = "base_url";
pub const CA_FILE: &str = "ca_file";
pub const LOGLEVEL: &str = "loglevel";
