//! GoCD API client implementation.
//!
//! This module provides the HTTP client for the GoCD admin REST API. Every
//! endpoint family is versioned through its `Accept` header; optimistic
//! concurrency relies on the `ETag` / `If-Match` pair.

use async_trait::async_trait;
use reqwest::{header, Certificate, Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, trace};

use crate::config::ProviderConfig;
use crate::error::{ConfigError, GoCdError, Result};

use super::api::GoCdApi;
use super::types::{
    AuthConfig, ClusterProfile, ConfigRepo, ElasticAgentProfile, EncryptedValue, Environment,
    PipelineConfig, PluginSettings, SecretConfig,
};

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

const PIPELINE_CONFIG_ACCEPT: &str = "application/vnd.go.cd.v11+json";
const CONFIG_REPO_ACCEPT: &str = "application/vnd.go.cd.v4+json";
const PLUGIN_SETTINGS_ACCEPT: &str = "application/vnd.go.cd.v1+json";
const CLUSTER_PROFILE_ACCEPT: &str = "application/vnd.go.cd.v1+json";
const ELASTIC_PROFILE_ACCEPT: &str = "application/vnd.go.cd.v2+json";
const AUTH_CONFIG_ACCEPT: &str = "application/vnd.go.cd.v2+json";
const ENVIRONMENT_ACCEPT: &str = "application/vnd.go.cd.v3+json";
const SECRET_CONFIG_ACCEPT: &str = "application/vnd.go.cd.v3+json";
const ENCRYPT_ACCEPT: &str = "application/vnd.go.cd.v1+json";

/// Header asking GoCD to pause a pipeline right after creation.
const PAUSE_PIPELINE_HEADER: &str = "X-pause-pipeline";

/// Header carrying the pause reason.
const PAUSE_CAUSE_HEADER: &str = "X-pause-cause";

const CONFIG_REPOS: &[&str] = &["api", "admin", "config_repos"];
const PIPELINES: &[&str] = &["api", "admin", "pipelines"];
const PLUGIN_SETTINGS: &[&str] = &["api", "admin", "plugin_settings"];
const CLUSTER_PROFILES: &[&str] = &["api", "admin", "elastic", "cluster_profiles"];
const ELASTIC_PROFILES: &[&str] = &["api", "elastic", "profiles"];
const AUTH_CONFIGS: &[&str] = &["api", "admin", "security", "auth_configs"];
const ENVIRONMENTS: &[&str] = &["api", "admin", "environments"];
const SECRET_CONFIGS: &[&str] = &["api", "admin", "secret_configs"];
const ENCRYPT: &[&str] = &["api", "admin", "encrypt"];

/// GoCD API client.
#[derive(Debug, Clone)]
pub struct GoCdClient {
    /// HTTP client.
    client: Client,
    /// Server URL, e.g. `https://gocd.example.com/go`.
    base_url: Url,
    /// Basic auth username.
    username: Option<String>,
    /// Basic auth password.
    password: Option<String>,
}

/// Error body returned by GoCD.
#[derive(Debug, Deserialize)]
struct ApiMessage {
    message: String,
}

/// Objects whose ETag is delivered in a response header.
trait Versioned {
    fn set_etag(&mut self, etag: String);
}

macro_rules! versioned {
    ($($ty:ty),* $(,)?) => {
        $(impl Versioned for $ty {
            fn set_etag(&mut self, etag: String) {
                self.etag = etag;
            }
        })*
    };
}

versioned!(
    ConfigRepo,
    PluginSettings,
    ClusterProfile,
    ElasticAgentProfile,
    AuthConfig,
    Environment,
    SecretConfig,
);

impl GoCdClient {
    /// Creates a client from the resolved provider configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the CA contents are not valid PEM, the base URL is
    /// unusable, or the HTTP client cannot be created.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let mut builder = Client::builder().timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        if let Some(ca) = config.ca_file.as_deref().filter(|ca| !ca.trim().is_empty()) {
            let certificates = Certificate::from_pem_bundle(ca.as_bytes()).map_err(|e| {
                ConfigError::InvalidCertificate {
                    message: e.to_string(),
                }
            })?;
            if certificates.is_empty() {
                return Err(ConfigError::InvalidCertificate {
                    message: String::from("no PEM certificate found in CA contents"),
                }
                .into());
            }
            for certificate in certificates {
                builder = builder.add_root_certificate(certificate);
            }
        }

        let client = builder
            .build()
            .map_err(|e| GoCdError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: parse_base_url(&config.base_url)?,
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    /// Creates an unauthenticated client for the given server URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is unusable or the HTTP client cannot be created.
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| GoCdError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: parse_base_url(base_url)?,
            username: None,
            password: None,
        })
    }

    /// Sets basic auth credentials.
    #[must_use]
    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.username = Some(username.to_string());
        self.password = Some(password.to_string());
        self
    }

    /// Returns the server URL this client talks to.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds an API URL below the server URL, percent-encoding each segment.
    fn endpoint(&self, collection: &[&str], id: Option<&str>) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| GoCdError::InvalidUrl {
                url: self.base_url.to_string(),
                message: String::from("URL cannot be a base"),
            })?
            .pop_if_empty()
            .extend(collection)
            .extend(id);
        Ok(url)
    }

    /// Starts a request with the version header and credentials.
    fn request(&self, method: Method, url: Url, accept: &str) -> RequestBuilder {
        debug!("GoCD API call: {method} {url}");

        let mut request = self
            .client
            .request(method, url)
            .header(header::ACCEPT, accept);

        if let (Some(username), Some(password)) = (&self.username, &self.password) {
            request = request.basic_auth(username, Some(password));
        }

        request
    }

    /// Sends a request and maps non-success statuses to errors.
    async fn send(request: RequestBuilder, kind: &str, id: &str) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| GoCdError::network(format!("Request failed: {e}")))?;

        let status = response.status();
        trace!("GoCD API responded with {status}");

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body);

        let error = match status.as_u16() {
            401 | 403 => GoCdError::AuthenticationFailed { message },
            404 => GoCdError::NotFound {
                kind: kind.to_string(),
                id: id.to_string(),
            },
            409 | 412 => GoCdError::PreconditionFailed { message },
            code => GoCdError::api_error(code, message),
        };

        Err(error.into())
    }

    /// Decodes a JSON body and returns it with the response ETag.
    async fn decode<T: DeserializeOwned>(response: Response) -> Result<(T, String)> {
        let etag = response
            .headers()
            .get(header::ETAG)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let body = response
            .json::<T>()
            .await
            .map_err(|e| GoCdError::invalid_response(format!("Failed to parse response: {e}")))?;

        Ok((body, etag))
    }

    async fn get_object<T: DeserializeOwned + Versioned>(
        &self,
        accept: &str,
        collection: &[&str],
        kind: &str,
        id: &str,
    ) -> Result<T> {
        let url = self.endpoint(collection, Some(id))?;
        let response = Self::send(self.request(Method::GET, url, accept), kind, id).await?;
        let (mut object, etag): (T, String) = Self::decode(response).await?;
        object.set_etag(etag);
        Ok(object)
    }

    async fn create_object<T: Serialize + DeserializeOwned + Versioned>(
        &self,
        accept: &str,
        collection: &[&str],
        kind: &str,
        id: &str,
        body: &T,
    ) -> Result<T> {
        let url = self.endpoint(collection, None)?;
        let request = self.request(Method::POST, url, accept).json(body);
        let response = Self::send(request, kind, id).await?;
        let (mut object, etag): (T, String) = Self::decode(response).await?;
        object.set_etag(etag);
        Ok(object)
    }

    async fn update_object<T: Serialize + DeserializeOwned + Versioned>(
        &self,
        accept: &str,
        collection: &[&str],
        kind: &str,
        id: &str,
        etag: &str,
        body: &T,
    ) -> Result<T> {
        let url = self.endpoint(collection, Some(id))?;
        let request = self
            .request(Method::PUT, url, accept)
            .header(header::IF_MATCH, etag)
            .json(body);
        let response = Self::send(request, kind, id).await?;
        let (mut object, new_etag): (T, String) = Self::decode(response).await?;
        object.set_etag(new_etag);
        Ok(object)
    }

    async fn delete_object(
        &self,
        accept: &str,
        collection: &[&str],
        kind: &str,
        id: &str,
    ) -> Result<()> {
        let url = self.endpoint(collection, Some(id))?;
        Self::send(self.request(Method::DELETE, url, accept), kind, id).await?;
        Ok(())
    }

    /// Turns a pipeline config response into the typed pipeline.
    async fn decode_pipeline(
        response: Response,
        name: &str,
        fallback_group: &str,
    ) -> Result<PipelineConfig> {
        let (config, etag): (Map<String, Value>, String) = Self::decode(response).await?;

        let group = config
            .get("group")
            .and_then(Value::as_str)
            .unwrap_or(fallback_group)
            .to_string();

        Ok(PipelineConfig {
            name: name.to_string(),
            group,
            config,
            create_options: crate::gocd::PipelineCreateOptions::default(),
            etag,
        })
    }
}

/// Parses the configured base URL, assuming `https` when no scheme is given.
fn parse_base_url(raw: &str) -> Result<Url> {
    let candidate = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    };

    Url::parse(&candidate).map_err(|e| {
        GoCdError::InvalidUrl {
            url: raw.to_string(),
            message: e.to_string(),
        }
        .into()
    })
}

/// Extracts the `message` of a GoCD error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ApiMessage>(body)
        .map_or_else(|_| body.trim().to_string(), |m| m.message)
}

#[async_trait]
impl GoCdApi for GoCdClient {
    async fn create_pipeline(&self, pipeline: &PipelineConfig) -> Result<PipelineConfig> {
        let url = self.endpoint(PIPELINES, None)?;
        let body = serde_json::json!({
            "group": pipeline.group,
            "pipeline": pipeline.config,
        });

        let mut request = self
            .request(Method::POST, url, PIPELINE_CONFIG_ACCEPT)
            .json(&body);

        if pipeline.create_options.pause_pipeline {
            request = request
                .header(PAUSE_PIPELINE_HEADER, "true")
                .header(PAUSE_CAUSE_HEADER, &pipeline.create_options.pause_reason);
        }

        let response = Self::send(request, "pipeline", &pipeline.name).await?;
        Self::decode_pipeline(response, &pipeline.name, &pipeline.group).await
    }

    async fn get_pipeline_config(&self, name: &str) -> Result<PipelineConfig> {
        let url = self.endpoint(PIPELINES, Some(name))?;
        let request = self.request(Method::GET, url, PIPELINE_CONFIG_ACCEPT);
        let response = Self::send(request, "pipeline", name).await?;
        Self::decode_pipeline(response, name, "").await
    }

    async fn update_pipeline_config(&self, pipeline: &PipelineConfig) -> Result<PipelineConfig> {
        let url = self.endpoint(PIPELINES, Some(&pipeline.name))?;

        let mut body = pipeline.config.clone();
        body.insert(String::from("group"), Value::from(pipeline.group.clone()));

        let request = self
            .request(Method::PUT, url, PIPELINE_CONFIG_ACCEPT)
            .header(header::IF_MATCH, &pipeline.etag)
            .json(&body);

        let response = Self::send(request, "pipeline", &pipeline.name).await?;
        Self::decode_pipeline(response, &pipeline.name, &pipeline.group).await
    }

    async fn delete_pipeline(&self, name: &str) -> Result<()> {
        self.delete_object(PIPELINE_CONFIG_ACCEPT, PIPELINES, "pipeline", name)
            .await
    }

    async fn create_config_repo(&self, repo: &ConfigRepo) -> Result<()> {
        self.create_object(CONFIG_REPO_ACCEPT, CONFIG_REPOS, "config repo", &repo.id, repo)
            .await
            .map(|_| ())
    }

    async fn get_config_repo(&self, id: &str) -> Result<ConfigRepo> {
        self.get_object(CONFIG_REPO_ACCEPT, CONFIG_REPOS, "config repo", id)
            .await
    }

    async fn update_config_repo(&self, repo: &ConfigRepo) -> Result<ConfigRepo> {
        self.update_object(
            CONFIG_REPO_ACCEPT,
            CONFIG_REPOS,
            "config repo",
            &repo.id,
            &repo.etag,
            repo,
        )
        .await
    }

    async fn delete_config_repo(&self, id: &str) -> Result<()> {
        self.delete_object(CONFIG_REPO_ACCEPT, CONFIG_REPOS, "config repo", id)
            .await
    }

    async fn get_plugin_settings(&self, plugin_id: &str) -> Result<PluginSettings> {
        self.get_object(
            PLUGIN_SETTINGS_ACCEPT,
            PLUGIN_SETTINGS,
            "plugin settings",
            plugin_id,
        )
        .await
    }

    async fn create_plugin_settings(&self, settings: &PluginSettings) -> Result<PluginSettings> {
        self.create_object(
            PLUGIN_SETTINGS_ACCEPT,
            PLUGIN_SETTINGS,
            "plugin settings",
            &settings.plugin_id,
            settings,
        )
        .await
    }

    async fn update_plugin_settings(&self, settings: &PluginSettings) -> Result<PluginSettings> {
        self.update_object(
            PLUGIN_SETTINGS_ACCEPT,
            PLUGIN_SETTINGS,
            "plugin settings",
            &settings.plugin_id,
            &settings.etag,
            settings,
        )
        .await
    }

    async fn get_cluster_profile(&self, id: &str) -> Result<ClusterProfile> {
        self.get_object(CLUSTER_PROFILE_ACCEPT, CLUSTER_PROFILES, "cluster profile", id)
            .await
    }

    async fn create_cluster_profile(&self, profile: &ClusterProfile) -> Result<ClusterProfile> {
        self.create_object(
            CLUSTER_PROFILE_ACCEPT,
            CLUSTER_PROFILES,
            "cluster profile",
            &profile.id,
            profile,
        )
        .await
    }

    async fn update_cluster_profile(&self, profile: &ClusterProfile) -> Result<ClusterProfile> {
        self.update_object(
            CLUSTER_PROFILE_ACCEPT,
            CLUSTER_PROFILES,
            "cluster profile",
            &profile.id,
            &profile.etag,
            profile,
        )
        .await
    }

    async fn delete_cluster_profile(&self, id: &str) -> Result<()> {
        self.delete_object(CLUSTER_PROFILE_ACCEPT, CLUSTER_PROFILES, "cluster profile", id)
            .await
    }

    async fn get_elastic_agent_profile(&self, id: &str) -> Result<ElasticAgentProfile> {
        self.get_object(
            ELASTIC_PROFILE_ACCEPT,
            ELASTIC_PROFILES,
            "elastic agent profile",
            id,
        )
        .await
    }

    async fn create_elastic_agent_profile(
        &self,
        profile: &ElasticAgentProfile,
    ) -> Result<ElasticAgentProfile> {
        self.create_object(
            ELASTIC_PROFILE_ACCEPT,
            ELASTIC_PROFILES,
            "elastic agent profile",
            &profile.id,
            profile,
        )
        .await
    }

    async fn update_elastic_agent_profile(
        &self,
        profile: &ElasticAgentProfile,
    ) -> Result<ElasticAgentProfile> {
        self.update_object(
            ELASTIC_PROFILE_ACCEPT,
            ELASTIC_PROFILES,
            "elastic agent profile",
            &profile.id,
            &profile.etag,
            profile,
        )
        .await
    }

    async fn delete_elastic_agent_profile(&self, id: &str) -> Result<()> {
        self.delete_object(
            ELASTIC_PROFILE_ACCEPT,
            ELASTIC_PROFILES,
            "elastic agent profile",
            id,
        )
        .await
    }

    async fn get_auth_config(&self, id: &str) -> Result<AuthConfig> {
        self.get_object(AUTH_CONFIG_ACCEPT, AUTH_CONFIGS, "auth config", id)
            .await
    }

    async fn create_auth_config(&self, config: &AuthConfig) -> Result<AuthConfig> {
        self.create_object(AUTH_CONFIG_ACCEPT, AUTH_CONFIGS, "auth config", &config.id, config)
            .await
    }

    async fn update_auth_config(&self, config: &AuthConfig) -> Result<AuthConfig> {
        self.update_object(
            AUTH_CONFIG_ACCEPT,
            AUTH_CONFIGS,
            "auth config",
            &config.id,
            &config.etag,
            config,
        )
        .await
    }

    async fn delete_auth_config(&self, id: &str) -> Result<()> {
        self.delete_object(AUTH_CONFIG_ACCEPT, AUTH_CONFIGS, "auth config", id)
            .await
    }

    async fn get_environment(&self, name: &str) -> Result<Environment> {
        self.get_object(ENVIRONMENT_ACCEPT, ENVIRONMENTS, "environment", name)
            .await
    }

    async fn create_environment(&self, environment: &Environment) -> Result<Environment> {
        self.create_object(
            ENVIRONMENT_ACCEPT,
            ENVIRONMENTS,
            "environment",
            &environment.name,
            environment,
        )
        .await
    }

    async fn update_environment(&self, environment: &Environment) -> Result<Environment> {
        self.update_object(
            ENVIRONMENT_ACCEPT,
            ENVIRONMENTS,
            "environment",
            &environment.name,
            &environment.etag,
            environment,
        )
        .await
    }

    async fn delete_environment(&self, name: &str) -> Result<()> {
        self.delete_object(ENVIRONMENT_ACCEPT, ENVIRONMENTS, "environment", name)
            .await
    }

    async fn get_secret_config(&self, id: &str) -> Result<SecretConfig> {
        self.get_object(SECRET_CONFIG_ACCEPT, SECRET_CONFIGS, "secret config", id)
            .await
    }

    async fn create_secret_config(&self, config: &SecretConfig) -> Result<SecretConfig> {
        self.create_object(
            SECRET_CONFIG_ACCEPT,
            SECRET_CONFIGS,
            "secret config",
            &config.id,
            config,
        )
        .await
    }

    async fn update_secret_config(&self, config: &SecretConfig) -> Result<SecretConfig> {
        self.update_object(
            SECRET_CONFIG_ACCEPT,
            SECRET_CONFIGS,
            "secret config",
            &config.id,
            &config.etag,
            config,
        )
        .await
    }

    async fn delete_secret_config(&self, id: &str) -> Result<()> {
        self.delete_object(SECRET_CONFIG_ACCEPT, SECRET_CONFIGS, "secret config", id)
            .await
    }

    async fn encrypt_value(&self, value: &str) -> Result<EncryptedValue> {
        let url = self.endpoint(ENCRYPT, None)?;
        let request = self
            .request(Method::POST, url, ENCRYPT_ACCEPT)
            .json(&serde_json::json!({ "value": value }));
        let response = Self::send(request, "encrypted value", "").await?;
        let (encrypted, _): (EncryptedValue, String) = Self::decode(response).await?;
        Ok(encrypted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::gocd::{Material, MaterialAttributes, PipelineCreateOptions};
    use wiremock::matchers::{basic_auth, body_json, header as header_is, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_repo() -> ConfigRepo {
        ConfigRepo {
            id: String::from("sample"),
            plugin_id: String::from("yaml.config.plugin"),
            material: Material {
                material_type: String::from("git"),
                fingerprint: String::new(),
                attributes: MaterialAttributes {
                    url: String::from("https://github.com/gocd/sample.git"),
                    branch: String::from("main"),
                    ..MaterialAttributes::default()
                },
            },
            configuration: vec![],
            rules: vec![],
            etag: String::new(),
        }
    }

    #[test]
    fn test_endpoint_keeps_server_path_and_encodes_ids() {
        let client = GoCdClient::with_base_url("https://gocd.example.com/go/").unwrap();
        let url = client.endpoint(CONFIG_REPOS, Some("repo one")).unwrap();

        assert_eq!(
            url.as_str(),
            "https://gocd.example.com/go/api/admin/config_repos/repo%20one"
        );
    }

    #[test]
    fn test_base_url_without_scheme_defaults_to_https() {
        let client = GoCdClient::with_base_url("gocd.example.com/go").unwrap();
        assert_eq!(client.base_url().scheme(), "https");
    }

    #[test]
    fn test_invalid_ca_is_a_config_error() {
        let config = ProviderConfig {
            base_url: String::from("https://gocd.example.com/go"),
            ca_file: Some(String::from("not a certificate")),
            ..ProviderConfig::default()
        };

        let err = GoCdClient::new(&config).unwrap_err();
        assert!(matches!(
            err,
            ProviderError::Config(ConfigError::InvalidCertificate { .. })
        ));
    }

    #[test]
    fn test_error_message_prefers_api_message() {
        assert_eq!(
            error_message(r#"{"message": "Save failed."}"#),
            "Save failed."
        );
        assert_eq!(error_message(" plain text \n"), "plain text");
    }

    #[tokio::test]
    async fn test_get_config_repo_reads_etag_and_authenticates() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/go/api/admin/config_repos/sample"))
            .and(header_is("Accept", CONFIG_REPO_ACCEPT))
            .and(basic_auth("admin", "secret"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("ETag", "\"etag-1\"")
                    .set_body_json(serde_json::json!({
                        "_links": {},
                        "id": "sample",
                        "plugin_id": "yaml.config.plugin",
                        "material": {
                            "type": "git",
                            "attributes": {
                                "url": "https://github.com/gocd/sample.git",
                                "branch": "main",
                                "auto_update": true
                            }
                        },
                        "configuration": [],
                        "rules": [{"directive": "allow", "action": "refer", "type": "pipeline_group", "resource": "*"}]
                    })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = GoCdClient::with_base_url(&format!("{}/go", server.uri()))
            .unwrap()
            .with_credentials("admin", "secret");

        let repo = client.get_config_repo("sample").await.unwrap();

        assert_eq!(repo.etag, "\"etag-1\"");
        assert_eq!(repo.material.attributes.branch, "main");
        assert_eq!(repo.rules[0]["directive"], "allow");
    }

    #[tokio::test]
    async fn test_update_config_repo_sends_if_match() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/go/api/admin/config_repos/sample"))
            .and(header_is("If-Match", "\"etag-1\""))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("ETag", "\"etag-2\"")
                    .set_body_json(serde_json::to_value(sample_repo()).unwrap()),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = GoCdClient::with_base_url(&format!("{}/go", server.uri())).unwrap();
        let mut repo = sample_repo();
        repo.etag = String::from("\"etag-1\"");

        let updated = client.update_config_repo(&repo).await.unwrap();
        assert_eq!(updated.etag, "\"etag-2\"");
    }

    #[tokio::test]
    async fn test_create_pipeline_wraps_group_and_pauses() {
        let server = MockServer::start().await;

        let mut config = Map::new();
        config.insert(String::from("name"), Value::from("build"));

        Mock::given(method("POST"))
            .and(path("/go/api/admin/pipelines"))
            .and(header_is("Accept", PIPELINE_CONFIG_ACCEPT))
            .and(header_is("X-pause-pipeline", "true"))
            .and(header_is("X-pause-cause", "waiting for review"))
            .and(body_json(serde_json::json!({
                "group": "first",
                "pipeline": { "name": "build" }
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("ETag", "\"p-1\"")
                    .set_body_json(serde_json::json!({ "name": "build", "group": "first" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = GoCdClient::with_base_url(&format!("{}/go", server.uri())).unwrap();
        let pipeline = PipelineConfig {
            name: String::from("build"),
            group: String::from("first"),
            config,
            create_options: PipelineCreateOptions {
                pause_pipeline: true,
                pause_reason: String::from("waiting for review"),
            },
            etag: String::new(),
        };

        let created = client.create_pipeline(&pipeline).await.unwrap();
        assert_eq!(created.etag, "\"p-1\"");
        assert_eq!(created.group, "first");
    }

    #[tokio::test]
    async fn test_status_codes_are_classified() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/go/api/admin/environments/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/go/api/admin/environments/stale"))
            .respond_with(ResponseTemplate::new(412).set_body_json(serde_json::json!({
                "message": "Someone has modified the configuration"
            })))
            .mount(&server)
            .await;

        Mock::given(method("DELETE"))
            .and(path("/go/api/admin/environments/locked"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let client = GoCdClient::with_base_url(&format!("{}/go", server.uri())).unwrap();

        let missing = client.get_environment("missing").await.unwrap_err();
        assert!(matches!(
            missing,
            ProviderError::GoCd(GoCdError::NotFound { ref id, .. }) if id == "missing"
        ));

        let stale = Environment {
            name: String::from("stale"),
            etag: String::from("\"old\""),
            ..Environment::default()
        };
        let conflict = client.update_environment(&stale).await.unwrap_err();
        assert!(matches!(
            conflict,
            ProviderError::GoCd(GoCdError::PreconditionFailed { ref message })
                if message == "Someone has modified the configuration"
        ));

        let denied = client.delete_environment("locked").await.unwrap_err();
        assert!(matches!(
            denied,
            ProviderError::GoCd(GoCdError::AuthenticationFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_encrypt_value() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/go/api/admin/encrypt"))
            .and(body_json(serde_json::json!({ "value": "s3cr3t" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "encrypted_value": "AES:xyz"
            })))
            .mount(&server)
            .await;

        let client = GoCdClient::with_base_url(&format!("{}/go", server.uri())).unwrap();
        let encrypted = client.encrypt_value("s3cr3t").await.unwrap();

        assert_eq!(encrypted.encrypted_value, "AES:xyz");
    }
}
