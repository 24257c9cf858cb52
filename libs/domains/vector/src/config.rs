use core_config::{ConfigError, EnvSource, FromEnv, ProcessEnv, explicit_or_env};

pub const API_KEY_ENV: &str = "PINECONE_API_KEY";
pub const BASE_URL_ENV: &str = "PINECONE_BASE_URL";

/// Control-plane host template; `{environment}` is replaced per call.
pub const DEFAULT_CONTROLLER_URL: &str = "https://controller.{environment}.pinecone.io";

/// Client configuration as supplied by the caller.
///
/// Unset `api_key`/`base_url` are looked up in the environment when the client is built.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub namespace: Option<String>,
    pub controller_url: Option<String>,
    pub http_client: Option<reqwest::Client>,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Override the control-plane URL template (must contain `{environment}` to vary by it).
    pub fn with_controller_url(mut self, template: impl Into<String>) -> Self {
        self.controller_url = Some(template.into());
        self
    }

    /// Use a preconfigured HTTP client (timeouts, proxies, TLS, pooling).
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Fill in missing values from `env` and check that everything required is present.
    pub fn resolve(self, env: &dyn EnvSource) -> Result<ResolvedConfig, ConfigError> {
        let api_key = explicit_or_env(self.api_key, env, API_KEY_ENV)?;
        let base_url = explicit_or_env(self.base_url, env, BASE_URL_ENV)?;

        Ok(ResolvedConfig {
            api_key,
            base_url,
            namespace: self.namespace,
            controller_url: self
                .controller_url
                .unwrap_or_else(|| DEFAULT_CONTROLLER_URL.to_string()),
            http_client: self.http_client.unwrap_or_default(),
        })
    }
}

impl FromEnv for ClientConfig {
    /// Reads `PINECONE_API_KEY` and `PINECONE_BASE_URL`; both are required.
    fn from_env() -> Result<Self, ConfigError> {
        let resolved = ClientConfig::default().resolve(&ProcessEnv)?;
        Ok(ClientConfig::default()
            .with_api_key(resolved.api_key)
            .with_base_url(resolved.base_url))
    }
}

/// Configuration after environment fallback; fixed for the lifetime of a client.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub api_key: String,
    pub base_url: String,
    pub namespace: Option<String>,
    pub controller_url: String,
    pub http_client: reqwest::Client,
}

impl ResolvedConfig {
    pub fn controller_url_for(&self, environment: &str) -> String {
        self.controller_url.replace("{environment}", environment)
    }
}
