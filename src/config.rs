//! Client configuration.
//!
//! Everything here is fixed at construction time. The client never reads
//! configuration from request parameters and never writes the secret into them.

use crate::types::*;
use std::fmt;
use std::time::Duration;
use url::Url;

/// Global gateway used when no region is chosen
pub const DEFAULT_BASE_URL: &str = "https://api.lazada.com/rest";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const ENV_APP_KEY: &str = "LAZADA_APP_KEY";
pub const ENV_APP_SECRET: &str = "LAZADA_APP_SECRET";
pub const ENV_API_URL: &str = "LAZADA_API_URL";

/// Regional API gateways
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    Global,
    Singapore,
    Malaysia,
    Vietnam,
    Thailand,
    Philippines,
    Indonesia,
}

impl Region {
    pub fn base_url(&self) -> &'static str {
        match self {
            Region::Global => DEFAULT_BASE_URL,
            Region::Singapore => "https://api.lazada.sg/rest",
            Region::Malaysia => "https://api.lazada.com.my/rest",
            Region::Vietnam => "https://api.lazada.vn/rest",
            Region::Thailand => "https://api.lazada.co.th/rest",
            Region::Philippines => "https://api.lazada.com.ph/rest",
            Region::Indonesia => "https://api.lazada.co.id/rest",
        }
    }
}

/// Configuration for TLS
#[derive(Clone, Debug)]
pub struct TlsConfig {
    pub min_tls_version: Option<reqwest::tls::Version>,
    pub cert_verification: bool,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            min_tls_version: Some(reqwest::tls::Version::TLS_1_2),
            cert_verification: true,
        }
    }
}

/// Immutable client configuration
#[derive(Clone)]
pub struct ClientConfig {
    app_key: String,
    app_secret: SecureAppSecret,
    base_url: String,
    sign_method: SignMethod,
    timeout: Duration,
    connect_timeout: Option<Duration>,
    user_agent: String,
    tls: TlsConfig,
}

impl ClientConfig {
    pub fn builder(app_key: impl Into<String>, app_secret: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder::new(app_key, app_secret)
    }

    /// Read `LAZADA_APP_KEY`, `LAZADA_APP_SECRET` and optionally `LAZADA_API_URL`
    pub fn from_env() -> ApiResult<Self> {
        let app_key = std::env::var(ENV_APP_KEY)
            .map_err(|_| ApiError::simple_configuration_error(format!("{} is not set", ENV_APP_KEY)))?;
        let app_secret = std::env::var(ENV_APP_SECRET)
            .map_err(|_| ApiError::simple_configuration_error(format!("{} is not set", ENV_APP_SECRET)))?;

        let mut builder = Self::builder(app_key, app_secret);
        if let Ok(url) = std::env::var(ENV_API_URL) {
            builder = builder.base_url(url);
        }
        builder.build()
    }

    pub fn app_key(&self) -> &str {
        &self.app_key
    }

    pub(crate) fn app_secret(&self) -> &SecureAppSecret {
        &self.app_secret
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn sign_method(&self) -> SignMethod {
        self.sign_method
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn tls(&self) -> &TlsConfig {
        &self.tls
    }

    /// Full endpoint URL for an API path
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("app_key", &self.app_key)
            .field("app_secret", &self.app_secret)
            .field("base_url", &self.base_url)
            .field("sign_method", &self.sign_method)
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("user_agent", &self.user_agent)
            .field("tls", &self.tls)
            .finish()
    }
}

/// Consuming builder for [`ClientConfig`]
pub struct ClientConfigBuilder {
    app_key: String,
    app_secret: SecureAppSecret,
    base_url: String,
    sign_method: SignMethod,
    timeout: Duration,
    connect_timeout: Option<Duration>,
    user_agent: String,
    tls: TlsConfig,
}

impl ClientConfigBuilder {
    pub fn new(app_key: impl Into<String>, app_secret: impl Into<String>) -> Self {
        Self {
            app_key: app_key.into(),
            app_secret: SecureAppSecret::new(app_secret),
            base_url: DEFAULT_BASE_URL.to_string(),
            sign_method: SignMethod::default(),
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: None,
            user_agent: concat!("lazada-rs/", env!("CARGO_PKG_VERSION")).to_string(),
            tls: TlsConfig::default(),
        }
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn region(mut self, region: Region) -> Self {
        self.base_url = region.base_url().to_string();
        self
    }

    pub fn sign_method(mut self, method: SignMethod) -> Self {
        self.sign_method = method;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn tls(mut self, tls: TlsConfig) -> Self {
        self.tls = tls;
        self
    }

    /// Validate and freeze the configuration
    pub fn build(self) -> ApiResult<ClientConfig> {
        if self.app_key.trim().is_empty() {
            return Err(ApiError::simple_configuration_error("app_key cannot be empty"));
        }
        if self.app_secret.is_empty() {
            return Err(ApiError::simple_configuration_error("app_secret cannot be empty"));
        }
        if self.timeout.is_zero() {
            return Err(ApiError::simple_configuration_error("timeout must be greater than 0"));
        }

        let parsed = Url::parse(&self.base_url).map_err(|e| {
            ApiError::simple_configuration_error(format!("invalid base_url '{}': {}", self.base_url, e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::simple_configuration_error(format!(
                "base_url must use http or https, got '{}'",
                parsed.scheme()
            )));
        }

        Ok(ClientConfig {
            app_key: self.app_key,
            app_secret: self.app_secret,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            sign_method: self.sign_method,
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            user_agent: self.user_agent,
            tls: self.tls,
        })
    }
}
