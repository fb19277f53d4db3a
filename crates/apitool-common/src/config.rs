//! Client configuration.
//!
//! A [`Config`] is supplied once when a client is built and is read-only
//! afterwards. It can be assembled in code with the `with_*` builders or
//! loaded from a JSON or TOML file.
//!
//! ## Example Configuration
//!
//! ```json
//! {
//!     "host": "https://api.hackableapp.com:3000",
//!     "username": "developer",
//!     "password": "sup3Rs3cr3t!!",
//!     "proxy": "http://localhost:8080",
//!     "endpoints": {
//!         "token": "/auth",
//!         "user": "/user",
//!         "status": "/status"
//!     }
//! }
//! ```
//!
//! The same file in TOML, with an interception proxy whose certificate is not
//! trusted and a token nested in the response body:
//!
//! ```toml
//! host = "https://api.hackableapp.com:3000"
//! username = "developer"
//! password = "sup3Rs3cr3t!!"
//!
//! [proxy]
//! url = "http://localhost:8080"
//! accept_invalid_certs = true
//!
//! [endpoints]
//! token = "/auth"
//! status = "/status"
//!
//! [token]
//! field = "/data/access_token"
//! header_prefix = "Bearer"
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Name of the endpoint used to acquire tokens.
pub const TOKEN_ENDPOINT: &str = "token";

/// Connection configuration for an API client.
///
/// The `password` field uses `SecretString` to prevent accidental logging or
/// serialization of the credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the API, including the protocol.
    ///
    /// May carry a path prefix (e.g. `https://example.com/api/v1`) which is
    /// preserved for every endpoint.
    pub host: String,
    /// Username for Basic authentication.
    #[serde(default)]
    pub username: Option<String>,
    /// Password for Basic authentication (stored securely).
    ///
    /// Will not be serialized to prevent accidental exposure.
    #[serde(skip_serializing, default)]
    pub password: Option<SecretString>,
    /// Optional proxy all requests are routed through.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyConfig>,
    /// Logical endpoint names mapped to paths.
    #[serde(default)]
    pub endpoints: Endpoints,
    /// How tokens are read from the token endpoint and sent back.
    #[serde(default)]
    pub token: TokenSettings,
    /// Request timeout in seconds.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

impl Config {
    /// Creates a configuration for the given host with no credentials,
    /// no proxy and no endpoints.
    ///
    /// # Examples
    ///
    /// ```
    /// use apitool_common::Config;
    ///
    /// let config = Config::new("https://api.example.com");
    /// assert!(config.username.is_none());
    /// ```
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            username: None,
            password: None,
            proxy: None,
            endpoints: Endpoints::default(),
            token: TokenSettings::default(),
            timeout_seconds: None,
        }
    }

    /// Sets the Basic authentication credentials.
    ///
    /// The password is stored securely using `SecretString`.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(SecretString::new(password.into().into()));
        self
    }

    /// Routes requests through the given proxy.
    #[must_use]
    pub fn with_proxy(mut self, proxy: ProxyConfig) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Registers a named endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.endpoints.insert(name, path);
        self
    }

    /// Replaces the token settings.
    #[must_use]
    pub fn with_token_settings(mut self, token: TokenSettings) -> Self {
        self.token = token;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout_seconds(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = Some(timeout_seconds);
        self
    }

    /// Returns `true` if both username and password are set.
    pub const fn has_credentials(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }

    /// Loads a configuration file.
    ///
    /// Files ending in `.json` are parsed as JSON, anything else as TOML.
    /// The loaded configuration is validated before it is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, does not parse, or fails
    /// [`validate`](Self::validate).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let config = if is_json {
            Self::from_json_str(&contents)?
        } else {
            Self::from_toml_str(&contents)?
        };

        log::debug!("Loaded configuration for {} from {}", config.host, path.display());
        Ok(config)
    }

    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the configuration is invalid.
    pub fn from_json_str(contents: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates a TOML configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or the configuration is invalid.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// Checks that:
    /// - `host` is an absolute `http` or `https` URL
    /// - username and password are given together
    /// - the proxy URL, if any, parses
    /// - the token field is not empty
    /// - the token header prefix, if any, is not blank
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        let host = url::Url::parse(&self.host)
            .map_err(|e| ConfigError::Invalid(format!("invalid host '{}': {e}", self.host)))?;

        if !matches!(host.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "host must use http or https, got '{}'",
                host.scheme()
            )));
        }

        if self.username.is_some() != self.password.is_some() {
            return Err(ConfigError::Invalid(
                "username and password must be set together".to_string(),
            ));
        }

        if let Some(proxy) = &self.proxy {
            url::Url::parse(&proxy.url)
                .map_err(|e| ConfigError::Invalid(format!("invalid proxy '{}': {e}", proxy.url)))?;
        }

        if self.token.field.trim().is_empty() {
            return Err(ConfigError::Invalid("token field must not be empty".to_string()));
        }

        if self
            .token
            .header_prefix
            .as_deref()
            .is_some_and(|prefix| prefix.trim().is_empty())
        {
            return Err(ConfigError::Invalid(
                "token header prefix must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Proxy routing for outgoing requests.
///
/// Written in configuration either as a bare URL string or as a table with
/// `url` and `accept_invalid_certs`. Certificate verification stays on unless
/// `accept_invalid_certs` is explicitly set, which is meant for interception
/// proxies used in traffic inspection and never for production traffic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "ProxyRepr")]
pub struct ProxyConfig {
    /// URL of the proxy (e.g. `http://localhost:8080`).
    pub url: String,
    /// Accept TLS certificates that fail verification.
    pub accept_invalid_certs: bool,
}

impl ProxyConfig {
    /// Creates a proxy route with certificate verification left on.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            accept_invalid_certs: false,
        }
    }

    /// Creates a proxy route for an interception proxy, with certificate
    /// verification disabled.
    pub fn intercepting(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            accept_invalid_certs: true,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ProxyRepr {
    Url(String),
    Table {
        url: String,
        #[serde(default)]
        accept_invalid_certs: bool,
    },
}

impl From<ProxyRepr> for ProxyConfig {
    fn from(repr: ProxyRepr) -> Self {
        match repr {
            ProxyRepr::Url(url) => Self::new(url),
            ProxyRepr::Table {
                url,
                accept_invalid_certs,
            } => Self {
                url,
                accept_invalid_certs,
            },
        }
    }
}

/// Logical endpoint names mapped to paths on the API.
///
/// Only `token` has a meaning to the client itself; any other key is defined
/// by the consumer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Endpoints(HashMap<String, String>);

impl Endpoints {
    /// Returns the path registered under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Returns the token endpoint path.
    pub fn token(&self) -> Option<&str> {
        self.get(TOKEN_ENDPOINT)
    }

    /// Registers or replaces a named endpoint.
    pub fn insert(&mut self, name: impl Into<String>, path: impl Into<String>) {
        self.0.insert(name.into(), path.into());
    }

    /// Iterates over `(name, path)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of registered endpoints.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no endpoints are registered.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Endpoints
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// How a token is read from the token endpoint's response and sent back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSettings {
    /// Location of the token in the JSON response body.
    ///
    /// Either a bare top-level key (`token`) or a JSON pointer
    /// (`/data/access_token`). Target APIs differ here, so this is the usual
    /// thing to adjust.
    #[serde(default = "default_token_field")]
    pub field: String,

    /// Scheme prepended to the token in the `Authorization` header,
    /// separated by a space. `None` sends the raw token.
    #[serde(default)]
    pub header_prefix: Option<String>,

    /// Re-acquire the token once it is older than this many seconds.
    /// `None` keeps it for the lifetime of the client.
    #[serde(default)]
    pub max_age_seconds: Option<u64>,
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            field: default_token_field(),
            header_prefix: None,
            max_age_seconds: None,
        }
    }
}

impl TokenSettings {
    /// Sets the location of the token in the response body.
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    /// Sets the scheme prepended to the token (e.g. `Bearer`).
    #[must_use]
    pub fn with_header_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.header_prefix = Some(prefix.into());
        self
    }

    /// Sets the maximum age of a cached token.
    #[must_use]
    pub fn with_max_age_seconds(mut self, seconds: u64) -> Self {
        self.max_age_seconds = Some(seconds);
        self
    }
}

fn default_token_field() -> String {
    "token".to_string()
}
