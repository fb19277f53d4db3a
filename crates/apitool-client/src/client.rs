//! The base API client.
//!
//! [`ApiTool`] holds the connection configuration, works out the
//! `Authorization` header for each request, joins endpoints onto the host and
//! hands the assembled request to a [`Transport`].
//!
//! # Examples
//!
//! ```no_run
//! use apitool_client::{ApiTool, Auth, RequestOptions};
//! use apitool_common::Config;
//!
//! # async fn example() -> apitool_client::Result<()> {
//! let config = Config::new("https://api.hackableapp.com:3000")
//!     .with_credentials("developer", "sup3Rs3cr3t!!")
//!     .with_endpoint("token", "/auth");
//!
//! let api = ApiTool::new(config)?;
//!
//! // Unauthenticated
//! let status = api.get("/status", Auth::None, RequestOptions::default()).await?;
//!
//! // Token acquired from `/auth` on first use, then reused
//! let user = api
//!     .post("/user", Auth::Token, RequestOptions::json(&serde_json::json!({"username": "hacker"}))?)
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Security
//!
//! The password and acquired tokens are held as `SecretString` and the
//! `Authorization` header is marked sensitive, so none of them show up in
//! `Debug` output or logs.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use apitool_common::config::TOKEN_ENDPOINT;
use apitool_common::{Auth, Config};
use chrono::{DateTime, Utc};
use log::debug;
use reqwest::Method;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::auth::basic_authorization;
use crate::endpoint::join_endpoint;
use crate::error::{ClientError, Result};
use crate::options::RequestOptions;
use crate::token::{JsonFieldExtractor, TokenCache, TokenExtractor};
use crate::transport::{PreparedRequest, ReqwestTransport, Transport};

/// Authorization-aware request dispatch for a single REST API.
///
/// Domain-specific clients hold an `ApiTool` and build their endpoint methods
/// on [`request`](Self::request) or the method shortcuts. Clones share the
/// transport and the token cache.
#[derive(Clone)]
pub struct ApiTool {
    config: Arc<Config>,
    host: Url,
    transport: Arc<dyn Transport>,
    extractor: Arc<dyn TokenExtractor>,
    token: Arc<TokenCache>,
}

// Custom Debug implementation to skip the transport and extractor
impl std::fmt::Debug for ApiTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiTool")
            .field("host", &self.host.as_str())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ApiTool {
    /// Create a new client from a configuration.
    ///
    /// Uses [`ReqwestTransport`] and reads tokens from the location named by
    /// `config.token.field`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be created.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let host = Url::parse(&config.host).map_err(|e| {
            ClientError::ConfigurationError(format!("Invalid host '{}': {e}", config.host))
        })?;

        let transport = ReqwestTransport::new(config.timeout_seconds.map(Duration::from_secs))?;
        let extractor = JsonFieldExtractor::new(&config.token.field);
        let token = TokenCache::new(config.token.max_age_seconds.map(Duration::from_secs));

        Ok(Self {
            config: Arc::new(config),
            host,
            transport: Arc::new(transport),
            extractor: Arc::new(extractor),
            token: Arc::new(token),
        })
    }

    /// Create a new client from a JSON or TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded or the client cannot be built.
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(Config::load(path)?)
    }

    /// Replace the transport requests are sent through.
    #[must_use]
    pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Arc::new(transport);
        self
    }

    /// Replace how tokens are read from the token endpoint's response.
    #[must_use]
    pub fn with_token_extractor(mut self, extractor: impl TokenExtractor + 'static) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }

    /// The configuration this client was built from.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The parsed host URL every endpoint is joined onto.
    pub const fn host(&self) -> &Url {
        &self.host
    }

    /// The Basic `Authorization` value for the configured credentials.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MissingCredentials`] if no username and password
    /// are configured.
    pub fn basic_authorization(&self) -> Result<SecretString> {
        match (&self.config.username, &self.config.password) {
            (Some(username), Some(password)) => {
                Ok(basic_authorization(username, password.expose_secret()))
            }
            _ => Err(ClientError::MissingCredentials("Basic")),
        }
    }

    /// Resolves the `Authorization` value for `auth`.
    ///
    /// Returns `Ok(None)` for [`Auth::None`]. For [`Auth::Token`] this waits
    /// for a token, acquiring one if none is cached.
    ///
    /// # Errors
    ///
    /// Returns an error if credentials are missing or token acquisition fails.
    pub async fn authorization_header(&self, auth: Auth) -> Result<Option<SecretString>> {
        match auth {
            Auth::Basic => self.basic_authorization().map(Some),
            Auth::Token => {
                let token = self.token().await?;
                let value = match &self.config.token.header_prefix {
                    Some(prefix) => {
                        SecretString::new(format!("{prefix} {}", token.expose_secret()).into())
                    }
                    None => token,
                };
                Ok(Some(value))
            }
            Auth::None => Ok(None),
        }
    }

    /// Returns the API token, acquiring it from the `token` endpoint with
    /// Basic authentication if none is cached.
    ///
    /// Concurrent callers share a single acquisition.
    ///
    /// # Errors
    ///
    /// Returns an error if the token endpoint or credentials are not
    /// configured, the request fails, or the response holds no token.
    pub async fn token(&self) -> Result<SecretString> {
        self.token.get_or_acquire(|| self.acquire_token()).await
    }

    /// Drops the cached token so the next token-authenticated request
    /// acquires a new one.
    pub async fn clear_token(&self) {
        self.token.clear().await;
    }

    /// When the cached token was acquired, if one is cached.
    pub async fn token_acquired_at(&self) -> Option<DateTime<Utc>> {
        self.token.acquired_at().await
    }

    async fn acquire_token(&self) -> Result<SecretString> {
        let endpoint = self
            .config
            .endpoints
            .token()
            .ok_or_else(|| ClientError::MissingEndpoint(TOKEN_ENDPOINT.to_string()))?;
        let credentials = self
            .basic_authorization()
            .map_err(|_| ClientError::MissingCredentials("token"))?;

        debug!("Requesting token from {endpoint}");
        let request = self.build_request(
            Method::POST,
            endpoint,
            Some(credentials),
            RequestOptions::default(),
        )?;
        let body = self.transport.send(request).await?;

        let token = self.extractor.extract(&body)?;
        Ok(SecretString::new(token.into()))
    }

    /// Assembles a request without sending it.
    ///
    /// # Errors
    ///
    /// Returns an error if the `Authorization` value cannot be resolved or a
    /// header is invalid.
    pub async fn prepare(
        &self,
        method: Method,
        endpoint: &str,
        auth: Auth,
        options: RequestOptions,
    ) -> Result<PreparedRequest> {
        let authorization = self.authorization_header(auth).await?;
        self.build_request(method, endpoint, authorization, options)
    }

    fn build_request(
        &self,
        method: Method,
        endpoint: &str,
        authorization: Option<SecretString>,
        options: RequestOptions,
    ) -> Result<PreparedRequest> {
        let mut url = join_endpoint(&self.host, endpoint);
        if !options.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&options.query);
        }

        let mut headers = HeaderMap::with_capacity(options.headers.len() + 2);
        for (name, value) in &options.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ClientError::InvalidHeader(format!("{name}: {e}")))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| ClientError::InvalidHeader(format!("{name}: {e}")))?;
            headers.insert(header_name, header_value);
        }

        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        match authorization {
            Some(authorization) => {
                let mut value =
                    HeaderValue::from_str(authorization.expose_secret()).map_err(|_| {
                        ClientError::InvalidHeader(
                            "Authorization value contains invalid characters".to_string(),
                        )
                    })?;
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
            None => {
                headers.remove(AUTHORIZATION);
            }
        }

        Ok(PreparedRequest {
            method,
            url,
            headers,
            body: options.body,
            proxy: self.config.proxy.clone(),
            timeout: options.timeout,
        })
    }

    /// Make a request to the API and return the JSON response.
    ///
    /// # Arguments
    ///
    /// * `method` - The HTTP method
    /// * `endpoint` - Path joined onto the configured host
    /// * `auth` - How to authorize the request
    /// * `options` - Extra headers, body, query and timeout
    ///
    /// # Errors
    ///
    /// Returns an error if authorization cannot be resolved or the transport
    /// fails. Transport errors, including non-success statuses, are returned
    /// unchanged.
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        auth: Auth,
        options: RequestOptions,
    ) -> Result<Value> {
        let request = self.prepare(method, endpoint, auth, options).await?;
        debug!("{} {} (auth: {auth})", request.method, request.url);
        self.transport.send(request).await
    }

    /// Like [`request`](Self::request), deserializing the response into `T`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response does not match `T`.
    pub async fn request_as<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        auth: Auth,
        options: RequestOptions,
    ) -> Result<T> {
        let body = self.request(method, endpoint, auth, options).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Make a GET request to the API.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn get(&self, endpoint: &str, auth: Auth, options: RequestOptions) -> Result<Value> {
        self.request(Method::GET, endpoint, auth, options).await
    }

    /// Make a POST request to the API.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn post(&self, endpoint: &str, auth: Auth, options: RequestOptions) -> Result<Value> {
        self.request(Method::POST, endpoint, auth, options).await
    }

    /// Make a PUT request to the API.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn put(&self, endpoint: &str, auth: Auth, options: RequestOptions) -> Result<Value> {
        self.request(Method::PUT, endpoint, auth, options).await
    }

    /// Make a PATCH request to the API.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn patch(
        &self,
        endpoint: &str,
        auth: Auth,
        options: RequestOptions,
    ) -> Result<Value> {
        self.request(Method::PATCH, endpoint, auth, options).await
    }

    /// Make a DELETE request to the API.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn delete(
        &self,
        endpoint: &str,
        auth: Auth,
        options: RequestOptions,
    ) -> Result<Value> {
        self.request(Method::DELETE, endpoint, auth, options).await
    }
}
