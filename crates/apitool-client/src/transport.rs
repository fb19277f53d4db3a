//! HTTP transport.
//!
//! [`ApiTool`](crate::ApiTool) never talks to the network itself. It builds a
//! [`PreparedRequest`] and hands it to a [`Transport`], which performs the call
//! and returns the parsed JSON body. [`ReqwestTransport`] is the default;
//! tests and embedders can substitute their own.

use std::collections::HashMap;
use std::time::Duration;

use apitool_common::ProxyConfig;
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Method;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde_json::Value;
use tokio::sync::RwLock;
use url::Url;

use crate::error::{ClientError, Result};

/// A fully assembled request, ready to be sent.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    /// HTTP method.
    pub method: Method,
    /// Target URL, host and endpoint joined, query included.
    pub url: Url,
    /// Headers, including `Accept` and (if any) `Authorization`.
    ///
    /// The `Authorization` value is marked sensitive and is not shown by `Debug`.
    pub headers: HeaderMap,
    /// JSON body.
    pub body: Option<Value>,
    /// Proxy to route through, if one is configured.
    pub proxy: Option<ProxyConfig>,
    /// Per-request timeout.
    pub timeout: Option<Duration>,
}

impl PreparedRequest {
    /// The `Authorization` header value, if one is set.
    pub fn authorization(&self) -> Option<&HeaderValue> {
        self.headers.get(AUTHORIZATION)
    }

    /// Returns `true` if TLS certificate verification is disabled for this request.
    ///
    /// Only ever the case when routed through a proxy that opted in.
    pub fn accepts_invalid_certs(&self) -> bool {
        self.proxy
            .as_ref()
            .is_some_and(|proxy| proxy.accept_invalid_certs)
    }
}

/// Performs HTTP calls on behalf of a client.
///
/// Implementations must return the response body parsed as JSON for success
/// statuses and [`ClientError::Status`] for anything else, without retrying.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request` and returns the parsed response body.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure or a non-success status.
    async fn send(&self, request: PreparedRequest) -> Result<Value>;
}

/// [`Transport`] backed by `reqwest`.
///
/// Requests without a proxy share one client. A client per distinct proxy
/// route is built on first use and kept for later requests.
#[derive(Debug)]
pub struct ReqwestTransport {
    direct: reqwest::Client,
    proxied: RwLock<HashMap<ProxyConfig, reqwest::Client>>,
    timeout: Option<Duration>,
}

impl ReqwestTransport {
    /// Creates a transport. `timeout` of `None` means no timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        Ok(Self {
            direct: Self::builder(timeout).build()?,
            proxied: RwLock::new(HashMap::new()),
            timeout,
        })
    }

    fn builder(timeout: Option<Duration>) -> reqwest::ClientBuilder {
        let builder = reqwest::Client::builder();
        match timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        }
    }

    async fn client_for(&self, proxy: Option<&ProxyConfig>) -> Result<reqwest::Client> {
        let Some(proxy) = proxy else {
            return Ok(self.direct.clone());
        };

        if let Some(client) = self.proxied.read().await.get(proxy) {
            return Ok(client.clone());
        }

        let mut proxied = self.proxied.write().await;
        if let Some(client) = proxied.get(proxy) {
            return Ok(client.clone());
        }

        if proxy.accept_invalid_certs {
            warn!(
                "TLS certificate verification disabled for requests through {}",
                proxy.url
            );
        }

        let client = Self::builder(self.timeout)
            .proxy(reqwest::Proxy::all(&proxy.url)?)
            .danger_accept_invalid_certs(proxy.accept_invalid_certs)
            .build()?;
        proxied.insert(proxy.clone(), client.clone());
        Ok(client)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: PreparedRequest) -> Result<Value> {
        let client = self.client_for(request.proxy.as_ref()).await?;

        let mut builder = client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;
        let body = parse_body(&text);

        if !status.is_success() {
            warn!("API request failed with status {}", status.as_u16());
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}

/// Parses a response body leniently: empty bodies become `null` and bodies
/// that are not JSON are returned as a JSON string.
pub(crate) fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }

    serde_json::from_str(text).unwrap_or_else(|e| {
        debug!("Response body is not JSON ({e}), returning it as a string");
        Value::String(text.to_string())
    })
}
