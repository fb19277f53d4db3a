//! # apitool-client
//!
//! A base for REST API clients.
//!
//! [`ApiTool`] centralizes the parts every client of a given API needs:
//! - Host configuration, with endpoints joined onto it segment by segment
//! - Basic and token authentication, with the token acquired once and cached
//! - Optional proxy routing, e.g. through an interception proxy during testing
//! - A single generic [`request`](ApiTool::request) primitive plus method shortcuts
//!
//! Domain-specific clients hold an [`ApiTool`] and implement [`ApiClient`] to
//! add their own endpoint methods.
//!
//! ## Example
//!
//! ```no_run
//! use apitool_client::{ApiClient, ApiTool, Auth, RequestOptions, Result};
//! use apitool_common::Config;
//! use serde_json::Value;
//!
//! struct HackableAppApi {
//!     api: ApiTool,
//! }
//!
//! impl ApiClient for HackableAppApi {
//!     fn api_tool(&self) -> &ApiTool {
//!         &self.api
//!     }
//! }
//!
//! impl HackableAppApi {
//!     async fn status(&self) -> Result<Value> {
//!         let endpoint = self.endpoint("status")?;
//!         self.api.get(endpoint, Auth::None, RequestOptions::default()).await
//!     }
//! }
//!
//! # async fn example() -> Result<()> {
//! let config = Config::new("https://api.hackableapp.com:3000")
//!     .with_credentials("developer", "sup3Rs3cr3t!!")
//!     .with_endpoint("token", "/auth")
//!     .with_endpoint("status", "/status");
//!
//! let client = HackableAppApi { api: ApiTool::new(config)? };
//! println!("{}", client.status().await?);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod endpoint;
pub mod error;
pub mod options;
pub mod token;
pub mod transport;

pub use apitool_common::{Auth, Config, ProxyConfig, TokenSettings};
pub use auth::basic_authorization;
pub use client::ApiTool;
pub use endpoint::join_endpoint;
pub use error::{ClientError, Result};
pub use options::RequestOptions;
pub use reqwest::Method;
pub use token::{JsonFieldExtractor, TokenCache, TokenExtractor};
pub use transport::{PreparedRequest, ReqwestTransport, Transport};

/// Trait for clients built on top of an [`ApiTool`].
///
/// Implementors only provide access to their `ApiTool`; endpoint lookups
/// come for free.
pub trait ApiClient: Send + Sync {
    /// The underlying client requests are made through.
    fn api_tool(&self) -> &ApiTool;

    /// Resolves a named endpoint from the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MissingEndpoint`] if `name` is not configured.
    fn endpoint(&self, name: &str) -> Result<&str> {
        self.api_tool()
            .config()
            .endpoints
            .get(name)
            .ok_or_else(|| ClientError::MissingEndpoint(name.to_string()))
    }
}

impl ApiClient for ApiTool {
    fn api_tool(&self) -> &ApiTool {
        self
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    // Mock implementation for testing
    struct StatusClient {
        api: ApiTool,
    }

    impl ApiClient for StatusClient {
        fn api_tool(&self) -> &ApiTool {
            &self.api
        }
    }

    fn create_client() -> StatusClient {
        let config = Config::new("https://h.test")
            .with_endpoint("status", "/status")
            .with_endpoint("user", "/user");
        StatusClient {
            api: ApiTool::new(config).unwrap(),
        }
    }

    #[test]
    fn test_endpoint_lookup() {
        let client = create_client();
        assert_eq!(client.endpoint("status").unwrap(), "/status");
        assert_eq!(client.endpoint("user").unwrap(), "/user");
    }

    #[test]
    fn test_missing_endpoint() {
        let client = create_client();
        let err = client.endpoint("token").unwrap_err();
        assert!(matches!(err, ClientError::MissingEndpoint(name) if name == "token"));
    }

    #[test]
    fn test_api_tool_is_its_own_client() {
        let client = create_client();
        let api = client.api_tool();
        assert_eq!(api.api_tool().host().as_str(), "https://h.test/");
    }
}
