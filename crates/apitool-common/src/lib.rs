//! # apitool-common
//!
//! Shared types for building REST API clients on top of `apitool-client`.
//!
//! This crate holds the pieces that do not depend on an HTTP stack:
//! - [`Config`]: host, credentials, proxy routing and named endpoints
//! - [`Auth`]: how a request obtains its `Authorization` header
//! - [`ConfigError`]: failures while loading or validating configuration
//!
//! ## Example
//!
//! ```
//! use apitool_common::{Auth, Config};
//!
//! let config = Config::new("https://api.hackableapp.com:3000")
//!     .with_credentials("developer", "sup3Rs3cr3t!!")
//!     .with_endpoint("token", "/auth")
//!     .with_endpoint("status", "/status");
//!
//! assert!(config.validate().is_ok());
//! assert_eq!(config.endpoints.token(), Some("/auth"));
//! assert_eq!(Auth::default(), Auth::Token);
//! ```

pub mod auth;
pub mod config;
pub mod error;

pub use auth::Auth;
pub use config::{Config, Endpoints, ProxyConfig, TokenSettings};
pub use error::ConfigError;
