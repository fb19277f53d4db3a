//! Per-request options.

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;
use typed_builder::TypedBuilder;

use crate::error::Result;

/// Additional data passed along with a single request.
///
/// `Accept` and `Authorization` are always set by the client and override
/// any value given here.
///
/// # Examples
///
/// ```
/// use apitool_client::RequestOptions;
/// use std::time::Duration;
///
/// let options = RequestOptions::builder()
///     .body(serde_json::json!({"username": "hacker"}))
///     .timeout(Duration::from_secs(5))
///     .build()
///     .with_header("X-Request-Id", "42");
///
/// assert_eq!(options.headers.get("X-Request-Id").map(String::as_str), Some("42"));
/// ```
#[derive(Debug, Clone, Default, TypedBuilder)]
pub struct RequestOptions {
    /// Extra headers, by name.
    #[builder(default)]
    pub headers: HashMap<String, String>,
    /// JSON request body.
    #[builder(default, setter(strip_option))]
    pub body: Option<serde_json::Value>,
    /// Query parameters appended to the URL.
    #[builder(default)]
    pub query: Vec<(String, String)>,
    /// Timeout for this request, overriding the client's.
    #[builder(default, setter(strip_option))]
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    /// Creates options carrying `body` serialized as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if `body` cannot be serialized.
    pub fn json<T: Serialize + ?Sized>(body: &T) -> Result<Self> {
        Ok(Self {
            body: Some(serde_json::to_value(body)?),
            ..Self::default()
        })
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Appends a query parameter.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}
