//! Token extraction and caching.
//!
//! Every target API returns its token somewhere different, so reading it out
//! of the token endpoint's response goes through [`TokenExtractor`]. The
//! default [`JsonFieldExtractor`] covers the common "string field in a JSON
//! object" shape; closures cover the rest.
//!
//! Acquired tokens are kept in a [`TokenCache`]. By default a cached token is
//! never re-validated: if the API expires it, requests keep failing until
//! [`ApiTool::clear_token`](crate::ApiTool::clear_token) is called or a
//! maximum age is configured.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::debug;
use secrecy::SecretString;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::error::{ClientError, Result};

/// Reads a token out of the token endpoint's JSON response.
///
/// Implemented for any `Fn(&Value) -> Option<String>`:
///
/// ```
/// use apitool_client::TokenExtractor;
/// use serde_json::{Value, json};
///
/// let extractor = |body: &Value| body["session"]["id"].as_str().map(String::from);
/// let token = extractor.extract(&json!({"session": {"id": "s-1"}})).unwrap();
/// assert_eq!(token, "s-1");
/// ```
pub trait TokenExtractor: Send + Sync {
    /// Returns the token contained in `body`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::TokenExtraction`] if no usable token is present.
    fn extract(&self, body: &Value) -> Result<String>;
}

impl<F> TokenExtractor for F
where
    F: Fn(&Value) -> Option<String> + Send + Sync,
{
    fn extract(&self, body: &Value) -> Result<String> {
        self(body).ok_or_else(|| {
            ClientError::TokenExtraction("extractor found no token in response".to_string())
        })
    }
}

/// Extracts a string token from a fixed location in a JSON object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonFieldExtractor {
    pointer: String,
}

impl JsonFieldExtractor {
    /// Creates an extractor for `field`.
    ///
    /// A `field` starting with `/` is used as a JSON pointer
    /// (`/data/access_token`); anything else names a top-level key.
    pub fn new(field: &str) -> Self {
        let pointer = if field.starts_with('/') {
            field.to_string()
        } else {
            format!("/{}", field.replace('~', "~0").replace('/', "~1"))
        };
        Self { pointer }
    }

    /// The JSON pointer this extractor reads.
    pub fn pointer(&self) -> &str {
        &self.pointer
    }
}

impl Default for JsonFieldExtractor {
    fn default() -> Self {
        Self::new("token")
    }
}

impl TokenExtractor for JsonFieldExtractor {
    fn extract(&self, body: &Value) -> Result<String> {
        match body.pointer(&self.pointer) {
            Some(Value::String(token)) if !token.is_empty() => Ok(token.clone()),
            Some(Value::String(_)) => Err(ClientError::TokenExtraction(format!(
                "token at '{}' is empty",
                self.pointer
            ))),
            Some(other) => Err(ClientError::TokenExtraction(format!(
                "expected a string at '{}', found {}",
                self.pointer,
                json_kind(other)
            ))),
            None => Err(ClientError::TokenExtraction(format!(
                "no token at '{}'",
                self.pointer
            ))),
        }
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[derive(Debug)]
struct CachedToken {
    value: SecretString,
    acquired_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, max_age: Option<Duration>) -> bool {
        let Some(max_age) = max_age else {
            return true;
        };
        // A negative age (clock moved backwards) counts as fresh.
        (Utc::now() - self.acquired_at)
            .to_std()
            .map_or(true, |age| age < max_age)
    }
}

/// A single cached token shared by all clones of a client.
///
/// Acquisition is single-flight: the lock is held while a token is being
/// fetched, so concurrent callers wait for that fetch instead of issuing
/// their own.
#[derive(Debug, Default)]
pub struct TokenCache {
    slot: Mutex<Option<CachedToken>>,
    max_age: Option<Duration>,
}

impl TokenCache {
    /// Creates an empty cache. `max_age` of `None` keeps tokens forever.
    pub fn new(max_age: Option<Duration>) -> Self {
        Self {
            slot: Mutex::new(None),
            max_age,
        }
    }

    /// Returns the cached token, running `acquire` first if there is none
    /// or it is older than the maximum age.
    ///
    /// A failed acquisition leaves the cache empty.
    ///
    /// # Errors
    ///
    /// Returns whatever `acquire` returns.
    pub async fn get_or_acquire<F, Fut>(&self, acquire: F) -> Result<SecretString>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<SecretString>>,
    {
        let mut slot = self.slot.lock().await;

        if let Some(cached) = slot.as_ref() {
            if cached.is_fresh(self.max_age) {
                return Ok(cached.value.clone());
            }
            debug!("Cached token acquired at {} has expired", cached.acquired_at);
        }

        *slot = None;
        let value = acquire().await?;
        *slot = Some(CachedToken {
            value: value.clone(),
            acquired_at: Utc::now(),
        });
        Ok(value)
    }

    /// Drops the cached token.
    pub async fn clear(&self) {
        self.slot.lock().await.take();
    }

    /// When the cached token was acquired, if there is one.
    pub async fn acquired_at(&self) -> Option<DateTime<Utc>> {
        self.slot.lock().await.as_ref().map(|cached| cached.acquired_at)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use secrecy::ExposeSecret;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_top_level_field() {
        let extractor = JsonFieldExtractor::default();
        assert_eq!(extractor.pointer(), "/token");
        assert_eq!(extractor.extract(&json!({"token": "abc123"})).unwrap(), "abc123");
    }

    #[test]
    fn test_json_pointer_field() {
        let extractor = JsonFieldExtractor::new("/data/access_token");
        let body = json!({"data": {"access_token": "xyz"}});
        assert_eq!(extractor.extract(&body).unwrap(), "xyz");
    }

    #[test]
    fn test_key_with_slash_is_escaped() {
        let extractor = JsonFieldExtractor::new("auth/token");
        assert_eq!(extractor.pointer(), "/auth~1token");
        assert_eq!(extractor.extract(&json!({"auth/token": "t"})).unwrap(), "t");
    }

    #[test]
    fn test_missing_or_wrong_type() {
        let extractor = JsonFieldExtractor::default();

        let err = extractor.extract(&json!({"access_token": "abc"})).unwrap_err();
        assert!(matches!(err, ClientError::TokenExtraction(_)));

        let err = extractor.extract(&json!({"token": 42})).unwrap_err();
        assert!(err.to_string().contains("a number"));

        let err = extractor.extract(&json!({"token": ""})).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_closure_extractor() {
        let extractor = |body: &Value| body.get("jwt").and_then(Value::as_str).map(String::from);
        assert_eq!(extractor.extract(&json!({"jwt": "j"})).unwrap(), "j");
        assert!(extractor.extract(&json!({})).is_err());
    }

    fn counting_acquire(calls: Arc<AtomicUsize>) -> impl Future<Output = Result<SecretString>> {
        async move {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            Ok(SecretString::new(format!("token-{n}").into()))
        }
    }

    #[tokio::test]
    async fn test_cache_reuses_token() {
        let cache = TokenCache::new(None);
        let calls = Arc::new(AtomicUsize::new(0));

        let first = cache.get_or_acquire(|| counting_acquire(Arc::clone(&calls))).await.unwrap();
        let second = cache.get_or_acquire(|| counting_acquire(Arc::clone(&calls))).await.unwrap();

        assert_eq!(first.expose_secret(), "token-0");
        assert_eq!(second.expose_secret(), "token-0");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.acquired_at().await.is_some());
    }

    #[tokio::test]
    async fn test_zero_max_age_always_reacquires() {
        let cache = TokenCache::new(Some(Duration::ZERO));
        let calls = Arc::new(AtomicUsize::new(0));

        cache.get_or_acquire(|| counting_acquire(Arc::clone(&calls))).await.unwrap();
        let second = cache.get_or_acquire(|| counting_acquire(Arc::clone(&calls))).await.unwrap();

        assert_eq!(second.expose_secret(), "token-1");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_clear_forces_reacquire() {
        let cache = TokenCache::new(None);
        let calls = Arc::new(AtomicUsize::new(0));

        cache.get_or_acquire(|| counting_acquire(Arc::clone(&calls))).await.unwrap();
        cache.clear().await;
        assert!(cache.acquired_at().await.is_none());

        cache.get_or_acquire(|| counting_acquire(Arc::clone(&calls))).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_acquire_leaves_cache_empty() {
        let cache = TokenCache::new(None);

        let err = cache
            .get_or_acquire(|| async {
                Err(ClientError::TokenExtraction("nope".to_string()))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::TokenExtraction(_)));
        assert!(cache.acquired_at().await.is_none());
    }
}
