//! Authentication modes.
//!
//! An [`Auth`] value selects how a request obtains its `Authorization` header.
//! Values coming from untyped input (numeric codes in existing configuration,
//! free-form strings) are parsed leniently: anything unrecognized resolves to
//! [`Auth::None`] instead of failing.

use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

/// How a request should be authorized.
///
/// # Examples
///
/// ```
/// use apitool_common::Auth;
///
/// assert_eq!(Auth::from(0), Auth::Basic);
/// assert_eq!(Auth::from_name("token"), Auth::Token);
///
/// // Unknown modes fall back to no authentication.
/// assert_eq!(Auth::from(42), Auth::None);
/// assert_eq!(Auth::from_name("digest"), Auth::None);
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(from = "AuthRepr")]
pub enum Auth {
    /// Use Basic username and password credentials.
    #[serde(rename = "basic")]
    Basic,

    /// Use a token acquired from the token endpoint.
    #[serde(rename = "token")]
    #[default]
    Token,

    /// Do not send an `Authorization` header.
    #[serde(rename = "none")]
    None,
}

impl Auth {
    /// Parses an auth mode by name, ignoring ASCII case.
    ///
    /// Unrecognized names resolve to [`Auth::None`].
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "basic" => Self::Basic,
            "token" | "bearer" => Self::Token,
            "none" => Self::None,
            other => {
                debug!("Unknown auth mode '{other}', sending no Authorization header");
                Self::None
            }
        }
    }

    /// Returns the numeric code of this mode (`Basic = 0`, `Token = 1`, `None = 2`).
    pub const fn code(self) -> u8 {
        match self {
            Self::Basic => 0,
            Self::Token => 1,
            Self::None => 2,
        }
    }

    /// Returns `true` if this mode sends credentials of any kind.
    pub const fn is_authenticated(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Accepted wire forms: a mode name or a numeric code.
#[derive(Deserialize)]
#[serde(untagged)]
enum AuthRepr {
    Code(u8),
    Name(String),
}

impl From<AuthRepr> for Auth {
    fn from(repr: AuthRepr) -> Self {
        match repr {
            AuthRepr::Code(code) => Self::from(code),
            AuthRepr::Name(name) => Self::from_name(&name),
        }
    }
}

impl From<u8> for Auth {
    fn from(code: u8) -> Self {
        match code {
            0 => Self::Basic,
            1 => Self::Token,
            2 => Self::None,
            other => {
                debug!("Unknown auth code {other}, sending no Authorization header");
                Self::None
            }
        }
    }
}

impl fmt::Display for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Basic => "basic",
            Self::Token => "token",
            Self::None => "none",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_codes_round_trip() {
        for auth in [Auth::Basic, Auth::Token, Auth::None] {
            assert_eq!(Auth::from(auth.code()), auth);
        }
    }

    #[test]
    fn test_unknown_code_is_none() {
        assert_eq!(Auth::from(3), Auth::None);
        assert_eq!(Auth::from(u8::MAX), Auth::None);
    }

    #[test]
    fn test_from_name_is_case_insensitive() {
        assert_eq!(Auth::from_name("BASIC"), Auth::Basic);
        assert_eq!(Auth::from_name(" Token "), Auth::Token);
        assert_eq!(Auth::from_name("Bearer"), Auth::Token);
        assert_eq!(Auth::from_name("none"), Auth::None);
        assert_eq!(Auth::from_name("ntlm"), Auth::None);
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&Auth::Basic).unwrap(), "\"basic\"");
        let auth: Auth = serde_json::from_str("\"token\"").unwrap();
        assert_eq!(auth, Auth::Token);
        let auth: Auth = serde_json::from_str("\"kerberos\"").unwrap();
        assert_eq!(auth, Auth::None);
        let auth: Auth = serde_json::from_str("0").unwrap();
        assert_eq!(auth, Auth::Basic);
    }

    #[test]
    fn test_default_is_token() {
        assert_eq!(Auth::default(), Auth::Token);
        assert!(Auth::Basic.is_authenticated());
        assert!(!Auth::None.is_authenticated());
    }
}
