//! Basic authorization header construction.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use secrecy::SecretString;

/// Builds the `Authorization` value for HTTP Basic authentication:
/// `"Basic " + base64(username + ":" + password)`.
///
/// # Examples
///
/// ```
/// use apitool_client::basic_authorization;
/// use secrecy::ExposeSecret;
///
/// let header = basic_authorization("u", "p");
/// assert_eq!(header.expose_secret(), "Basic dTpw");
/// ```
pub fn basic_authorization(username: &str, password: &str) -> SecretString {
    let encoded = STANDARD.encode(format!("{username}:{password}"));
    SecretString::new(format!("Basic {encoded}").into())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use secrecy::ExposeSecret;

    use super::*;

    fn decode(header: &SecretString) -> (String, String) {
        let encoded = header.expose_secret().strip_prefix("Basic ").unwrap();
        let decoded = String::from_utf8(STANDARD.decode(encoded).unwrap()).unwrap();
        let (username, password) = decoded.split_once(':').unwrap();
        (username.to_string(), password.to_string())
    }

    #[test]
    fn test_known_value() {
        let header = basic_authorization("developer", "sup3Rs3cr3t!!");
        assert_eq!(
            header.expose_secret(),
            "Basic ZGV2ZWxvcGVyOnN1cDNSczNjcjN0ISE="
        );
    }

    #[test]
    fn test_decodes_back_to_credentials() {
        let cases = [
            ("u", "p"),
            ("developer", "sup3Rs3cr3t!!"),
            ("user", "pass:with:colons"),
            ("ünïcödé", "pässwörd"),
            ("", ""),
        ];

        for (username, password) in cases {
            let header = basic_authorization(username, password);
            assert_eq!(decode(&header), (username.to_string(), password.to_string()));
        }
    }
}
