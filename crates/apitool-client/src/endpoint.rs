//! Joining endpoint paths onto the configured host.
//!
//! The host's path is treated as a directory prefix that every endpoint lives
//! under. Endpoint paths are normalized segment by segment: empty and `.`
//! segments are dropped and `..` only removes segments the endpoint itself
//! contributed, so an endpoint can never climb out of the host prefix.
//!
//! Segments are split on `\` as well as `/`, and percent-encoded dots
//! (`%2e`) count as dots, matching how the URL parser reads http(s) paths.

use url::Url;

/// Joins `endpoint` onto `host` with exactly one `/` between them.
///
/// A trailing slash on a non-empty endpoint is kept, and any `?query` or
/// `#fragment` on the endpoint is carried over to the result.
///
/// # Examples
///
/// ```
/// use apitool_client::join_endpoint;
/// use url::Url;
///
/// let host = Url::parse("https://h.test").unwrap();
/// assert_eq!(join_endpoint(&host, "/status").as_str(), "https://h.test/status");
///
/// let host = Url::parse("https://h.test/").unwrap();
/// assert_eq!(join_endpoint(&host, "status").as_str(), "https://h.test/status");
///
/// let host = Url::parse("https://h.test/api/v1").unwrap();
/// assert_eq!(join_endpoint(&host, "/../users").as_str(), "https://h.test/api/v1/users");
/// ```
pub fn join_endpoint(host: &Url, endpoint: &str) -> Url {
    let (rest, fragment) = match endpoint.split_once('#') {
        Some((rest, fragment)) => (rest, Some(fragment)),
        None => (endpoint, None),
    };
    let (path, query) = match rest.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (rest, None),
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split(['/', '\\']) {
        match DotSegment::classify(segment) {
            DotSegment::Skip => {}
            DotSegment::Parent => {
                segments.pop();
            }
            DotSegment::Name => segments.push(segment),
        }
    }

    let prefix = host.path().trim_end_matches('/');
    let mut joined = String::with_capacity(prefix.len() + path.len() + 2);
    joined.push_str(prefix);
    joined.push('/');
    joined.push_str(&segments.join("/"));
    if !segments.is_empty() && path.ends_with(['/', '\\']) {
        joined.push('/');
    }

    let mut url = host.clone();
    url.set_path(&joined);
    url.set_query(query);
    url.set_fragment(fragment);
    url
}

enum DotSegment {
    Skip,
    Parent,
    Name,
}

impl DotSegment {
    /// Classifies a segment the way the URL parser would, treating `%2e` as `.`.
    fn classify(segment: &str) -> Self {
        if segment.is_empty() {
            return Self::Skip;
        }
        match segment.to_ascii_lowercase().replace("%2e", ".").as_str() {
            "." => Self::Skip,
            ".." => Self::Parent,
            _ => Self::Name,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn join(host: &str, endpoint: &str) -> String {
        join_endpoint(&Url::parse(host).unwrap(), endpoint).to_string()
    }

    #[test]
    fn test_single_separator() {
        assert_eq!(join("https://h.test", "/status"), "https://h.test/status");
        assert_eq!(join("https://h.test/", "status"), "https://h.test/status");
        assert_eq!(join("https://h.test/", "/status"), "https://h.test/status");
        assert_eq!(join("https://h.test", "status"), "https://h.test/status");
        assert_eq!(join("https://h.test", "//user//42"), "https://h.test/user/42");
    }

    #[test]
    fn test_host_prefix_is_preserved() {
        assert_eq!(join("https://h.test/api/v1", "/user"), "https://h.test/api/v1/user");
        assert_eq!(join("https://h.test/api/v1/", "user"), "https://h.test/api/v1/user");
    }

    #[test]
    fn test_dot_segments_stay_inside_prefix() {
        assert_eq!(join("https://h.test/api", "../../admin"), "https://h.test/api/admin");
        assert_eq!(join("https://h.test/api", "/user/../status"), "https://h.test/api/status");
        assert_eq!(join("https://h.test/api", "./status"), "https://h.test/api/status");
    }

    #[test]
    fn test_encoded_dot_segments_stay_inside_prefix() {
        assert_eq!(
            join("https://h.test/api/v1", "/%2e%2e/%2e%2e/admin"),
            "https://h.test/api/v1/admin"
        );
        assert_eq!(join("https://h.test/api/v1", "/%2E./admin"), "https://h.test/api/v1/admin");
        assert_eq!(join("https://h.test/api/v1", "/.%2E/admin"), "https://h.test/api/v1/admin");
        assert_eq!(join("https://h.test/api/v1", "/%2e/status"), "https://h.test/api/v1/status");
        assert_eq!(
            join("https://h.test/api/v1", "/user/%2e%2e/status"),
            "https://h.test/api/v1/status"
        );
    }

    #[test]
    fn test_backslash_segments_stay_inside_prefix() {
        assert_eq!(join("https://h.test/api/v1", "..\\..\\admin"), "https://h.test/api/v1/admin");
        assert_eq!(join("https://h.test/api/v1", "user\\42"), "https://h.test/api/v1/user/42");
    }

    #[test]
    fn test_dotted_names_are_kept() {
        assert_eq!(join("https://h.test", "/.well-known/x"), "https://h.test/.well-known/x");
        assert_eq!(join("https://h.test", "/v1.2/..."), "https://h.test/v1.2/...");
    }

    #[test]
    fn test_port_is_kept() {
        assert_eq!(
            join("https://api.hackableapp.com:3000", "/auth"),
            "https://api.hackableapp.com:3000/auth"
        );
    }

    #[test]
    fn test_trailing_slash_is_kept() {
        assert_eq!(join("https://h.test", "/user/"), "https://h.test/user/");
    }

    #[test]
    fn test_empty_endpoint_is_host_root() {
        assert_eq!(join("https://h.test", ""), "https://h.test/");
        assert_eq!(join("https://h.test/api", "/"), "https://h.test/api/");
    }

    #[test]
    fn test_query_and_fragment() {
        assert_eq!(
            join("https://h.test/api", "/user?id=7&sort=asc"),
            "https://h.test/api/user?id=7&sort=asc"
        );
        assert_eq!(join("https://h.test", "docs#top"), "https://h.test/docs#top");
    }

    #[test]
    fn test_encoded_segments_are_not_double_encoded() {
        assert_eq!(join("https://h.test", "/user/a%20b"), "https://h.test/user/a%20b");
        assert_eq!(join("https://h.test", "/user/a b"), "https://h.test/user/a%20b");
    }
}
