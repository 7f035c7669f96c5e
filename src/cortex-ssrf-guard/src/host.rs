//! Hostname normalization.

use url::Url;

/// Normalize the host of a parsed URL for classification.
///
/// Returns `None` when the URL has no host component.
pub fn url_hostname(url: &Url) -> Option<String> {
    url.host_str().map(normalize_hostname)
}

/// Normalize a hostname or literal IP.
/// - Lowercase
/// - Strip brackets from IPv6 literals
/// - Strip one trailing root dot (`localhost.` is `localhost`)
pub fn normalize_hostname(input: &str) -> String {
    let host = input.to_lowercase();

    if let Some(inner) = host.strip_prefix('[').and_then(|h| h.strip_suffix(']')) {
        return inner.to_string();
    }

    match host.strip_suffix('.') {
        Some(name) => name.to_string(),
        None => host,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_hostname() {
        assert_eq!(normalize_hostname("Example.COM"), "example.com");
        assert_eq!(normalize_hostname("[::1]"), "::1");
        assert_eq!(normalize_hostname("[FE80::1]"), "fe80::1");
        assert_eq!(normalize_hostname("127.0.0.1"), "127.0.0.1");
    }

    #[test]
    fn test_trailing_dot_stripped() {
        assert_eq!(normalize_hostname("localhost."), "localhost");
        assert_eq!(
            normalize_hostname("Metadata.Google.Internal."),
            "metadata.google.internal"
        );
        assert_eq!(normalize_hostname("example.com.."), "example.com.");

        let url = Url::parse("http://metadata./computeMetadata/v1/").unwrap();
        assert_eq!(url_hostname(&url).as_deref(), Some("metadata"));
    }

    #[test]
    fn test_unbalanced_brackets_kept() {
        assert_eq!(normalize_hostname("[::1"), "[::1");
    }

    #[test]
    fn test_url_hostname() {
        let url = Url::parse("http://[::1]:8080/hook").unwrap();
        assert_eq!(url_hostname(&url).as_deref(), Some("::1"));

        let url = Url::parse("https://API.Example.com/v1").unwrap();
        assert_eq!(url_hostname(&url).as_deref(), Some("api.example.com"));
    }

    #[test]
    fn test_url_without_host() {
        let url = Url::parse("mailto:ops@example.com").unwrap();
        assert_eq!(url_hostname(&url), None);
    }
}
