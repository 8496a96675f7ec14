//! URL validation and resolution
//!
//! Origins (scheme + host + port) are the scoping key for both the robots
//! cache and the rate limiter.

use crate::{UrlError, UrlResult};
use ::url::Url;

/// Parses a URL string, requiring an absolute http(s) URL with a host.
pub fn validate_absolute(input: &str) -> UrlResult<Url> {
    let url = Url::parse(input.trim()).map_err(|e| UrlError::Parse(format!("{}: {}", input, e)))?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(UrlError::InvalidScheme(other.to_string())),
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    Ok(url)
}

/// Returns the origin key for a URL: scheme + host + port.
///
/// The default port for the scheme is omitted, matching how URLs are
/// normally written (`https://example.com`, not `https://example.com:443`).
pub fn origin_of(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    }
}

/// Resolves an href against a base URL.
///
/// Returns None for hrefs that cannot name a fetchable page: empty strings,
/// fragment-only anchors, javascript:/mailto:/tel:/data: pseudo-links, and
/// anything that does not resolve to http(s).
pub fn resolve(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match base.join(href) {
        Ok(resolved) if resolved.scheme() == "http" || resolved.scheme() == "https" => {
            Some(resolved)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_absolute_accepts_http_and_https() {
        assert!(validate_absolute("https://example.com/page").is_ok());
        assert!(validate_absolute("http://example.com").is_ok());
    }

    #[test]
    fn test_validate_absolute_rejects_other_schemes() {
        assert!(matches!(
            validate_absolute("ftp://example.com"),
            Err(UrlError::InvalidScheme(_))
        ));
        assert!(matches!(
            validate_absolute("file:///etc/passwd"),
            Err(UrlError::InvalidScheme(_))
        ));
    }

    #[test]
    fn test_validate_absolute_rejects_relative() {
        assert!(validate_absolute("/page").is_err());
        assert!(validate_absolute("example.com/page").is_err());
    }

    #[test]
    fn test_origin_includes_explicit_port() {
        let url = Url::parse("http://127.0.0.1:8080/path?q=1").unwrap();
        assert_eq!(origin_of(&url), "http://127.0.0.1:8080");
    }

    #[test]
    fn test_origin_omits_default_port() {
        let url = Url::parse("https://example.com/path").unwrap();
        assert_eq!(origin_of(&url), "https://example.com");
    }

    #[test]
    fn test_resolve_relative_href() {
        let base = Url::parse("https://example.com/list/page1").unwrap();
        let resolved = resolve(&base, "page2").unwrap();
        assert_eq!(resolved.as_str(), "https://example.com/list/page2");

        let resolved = resolve(&base, "/other").unwrap();
        assert_eq!(resolved.as_str(), "https://example.com/other");
    }

    #[test]
    fn test_resolve_absolute_href() {
        let base = Url::parse("https://example.com/").unwrap();
        let resolved = resolve(&base, "https://other.com/p").unwrap();
        assert_eq!(resolved.as_str(), "https://other.com/p");
    }

    #[test]
    fn test_resolve_skips_pseudo_links() {
        let base = Url::parse("https://example.com/").unwrap();
        assert!(resolve(&base, "javascript:void(0)").is_none());
        assert!(resolve(&base, "mailto:a@b.com").is_none());
        assert!(resolve(&base, "tel:+123").is_none());
        assert!(resolve(&base, "data:text/html,hi").is_none());
        assert!(resolve(&base, "#top").is_none());
        assert!(resolve(&base, "").is_none());
    }
}
