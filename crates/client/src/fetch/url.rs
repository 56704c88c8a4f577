//! URL resolution against the site origin.

/// Error type for URL resolution failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<UrlError> for shellcache_core::Error {
    fn from(err: UrlError) -> Self {
        shellcache_core::Error::InvalidUrl(err.to_string())
    }
}

/// Resolve a URL string the way the page would.
///
/// Steps:
/// 1. Trim leading/trailing whitespace
/// 2. Resolve relative input (`/`, `/index.html`, `about`) against `origin`
/// 3. Accept only http(s)
/// 4. Lowercase the host
/// 5. Remove fragment (#...), keep query string intact
pub fn resolve(origin: &url::Url, input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = origin.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if let Some(host) = parsed.host_str() {
        let host = host.to_lowercase();
        parsed
            .set_host(Some(&host))
            .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> url::Url {
        url::Url::parse("https://portfolio.example").unwrap()
    }

    #[test]
    fn test_resolve_root() {
        let url = resolve(&origin(), "/").unwrap();
        assert_eq!(url.as_str(), "https://portfolio.example/");
    }

    #[test]
    fn test_resolve_root_relative() {
        let url = resolve(&origin(), "/manifest.json").unwrap();
        assert_eq!(url.as_str(), "https://portfolio.example/manifest.json");
    }

    #[test]
    fn test_resolve_absolute_passthrough() {
        let url = resolve(&origin(), "https://cdn.example/app.css").unwrap();
        assert_eq!(url.host_str(), Some("cdn.example"));
    }

    #[test]
    fn test_resolve_lowercase_host() {
        let url = resolve(&origin(), "https://CDN.EXAMPLE/app.css").unwrap();
        assert_eq!(url.host_str(), Some("cdn.example"));
    }

    #[test]
    fn test_resolve_remove_fragment() {
        let url = resolve(&origin(), "/about#team").unwrap();
        assert_eq!(url.fragment(), None);
        assert_eq!(url.path(), "/about");
    }

    #[test]
    fn test_resolve_preserve_query() {
        let url = resolve(&origin(), "/main.js?a=1&b=2").unwrap();
        assert_eq!(url.query(), Some("a=1&b=2"));
    }

    #[test]
    fn test_resolve_trim_whitespace() {
        let url = resolve(&origin(), "  /index.html  ").unwrap();
        assert_eq!(url.as_str(), "https://portfolio.example/index.html");
    }

    #[test]
    fn test_resolve_unsupported_scheme() {
        let result = resolve(&origin(), "file:///etc/passwd");
        assert!(matches!(result, Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_resolve_empty() {
        assert!(matches!(resolve(&origin(), ""), Err(UrlError::Empty)));
        assert!(matches!(resolve(&origin(), "   "), Err(UrlError::Empty)));
    }

    #[test]
    fn test_resolve_http_allowed() {
        let url = resolve(&origin(), "http://localhost:4173/").unwrap();
        assert_eq!(url.scheme(), "http");
    }
}
