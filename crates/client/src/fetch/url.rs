//! URL canonicalization before a resource request goes out.

/// Error type for URL canonicalization failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Canonicalize a resource URL for the request line.
///
/// Trims whitespace, defaults a missing scheme to https and drops the
/// fragment. Hosts come back lowercased from the parser. The query string
/// is kept as-is since asset hosts often version files through it. Only
/// http and https are fetchable.
pub fn canonicalize(input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else if let Some(rest) = trimmed.strip_prefix("//") {
        format!("https://{rest}")
    } else {
        format!("https://{trimmed}")
    };

    let mut parsed = url::Url::parse(&with_scheme).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(UrlError::UnsupportedScheme(parsed.scheme().to_string()));
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_asset_url() {
        let url = canonicalize("https://CDN.Example.com/img/Logo.PNG").unwrap();
        assert_eq!(url.as_str(), "https://cdn.example.com/img/Logo.PNG");
    }

    #[test]
    fn test_protocol_relative_defaults_to_https() {
        let url = canonicalize("//fonts.example.com/a.woff2").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host_str(), Some("fonts.example.com"));
    }

    #[test]
    fn test_bare_host_defaults_to_https() {
        let url = canonicalize("example.com/a.svg").unwrap();
        assert_eq!(url.as_str(), "https://example.com/a.svg");
    }

    #[test]
    fn test_fragment_dropped_query_kept() {
        let url = canonicalize("https://x.io/sprite.svg?v=2#icon-home").unwrap();
        assert_eq!(url.query(), Some("v=2"));
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_whitespace_trimmed() {
        let url = canonicalize("  http://x.io/a.png\n").unwrap();
        assert_eq!(url.as_str(), "http://x.io/a.png");
    }

    #[test]
    fn test_rejects_non_http_schemes() {
        assert!(canonicalize("data:image/png;base64,AAAA").is_err());
        assert!(matches!(canonicalize("ftp://x.io/a.png"), Err(UrlError::UnsupportedScheme(s)) if s == "ftp"));
        assert!(matches!(canonicalize("file:///tmp/a.png"), Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_empty() {
        assert_eq!(canonicalize(""), Err(UrlError::Empty));
        assert_eq!(canonicalize("   "), Err(UrlError::Empty));
    }
}
