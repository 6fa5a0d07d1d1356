use crate::UrlError;
use url::Url;

/// Parses and validates a candidate URL
///
/// A candidate is accepted when it parses, uses an HTTP(S) scheme, and has a
/// host. The fragment is stripped since two URLs differing only in fragment
/// address the same document and must dedup to one frontier entry.
///
/// # Arguments
///
/// * `raw` - The URL string to validate
///
/// # Returns
///
/// * `Ok(Url)` - The validated URL, fragment removed
/// * `Err(UrlError)` - Malformed, non-HTTP, or hostless input
///
/// # Examples
///
/// ```
/// use driftnet::url::parse_candidate;
///
/// let url = parse_candidate("https://example.com/page#section").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/page");
///
/// assert!(parse_candidate("mailto:someone@example.com").is_err());
/// ```
pub fn parse_candidate(raw: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(raw.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);

    Ok(url)
}
