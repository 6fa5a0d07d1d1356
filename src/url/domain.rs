use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host (which shouldn't happen for valid HTTP(S) URLs), it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use driftnet::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Checks if a host falls under a domain suffix
///
/// Matches the bare domain itself and any subdomain of it, respecting label
/// boundaries so `"notexample.com"` does not match the suffix `"example.com"`.
///
/// # Examples
///
/// ```
/// use driftnet::url::domain_suffix_matches;
///
/// assert!(domain_suffix_matches("parliament.uk", "parliament.uk"));
/// assert!(domain_suffix_matches("sub.parliament.uk", "parliament.uk"));
/// assert!(!domain_suffix_matches("evil.com", "parliament.uk"));
/// ```
pub fn domain_suffix_matches(host: &str, suffix: &str) -> bool {
    if suffix.is_empty() {
        return false;
    }
    host == suffix || host.ends_with(&format!(".{}", suffix))
}

/// Returns the last `levels` dot-separated labels of a host
///
/// Used to compare hosts at a configurable registrable-domain level:
/// with `levels = 2`, `"blog.example.co.uk"` yields `"co.uk"`; with
/// `levels = 3` it yields `"example.co.uk"`. Hosts with fewer labels than
/// requested are returned whole.
pub fn host_suffix_at_level(host: &str, levels: u32) -> String {
    let labels: Vec<&str> = host.rsplitn(levels as usize + 1, '.').collect();
    if labels.len() <= levels as usize {
        host.to_string()
    } else {
        let mut tail: Vec<&str> = labels[..levels as usize].to_vec();
        tail.reverse();
        tail.join(".")
    }
}
