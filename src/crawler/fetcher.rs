//! Page fetch collaborator
//!
//! The dispatcher only knows the [`PageFetcher`] trait: given a URL,
//! return the extracted emails and outbound links, or fail with a
//! [`FetchError`]. The production implementation fetches over HTTP and
//! parses HTML; tests substitute scripted fetchers.

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// User agent presented to fetched sites
const USER_AGENT: &str = "Mozilla/5.0 (compatible; Driftnet/1.0)";

/// Email address pattern applied to the flattened page text
const EMAIL_PATTERN: &str = r"[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9-.]+";

/// A fetch failure; the core routes every variant to `failed` uniformly
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request failed for {url}: {message}")]
    Network { url: String, message: String },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Unreadable content from {url}: {message}")]
    Parse { url: String, message: String },
}

/// Extracted content of a successfully fetched page
#[derive(Debug, Clone, Default)]
pub struct FetchedPage {
    /// Email addresses found in the page text, in document order
    pub emails: Vec<String>,

    /// Absolute, HTTP(S), deduplicated outbound links
    pub links: Vec<Url>,
}

/// The external fetch collaborator interface
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches a URL and extracts its emails and outbound links
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError>;
}

/// Production fetcher: HTTP GET + HTML extraction
pub struct HttpFetcher {
    client: Client,
    email_pattern: Regex,
}

impl HttpFetcher {
    /// Builds the fetcher with the given per-request timeout
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .connect_timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            email_pattern: Regex::new(EMAIL_PATTERN).expect("email pattern is valid"),
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| classify_request_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        // Redirects may have moved us; relative links resolve against the
        // final URL, not the requested one.
        let base = response.url().clone();

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Parse {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        Ok(extract_page(&base, &body, &self.email_pattern))
    }
}

fn classify_request_error(url: &Url, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

/// Extracts emails and outbound links from an HTML body
fn extract_page(base: &Url, body: &str, email_pattern: &Regex) -> FetchedPage {
    let document = Html::parse_document(body);

    let text: String = document
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ");

    let mut seen_emails = HashSet::new();
    let emails: Vec<String> = email_pattern
        .find_iter(&text)
        .map(|m| m.as_str().to_string())
        .filter(|email| seen_emails.insert(email.clone()))
        .collect();

    let anchor = Selector::parse("a[href]").expect("anchor selector is valid");
    let mut seen_links = HashSet::new();
    let mut links = Vec::new();
    for element in document.select(&anchor) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Ok(mut joined) = base.join(href.trim()) else {
            continue;
        };
        if joined.scheme() != "http" && joined.scheme() != "https" {
            continue;
        }
        if joined.host_str().is_none() {
            continue;
        }
        joined.set_fragment(None);
        if seen_links.insert(joined.to_string()) {
            links.push(joined);
        }
    }

    FetchedPage { emails, links }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email_regex() -> Regex {
        Regex::new(EMAIL_PATTERN).unwrap()
    }

    #[test]
    fn test_extracts_emails_from_text() {
        let base = Url::parse("https://a.example/").unwrap();
        let body = r#"<html><body>
            <p>Contact x@a.example or sales@b.example for details.</p>
        </body></html>"#;

        let page = extract_page(&base, body, &email_regex());
        assert_eq!(page.emails, vec!["x@a.example", "sales@b.example"]);
    }

    #[test]
    fn test_emails_deduplicated_in_order() {
        let base = Url::parse("https://a.example/").unwrap();
        let body = "<p>x@a.example and again x@a.example plus y@a.example</p>";

        let page = extract_page(&base, body, &email_regex());
        assert_eq!(page.emails, vec!["x@a.example", "y@a.example"]);
    }

    #[test]
    fn test_resolves_relative_links() {
        let base = Url::parse("https://a.example/dir/page").unwrap();
        let body = r#"<a href="/page2">two</a> <a href="sibling">three</a>"#;

        let page = extract_page(&base, body, &email_regex());
        let hrefs: Vec<&str> = page.links.iter().map(|u| u.as_str()).collect();
        assert_eq!(
            hrefs,
            vec!["https://a.example/page2", "https://a.example/dir/sibling"]
        );
    }

    #[test]
    fn test_skips_non_http_links() {
        let base = Url::parse("https://a.example/").unwrap();
        let body = r#"
            <a href="mailto:x@a.example">mail</a>
            <a href="javascript:void(0)">js</a>
            <a href="https://a.example/ok">ok</a>
        "#;

        let page = extract_page(&base, body, &email_regex());
        assert_eq!(page.links.len(), 1);
        assert_eq!(page.links[0].as_str(), "https://a.example/ok");
    }

    #[test]
    fn test_links_deduplicated_and_fragment_stripped() {
        let base = Url::parse("https://a.example/").unwrap();
        let body = r#"
            <a href="/page#top">one</a>
            <a href="/page#bottom">two</a>
        "#;

        let page = extract_page(&base, body, &email_regex());
        assert_eq!(page.links.len(), 1);
        assert_eq!(page.links[0].as_str(), "https://a.example/page");
    }

    #[test]
    fn test_empty_page() {
        let base = Url::parse("https://a.example/").unwrap();
        let page = extract_page(&base, "", &email_regex());
        assert!(page.emails.is_empty());
        assert!(page.links.is_empty());
    }
}
