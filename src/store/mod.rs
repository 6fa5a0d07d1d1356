//! Shared store module
//!
//! All cross-worker state lives behind the [`FrontierStore`] trait: the
//! dedup index, the scored frontier queue, the in-flight bookkeeping, the
//! domain counters, the artifact set, and the worker registry. Components
//! never touch raw store primitives directly; routing every access through
//! this one abstraction keeps the atomicity contract centralized and lets
//! tests swap in the in-memory backend.

mod memory;
mod redis;
mod traits;

pub use memory::MemoryStore;
pub use redis::RedisStore;
pub use traits::{FrontierStore, StoreError, StoreResult};

use crate::url::{extract_domain, Fingerprint};
use crate::UrlError;
use url::Url;

/// A discovered URL together with its traversal metadata
#[derive(Debug, Clone, PartialEq)]
pub struct UrlRecord {
    /// The URL to fetch
    pub url: Url,

    /// Lowercased host, the unit of fairness accounting
    pub domain: String,

    /// Link distance from the seed that discovered this URL
    pub depth: u32,
}

impl UrlRecord {
    /// Builds a record from a validated URL
    pub fn new(url: Url, depth: u32) -> Result<Self, UrlError> {
        let domain = extract_domain(&url).ok_or(UrlError::MissingHost)?;
        Ok(Self { url, domain, depth })
    }

    /// The canonical identity of this URL in the store
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of(self.url.as_str())
    }
}

/// A frontier queue entry: a URL record and its priority score
///
/// Lower scores are popped first.
#[derive(Debug, Clone, PartialEq)]
pub struct FrontierEntry {
    pub record: UrlRecord,
    pub score: f64,
}

/// Terminal outcome of a checked-out entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingOutcome {
    /// Fetched and routed successfully
    Visited,
    /// Fetch raised a terminal error
    Failed,
}

/// Lifecycle state of a worker process in the shared registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Online,
    Shutdown,
    Offline,
}

impl WorkerState {
    /// Converts the state to its registry string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Shutdown => "shutdown",
            Self::Offline => "offline",
        }
    }

    /// Parses a state from its registry string representation
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "online" => Some(Self::Online),
            "shutdown" => Some(Self::Shutdown),
            "offline" => Some(Self::Offline),
            _ => None,
        }
    }
}

/// Aggregate counters for operator-facing statistics
#[derive(Debug, Clone, Default)]
pub struct StoreCounts {
    pub frontier: u64,
    pub processing: u64,
    pub visited: u64,
    pub failed: u64,
    pub processed: u64,
    pub domains: u64,
    pub artifacts: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_record_extracts_domain() {
        let url = Url::parse("https://Sub.Example.COM/page").unwrap();
        let record = UrlRecord::new(url, 2).unwrap();
        assert_eq!(record.domain, "sub.example.com");
        assert_eq!(record.depth, 2);
    }

    #[test]
    fn test_url_record_fingerprint_matches_url() {
        let url = Url::parse("https://example.com/").unwrap();
        let record = UrlRecord::new(url.clone(), 0).unwrap();
        assert_eq!(record.fingerprint(), Fingerprint::of(url.as_str()));
    }

    #[test]
    fn test_worker_state_roundtrip() {
        for state in [
            WorkerState::Online,
            WorkerState::Shutdown,
            WorkerState::Offline,
        ] {
            assert_eq!(WorkerState::parse(state.as_str()), Some(state));
        }
    }

    #[test]
    fn test_worker_state_invalid() {
        assert_eq!(WorkerState::parse("rebooting"), None);
    }
}
