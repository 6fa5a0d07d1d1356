//! Driftnet: a distributed crawl-frontier coordinator
//!
//! This crate implements the coordination core of a fleet of fetch workers
//! that share a Redis-backed frontier: each URL is fetched at most once,
//! newly discovered domains are prioritized fairly, and work survives
//! individual worker crashes.

pub mod config;
pub mod crawler;
pub mod output;
pub mod scope;
pub mod seed;
pub mod store;
pub mod url;

use thiserror::Error;

/// Main error type for Driftnet operations
#[derive(Debug, Error)]
pub enum DriftnetError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] store::StoreError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("Seed error: {0}")]
    Seed(#[from] seed::SeedError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Driftnet operations
pub type Result<T> = std::result::Result<T, DriftnetError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use scope::ScopePolicy;
pub use store::{FrontierEntry, FrontierStore, UrlRecord, WorkerState};
pub use self::url::{extract_domain, parse_candidate, Fingerprint};
