//! Configuration module for Driftnet
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use driftnet::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Store endpoint: {}", config.store.url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ArtifactConfig, Config, DispatcherConfig, ScopeConfig, ScopeKind, SeedConfig, StoreConfig,
};

// Re-export parser functions
pub use parser::load_config;
