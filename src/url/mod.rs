//! URL handling module for Driftnet
//!
//! This module provides URL fingerprinting (the canonical identity used by
//! the shared store), domain extraction, suffix matching, and syntactic
//! validation of discovered candidates.

mod domain;
mod fingerprint;
mod validate;

pub use domain::{domain_suffix_matches, extract_domain, host_suffix_at_level};
pub use fingerprint::Fingerprint;
pub use validate::parse_candidate;
