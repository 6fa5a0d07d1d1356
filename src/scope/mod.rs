//! Link admission policies
//!
//! A discovered link is only enqueued when the active scope policy admits
//! it. The policies are interchangeable strategies over one interface:
//! suffix-pinned, same-registrable-host, depth-limited, or unrestricted
//! crawls all flow through [`ScopePolicy::admit`].

use crate::config::{ScopeConfig, ScopeKind};
use crate::url::{domain_suffix_matches, extract_domain, host_suffix_at_level};
use crate::ConfigError;
use url::Url;

/// Decides whether a discovered link is eligible for the frontier
#[derive(Debug, Clone, PartialEq)]
pub enum ScopePolicy {
    /// Admit candidates whose host falls under a fixed domain suffix
    DomainSuffix { suffix: String },

    /// Admit candidates sharing the source host's last `levels` labels
    HostLevel { levels: u32 },

    /// Admit candidates at or below a depth ceiling, regardless of domain
    DepthCeiling { max_depth: u32 },

    /// Admit every syntactically valid candidate
    Unrestricted,
}

impl ScopePolicy {
    /// Builds the policy selected by the configuration
    ///
    /// The configuration must already have passed validation; a missing
    /// parameter here is still reported rather than defaulted.
    pub fn from_config(config: &ScopeConfig) -> Result<Self, ConfigError> {
        match config.policy {
            ScopeKind::DomainSuffix => {
                let suffix = config.domain.clone().filter(|d| !d.is_empty()).ok_or_else(
                    || ConfigError::Validation("domain-suffix scope without a domain".to_string()),
                )?;
                Ok(Self::DomainSuffix {
                    suffix: suffix.to_lowercase(),
                })
            }
            ScopeKind::HostLevel => {
                let levels = config.host_level.filter(|l| *l >= 1).ok_or_else(|| {
                    ConfigError::Validation("host-level scope without a level".to_string())
                })?;
                Ok(Self::HostLevel { levels })
            }
            ScopeKind::Depth => {
                let max_depth = config.max_depth.ok_or_else(|| {
                    ConfigError::Validation("depth scope without max-depth".to_string())
                })?;
                Ok(Self::DepthCeiling { max_depth })
            }
            ScopeKind::Unrestricted => Ok(Self::Unrestricted),
        }
    }

    /// Returns true if `candidate`, discovered at `depth` by following a
    /// link on `source`, should be enqueued
    pub fn admit(&self, candidate: &Url, source: &Url, depth: u32) -> bool {
        match self {
            Self::DomainSuffix { suffix } => match extract_domain(candidate) {
                Some(host) => domain_suffix_matches(&host, suffix),
                None => false,
            },
            Self::HostLevel { levels } => {
                match (extract_domain(candidate), extract_domain(source)) {
                    (Some(candidate_host), Some(source_host)) => {
                        host_suffix_at_level(&candidate_host, *levels)
                            == host_suffix_at_level(&source_host, *levels)
                    }
                    _ => false,
                }
            }
            Self::DepthCeiling { max_depth } => depth <= *max_depth,
            Self::Unrestricted => true,
        }
    }
}
