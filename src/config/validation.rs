use crate::config::types::{Config, DispatcherConfig, ScopeConfig, ScopeKind, StoreConfig};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_store_config(&config.store)?;
    validate_dispatcher_config(&config.dispatcher)?;
    validate_scope_config(&config.scope)?;
    Ok(())
}

/// Validates the shared store configuration
fn validate_store_config(config: &StoreConfig) -> Result<(), ConfigError> {
    if config.url.is_empty() {
        return Err(ConfigError::Validation(
            "store url cannot be empty".to_string(),
        ));
    }

    if !config.url.starts_with("redis://") && !config.url.starts_with("rediss://") {
        return Err(ConfigError::InvalidUrl(format!(
            "store url must use the redis:// or rediss:// scheme, got '{}'",
            config.url
        )));
    }

    Ok(())
}

/// Validates dispatcher pool sizing and intervals
fn validate_dispatcher_config(config: &DispatcherConfig) -> Result<(), ConfigError> {
    if config.dispatchers < 1 {
        return Err(ConfigError::Validation(format!(
            "dispatchers must be >= 1, got {}",
            config.dispatchers
        )));
    }

    if config.workers < 1 || config.workers > 256 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 256, got {}",
            config.workers
        )));
    }

    if config.poll_interval_ms < 1 {
        return Err(ConfigError::Validation(
            "poll-interval-ms must be >= 1".to_string(),
        ));
    }

    if config.fetch_timeout_ms < 1 {
        return Err(ConfigError::Validation(
            "fetch-timeout-ms must be >= 1".to_string(),
        ));
    }

    if config.processing_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "processing-timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.sweep_interval_secs < 1 {
        return Err(ConfigError::Validation(
            "sweep-interval-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates that the selected scope policy has its required parameters
fn validate_scope_config(config: &ScopeConfig) -> Result<(), ConfigError> {
    match config.policy {
        ScopeKind::DomainSuffix => match &config.domain {
            Some(domain) if !domain.is_empty() => Ok(()),
            _ => Err(ConfigError::Validation(
                "scope policy 'domain-suffix' requires a non-empty domain".to_string(),
            )),
        },
        ScopeKind::HostLevel => match config.host_level {
            Some(levels) if levels >= 1 => Ok(()),
            _ => Err(ConfigError::Validation(
                "scope policy 'host-level' requires host-level >= 1".to_string(),
            )),
        },
        ScopeKind::Depth => match config.max_depth {
            Some(_) => Ok(()),
            None => Err(ConfigError::Validation(
                "scope policy 'depth' requires max-depth".to_string(),
            )),
        },
        ScopeKind::Unrestricted => Ok(()),
    }
}
