use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use driftnet::config::load_config;
///
/// let config = load_config(Path::new("config.toml")).unwrap();
/// println!("Workers per dispatcher: {}", config.dispatcher.workers);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let config: Config = toml::from_str(&content)?;

    validate(&config)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::ScopeKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[store]
url = "redis://cache.internal:6379"

[dispatcher]
dispatchers = 2
workers = 16
poll-interval-ms = 5000

[scope]
policy = "domain-suffix"
domain = "example.com"

[seeds]
file = "./seeds.json"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.store.url, "redis://cache.internal:6379");
        assert_eq!(config.dispatcher.dispatchers, 2);
        assert_eq!(config.dispatcher.workers, 16);
        assert_eq!(config.dispatcher.poll_interval_ms, 5000);
        assert_eq!(config.scope.policy, ScopeKind::DomainSuffix);
        assert_eq!(config.scope.domain.as_deref(), Some("example.com"));
        assert_eq!(config.seeds.file.as_deref(), Some("./seeds.json"));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let file = create_temp_config("");
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.store.url, "redis://127.0.0.1:6379");
        assert_eq!(config.dispatcher.dispatchers, 1);
        assert_eq!(config.dispatcher.workers, 8);
        assert_eq!(config.scope.policy, ScopeKind::Unrestricted);
        assert!(config.seeds.file.is_none());
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = r#"
[dispatcher]
workers = 0
"#;

        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_load_config_with_incomplete_scope() {
        let config_content = r#"
[scope]
policy = "host-level"
"#;

        let file = create_temp_config(config_content);
        assert!(load_config(file.path()).is_err());
    }
}
