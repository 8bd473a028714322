//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Parse error: {0}")]
    ParseJson(#[from] serde_json::Error),
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file, or JSON when the
/// file extension is `.json`.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let config = if is_json {
        parse_json(&content)?
    } else {
        parse_toml(&content)?
    };

    tracing::debug!(path = %path.display(), "Configuration file parsed");
    Ok(config)
}

/// Parse and validate TOML configuration text.
pub fn parse_toml(content: &str) -> Result<ProxyConfig, ConfigError> {
    let config: ProxyConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Parse and validate JSON configuration text.
pub fn parse_json(content: &str) -> Result<ProxyConfig, ConfigError> {
    let config: ProxyConfig = serde_json::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
            upstream = "backend.local:8080"
            methods = ["get", "post"]

            [listener]
            bind_address = "127.0.0.1:9000"

            [timeouts]
            upstream_secs = 15
            "#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
        assert_eq!(config.upstream.authority(), "backend.local:8080");
        assert_eq!(config.methods.0, vec!["get", "post"]);
        assert_eq!(config.timeouts.upstream_secs, Some(15));
    }

    #[test]
    fn test_load_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"upstream": {{"host": "backend.local", "path": "/base", "logRequests": false}}}}"#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.upstream.port, 80);
        assert_eq!(config.upstream.path, "/base");
        assert!(!config.upstream.log_requests);
    }

    #[test]
    fn test_validation_failure_is_reported() {
        let err = parse_toml(
            r#"
            [upstream]
            host = "backend.local"
            path = "no-slash"
            "#,
        )
        .unwrap_err();
        match err {
            ConfigError::Validation(errors) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, "upstream.path");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
