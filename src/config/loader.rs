//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
///
/// An empty path selects the built-in defaults. Those are validated too, so
/// the caller always receives a snapshot that passed the same checks.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let config = if path.as_os_str().is_empty() {
        tracing::info!("No config file given, using defaults");
        AppConfig::default()
    } else {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?
    };

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("svc-config-{}.toml", uuid::Uuid::new_v4()));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn empty_path_yields_defaults() {
        let config = load_config(Path::new("")).unwrap();
        assert_eq!(config.server.endpoint.http, "localhost:8080");
        assert_eq!(config.server.endpoint.grpc, "localhost:50051");
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_sections() {
        let path = write_temp(
            r#"
            [server.endpoint]
            http = "127.0.0.1:9000"

            [plans]
            currency = "EUR"
            "#,
        );

        let config = load_config(&path).unwrap();
        assert_eq!(config.server.endpoint.http, "127.0.0.1:9000");
        assert_eq!(config.server.endpoint.grpc, "localhost:50051");
        assert_eq!(config.plans.currency, "EUR");
        assert_eq!(config.users.max_results, 100);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let path = write_temp("[server\nhttp = ");
        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let path = write_temp(
            r#"
            [server.endpoint]
            http = ""
            "#,
        );
        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
        let _ = fs::remove_file(path);
    }
}
