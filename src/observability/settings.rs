//! Telemetry settings, read from the `--otel` YAML file.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::observability::telemetry::TelemetryError;

/// Default service name reported on spans and logs.
pub const SERVICE_NAME: &str = "svc-orchestrator";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetrySettings {
    /// Reported as the `service.name` resource attribute.
    pub service_name: String,

    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    pub log_level: String,

    /// JSON lines instead of the compact human format.
    pub json_logs: bool,

    /// OTLP gRPC collector endpoint (e.g., "http://localhost:4317").
    pub otlp_endpoint: Option<String>,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            service_name: SERVICE_NAME.to_string(),
            log_level: "info".to_string(),
            json_logs: true,
            otlp_endpoint: None,
        }
    }
}

impl TelemetrySettings {
    pub fn from_file(path: &Path) -> Result<Self, TelemetryError> {
        let content = fs::read_to_string(path).map_err(|source| TelemetryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| TelemetryError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_yaml() {
        let path = std::env::temp_dir().join(format!("otel-{}.yaml", uuid::Uuid::new_v4()));
        fs::write(
            &path,
            "service_name: billing\notlp_endpoint: http://collector:4317\n",
        )
        .unwrap();

        let settings = TelemetrySettings::from_file(&path).unwrap();
        assert_eq!(settings.service_name, "billing");
        assert_eq!(settings.otlp_endpoint.as_deref(), Some("http://collector:4317"));
        assert_eq!(settings.log_level, "info");
        assert!(settings.json_logs);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn missing_file_is_reported() {
        let err = TelemetrySettings::from_file(Path::new("/nope/otel.yaml")).unwrap_err();
        assert!(matches!(err, TelemetryError::Io { .. }));
    }
}
