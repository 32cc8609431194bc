//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate endpoint shape (`host:port`) and value ranges
//! - Detect the two listeners claiming the same address
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function: AppConfig → Result<(), Vec<ValidationError>>

use crate::config::schema::AppConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} must be host:port, got {value:?}")]
    BadEndpoint { field: &'static str, value: String },

    #[error("server.endpoint.http and server.endpoint.grpc both use {0}")]
    SharedEndpoint(String),

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let endpoint = &config.server.endpoint;

    check_endpoint("server.endpoint.http", &endpoint.http, &mut errors);
    check_endpoint("server.endpoint.grpc", &endpoint.grpc, &mut errors);

    // Port 0 asks the OS for an ephemeral port, so two such endpoints never collide.
    if !endpoint.http.is_empty() && endpoint.http == endpoint.grpc && port(&endpoint.http) != Some(0) {
        errors.push(ValidationError::SharedEndpoint(endpoint.http.clone()));
    }

    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::Zero {
            field: "server.request_timeout_secs",
        });
    }
    if config.users.max_results == 0 {
        errors.push(ValidationError::Zero {
            field: "users.max_results",
        });
    }
    if config.subscriptions.max_results == 0 {
        errors.push(ValidationError::Zero {
            field: "subscriptions.max_results",
        });
    }
    if config.payments.connect_timeout_secs == 0 {
        errors.push(ValidationError::Zero {
            field: "payments.connect_timeout_secs",
        });
    }
    if config.payments.plans_endpoint.trim().is_empty() {
        errors.push(ValidationError::Empty {
            field: "payments.plans_endpoint",
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_endpoint(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    if value.trim().is_empty() {
        errors.push(ValidationError::Empty { field });
    } else if port(value).is_none() {
        errors.push(ValidationError::BadEndpoint {
            field,
            value: value.to_string(),
        });
    }
}

fn port(endpoint: &str) -> Option<u16> {
    let (host, port) = endpoint.rsplit_once(':')?;
    if host.is_empty() {
        return None;
    }
    port.parse().ok()
}
