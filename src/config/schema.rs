//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.
//! Every section defaults, so `AppConfig::default()` is a runnable config.

use serde::{Deserialize, Serialize};

/// Root configuration snapshot for the service process.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener settings for both transports.
    pub server: ServerConfig,

    /// User module settings.
    pub users: UsersConfig,

    /// Plan module settings.
    pub plans: PlansConfig,

    /// Payment module settings.
    pub payments: PaymentsConfig,

    /// Subscription module settings.
    pub subscriptions: SubscriptionsConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind addresses, one per transport.
    pub endpoint: EndpointConfig,

    /// HTTP request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            endpoint: EndpointConfig::default(),
            request_timeout_secs: 30,
        }
    }
}

/// Bind addresses (`host:port`) for the two listeners.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// REST listener address.
    pub http: String,

    /// gRPC listener address.
    pub grpc: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            http: "localhost:8080".to_string(),
            grpc: "localhost:50051".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UsersConfig {
    /// Upper bound on records returned by a list call.
    pub max_results: usize,
}

impl Default for UsersConfig {
    fn default() -> Self {
        Self { max_results: 100 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PlansConfig {
    /// Currency applied to plans created without one.
    pub currency: String,
}

impl Default for PlansConfig {
    fn default() -> Self {
        Self {
            currency: "USD".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PaymentsConfig {
    /// gRPC endpoint of the plan service (e.g., "http://localhost:50051").
    pub plans_endpoint: String,

    /// Outbound connect timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            plans_endpoint: "http://localhost:50051".to_string(),
            connect_timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SubscriptionsConfig {
    /// Upper bound on records returned by a list call.
    pub max_results: usize,
}

impl Default for SubscriptionsConfig {
    fn default() -> Self {
        Self { max_results: 100 }
    }
}
