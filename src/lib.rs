//! Dual-protocol service orchestrator library.
//!
//! Brings up telemetry, loads configuration, registers the functional
//! modules against an HTTP router and a gRPC server, serves both, and tears
//! everything down in a fixed order.

pub mod config;
pub mod error;
pub mod grpc;
pub mod http;
pub mod lifecycle;
pub mod modules;
pub mod net;
pub mod observability;

pub use config::AppConfig;
pub use error::FatalError;
pub use lifecycle::{ConfigSource, Orchestrator, StopHandle};
pub use observability::Telemetry;
