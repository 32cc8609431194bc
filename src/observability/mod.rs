//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! otel.yaml
//!     → settings.rs (service name, log level, format, OTLP endpoint)
//!     → telemetry.rs (subscriber + exporter install, Telemetry handle)
//!
//! All subsystems produce:
//!     → tracing events (fmt layer: stdout, JSON or compact)
//!     → tracing spans (OpenTelemetry layer when an OTLP endpoint is set)
//! ```
//!
//! # Design Decisions
//! - Telemetry comes up before anything else and is torn down last
//! - Setup failure is never fatal; a console-only fallback takes over
//! - The `Telemetry` handle is passed to the orchestrator explicitly
//! - Fatal conditions are stamped on the span with `otel.status_code`

pub mod settings;
pub mod telemetry;

pub use settings::TelemetrySettings;
pub use telemetry::{Telemetry, TelemetryError, TelemetryGuard};
