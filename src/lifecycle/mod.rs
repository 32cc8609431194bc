//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Telemetry → Load config → Bind gRPC → Bind HTTP
//!         → Register modules → Spawn gRPC loop → Block on HTTP loop
//!
//! Shutdown (shutdown.rs):
//!     Stop requested or fatal error → module shutdown ops (reverse order)
//!         → telemetry teardown
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → StopHandle::trigger → both listeners close
//! ```
//!
//! # Design Decisions
//! - Ordered startup: telemetry first, then config, then listeners, then modules;
//!   serving starts last
//! - Fail fast: any startup error is fatal
//! - Cleanup is scoped: guards run on every exit path, panics included

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{ShutdownCoordinator, ShutdownFailure, StopHandle};
pub use startup::{ConfigSource, Orchestrator};
