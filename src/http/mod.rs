//! HTTP (text transport) subsystem.
//!
//! # Data Flow
//! ```text
//! Modules
//!     → HttpRouter::merge (routes attached during startup, not yet serving)
//! Orchestrator
//!     → HttpRouter::serve (middleware applied, accept loop on the main task)
//!     → returns ServeError::Closed after an administrative stop
//! ```

pub mod server;

pub use server::HttpRouter;
