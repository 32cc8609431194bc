//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! server.endpoint.{grpc,http}
//!     → listener.rs (bind, one TcpListener per transport)
//!     → ListenerAddrs (actual bound addresses, e.g. after port 0)
//!     → handed to the gRPC and HTTP serving loops
//! ```
//!
//! # Design Decisions
//! - Binding is separate from serving so a bind failure aborts startup
//!   before any loop accepts connections
//! - Errors carry the transport and the configured address

pub mod listener;

pub use listener::{bind, BindError, ListenerAddrs, ServeError, Transport};
