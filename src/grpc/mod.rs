//! gRPC (binary transport) subsystem.
//!
//! The server always carries the standard `grpc.health.v1.Health` service.
//! Modules exposing an RPC surface mark their service name as serving; the
//! statuses are published before the listener accepts its first connection.

pub mod server;

pub use server::GrpcServer;
