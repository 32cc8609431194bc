//! TCP listener binding for the two transports.

use std::fmt;
use std::net::SocketAddr;

use tokio::net::TcpListener;

/// The two transports the process exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Http,
    Grpc,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Http => f.write_str("HTTP"),
            Transport::Grpc => f.write_str("gRPC"),
        }
    }
}

/// Failed to bind a listener.
#[derive(Debug, thiserror::Error)]
#[error("failed to bind the {transport} listener on {address}: {source}")]
pub struct BindError {
    pub transport: Transport,
    pub address: String,
    #[source]
    pub source: std::io::Error,
}

/// A serving loop stopped.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    /// The listener was closed by an administrative stop. Not a failure.
    #[error("listener closed")]
    Closed,

    #[error("{transport} serving loop failed: {source}")]
    Io {
        transport: Transport,
        #[source]
        source: std::io::Error,
    },

    #[error("gRPC serving loop failed: {0}")]
    Grpc(#[from] tonic::transport::Error),

    #[error("{transport} serving task ended abnormally: {source}")]
    Task {
        transport: Transport,
        #[source]
        source: tokio::task::JoinError,
    },
}

impl ServeError {
    pub fn is_closed(&self) -> bool {
        matches!(self, ServeError::Closed)
    }
}

/// Addresses the listeners actually bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerAddrs {
    pub http: SocketAddr,
    pub grpc: SocketAddr,
}

/// Bind `address` (`host:port`) for `transport`, returning the listener and
/// the address it actually got.
pub async fn bind(transport: Transport, address: &str) -> Result<(TcpListener, SocketAddr), BindError> {
    let to_bind_error = |source| BindError {
        transport,
        address: address.to_string(),
        source,
    };

    let listener = TcpListener::bind(address).await.map_err(to_bind_error)?;
    let local_addr = listener.local_addr().map_err(to_bind_error)?;

    tracing::info!(
        transport = %transport,
        address = %local_addr,
        "Listener bound"
    );

    Ok((listener, local_addr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn binds_ephemeral_port() {
        let (listener, addr) = bind(Transport::Http, "127.0.0.1:0").await.unwrap();
        assert_ne!(addr.port(), 0);
        assert_eq!(listener.local_addr().unwrap(), addr);
    }

    #[tokio::test]
    async fn address_in_use_is_a_bind_error() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let address = taken.local_addr().unwrap().to_string();

        let err = bind(Transport::Grpc, &address).await.unwrap_err();
        assert_eq!(err.transport, Transport::Grpc);
        assert_eq!(err.address, address);
        assert_eq!(err.source.kind(), std::io::ErrorKind::AddrInUse);
    }

    #[test]
    fn only_closed_counts_as_closed() {
        assert!(ServeError::Closed.is_closed());
        let io = ServeError::Io {
            transport: Transport::Http,
            source: std::io::Error::other("accept failed"),
        };
        assert!(!io.is_closed());
    }
}
