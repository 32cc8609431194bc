//! HTTP router setup and serving.
//!
//! # Responsibilities
//! - Own the Axum router modules attach their routes to
//! - Wire up middleware (request ID, tracing, timeout)
//! - Serve on a pre-bound listener until a stop is requested

use std::time::Duration;

use axum::{http::StatusCode, routing::get, Router};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::lifecycle::StopHandle;
use crate::net::{ServeError, Transport};

/// The text-transport router.
///
/// Exists before any module runs so registration never races serving.
pub struct HttpRouter {
    router: Router,
    request_timeout: Duration,
}

impl HttpRouter {
    pub fn new(request_timeout: Duration) -> Self {
        Self {
            router: Router::new().route("/health", get(|| async { "OK" })),
            request_timeout,
        }
    }

    /// Attach a module's routes.
    ///
    /// Panics (inside Axum) on overlapping paths; the registrar makes sure a
    /// module's routes are merged at most once.
    pub fn merge(&mut self, routes: Router) -> &mut Self {
        self.router = std::mem::take(&mut self.router).merge(routes);
        self
    }

    /// Apply the middleware stack and produce the final router.
    pub fn into_router(self) -> Router {
        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                self.request_timeout,
            ))
            .layer(PropagateRequestIdLayer::x_request_id());

        self.router.layer(middleware)
    }

    /// Serve until `stop` fires.
    ///
    /// A clean stop drains in-flight requests and then reports
    /// [`ServeError::Closed`]; any other error is a real failure.
    pub async fn serve(self, listener: TcpListener, stop: StopHandle) -> Result<(), ServeError> {
        let addr = listener.local_addr().map_err(|source| ServeError::Io {
            transport: Transport::Http,
            source,
        })?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.into_router())
            .with_graceful_shutdown(stop.stopped())
            .await
            .map_err(|source| ServeError::Io {
                transport: Transport::Http,
                source,
            })?;

        tracing::info!("HTTP server stopped");
        Err(ServeError::Closed)
    }
}
