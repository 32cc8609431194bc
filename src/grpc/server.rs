//! gRPC server setup and serving.

use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::service::Routes;
use tonic::transport::Server;
use tonic_health::server::{health_reporter, HealthReporter};
use tonic_health::ServingStatus;

use crate::lifecycle::StopHandle;
use crate::net::{ServeError, Transport};

pub struct GrpcServer {
    routes: Routes,
    reporter: HealthReporter,
    serving: Vec<&'static str>,
}

impl GrpcServer {
    pub fn new() -> Self {
        let (reporter, health_service) = health_reporter();
        Self {
            routes: Routes::new(health_service),
            reporter,
            serving: Vec::new(),
        }
    }

    /// Mark `service` (fully qualified, e.g. `plans.v1.PlanService`) as serving.
    pub fn report_serving(&mut self, service: &'static str) -> &mut Self {
        if !self.serving.contains(&service) {
            self.serving.push(service);
        }
        self
    }

    /// Service names reported as serving so far.
    pub fn services(&self) -> &[&'static str] {
        &self.serving
    }

    /// Publish every reported service as `SERVING` on the health service.
    pub async fn publish_health(&mut self) {
        for service in &self.serving {
            self.reporter
                .set_service_status(*service, ServingStatus::Serving)
                .await;
        }
    }

    /// Serve until `stop` fires.
    pub async fn serve(self, listener: TcpListener, stop: StopHandle) -> Result<(), ServeError> {
        let addr = listener.local_addr().map_err(|source| ServeError::Io {
            transport: Transport::Grpc,
            source,
        })?;

        tracing::info!(address = %addr, services = ?self.serving, "gRPC server starting");

        Server::builder()
            .add_routes(self.routes)
            .serve_with_incoming_shutdown(TcpListenerStream::new(listener), stop.stopped())
            .await?;

        tracing::info!("gRPC server stopped");
        Ok(())
    }
}

impl Default for GrpcServer {
    fn default() -> Self {
        Self::new()
    }
}
