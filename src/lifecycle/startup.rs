//! Startup orchestration.
//!
//! # Responsibilities
//! - Load the configuration snapshot once, before any module exists
//! - Bind the gRPC listener, then the HTTP listener, then let the modules
//!   register
//! - Spawn the gRPC loop, block on the HTTP loop
//! - Unwind in order: module shutdowns (reverse), then telemetry
//!
//! # Design Decisions
//! - Fail fast: every startup error is fatal and reported on the `main` span
//! - No loop accepts connections before every module has registered
//! - A fatal error in either loop ends `run`; the other loop is aborted,
//!   not drained
//! - Cleanup lives in guards, so panics unwind through it too

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinError;

use crate::config::{load_config, validate_config, AppConfig, ConfigError};
use crate::error::FatalError;
use crate::grpc::GrpcServer;
use crate::http::HttpRouter;
use crate::lifecycle::shutdown::{ShutdownCoordinator, StopHandle};
use crate::modules::{self, Registrar};
use crate::net::{self, ListenerAddrs, ServeError, Transport};
use crate::observability::Telemetry;

/// How long the gRPC loop may take to drain after the HTTP loop closed.
const GRPC_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

type ServeFuture = Pin<Box<dyn Future<Output = Result<(), ServeError>> + Send>>;

/// Stand-ins for the real serving loops.
#[cfg(test)]
#[derive(Default)]
struct LoopOverrides {
    grpc: Option<Box<dyn FnOnce() -> ServeFuture + Send>>,
    http: Option<Box<dyn FnOnce() -> ServeFuture + Send>>,
}

/// Where the configuration snapshot comes from.
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// A TOML file; an empty path selects the defaults.
    File(PathBuf),
    /// An already built snapshot. Still validated.
    Inline(AppConfig),
}

impl ConfigSource {
    pub fn load(self) -> Result<AppConfig, ConfigError> {
        match self {
            ConfigSource::File(path) => load_config(&path),
            ConfigSource::Inline(config) => {
                validate_config(&config).map_err(ConfigError::Validation)?;
                Ok(config)
            }
        }
    }
}

/// Brings the process up, serves both transports and tears everything down.
pub struct Orchestrator {
    telemetry: Telemetry,
    source: ConfigSource,
    stop: StopHandle,
    ready: Option<oneshot::Sender<ListenerAddrs>>,
    #[cfg(test)]
    overrides: LoopOverrides,
}

impl Orchestrator {
    pub fn new(telemetry: Telemetry, source: ConfigSource) -> Self {
        Self {
            telemetry,
            source,
            stop: StopHandle::new(),
            ready: None,
            #[cfg(test)]
            overrides: LoopOverrides::default(),
        }
    }

    /// Use `stop` as the administrative stop signal for both listeners.
    pub fn with_stop(mut self, stop: StopHandle) -> Self {
        self.stop = stop;
        self
    }

    /// Send the bound addresses on `tx` right before serving starts.
    /// The sender is dropped unsent if startup fails first.
    pub fn notify_ready(mut self, tx: oneshot::Sender<ListenerAddrs>) -> Self {
        self.ready = Some(tx);
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Run with the built-in module set.
    pub async fn run(self) -> Result<(), FatalError> {
        self.run_with(modules::compose).await
    }

    /// Run with `compose` as the composition root.
    ///
    /// Returns `Ok(())` after a clean stop. Every `Err` has already been
    /// recorded through telemetry.
    pub async fn run_with<F>(self, compose: F) -> Result<(), FatalError>
    where
        F: FnOnce(&mut Registrar<'_>, &AppConfig) -> Result<(), FatalError> + Send,
    {
        #[cfg(test)]
        let overrides = self.overrides;
        let Self {
            telemetry,
            source,
            stop,
            ready,
            ..
        } = self;

        // Dropped in reverse: module shutdowns run before telemetry teardown.
        let telemetry = telemetry.guard();
        let mut shutdown = ShutdownCoordinator::new();

        let span = telemetry.startup_span();
        let fatal = |context: &str, error: FatalError| {
            telemetry.record_fatal(&span, context, &error);
            error
        };

        tracing::info!(parent: &span, "Starting the {} service", telemetry.service_name());

        let config = source
            .load()
            .map_err(|e| fatal("Failed to load the config", e.into()))?;

        let (grpc_listener, grpc_addr) = net::bind(Transport::Grpc, &config.server.endpoint.grpc)
            .await
            .map_err(|e| fatal("Failed to listen on the gRPC endpoint", e.into()))?;

        let (http_listener, http_addr) = net::bind(Transport::Http, &config.server.endpoint.http)
            .await
            .map_err(|e| fatal("Failed to listen on the HTTP endpoint", e.into()))?;

        let mut http = HttpRouter::new(Duration::from_secs(config.server.request_timeout_secs));
        let mut grpc = GrpcServer::new();
        {
            let mut registrar = Registrar::new(&mut http, &mut grpc, &mut shutdown, &span);
            compose(&mut registrar, &config)
                .map_err(|e| fatal("Failed to register the modules", e))?;
        }

        grpc.publish_health().await;

        let addrs = ListenerAddrs {
            http: http_addr,
            grpc: grpc_addr,
        };
        tracing::info!(parent: &span, http = %addrs.http, grpc = %addrs.grpc, "Serving");
        if let Some(tx) = ready {
            let _ = tx.send(addrs);
        }

        let grpc_serve: ServeFuture = Box::pin(grpc.serve(grpc_listener, stop.clone()));
        let http_serve: ServeFuture = Box::pin(http.serve(http_listener, stop.clone()));
        #[cfg(test)]
        let (grpc_serve, http_serve) = (
            overrides.grpc.map_or(grpc_serve, |make| make()),
            overrides.http.map_or(http_serve, |make| make()),
        );

        let mut grpc_task = tokio::spawn(grpc_serve);
        tokio::pin!(http_serve);

        let mut grpc_finished = false;
        let http_result = tokio::select! {
            result = &mut http_serve => result,
            joined = &mut grpc_task => {
                grpc_finished = true;
                // A clean gRPC exit only happens on stop; HTTP is closing too.
                grpc_outcome(joined).map_err(|e| fatal("Failed to serve gRPC", e.into()))?;
                http_serve.await
            }
        };

        match http_result {
            Ok(()) | Err(ServeError::Closed) => tracing::info!("HTTP listener closed"),
            Err(e) => {
                grpc_task.abort();
                return Err(fatal("Failed to serve HTTP", e.into()));
            }
        }

        if !grpc_finished {
            match tokio::time::timeout(GRPC_DRAIN_TIMEOUT, &mut grpc_task).await {
                Ok(joined) => {
                    grpc_outcome(joined).map_err(|e| fatal("Failed to serve gRPC", e.into()))?
                }
                Err(_) => {
                    tracing::warn!("gRPC server did not drain in time, aborting");
                    grpc_task.abort();
                }
            }
        }

        let failures = shutdown.run_all();
        tracing::info!(
            failed_shutdowns = failures.len(),
            "Stopping the {} service",
            telemetry.service_name()
        );
        Ok(())
    }
}

fn grpc_outcome(joined: Result<Result<(), ServeError>, JoinError>) -> Result<(), ServeError> {
    joined.map_err(|source| ServeError::Task {
        transport: Transport::Grpc,
        source,
    })?
}
