//! Telemetry bootstrap and teardown.
//!
//! # Responsibilities
//! - Install the `tracing` subscriber (env filter + fmt layer)
//! - Build the OTLP span and log exporters when an endpoint is configured
//! - Bridge every `tracing` event into the OpenTelemetry log pipeline
//! - Hand out the `Telemetry` handle the orchestrator reports through
//! - Flush and shut the exporter down exactly once, after everything else

use std::error::Error as StdError;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::time::Duration;

use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::trace::{Sampler, SdkTracerProvider};
use opentelemetry_sdk::Resource;
use tracing::Span;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::observability::settings::{TelemetrySettings, SERVICE_NAME};

/// Export timeout for the OTLP exporters.
const EXPORT_TIMEOUT: Duration = Duration::from_secs(5);

/// Targets whose events must not be bridged into OTLP logs; exporting them
/// would feed the exporter its own traffic.
const EXPORT_PLUMBING: [&str; 5] = ["opentelemetry", "tonic", "h2", "hyper", "tower"];

type TeardownHook = Box<dyn FnOnce() + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to build an OTLP exporter: {0}")]
    Exporter(String),

    #[error("failed to install the tracing subscriber: {0}")]
    Subscriber(String),

    #[error("failed to shut down an OpenTelemetry provider: {0}")]
    Shutdown(String),
}

/// Process-wide telemetry handle.
///
/// Created before anything else. Consuming [`Telemetry::teardown`] (or
/// dropping the [`TelemetryGuard`]) flushes the exporters and then runs the
/// registered teardown hooks in registration order.
pub struct Telemetry {
    service_name: String,
    exporters: Option<Exporters>,
    hooks: Vec<TeardownHook>,
}

/// The OTLP pipelines, present only when an endpoint is configured.
struct Exporters {
    tracer: SdkTracerProvider,
    logger: SdkLoggerProvider,
}

impl Exporters {
    fn build(service_name: &str, endpoint: &str) -> Result<Self, TelemetryError> {
        let resource = Resource::builder()
            .with_attributes([KeyValue::new("service.name", service_name.to_string())])
            .build();

        let tracer = build_tracer_provider(endpoint, resource.clone())?;
        match build_logger_provider(endpoint, resource) {
            Ok(logger) => Ok(Self { tracer, logger }),
            Err(e) => {
                let _ = tracer.shutdown();
                Err(e)
            }
        }
    }

    /// Flush and shut down both providers. Both are shut down even if the
    /// first fails; the first error wins.
    fn shutdown(self) -> Result<(), TelemetryError> {
        let traces = self
            .tracer
            .shutdown()
            .map_err(|e| TelemetryError::Shutdown(e.to_string()));
        let logs = self
            .logger
            .shutdown()
            .map_err(|e| TelemetryError::Shutdown(e.to_string()));
        traces.and(logs)
    }
}

impl Telemetry {
    /// Read the settings file and install the subscriber and exporters.
    pub fn setup(path: &Path) -> Result<Self, TelemetryError> {
        let settings = TelemetrySettings::from_file(path)?;
        Self::from_settings(&settings)
    }

    pub fn from_settings(settings: &TelemetrySettings) -> Result<Self, TelemetryError> {
        let exporters = settings
            .otlp_endpoint
            .as_deref()
            .map(|endpoint| Exporters::build(&settings.service_name, endpoint))
            .transpose()?;

        let span_layer = exporters.as_ref().map(|exporters| {
            tracing_opentelemetry::layer()
                .with_tracer(exporters.tracer.tracer(settings.service_name.clone()))
        });
        let log_layer = exporters.as_ref().map(|exporters| {
            OpenTelemetryTracingBridge::new(&exporters.logger)
                .with_filter(filter_fn(|metadata| !is_export_plumbing(metadata.target())))
        });

        let installed = tracing_subscriber::registry()
            .with(env_filter(&settings.log_level))
            .with(fmt_layer(settings.json_logs))
            .with(span_layer)
            .with(log_layer)
            .try_init();

        if let Err(e) = installed {
            if let Some(exporters) = exporters {
                let _ = exporters.shutdown();
            }
            return Err(TelemetryError::Subscriber(e.to_string()));
        }

        tracing::info!(
            service = %settings.service_name,
            otlp = settings.otlp_endpoint.is_some(),
            "Telemetry initialized"
        );

        Ok(Self {
            service_name: settings.service_name.clone(),
            exporters,
            hooks: Vec::new(),
        })
    }

    /// Console-only fallback used when [`Telemetry::setup`] fails.
    ///
    /// Installs a plain fmt subscriber unless one is already in place.
    pub fn console() -> Self {
        let _ = tracing_subscriber::registry()
            .with(env_filter("info"))
            .with(fmt_layer(false))
            .try_init();

        Self::noop()
    }

    /// A handle that installs nothing. Events still reach whatever
    /// subscriber the host process set up.
    pub fn noop() -> Self {
        Self {
            service_name: SERVICE_NAME.to_string(),
            exporters: None,
            hooks: Vec::new(),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Run `hook` during teardown, after the exporters have been flushed.
    pub fn on_teardown(&mut self, hook: impl FnOnce() + Send + Sync + 'static) {
        self.hooks.push(Box::new(hook));
    }

    /// The span covering process startup.
    pub fn startup_span(&self) -> Span {
        tracing::info_span!(
            "main",
            service = %self.service_name,
            otel.status_code = tracing::field::Empty,
            otel.status_description = tracing::field::Empty,
        )
    }

    /// Record a fatal condition on `span` and log it.
    ///
    /// Only reports; the caller decides how to unwind.
    pub fn record_fatal(&self, span: &Span, context: &str, error: &dyn StdError) {
        span.record("otel.status_code", "ERROR");
        span.record("otel.status_description", tracing::field::display(error));
        tracing::error!(parent: span, fatal = true, error = %error, "{}", context);
    }

    /// Wrap the handle so teardown runs when the guard goes out of scope.
    pub fn guard(self) -> TelemetryGuard {
        TelemetryGuard { inner: Some(self) }
    }

    /// Flush and shut down the span and log exporters, then run the
    /// teardown hooks.
    ///
    /// Hooks run even when a provider fails to shut down.
    pub fn teardown(self) -> Result<(), TelemetryError> {
        let result = match self.exporters {
            Some(exporters) => exporters.shutdown(),
            None => Ok(()),
        };

        for hook in self.hooks {
            hook();
        }

        result
    }
}

/// Scope guard for [`Telemetry`]; tears it down on drop, including unwinds.
pub struct TelemetryGuard {
    inner: Option<Telemetry>,
}

impl Deref for TelemetryGuard {
    type Target = Telemetry;

    fn deref(&self) -> &Telemetry {
        self.inner
            .as_ref()
            .expect("telemetry is only taken when the guard drops")
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(telemetry) = self.inner.take() {
            if let Err(e) = telemetry.teardown() {
                eprintln!("Failed to shut down telemetry: {e}");
            }
        }
    }
}

fn build_tracer_provider(
    endpoint: &str,
    resource: Resource,
) -> Result<SdkTracerProvider, TelemetryError> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .with_timeout(EXPORT_TIMEOUT)
        .build()
        .map_err(|e| TelemetryError::Exporter(e.to_string()))?;

    Ok(SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_sampler(Sampler::AlwaysOn)
        .with_resource(resource)
        .build())
}

fn build_logger_provider(
    endpoint: &str,
    resource: Resource,
) -> Result<SdkLoggerProvider, TelemetryError> {
    let exporter = opentelemetry_otlp::LogExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .with_timeout(EXPORT_TIMEOUT)
        .build()
        .map_err(|e| TelemetryError::Exporter(e.to_string()))?;

    Ok(SdkLoggerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(resource)
        .build())
}

fn is_export_plumbing(target: &str) -> bool {
    EXPORT_PLUMBING
        .iter()
        .any(|prefix| target.starts_with(prefix))
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{level},h2=info,hyper=info,tower=info"))
    })
}

fn fmt_layer<S>(json: bool) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    if json {
        fmt::layer().json().with_target(true).boxed()
    } else {
        fmt::layer().with_target(true).compact().boxed()
    }
}
