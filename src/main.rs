//! Service entry point.
//!
//! ```text
//! svc-orchestrator [--config app.toml] [--otel otel.yaml]
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use svc_orchestrator::lifecycle::signals;
use svc_orchestrator::{ConfigSource, Orchestrator, Telemetry};

#[derive(Parser)]
#[command(name = "svc-orchestrator")]
#[command(about = "Serves the user, plan, payment and subscription modules over HTTP and gRPC", long_about = None)]
struct Cli {
    /// Path to the config file; empty uses the built-in defaults.
    #[arg(long, default_value = "")]
    config: PathBuf,

    /// Path to the telemetry config file.
    #[arg(long, default_value = "otel.yaml")]
    otel: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Telemetry is a diagnostic aid, never a startup precondition.
    let telemetry = match Telemetry::setup(&cli.otel) {
        Ok(telemetry) => telemetry,
        Err(e) => {
            eprintln!("Failed to setup telemetry: {e}");
            Telemetry::console()
        }
    };

    let orchestrator = Orchestrator::new(telemetry, ConfigSource::File(cli.config));
    tokio::spawn(signals::stop_on_signal(orchestrator.stop_handle()));

    match orchestrator.run().await {
        Ok(()) => ExitCode::SUCCESS,
        // Already recorded through telemetry, which is torn down by now.
        Err(_) => ExitCode::FAILURE,
    }
}
