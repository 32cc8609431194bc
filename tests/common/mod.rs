//! Shared utilities for the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use svc_orchestrator::http::HttpRouter;
use svc_orchestrator::modules::{Module, ModuleError, Registrable, Stoppable};
use svc_orchestrator::{AppConfig, Telemetry};

/// Ordered record of lifecycle events, shared between modules and telemetry.
pub type Log = Arc<Mutex<Vec<String>>>;

pub fn log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Telemetry that records `telemetry` when torn down.
pub fn telemetry(log: &Log) -> Telemetry {
    let mut telemetry = Telemetry::noop();
    let log = log.clone();
    telemetry.on_teardown(move || log.lock().unwrap().push("telemetry".into()));
    telemetry
}

/// Both listeners on ephemeral loopback ports.
pub fn ephemeral_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.server.endpoint.http = "127.0.0.1:0".into();
    config.server.endpoint.grpc = "127.0.0.1:0".into();
    config
}

/// Instrumented no-op module.
pub struct Tracked {
    name: &'static str,
    log: Log,
    fail_shutdown: bool,
}

impl Tracked {
    pub fn new(name: &'static str, log: &Log) -> Self {
        Self {
            name,
            log: log.clone(),
            fail_shutdown: false,
        }
    }

    pub fn failing_shutdown(name: &'static str, log: &Log) -> Self {
        Self {
            fail_shutdown: true,
            ..Self::new(name, log)
        }
    }

    fn record(&self, event: &str) {
        self.log.lock().unwrap().push(format!("{event}:{}", self.name));
    }
}

impl Module for Tracked {
    fn name(&self) -> &'static str {
        self.name
    }
}

impl Registrable for Tracked {
    fn register_routes(&self, _router: &mut HttpRouter) {
        self.record("register");
    }
}

impl Stoppable for Tracked {
    fn shutdown(&self) -> Result<(), ModuleError> {
        self.record("shutdown");
        if self.fail_shutdown {
            return Err(ModuleError::Failed {
                module: self.name,
                message: "connection reset".into(),
            });
        }
        Ok(())
    }
}

/// A module whose construction always fails.
pub struct Broken;

impl Broken {
    pub fn try_new() -> Result<Self, ModuleError> {
        Err(ModuleError::Config {
            module: "broken",
            reason: "missing credentials".into(),
        })
    }
}

impl Module for Broken {
    fn name(&self) -> &'static str {
        "broken"
    }
}

impl Registrable for Broken {
    fn register_routes(&self, _router: &mut HttpRouter) {}
}
