//! Startup and teardown ordering.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use svc_orchestrator::modules::RegistrationError;
use svc_orchestrator::net::{ListenerAddrs, Transport};
use svc_orchestrator::{ConfigSource, FatalError, Orchestrator};
use tokio::sync::oneshot;

mod common;
use common::{entries, Broken, Tracked};

fn orchestrator(log: &common::Log, config: svc_orchestrator::AppConfig) -> (Orchestrator, oneshot::Receiver<ListenerAddrs>) {
    let (tx, rx) = oneshot::channel();
    let orchestrator = Orchestrator::new(common::telemetry(log), ConfigSource::Inline(config)).notify_ready(tx);
    (orchestrator, rx)
}

#[tokio::test]
async fn shutdown_runs_in_reverse_registration_order_then_telemetry() {
    let log = common::log();
    let (orchestrator, ready) = orchestrator(&log, common::ephemeral_config());
    let stop = orchestrator.stop_handle();

    let l = log.clone();
    let task = tokio::spawn(orchestrator.run_with(move |registrar, _| {
        for name in ["alpha", "beta", "gamma", "delta"] {
            let tracked = registrar.register(Tracked::new(name, &l))?;
            registrar.stop_on_exit(&tracked)?;
        }
        Ok(())
    }));

    ready.await.expect("orchestrator should start serving");
    stop.trigger();
    task.await.unwrap().unwrap();

    assert_eq!(
        entries(&log),
        [
            "register:alpha",
            "register:beta",
            "register:gamma",
            "register:delta",
            "shutdown:delta",
            "shutdown:gamma",
            "shutdown:beta",
            "shutdown:alpha",
            "telemetry",
        ]
    );
}

#[tokio::test]
async fn grpc_bind_failure_starts_nothing() {
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let mut config = common::ephemeral_config();
    config.server.endpoint.grpc = taken.local_addr().unwrap().to_string();

    let log = common::log();
    let (orchestrator, ready) = orchestrator(&log, config);
    let composed = Arc::new(AtomicBool::new(false));

    let c = composed.clone();
    let result = orchestrator
        .run_with(move |_, _| {
            c.store(true, Ordering::SeqCst);
            Ok(())
        })
        .await;

    assert!(matches!(result, Err(FatalError::Bind(ref e)) if e.transport == Transport::Grpc));
    assert!(!composed.load(Ordering::SeqCst), "no module may register");
    assert!(ready.await.is_err(), "no serving loop may start");
    assert_eq!(entries(&log), ["telemetry"]);
}

#[tokio::test]
async fn http_bind_failure_starts_nothing() {
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let mut config = common::ephemeral_config();
    config.server.endpoint.http = taken.local_addr().unwrap().to_string();

    let log = common::log();
    let (orchestrator, ready) = orchestrator(&log, config);

    let l = log.clone();
    let result = orchestrator
        .run_with(move |registrar, _| {
            let tracked = registrar.register(Tracked::new("only", &l))?;
            registrar.stop_on_exit(&tracked)?;
            Ok(())
        })
        .await;

    assert!(matches!(result, Err(FatalError::Bind(ref e)) if e.transport == Transport::Http));
    assert!(ready.await.is_err());
    assert_eq!(entries(&log), ["telemetry"]);
}

#[tokio::test]
async fn construction_failure_stops_later_registrations() {
    let log = common::log();
    let (orchestrator, ready) = orchestrator(&log, common::ephemeral_config());

    let l = log.clone();
    let result = orchestrator
        .run_with(move |registrar, _| {
            let first = registrar.register(Tracked::new("first", &l))?;
            registrar.stop_on_exit(&first)?;
            registrar.register(Broken::try_new()?)?;
            registrar.register(Tracked::new("after", &l))?;
            Ok(())
        })
        .await;

    assert!(matches!(result, Err(FatalError::Module(_))));
    assert!(ready.await.is_err());
    assert_eq!(entries(&log), ["register:first", "shutdown:first", "telemetry"]);
}

#[tokio::test]
async fn failing_shutdown_does_not_skip_cleanup_or_telemetry() {
    let log = common::log();
    let (orchestrator, ready) = orchestrator(&log, common::ephemeral_config());
    let stop = orchestrator.stop_handle();

    let l = log.clone();
    let task = tokio::spawn(orchestrator.run_with(move |registrar, _| {
        let a = registrar.register(Tracked::new("a", &l))?;
        registrar.stop_on_exit(&a)?;
        let b = registrar.register(Tracked::failing_shutdown("b", &l))?;
        registrar.stop_on_exit(&b)?;
        let c = registrar.register(Tracked::new("c", &l))?;
        registrar.stop_on_exit(&c)?;
        Ok(())
    }));

    ready.await.unwrap();
    stop.trigger();
    task.await.unwrap().expect("shutdown failures are not fatal");

    let log = entries(&log);
    assert_eq!(
        &log[3..],
        ["shutdown:c", "shutdown:b", "shutdown:a", "telemetry"]
    );
    assert_eq!(log.iter().filter(|e| *e == "telemetry").count(), 1);
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let log = common::log();
    let (orchestrator, _ready) = orchestrator(&log, common::ephemeral_config());

    let l = log.clone();
    let result = orchestrator
        .run_with(move |registrar, _| {
            let first = registrar.register(Tracked::new("same", &l))?;
            registrar.stop_on_exit(&first)?;
            registrar.register(Tracked::new("same", &l))?;
            Ok(())
        })
        .await;

    assert!(matches!(
        result,
        Err(FatalError::Registration(RegistrationError::Duplicate("same")))
    ));
    assert_eq!(entries(&log), ["register:same", "shutdown:same", "telemetry"]);
}

#[tokio::test]
async fn panic_during_registration_still_unwinds_in_order() {
    let log = common::log();
    let (orchestrator, _ready) = orchestrator(&log, common::ephemeral_config());

    let l = log.clone();
    let task = tokio::spawn(orchestrator.run_with(move |registrar, _| {
        let tracked = registrar.register(Tracked::new("held", &l))?;
        registrar.stop_on_exit(&tracked)?;
        panic!("module wiring bug");
    }));

    assert!(task.await.unwrap_err().is_panic());
    assert_eq!(entries(&log), ["register:held", "shutdown:held", "telemetry"]);
}
