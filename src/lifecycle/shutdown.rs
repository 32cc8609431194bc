//! Shutdown coordination.

use tokio::sync::watch;

use crate::modules::ModuleError;

type ShutdownOp = Box<dyn FnOnce() -> Result<(), ModuleError> + Send>;

/// Administrative stop signal shared by both serving loops.
///
/// Cloning is cheap; every clone observes the same stop. A stop requested
/// before a loop starts waiting is still observed.
#[derive(Clone)]
pub struct StopHandle {
    tx: watch::Sender<bool>,
}

impl StopHandle {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Request a clean stop.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once [`StopHandle::trigger`] has been called.
    pub fn stopped(&self) -> impl std::future::Future<Output = ()> + Send + 'static {
        let mut rx = self.tx.subscribe();
        async move {
            loop {
                if *rx.borrow_and_update() {
                    return;
                }
                if rx.changed().await.is_err() {
                    // Every handle is gone; no stop can arrive anymore.
                    std::future::pending::<()>().await;
                }
            }
        }
    }
}

impl Default for StopHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// A shutdown operation that returned an error.
#[derive(Debug)]
pub struct ShutdownFailure {
    pub module: &'static str,
    pub error: ModuleError,
}

/// Collects module shutdown operations during startup and runs them in
/// reverse registration order.
///
/// Operations not yet run when the coordinator is dropped run in `Drop`,
/// so early returns and panics still release module resources.
#[derive(Default)]
pub struct ShutdownCoordinator {
    ops: Vec<(&'static str, ShutdownOp)>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, module: &'static str, op: F)
    where
        F: FnOnce() -> Result<(), ModuleError> + Send + 'static,
    {
        self.ops.push((module, Box::new(op)));
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Run every pending operation, last registered first.
    ///
    /// A failing operation is logged and collected; the rest still run.
    pub fn run_all(&mut self) -> Vec<ShutdownFailure> {
        let mut failures = Vec::new();

        while let Some((module, op)) = self.ops.pop() {
            tracing::info!(module, "Shutting down the {} module", module);
            if let Err(error) = op() {
                tracing::error!(module, error = %error, "Failed to shut down the {} module", module);
                failures.push(ShutdownFailure { module, error });
            }
        }

        failures
    }
}

impl Drop for ShutdownCoordinator {
    fn drop(&mut self) {
        if !self.ops.is_empty() {
            self.run_all();
        }
    }
}
