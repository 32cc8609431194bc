//! Functional modules and the contract they register through.
//!
//! # Data Flow
//! ```text
//! AppConfig sub-block
//!     → Module::new / try_new (construct, may fail)
//!     → Registrar::register / register_with_rpc (routes onto HttpRouter,
//!       services onto GrpcServer)
//!     → Registrar::stop_on_exit (queue Stoppable::shutdown)
//! ```
//!
//! # Design Decisions
//! - Capabilities are separate traits; a module implements only what it has
//! - Registration is synchronous and happens before any listener serves
//! - A module name registers at most once; a second attempt is an error
//! - Declaration order in `compose` is registration order, and the reverse
//!   of shutdown order

pub mod api;
pub mod payments;
pub mod plans;
pub mod store;
pub mod subscriptions;
pub mod users;

use std::sync::Arc;

use tracing::Span;

use crate::config::AppConfig;
use crate::error::FatalError;
use crate::grpc::GrpcServer;
use crate::http::HttpRouter;
use crate::lifecycle::ShutdownCoordinator;

pub use payments::PaymentModule;
pub use plans::PlanModule;
pub use subscriptions::SubscriptionModule;
pub use users::UserModule;

/// Errors raised by a module while constructing or shutting down.
#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    #[error("invalid {module} configuration: {reason}")]
    Config { module: &'static str, reason: String },

    #[error("the {0} module is already shut down")]
    AlreadyStopped(&'static str),

    #[error("{module}: {message}")]
    Failed { module: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    #[error("module {0} is already registered")]
    Duplicate(&'static str),

    #[error("module {0} must be registered before queueing its shutdown")]
    NotRegistered(&'static str),
}

/// Identity shared by every module.
pub trait Module: Send + Sync + 'static {
    /// Unique name, used for logs and duplicate detection.
    fn name(&self) -> &'static str;
}

/// A module exposing routes on the HTTP transport only.
pub trait Registrable: Module {
    fn register_routes(&self, router: &mut HttpRouter);
}

/// A module exposing routes on both transports.
pub trait RegistrableWithRpc: Module {
    fn register_routes(&self, router: &mut HttpRouter, server: &mut GrpcServer);
}

/// A module owning resources that must be released on exit.
pub trait Stoppable: Module {
    fn shutdown(&self) -> Result<(), ModuleError>;
}

/// Registration context handed to the composition root.
///
/// Borrows the router, the gRPC server and the shutdown coordinator for the
/// duration of the startup phase only.
pub struct Registrar<'a> {
    router: &'a mut HttpRouter,
    server: &'a mut GrpcServer,
    shutdown: &'a mut ShutdownCoordinator,
    span: &'a Span,
    registered: Vec<&'static str>,
}

impl<'a> Registrar<'a> {
    pub fn new(
        router: &'a mut HttpRouter,
        server: &'a mut GrpcServer,
        shutdown: &'a mut ShutdownCoordinator,
        span: &'a Span,
    ) -> Self {
        Self {
            router,
            server,
            shutdown,
            span,
            registered: Vec::new(),
        }
    }

    pub fn register<M: Registrable>(&mut self, module: M) -> Result<Arc<M>, RegistrationError> {
        self.admit(module.name())?;
        Registrable::register_routes(&module, self.router);
        Ok(Arc::new(module))
    }

    pub fn register_with_rpc<M: RegistrableWithRpc>(
        &mut self,
        module: M,
    ) -> Result<Arc<M>, RegistrationError> {
        self.admit(module.name())?;
        RegistrableWithRpc::register_routes(&module, self.router, self.server);
        Ok(Arc::new(module))
    }

    /// Queue `module`'s shutdown. The coordinator keeps the module alive
    /// until the operation has run.
    pub fn stop_on_exit<M: Stoppable>(&mut self, module: &Arc<M>) -> Result<(), RegistrationError> {
        let name = module.name();
        if !self.registered.contains(&name) {
            return Err(RegistrationError::NotRegistered(name));
        }

        let module = Arc::clone(module);
        self.shutdown.register(name, move || module.shutdown());
        Ok(())
    }

    /// Names registered so far, in registration order.
    pub fn registered(&self) -> &[&'static str] {
        &self.registered
    }

    fn admit(&mut self, name: &'static str) -> Result<(), RegistrationError> {
        if self.registered.contains(&name) {
            tracing::warn!(parent: self.span, module = name, "Module registered twice, rejecting");
            return Err(RegistrationError::Duplicate(name));
        }

        tracing::info!(parent: self.span, module = name, "Starting the {} module", name);
        self.registered.push(name);
        Ok(())
    }
}

/// The composition root: every module the process serves, in order.
pub fn compose(registrar: &mut Registrar<'_>, config: &AppConfig) -> Result<(), FatalError> {
    registrar.register(UserModule::new(&config.users))?;
    registrar.register_with_rpc(PlanModule::new(&config.plans))?;

    let payments = registrar.register(PaymentModule::try_new(&config.payments)?)?;
    registrar.stop_on_exit(&payments)?;

    registrar.register(SubscriptionModule::new(&config.subscriptions))?;
    Ok(())
}
