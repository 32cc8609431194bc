//! Process-level error type.

use crate::config::ConfigError;
use crate::modules::{ModuleError, RegistrationError};
use crate::net::{BindError, ServeError};

/// A condition that ends the process after being recorded through telemetry.
#[derive(Debug, thiserror::Error)]
pub enum FatalError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Bind(#[from] BindError),

    #[error(transparent)]
    Module(#[from] ModuleError),

    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    Serve(#[from] ServeError),
}
