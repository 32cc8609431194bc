//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML), or nothing
//!     → loader.rs (read & deserialize, or defaults for an empty path)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → borrowed by the orchestrator and the composition root
//! ```
//!
//! # Design Decisions
//! - Config is loaded exactly once, before any module is constructed
//! - All fields have defaults to allow minimal configs
//! - A file that fails to load is fatal; defaults are only used on request
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AppConfig, EndpointConfig, PaymentsConfig, PlansConfig, ServerConfig, SubscriptionsConfig,
    UsersConfig,
};
pub use validation::{validate_config, ValidationError};
