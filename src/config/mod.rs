//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! management.toml
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (referenced names exist, addresses parse)
//!     → ManagementConfig (validated, immutable)
//!     → EndpointConfig::from_interface (normalized input of the graph builder)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    ConsoleMode, EndpointConfig, HttpInterfaceConfig, Listeners, ManagementConfig, ProcessType,
    RunningMode,
};
pub use validation::ValidationError;
