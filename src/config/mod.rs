//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → BreakerFileConfig (validated, immutable)
//!     → BreakerRegistry::from_config builds one breaker per entry
//! ```
//!
//! # Design Decisions
//! - Breaker parameters are immutable once a breaker is built
//! - Everything but breaker thresholds has a default
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::BreakerDefaults;
pub use schema::BreakerFileConfig;
pub use schema::BreakerSettings;
pub use schema::ObservabilityConfig;
pub use validation::ValidationError;
