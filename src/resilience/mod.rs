//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to a dependency:
//!     → registry.rs (look up the breaker for the dependency)
//!     → circuit_breaker.rs is_tripped() (refuse the call if tripped)
//!     → caller performs the call and classifies it (outcome.rs)
//!     → circuit_breaker.rs register(outcome)
//!         → on threshold crossing: trip, backoff.rs picks the backoff
//! ```
//!
//! # Design Decisions
//! - One breaker per dependency, never global
//! - Hot path is lock-free; only trips and window rollovers take a lock
//! - Recovery is lazy: the first call after a deadline performs the transition
//! - Backoff is randomized so clients sharing a failure do not retry in lockstep

pub mod backoff;
pub mod circuit_breaker;
pub mod error;
pub mod outcome;
pub mod registry;

pub use circuit_breaker::{Breaker, BreakerConfig, BreakerSnapshot, BreakerState, CountBreaker};
pub use error::{BreakerError, RegistryError};
pub use outcome::{Outcome, ParseOutcomeError};
pub use registry::BreakerRegistry;
