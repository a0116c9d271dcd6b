//! Count Breaker Library
//!
//! Circuit breakers that protect callers of an unreliable dependency by
//! counting failed calls in a time window and refusing calls once a
//! threshold is crossed.
//!
//! ```text
//!        is_tripped() ──────────────┐          register(outcome)
//!              │                    │                  │
//!              ▼                    ▼                  ▼
//!       ┌─────────────┐     ┌──────────────┐   ┌──────────────┐
//!       │ maybe_reset │────▶│ state (atom) │◀──│ counters     │
//!       │ (deadline)  │     └──────────────┘   │ (atomics)    │
//!       └──────┬──────┘                        └──────┬───────┘
//!              │ rollover due                         │ threshold crossed
//!              ▼                                      ▼
//!       ┌───────────────────────────────────────────────────────┐
//!       │        transition guard (window rollover / trip)      │
//!       └───────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod observability;
pub mod resilience;
pub mod simulation;

pub use config::BreakerFileConfig;
pub use resilience::{
    Breaker, BreakerConfig, BreakerError, BreakerRegistry, BreakerSnapshot, BreakerState,
    CountBreaker, Outcome, ParseOutcomeError, RegistryError,
};
