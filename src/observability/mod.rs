//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Breakers produce:
//!     → logging.rs (structured log events: trips, half-open, recovery)
//!     → metrics.rs (trip counters, outcome counters, state gauges)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Every event carries the `service` it concerns
//! - Metrics are cheap and become no-ops when no recorder is installed
//! - Library code never installs a subscriber or recorder; binaries do

pub mod logging;
pub mod metrics;
