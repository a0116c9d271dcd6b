//! Metrics collection and exposition.
//!
//! # Metrics
//! - `breaker_trips_total` (counter): trips by service
//! - `breaker_outcomes_total` (counter): registered outcomes by service, outcome
//! - `breaker_state` (gauge): 0=normal, 1=half-open, 2=tripped
//!
//! # Design Decisions
//! - Handles are registered once per breaker; recording is an atomic update
//! - Breakers created before a recorder is installed record nothing
//! - Labels are limited to service and outcome to bound cardinality

use std::net::SocketAddr;

use metrics::{counter, describe_counter, describe_gauge, gauge, Counter, Gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::resilience::circuit_breaker::BreakerState;
use crate::resilience::outcome::Outcome;

/// Install the Prometheus exporter with an HTTP scrape endpoint on `addr`.
///
/// Call before building breakers so their handles bind to the exporter.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    describe_metrics();
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

fn describe_metrics() {
    describe_counter!("breaker_trips_total", "Number of times a circuit breaker tripped");
    describe_counter!("breaker_outcomes_total", "Call outcomes registered with a circuit breaker");
    describe_gauge!("breaker_state", "Circuit breaker state (0=normal, 1=half-open, 2=tripped)");
}

/// Metric handles of a single breaker.
#[derive(Debug)]
pub struct BreakerMetrics {
    successes: Counter,
    anomalies: Counter,
    fatalities: Counter,
    trips: Counter,
    state: Gauge,
}

impl BreakerMetrics {
    pub fn new(service: &str) -> Self {
        let outcome_counter = |outcome: Outcome| {
            counter!(
                "breaker_outcomes_total",
                "service" => service.to_string(),
                "outcome" => outcome.as_str()
            )
        };
        let metrics = Self {
            successes: outcome_counter(Outcome::Success),
            anomalies: outcome_counter(Outcome::Anomaly),
            fatalities: outcome_counter(Outcome::Fatal),
            trips: counter!("breaker_trips_total", "service" => service.to_string()),
            state: gauge!("breaker_state", "service" => service.to_string()),
        };
        metrics.record_state(BreakerState::Normal);
        metrics
    }

    pub fn record_outcome(&self, outcome: Outcome) {
        match outcome {
            Outcome::Success => self.successes.increment(1),
            Outcome::Anomaly => self.anomalies.increment(1),
            Outcome::Fatal => self.fatalities.increment(1),
        }
    }

    pub fn record_trip(&self) {
        self.trips.increment(1);
    }

    pub fn record_state(&self, state: BreakerState) {
        self.state.set(state as u8 as f64);
    }
}
