//! Windowed counting circuit breaker.
//!
//! # States
//! - Normal: calls pass through, anomalies and fatalities are counted
//! - Half-Open: calls pass through as probes, any failure trips immediately
//! - Tripped: dependency assumed down, calls fail fast
//!
//! # State Transitions
//! ```text
//! Normal → Tripped: anomalies > max_anomalies or fatalities > max_fatalities within a window
//! Half-Open → Tripped: any anomaly or fatal outcome
//! Half-Open → Normal: first success, or a full window without resolution
//! Tripped → Half-Open: first call after the backoff deadline
//! Normal → Normal: first call after the window deadline resets the counters
//! ```
//!
//! # Design Decisions
//! - The window is not rolling: counters reset when the window deadline passes
//! - A single deadline serves as window end (Normal/Half-Open) and backoff end (Tripped)
//! - Counters and state are atomics; a mutex serializes only trips and rollovers
//! - Only the increment that crosses a threshold attempts a trip (exact match),
//!   and a trip on an already tripped breaker is a no-op, so each trip is
//!   reported to exactly one caller
//! - Backoff doubles per consecutive trip, randomized, capped at `max_backoff`

use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::{ArcSwap, Guard};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::time::Instant;

use crate::observability::metrics::BreakerMetrics;
use crate::resilience::backoff::trip_backoff;
use crate::resilience::error::BreakerError;
use crate::resilience::outcome::Outcome;

/// Default length of the counting window.
pub const DEFAULT_TIME_WINDOW: Duration = Duration::from_secs(60);
/// Default base backoff after a trip.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(60);
/// Default ceiling for the backoff.
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(240);

// Fallback when a configured duration would overflow the clock.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Breaker state enum.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerState {
    Normal = 0,
    HalfOpen = 1,
    Tripped = 2,
}

impl BreakerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BreakerState::Normal => "normal",
            BreakerState::HalfOpen => "half_open",
            BreakerState::Tripped => "tripped",
        }
    }
}

impl From<u8> for BreakerState {
    fn from(val: u8) -> Self {
        match val {
            0 => BreakerState::Normal,
            1 => BreakerState::HalfOpen,
            _ => BreakerState::Tripped,
        }
    }
}

impl fmt::Display for BreakerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Common interface of circuit breakers.
///
/// Typical use around a call to a dependency:
///
/// ```
/// use count_breaker::{Breaker, BreakerConfig, CountBreaker, Outcome};
///
/// let breaker = CountBreaker::new("inventory", BreakerConfig::new(10, 3));
/// if breaker.is_tripped().is_ok() {
///     // perform the call, then classify it
///     if let Err(e) = breaker.register(Outcome::Anomaly) {
///         eprintln!("alert: {e}");
///     }
/// }
/// ```
pub trait Breaker: Send + Sync {
    /// Return an error if calls to the dependency should not be made.
    fn is_tripped(&self) -> Result<(), BreakerError>;

    /// Report the outcome of a call. Returns an error only if this outcome
    /// tripped the breaker.
    fn register(&self, outcome: Outcome) -> Result<(), BreakerError>;
}

/// Parameters of a [`CountBreaker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerConfig {
    /// Anomalies tolerated within one window. Fatal outcomes count as anomalies too.
    pub max_anomalies: u32,
    /// Fatal outcomes tolerated within one window.
    pub max_fatalities: u32,
    /// Length of the counting window. Zero means [`DEFAULT_TIME_WINDOW`].
    pub time_window: Duration,
    /// Base backoff after a trip. Zero means [`DEFAULT_BACKOFF`].
    pub backoff: Duration,
    /// Backoff ceiling. Zero means [`DEFAULT_MAX_BACKOFF`].
    pub max_backoff: Duration,
}

impl BreakerConfig {
    pub fn new(max_anomalies: u32, max_fatalities: u32) -> Self {
        Self {
            max_anomalies,
            max_fatalities,
            time_window: DEFAULT_TIME_WINDOW,
            backoff: DEFAULT_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
        }
    }

    pub fn with_time_window(mut self, window: Duration) -> Self {
        self.time_window = window;
        self
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    /// Replace unset (zero) durations with their defaults.
    pub fn normalized(mut self) -> Self {
        if self.time_window.is_zero() {
            self.time_window = DEFAULT_TIME_WINDOW;
        }
        if self.backoff.is_zero() {
            self.backoff = DEFAULT_BACKOFF;
        }
        if self.max_backoff.is_zero() {
            self.max_backoff = DEFAULT_MAX_BACKOFF;
        }
        self
    }
}

/// Point-in-time view of a breaker, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakerSnapshot {
    pub service: String,
    pub state: BreakerState,
    pub anomalies: u32,
    pub fatalities: u32,
    pub successive_failures: u32,
    /// Time left until the window (or backoff, when tripped) ends.
    pub deadline_in_ms: u64,
}

/// A circuit breaker counting anomalies and fatalities within a time window.
///
/// When either count goes over its maximum within a single window, the
/// breaker trips and refuses calls for at least `backoff`. Once the backoff
/// is over it becomes half-open: the first failure re-trips it with a doubled,
/// randomized backoff (up to `max_backoff`), the first success returns it to
/// normal.
///
/// The window is not rolling. Four anomalies in the last seconds of a window
/// are forgotten when the window resets.
#[derive(Debug)]
pub struct CountBreaker {
    service: String,
    config: BreakerConfig,
    anomalies: AtomicU32,
    fatalities: AtomicU32,
    /// End of the counting window while Normal or HalfOpen, end of the
    /// backoff while Tripped.
    deadline: ArcSwap<Instant>,
    state: AtomicU8,
    /// Transition guard. Holds the number of trips since the breaker last healed.
    transition: Mutex<u32>,
    metrics: BreakerMetrics,
}

impl CountBreaker {
    /// Create a breaker for `service`. Zero durations in `config` take their defaults.
    pub fn new(service: impl Into<String>, config: BreakerConfig) -> Self {
        let config = config.normalized();
        let service = service.into();
        let deadline = deadline_after(Instant::now(), config.time_window);

        tracing::debug!(
            service = %service,
            max_anomalies = config.max_anomalies,
            max_fatalities = config.max_fatalities,
            time_window_ms = config.time_window.as_millis() as u64,
            "Circuit breaker created"
        );

        Self {
            metrics: BreakerMetrics::new(&service),
            service,
            config,
            anomalies: AtomicU32::new(0),
            fatalities: AtomicU32::new(0),
            deadline: ArcSwap::from_pointee(deadline),
            state: AtomicU8::new(BreakerState::Normal as u8),
            transition: Mutex::new(0),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn config(&self) -> &BreakerConfig {
        &self.config
    }

    /// Current state, without applying a pending window rollover.
    pub fn state(&self) -> BreakerState {
        BreakerState::from(self.state.load(Ordering::Acquire))
    }

    pub fn anomalies(&self) -> u32 {
        self.anomalies.load(Ordering::Relaxed)
    }

    pub fn fatalities(&self) -> u32 {
        self.fatalities.load(Ordering::Relaxed)
    }

    /// Number of trips since the breaker last healed to normal.
    pub fn successive_failures(&self) -> u32 {
        *self.transition.lock()
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let deadline = **self.deadline.load();
        BreakerSnapshot {
            service: self.service.clone(),
            state: self.state(),
            anomalies: self.anomalies(),
            fatalities: self.fatalities(),
            successive_failures: self.successive_failures(),
            deadline_in_ms: deadline.saturating_duration_since(Instant::now()).as_millis() as u64,
        }
    }

    /// Return [`BreakerError::Tripped`] iff the breaker is tripped.
    pub fn is_tripped(&self) -> Result<(), BreakerError> {
        self.maybe_reset();
        match self.state() {
            BreakerState::Normal | BreakerState::HalfOpen => Ok(()),
            BreakerState::Tripped => Err(BreakerError::tripped(&self.service)),
        }
    }

    /// Register the outcome of a call. Returns [`BreakerError::Tripped`] only
    /// if this outcome caused the breaker to trip.
    pub fn register(&self, outcome: Outcome) -> Result<(), BreakerError> {
        self.maybe_reset();
        let state = self.state();
        self.metrics.record_outcome(outcome);

        let should_trip = match outcome {
            Outcome::Success => {
                // Assume the dependency is back up. Successive failures are
                // kept: a trip later in this window still counts as consecutive.
                if state == BreakerState::HalfOpen && self.transition_from_half_open() {
                    tracing::info!(service = %self.service, "Probe succeeded, circuit breaker back to normal");
                    self.metrics.record_state(BreakerState::Normal);
                }
                false
            }
            Outcome::Anomaly => {
                let prev_anomalies = self.anomalies.fetch_add(1, Ordering::AcqRel);
                // Exact match, so only one caller contends for the lock.
                prev_anomalies == self.config.max_anomalies || state == BreakerState::HalfOpen
            }
            Outcome::Fatal => {
                let prev_anomalies = self.anomalies.fetch_add(1, Ordering::AcqRel);
                let prev_fatalities = self.fatalities.fetch_add(1, Ordering::AcqRel);
                // Both thresholds may be crossed at once; trip() reports only one.
                prev_fatalities == self.config.max_fatalities
                    || prev_anomalies == self.config.max_anomalies
                    || state == BreakerState::HalfOpen
            }
        };

        if should_trip && self.trip() {
            return Err(BreakerError::tripped(&self.service));
        }
        Ok(())
    }

    fn transition_from_half_open(&self) -> bool {
        self.state
            .compare_exchange(
                BreakerState::HalfOpen as u8,
                BreakerState::Normal as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Roll the window over, or end the backoff, if the deadline has passed.
    fn maybe_reset(&self) {
        let observed = self.deadline.load();
        let now = Instant::now();
        if **observed >= now {
            return;
        }
        let observed = Guard::into_inner(observed);

        let mut successive_failures = self.transition.lock();
        // Someone else reset or tripped the breaker while we waited for the lock.
        if !Arc::ptr_eq(&*self.deadline.load(), &observed) {
            return;
        }

        self.deadline
            .store(Arc::new(deadline_after(now, self.config.time_window)));
        // Events racing this reset may be counted in either window.
        self.anomalies.store(0, Ordering::Release);
        self.fatalities.store(0, Ordering::Release);

        let next = match self.state() {
            BreakerState::Normal => {
                tracing::debug!(service = %self.service, "Counting window reset");
                BreakerState::Normal
            }
            BreakerState::HalfOpen => {
                tracing::info!(service = %self.service, "No failed probe within a window, circuit breaker back to normal");
                BreakerState::Normal
            }
            BreakerState::Tripped => {
                tracing::info!(
                    service = %self.service,
                    successive_failures = *successive_failures,
                    "Backoff elapsed, circuit breaker half-open"
                );
                BreakerState::HalfOpen
            }
        };
        if next == BreakerState::Normal {
            *successive_failures = 0;
        }
        self.state.store(next as u8, Ordering::Release);
        self.metrics.record_state(next);
    }

    /// Trip the breaker. Returns false if it was already tripped.
    fn trip(&self) -> bool {
        let mut successive_failures = self.transition.lock();
        if self.state() == BreakerState::Tripped {
            return false;
        }

        let backoff = trip_backoff(
            *successive_failures,
            self.config.backoff,
            self.config.max_backoff,
        );
        self.deadline
            .store(Arc::new(deadline_after(Instant::now(), backoff)));
        self.state
            .store(BreakerState::Tripped as u8, Ordering::Release);
        *successive_failures = successive_failures.saturating_add(1);

        tracing::warn!(
            service = %self.service,
            backoff_ms = backoff.as_millis() as u64,
            successive_failures = *successive_failures,
            "Circuit breaker tripped"
        );
        self.metrics.record_trip();
        self.metrics.record_state(BreakerState::Tripped);
        true
    }
}

impl Breaker for CountBreaker {
    fn is_tripped(&self) -> Result<(), BreakerError> {
        CountBreaker::is_tripped(self)
    }

    fn register(&self, outcome: Outcome) -> Result<(), BreakerError> {
        CountBreaker::register(self, outcome)
    }
}

fn deadline_after(now: Instant, after: Duration) -> Instant {
    now.checked_add(after).unwrap_or_else(|| now + FAR_FUTURE)
}
