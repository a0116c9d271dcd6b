//! Shared utilities for breaker integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Barrier, Mutex};
use std::thread;

use count_breaker::{CountBreaker, Outcome};

/// Tally of what concurrent callers observed.
#[derive(Debug, Default)]
pub struct Tally {
    /// Calls whose `register` reported a trip.
    pub trips: AtomicUsize,
    /// Calls that saw the breaker tripped before registering.
    pub refused: AtomicUsize,
    /// Successful calls that were told they tripped the breaker.
    pub bogus_success_trips: AtomicUsize,
    /// Failure reporters refused before their own register call.
    pub premature_blocks: Mutex<Vec<Outcome>>,
}

/// Run one thread per outcome against `breaker`, all released at once.
///
/// Every caller checks `is_tripped` first and only registers its outcome when
/// calls are allowed, like a well-behaved client.
#[allow(dead_code)]
pub fn race(breaker: &CountBreaker, outcomes: &[Outcome]) -> Tally {
    let tally = Tally::default();
    let start_pistol = Barrier::new(outcomes.len());

    thread::scope(|scope| {
        for &outcome in outcomes {
            let tally = &tally;
            let start_pistol = &start_pistol;
            scope.spawn(move || {
                start_pistol.wait();
                if breaker.is_tripped().is_err() {
                    tally.refused.fetch_add(1, Ordering::SeqCst);
                    if outcome.is_failure() {
                        tally.premature_blocks.lock().unwrap().push(outcome);
                    }
                    return;
                }
                if breaker.register(outcome).is_err() {
                    tally.trips.fetch_add(1, Ordering::SeqCst);
                    if outcome == Outcome::Success {
                        tally.bogus_success_trips.fetch_add(1, Ordering::SeqCst);
                    }
                }
            });
        }
    });

    tally
}

/// Interleave the requested number of each outcome kind.
#[allow(dead_code)]
pub fn mixed(successes: usize, anomalies: usize, fatalities: usize) -> Vec<Outcome> {
    let mut outcomes = Vec::with_capacity(successes + anomalies + fatalities);
    let longest = successes.max(anomalies).max(fatalities);
    for i in 0..longest {
        if i < successes {
            outcomes.push(Outcome::Success);
        }
        if i < anomalies {
            outcomes.push(Outcome::Anomaly);
        }
        if i < fatalities {
            outcomes.push(Outcome::Fatal);
        }
    }
    outcomes
}
