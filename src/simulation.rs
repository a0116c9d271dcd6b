//! Scripted breaker runs, as driven by `breaker-sim`.
//!
//! # Responsibilities
//! - Feed a sequence of outcomes into one breaker, optionally spaced in time
//! - Describe what the breaker did after each outcome
//! - Summarize a loaded registry for `breaker-sim check`

use std::time::Duration;

use serde::Serialize;
use serde_json::{json, Value};

use crate::resilience::circuit_breaker::{BreakerSnapshot, CountBreaker};
use crate::resilience::outcome::Outcome;
use crate::resilience::registry::BreakerRegistry;

/// What happened when one scripted outcome was registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    /// 1-based position in the script.
    pub step: usize,
    pub outcome: Outcome,
    /// Whether the breaker let the call through before it was registered.
    pub allowed: bool,
    /// Whether this outcome tripped the breaker.
    pub tripped_now: bool,
    #[serde(flatten)]
    pub snapshot: BreakerSnapshot,
}

/// Register a single outcome, checking the breaker first like a caller would.
pub fn apply(breaker: &CountBreaker, step: usize, outcome: Outcome) -> Step {
    let allowed = breaker.is_tripped().is_ok();
    let tripped_now = breaker.register(outcome).is_err();
    Step {
        step,
        outcome,
        allowed,
        tripped_now,
        snapshot: breaker.snapshot(),
    }
}

/// Run `outcomes` against `breaker`, sleeping `interval` between them and
/// handing every step to `emit` as soon as it happens.
pub async fn run_outcomes<E>(
    breaker: &CountBreaker,
    outcomes: &[Outcome],
    interval: Duration,
    mut emit: impl FnMut(&Step) -> Result<(), E>,
) -> Result<(), E> {
    for (i, &outcome) in outcomes.iter().enumerate() {
        if i > 0 && !interval.is_zero() {
            tokio::time::sleep(interval).await;
        }
        emit(&apply(breaker, i + 1, outcome))?;
    }
    Ok(())
}

/// On-demand defaults (or `null`) and a snapshot of every configured breaker.
pub fn check_report(registry: &BreakerRegistry) -> Value {
    let defaults = registry.defaults().map(|defaults| {
        json!({
            "max_anomalies": defaults.max_anomalies,
            "max_fatalities": defaults.max_fatalities,
            "time_window_ms": defaults.time_window.as_millis() as u64,
            "backoff_ms": defaults.backoff.as_millis() as u64,
            "max_backoff_ms": defaults.max_backoff.as_millis() as u64,
        })
    });
    json!({
        "defaults": defaults,
        "breakers": registry.snapshots(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    use crate::config::parse_config;
    use crate::resilience::circuit_breaker::{BreakerConfig, BreakerState};

    const CONFIG: &str = r#"
        [defaults]
        max_anomalies = 4
        max_fatalities = 2
        time_window_ms = 1000

        [[breakers]]
        service = "db"
        max_anomalies = 1
        max_fatalities = 0
        backoff_ms = 100
        max_backoff_ms = 100
    "#;

    #[test]
    fn test_check_report() {
        let registry = BreakerRegistry::from_config(&parse_config(CONFIG).unwrap());
        let report = check_report(&registry);

        assert_eq!(report["defaults"]["max_anomalies"], 4);
        assert_eq!(report["defaults"]["max_fatalities"], 2);
        assert_eq!(report["defaults"]["time_window_ms"], 1000);
        assert_eq!(report["defaults"]["max_backoff_ms"], 240_000);
        assert_eq!(report["breakers"][0]["service"], "db");
        assert_eq!(report["breakers"][0]["state"], "normal");
    }

    #[test]
    fn test_check_report_without_defaults() {
        let registry = BreakerRegistry::from_config(&parse_config("").unwrap());
        let report = check_report(&registry);

        assert!(report["defaults"].is_null());
        assert_eq!(report["breakers"], json!([]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_trips_then_recovers() {
        let registry = BreakerRegistry::from_config(&parse_config(CONFIG).unwrap());
        let breaker = registry.get_or_create("db").unwrap();
        let outcomes = [
            Outcome::Anomaly,
            Outcome::Anomaly,
            Outcome::Success,
            Outcome::Success,
        ];

        let mut steps = Vec::new();
        run_outcomes(&breaker, &outcomes, Duration::from_millis(60), |step| {
            steps.push(step.clone());
            Ok::<_, Infallible>(())
        })
        .await
        .unwrap();

        let summary: Vec<_> = steps
            .iter()
            .map(|s| (s.step, s.allowed, s.tripped_now, s.snapshot.state))
            .collect();
        assert_eq!(
            summary,
            vec![
                (1, true, false, BreakerState::Normal),
                (2, true, true, BreakerState::Tripped),
                (3, false, false, BreakerState::Tripped),
                (4, true, false, BreakerState::Normal),
            ]
        );

        let line = serde_json::to_value(&steps[1]).unwrap();
        assert_eq!(line["step"], 2);
        assert_eq!(line["outcome"], "anomaly");
        assert_eq!(line["tripped_now"], true);
        assert_eq!(line["service"], "db");
        assert_eq!(line["state"], "tripped");
        assert_eq!(line["deadline_in_ms"], 100);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_emit_error() {
        let breaker = CountBreaker::new("db", BreakerConfig::new(3, 1));
        let mut seen = 0;
        let result = run_outcomes(&breaker, &[Outcome::Success; 5], Duration::ZERO, |_| {
            seen += 1;
            if seen == 2 {
                Err("closed pipe")
            } else {
                Ok(())
            }
        })
        .await;

        assert_eq!(result, Err("closed pipe"));
        assert_eq!(seen, 2);
        assert_eq!(breaker.snapshot().state, BreakerState::Normal);
    }
}
