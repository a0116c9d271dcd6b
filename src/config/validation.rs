//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (durations > 0, backoff ceiling >= base backoff)
//! - Thresholds are required fields, so serde rejects files missing them
//! - Detect duplicate or unnamed breakers
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BreakerFileConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::BreakerFileConfig;

/// A single semantic problem in a configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("breaker #{index} has an empty service name")]
    EmptyServiceName { index: usize },

    #[error("breaker {service} is defined more than once")]
    DuplicateService { service: String },

    #[error("{scope}: {field} must be greater than zero")]
    ZeroDuration { scope: String, field: &'static str },

    #[error("{scope}: max_backoff_ms ({max_backoff_ms}) is below backoff_ms ({backoff_ms})")]
    BackoffCeilingTooLow {
        scope: String,
        backoff_ms: u64,
        max_backoff_ms: u64,
    },

    #[error("invalid metrics address {0:?}")]
    MetricsAddress(String),
}

/// Validate a parsed configuration file.
pub fn validate_config(config: &BreakerFileConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Some(defaults) = &config.defaults {
        check_durations(
            "defaults",
            defaults.time_window_ms,
            defaults.backoff_ms,
            defaults.max_backoff_ms,
            &mut errors,
        );
    }

    let mut seen = HashSet::new();
    for (index, breaker) in config.breakers.iter().enumerate() {
        if breaker.service.trim().is_empty() {
            errors.push(ValidationError::EmptyServiceName { index });
            continue;
        }
        if !seen.insert(breaker.service.as_str()) {
            errors.push(ValidationError::DuplicateService {
                service: breaker.service.clone(),
            });
        }
        check_durations(
            &breaker.service,
            breaker.time_window_ms,
            breaker.backoff_ms,
            breaker.max_backoff_ms,
            &mut errors,
        );
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_durations(
    scope: &str,
    time_window_ms: u64,
    backoff_ms: u64,
    max_backoff_ms: u64,
    errors: &mut Vec<ValidationError>,
) {
    for (field, value) in [
        ("time_window_ms", time_window_ms),
        ("backoff_ms", backoff_ms),
        ("max_backoff_ms", max_backoff_ms),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroDuration {
                scope: scope.to_string(),
                field,
            });
        }
    }
    if max_backoff_ms < backoff_ms {
        errors.push(ValidationError::BackoffCeilingTooLow {
            scope: scope.to_string(),
            backoff_ms,
            max_backoff_ms,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::BreakerSettings;

    fn settings(service: &str) -> BreakerSettings {
        BreakerSettings {
            service: service.to_string(),
            max_anomalies: 3,
            max_fatalities: 1,
            time_window_ms: 1000,
            backoff_ms: 100,
            max_backoff_ms: 400,
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&BreakerFileConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = BreakerFileConfig::default();
        config.breakers.push(settings("db"));
        config.breakers.push(settings("db"));
        config.breakers.push(settings(" "));
        let mut bad = settings("cache");
        bad.time_window_ms = 0;
        bad.max_backoff_ms = 50;
        config.breakers.push(bad);
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = "not-an-address".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::DuplicateService { service: "db".into() },
                ValidationError::EmptyServiceName { index: 2 },
                ValidationError::ZeroDuration {
                    scope: "cache".into(),
                    field: "time_window_ms"
                },
                ValidationError::BackoffCeilingTooLow {
                    scope: "cache".into(),
                    backoff_ms: 100,
                    max_backoff_ms: 50
                },
                ValidationError::MetricsAddress("not-an-address".into()),
            ]
        );
    }
}
