//! Configuration schema definitions.
//!
//! This module defines the configuration file structure for breakers.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::resilience::circuit_breaker::{
    BreakerConfig, DEFAULT_BACKOFF, DEFAULT_MAX_BACKOFF, DEFAULT_TIME_WINDOW,
};

/// Root configuration file.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BreakerFileConfig {
    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Parameters for breakers created on demand. Without them only the
    /// breakers listed below exist.
    pub defaults: Option<BreakerDefaults>,

    /// Explicitly configured breakers, one per dependency.
    pub breakers: Vec<BreakerSettings>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Parameters for breakers that have no explicit entry.
///
/// Thresholds have no safe default and must be given. Durations left out
/// fall back to the breaker defaults (1m window, 1m backoff, 4m ceiling).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BreakerDefaults {
    pub max_anomalies: u32,
    pub max_fatalities: u32,

    #[serde(default = "default_time_window_ms")]
    pub time_window_ms: u64,

    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl BreakerDefaults {
    pub fn to_breaker_config(&self) -> BreakerConfig {
        breaker_config(
            self.max_anomalies,
            self.max_fatalities,
            self.time_window_ms,
            self.backoff_ms,
            self.max_backoff_ms,
        )
    }
}

/// A single breaker definition.
///
/// Same rules as [`BreakerDefaults`]: thresholds required, durations optional.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BreakerSettings {
    /// Dependency protected by this breaker.
    pub service: String,

    /// Anomalies tolerated within one window.
    pub max_anomalies: u32,

    /// Fatal outcomes tolerated within one window.
    pub max_fatalities: u32,

    #[serde(default = "default_time_window_ms")]
    pub time_window_ms: u64,

    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl BreakerSettings {
    pub fn to_breaker_config(&self) -> BreakerConfig {
        breaker_config(
            self.max_anomalies,
            self.max_fatalities,
            self.time_window_ms,
            self.backoff_ms,
            self.max_backoff_ms,
        )
    }
}

fn default_time_window_ms() -> u64 {
    DEFAULT_TIME_WINDOW.as_millis() as u64
}

fn default_backoff_ms() -> u64 {
    DEFAULT_BACKOFF.as_millis() as u64
}

fn default_max_backoff_ms() -> u64 {
    DEFAULT_MAX_BACKOFF.as_millis() as u64
}

fn breaker_config(
    max_anomalies: u32,
    max_fatalities: u32,
    time_window_ms: u64,
    backoff_ms: u64,
    max_backoff_ms: u64,
) -> BreakerConfig {
    BreakerConfig::new(max_anomalies, max_fatalities)
        .with_time_window(Duration::from_millis(time_window_ms))
        .with_backoff(Duration::from_millis(backoff_ms))
        .with_max_backoff(Duration::from_millis(max_backoff_ms))
}
