//! Outcome classification for calls made through a breaker.
//!
//! The caller decides how severe a failure was. Success never counts, an
//! anomaly counts toward the anomaly threshold, and a fatal outcome counts
//! toward both thresholds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result of a call to the protected dependency.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The call completed without trouble.
    Success = 0,
    /// A minor failure. Several of them indicate an outage.
    Anomaly = 1,
    /// A critical failure. Also counted as an anomaly.
    Fatal = 2,
}

impl Outcome {
    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Anomaly => "anomaly",
            Outcome::Fatal => "fatal",
        }
    }

    /// Return true for outcomes that count against the breaker.
    pub fn is_failure(&self) -> bool {
        !matches!(self, Outcome::Success)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected outcome code coming from outside the process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseOutcomeError {
    #[error("unknown outcome code {0}")]
    UnknownCode(u8),
    #[error("unknown outcome {0:?}, expected success, anomaly or fatal")]
    UnknownName(String),
}

impl TryFrom<u8> for Outcome {
    type Error = ParseOutcomeError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Outcome::Success),
            1 => Ok(Outcome::Anomaly),
            2 => Ok(Outcome::Fatal),
            other => Err(ParseOutcomeError::UnknownCode(other)),
        }
    }
}

impl FromStr for Outcome {
    type Err = ParseOutcomeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s" | "success" | "ok" => Ok(Outcome::Success),
            "a" | "anomaly" => Ok(Outcome::Anomaly),
            "f" | "fatal" => Ok(Outcome::Fatal),
            _ => Err(ParseOutcomeError::UnknownName(s.to_string())),
        }
    }
}
