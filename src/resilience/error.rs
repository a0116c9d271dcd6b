//! Breaker errors.

use thiserror::Error;

/// Error returned when a circuit breaker refuses calls or has just tripped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BreakerError {
    /// The breaker guarding `service` is tripped.
    #[error("circuit breaker for {service} has been tripped")]
    Tripped { service: String },
}

impl BreakerError {
    pub(crate) fn tripped(service: &str) -> Self {
        BreakerError::Tripped {
            service: service.to_string(),
        }
    }

    /// Return true if this error reports a tripped breaker.
    pub fn is_tripped(&self) -> bool {
        matches!(self, BreakerError::Tripped { .. })
    }

    /// Name of the dependency whose breaker produced the error.
    pub fn service(&self) -> &str {
        match self {
            BreakerError::Tripped { service } => service,
        }
    }
}

/// Error returned by [`BreakerRegistry`](crate::resilience::registry::BreakerRegistry)
/// lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// No breaker exists for `service` and the registry has no defaults to
    /// build one from.
    #[error("no circuit breaker configured for {service}")]
    Unconfigured { service: String },

    #[error(transparent)]
    Breaker(#[from] BreakerError),
}

impl RegistryError {
    /// Return true if the underlying breaker is tripped.
    pub fn is_tripped(&self) -> bool {
        matches!(self, RegistryError::Breaker(err) if err.is_tripped())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tripped_message_names_service() {
        let err = BreakerError::tripped("payments");
        assert!(err.is_tripped());
        assert_eq!(err.service(), "payments");
        assert_eq!(err.to_string(), "circuit breaker for payments has been tripped");
    }

    #[test]
    fn test_registry_error_wraps_breaker_error() {
        let err = RegistryError::from(BreakerError::tripped("payments"));
        assert!(err.is_tripped());
        assert_eq!(err.to_string(), "circuit breaker for payments has been tripped");

        let err = RegistryError::Unconfigured {
            service: "search".into(),
        };
        assert!(!err.is_tripped());
        assert_eq!(err.to_string(), "no circuit breaker configured for search");
    }
}
