//! Per-dependency breaker registry.
//!
//! # Responsibilities
//! - Own one breaker per named dependency
//! - Create breakers on first use, only when default parameters were given
//! - Expose snapshots of all breakers for diagnostics

use std::sync::Arc;

use dashmap::DashMap;

use crate::config::schema::BreakerFileConfig;
use crate::resilience::circuit_breaker::{BreakerConfig, BreakerSnapshot, CountBreaker};
use crate::resilience::error::RegistryError;
use crate::resilience::outcome::Outcome;

/// A thread-safe map from dependency name to its circuit breaker.
///
/// Without defaults the registry only serves breakers that were inserted
/// explicitly; lookups of any other service fail with
/// [`RegistryError::Unconfigured`].
#[derive(Debug, Clone)]
pub struct BreakerRegistry {
    inner: Arc<DashMap<String, Arc<CountBreaker>>>,
    defaults: Option<BreakerConfig>,
}

impl BreakerRegistry {
    /// Create an empty registry. Breakers created on demand use `defaults`;
    /// with `None` only inserted breakers are served.
    pub fn new(defaults: Option<BreakerConfig>) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            defaults: defaults.map(BreakerConfig::normalized),
        }
    }

    /// Build a registry holding every breaker declared in the config file.
    pub fn from_config(config: &BreakerFileConfig) -> Self {
        let registry = Self::new(config.defaults.as_ref().map(|d| d.to_breaker_config()));
        for breaker in &config.breakers {
            registry.insert(&breaker.service, breaker.to_breaker_config());
        }
        tracing::info!(
            breakers = registry.len(),
            on_demand = registry.defaults.is_some(),
            "Breaker registry loaded"
        );
        registry
    }

    pub fn defaults(&self) -> Option<&BreakerConfig> {
        self.defaults.as_ref()
    }

    /// Get the breaker for `service`, if one exists.
    pub fn get(&self, service: &str) -> Option<Arc<CountBreaker>> {
        self.inner.get(service).map(|entry| entry.value().clone())
    }

    /// Get the breaker for `service`, creating it from the defaults if needed.
    pub fn get_or_create(&self, service: &str) -> Result<Arc<CountBreaker>, RegistryError> {
        if let Some(breaker) = self.get(service) {
            return Ok(breaker);
        }
        let Some(defaults) = self.defaults else {
            tracing::warn!(service = %service, "No circuit breaker configured");
            return Err(RegistryError::Unconfigured {
                service: service.to_string(),
            });
        };
        let breaker = self
            .inner
            .entry(service.to_string())
            .or_insert_with(|| Arc::new(CountBreaker::new(service, defaults)))
            .value()
            .clone();
        Ok(breaker)
    }

    /// Install a fresh breaker for `service`, replacing any existing one.
    pub fn insert(&self, service: &str, config: BreakerConfig) -> Arc<CountBreaker> {
        let breaker = Arc::new(CountBreaker::new(service, config));
        if self.inner.insert(service.to_string(), breaker.clone()).is_some() {
            tracing::debug!(service = %service, "Replaced existing circuit breaker");
        }
        breaker
    }

    pub fn remove(&self, service: &str) -> Option<Arc<CountBreaker>> {
        self.inner.remove(service).map(|(_, breaker)| breaker)
    }

    /// Forward to the breaker for `service`, creating it if needed.
    pub fn is_tripped(&self, service: &str) -> Result<(), RegistryError> {
        Ok(self.get_or_create(service)?.is_tripped()?)
    }

    /// Forward to the breaker for `service`, creating it if needed.
    pub fn register(&self, service: &str, outcome: Outcome) -> Result<(), RegistryError> {
        Ok(self.get_or_create(service)?.register(outcome)?)
    }

    /// Snapshots of all breakers, sorted by service name.
    pub fn snapshots(&self) -> Vec<BreakerSnapshot> {
        let mut snapshots: Vec<_> = self
            .inner
            .iter()
            .map(|entry| entry.value().snapshot())
            .collect();
        snapshots.sort_by(|a, b| a.service.cmp(&b.service));
        snapshots
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::resilience::circuit_breaker::BreakerState;

    #[test]
    fn test_get_or_create_is_shared() {
        let registry = BreakerRegistry::new(Some(BreakerConfig::new(0, 0)));
        assert!(registry.get("search").is_none());

        let a = registry.get_or_create("search").unwrap();
        let b = registry.get_or_create("search").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);

        assert!(registry.register("search", Outcome::Anomaly).unwrap_err().is_tripped());
        assert_eq!(a.state(), BreakerState::Tripped);
        assert!(registry.is_tripped("search").is_err());
        assert!(registry.is_tripped("billing").is_ok());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_empty_config_creates_nothing_on_demand() {
        let config = parse_config("").unwrap();
        let registry = BreakerRegistry::from_config(&config);
        assert!(registry.defaults().is_none());

        let err = registry.get_or_create("never-configured").unwrap_err();
        assert_eq!(
            err,
            RegistryError::Unconfigured {
                service: "never-configured".into()
            }
        );
        for _ in 0..10 {
            assert!(matches!(
                registry.register("never-configured", Outcome::Fatal),
                Err(RegistryError::Unconfigured { .. })
            ));
        }
        assert!(registry.is_tripped("never-configured").is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_insert_replaces() {
        let registry = BreakerRegistry::new(None);
        let old = registry.insert("search", BreakerConfig::new(0, 0));
        old.register(Outcome::Fatal).unwrap_err();

        let new = registry.insert("search", BreakerConfig::new(5, 5));
        assert!(!Arc::ptr_eq(&old, &new));
        assert!(registry.is_tripped("search").is_ok());
        assert_eq!(registry.get("search").unwrap().config().max_anomalies, 5);

        assert!(registry.remove("search").is_some());
        assert!(registry.is_empty());
        assert!(registry.get_or_create("search").is_err());
    }

    #[test]
    fn test_snapshots_sorted() {
        let registry = BreakerRegistry::new(Some(BreakerConfig::new(3, 1)));
        for name in ["zeta", "alpha", "mid"] {
            registry.get_or_create(name).unwrap();
        }
        let names: Vec<_> = registry.snapshots().into_iter().map(|s| s.service).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }
}
