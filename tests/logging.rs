//! Global subscriber installation. Kept in its own test binary because the
//! subscriber is process-wide.

use count_breaker::config::ObservabilityConfig;
use count_breaker::observability::logging::init_logging;

#[test]
fn test_second_init_is_noop() {
    let config = ObservabilityConfig::default();
    assert!(init_logging(&config));
    assert!(!init_logging(&config));
    tracing::info!("still logging after a rejected init");
}
