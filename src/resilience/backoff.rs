//! Exponential trip backoff with jitter.

use std::time::Duration;
use rand::Rng;

/// Calculate how long a breaker stays tripped.
///
/// The backoff is drawn uniformly from `[base * 2^k, base * 2^(k+1))` where
/// `k` is the number of trips since the breaker last healed, then capped at
/// `max`.
pub fn trip_backoff(successive_failures: u32, base: Duration, max: Duration) -> Duration {
    trip_backoff_with(&mut rand::thread_rng(), successive_failures, base, max)
}

/// Same as [`trip_backoff`] with an explicit random source.
pub fn trip_backoff_with<R: Rng>(
    rng: &mut R,
    successive_failures: u32,
    base: Duration,
    max: Duration,
) -> Duration {
    // Need room for the doubled upper bound.
    let factor = match 1u32.checked_shl(successive_failures) {
        Some(f) if f <= u32::MAX / 2 => f,
        _ => return max,
    };

    let min_time = base.saturating_mul(factor);
    if min_time >= max {
        return max;
    }
    let max_time = base.saturating_mul(factor * 2);

    let span_nanos = u64::try_from((max_time - min_time).as_nanos()).unwrap_or(u64::MAX);
    let extra = if span_nanos > 0 {
        Duration::from_nanos(rng.gen_range(0..span_nanos))
    } else {
        Duration::ZERO
    };

    (min_time + extra).min(max)
}
