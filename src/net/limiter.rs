//! Global pacing for external calls.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::core::constants::MIN_REQUEST_DELAY;

/// Enforces a minimum delay between successive external calls. One
/// instance is shared (via `Arc`) by the geocoder and the feature fetcher
/// across every worker, so the upstream services see at most one request
/// per delay window regardless of job concurrency.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    min_delay: Duration,
    last_call: Arc<Mutex<Option<Instant>>>,
}

impl RateLimiter {
    pub fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            last_call: Arc::new(Mutex::new(None)),
        }
    }

    /// Blocks until at least `min_delay` has passed since the previous
    /// permit, then records this call. Callers invoke this immediately
    /// before each external request.
    pub fn acquire(&self) {
        // Hold the lock across the sleep: a second caller must queue
        // behind us, otherwise both would leave within one window.
        let mut last = match self.last_call.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_delay {
                std::thread::sleep(self.min_delay - elapsed);
            }
        }
        *last = Some(Instant::now());
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(MIN_REQUEST_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_acquire_is_immediate() {
        let limiter = RateLimiter::new(Duration::from_secs(5));
        let start = Instant::now();
        limiter.acquire();
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn test_second_acquire_waits_out_the_window() {
        let limiter = RateLimiter::new(Duration::from_millis(80));
        limiter.acquire();
        let start = Instant::now();
        limiter.acquire();
        assert!(start.elapsed() >= Duration::from_millis(80));
    }

    #[test]
    fn test_clones_share_the_window() {
        let limiter = RateLimiter::new(Duration::from_millis(80));
        let clone = limiter.clone();
        limiter.acquire();
        let start = Instant::now();
        clone.acquire();
        assert!(start.elapsed() >= Duration::from_millis(80));
    }
}
