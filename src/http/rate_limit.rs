//! Per-target request pacing
//!
//! Uses a keyed governor limiter with a burst of one, so consecutive
//! requests to the same target are spaced by at least the configured
//! interval. Different targets do not delay each other.

use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::sync::Arc;
use std::time::Duration;

/// Minimum-interval pacer keyed by target name
#[derive(Clone, Default)]
pub struct Pacer {
    limiter: Option<Arc<DefaultKeyedRateLimiter<String>>>,
    interval: Option<Duration>,
}

impl Pacer {
    /// Create a pacer; `None` or a zero interval disables pacing
    pub fn new(interval: Option<Duration>) -> Self {
        let Some(quota) = interval.and_then(Quota::with_period) else {
            return Self::disabled();
        };

        Self {
            limiter: Some(Arc::new(RateLimiter::keyed(quota))),
            interval,
        }
    }

    /// A pacer that never waits
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Check if pacing is active
    pub fn is_enabled(&self) -> bool {
        self.limiter.is_some()
    }

    /// Configured interval
    pub fn interval(&self) -> Option<Duration> {
        self.interval.filter(|_| self.is_enabled())
    }

    /// Wait until a request to `target` may be sent
    pub async fn wait(&self, target: &str) {
        if let Some(ref limiter) = self.limiter {
            limiter.until_key_ready(&target.to_string()).await;
        }
    }

    /// Take a slot for `target` without waiting; false if it is too soon
    pub fn try_acquire(&self, target: &str) -> bool {
        match self.limiter {
            Some(ref limiter) => limiter.check_key(&target.to_string()).is_ok(),
            None => true,
        }
    }
}

impl std::fmt::Debug for Pacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pacer")
            .field("interval", &self.interval())
            .finish()
    }
}
