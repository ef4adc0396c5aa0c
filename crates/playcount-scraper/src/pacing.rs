//! Randomized throttling between targets and between engine attempts.
//!
//! The jitter keeps automated traffic from forming a regular rhythm; it is a
//! throttling control only and never affects results.

use std::time::Duration;

use rand::Rng;

/// Sleeps for a uniformly random duration within `[min_ms, max_ms]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacer {
    min_ms: u64,
    max_ms: u64,
}

impl Pacer {
    /// Creates a pacer; bounds are swapped if given in the wrong order.
    #[must_use]
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min_ms: min_ms.min(max_ms),
            max_ms: max_ms.max(min_ms),
        }
    }

    /// A pacer that never sleeps.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(0, 0)
    }

    #[must_use]
    pub fn next_delay(&self) -> Duration {
        if self.max_ms == 0 {
            return Duration::ZERO;
        }
        let ms = rand::rng().random_range(self.min_ms..=self.max_ms);
        Duration::from_millis(ms)
    }

    pub async fn pause(&self) {
        let delay = self.next_delay();
        if delay.is_zero() {
            return;
        }
        tracing::trace!(delay_ms = delay.as_millis(), "pacing pause");
        tokio::time::sleep(delay).await;
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new(1_200, 2_000)
    }
}
