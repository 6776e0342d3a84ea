//! Randomized pacing between page interactions
//!
//! Search and posting pages sit behind request-rate defenses, so every page
//! load, reload and tab switch is followed by a pause drawn uniformly from a
//! configured range.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::trace;

/// Inclusive range of pause lengths in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// No pause at all
    pub const fn none() -> Self {
        Self::new(0, 0)
    }

    /// Draw a pause length from the range
    pub fn sample(&self) -> Duration {
        if self.max_ms <= self.min_ms {
            return Duration::from_millis(self.min_ms);
        }
        Duration::from_millis(rand::thread_rng().gen_range(self.min_ms..=self.max_ms))
    }

    /// Sleep for a randomly drawn duration
    pub async fn pause(&self) {
        let wait = self.sample();
        if wait.is_zero() {
            return;
        }
        trace!("Pacing: waiting {:?}", wait);
        tokio::time::sleep(wait).await;
    }
}
