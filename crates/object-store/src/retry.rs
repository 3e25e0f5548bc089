//! Retry bound and backoff for replica writes.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// How many times a failed write is retried and how long to wait in between.
///
/// `max_retries` counts attempts *after* the first, so a transfer makes at
/// most `1 + max_retries` writes. Zero means a single attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    /// Draw each delay uniformly from `[delay / 2, delay]`.
    #[serde(default = "default_jitter")]
    pub jitter: bool,
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_ms() -> u64 {
    30_000
}

fn default_jitter() -> bool {
    true
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            jitter: default_jitter(),
        }
    }
}

impl RetryConfig {
    /// Retry `max_retries` times with no delay.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
            jitter: false,
        }
    }

    /// Total number of write attempts allowed.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retry number `retry` (1-based), before jitter.
    pub fn base_delay(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1);
        let delay_ms = self
            .initial_backoff_ms
            .saturating_mul(2u64.saturating_pow(exponent));
        Duration::from_millis(delay_ms.min(self.max_backoff_ms))
    }

    /// Delay to sleep before retry number `retry` (1-based).
    pub fn delay(&self, retry: u32) -> Duration {
        let base = self.base_delay(retry);
        if !self.jitter || base.is_zero() {
            return base;
        }
        let ms = base.as_millis() as u64;
        Duration::from_millis(rand::rng().random_range(ms / 2..=ms))
    }
}
