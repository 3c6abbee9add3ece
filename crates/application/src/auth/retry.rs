//! Retry policy for token requests.

use std::time::Duration;

use rand::Rng;

/// Bounded exponential backoff with symmetric jitter.
///
/// The delay before retry `n` (0-based) is `base_delay * 2^n`, shifted by a
/// uniformly random amount of up to `jitter_ratio` of that value in either
/// direction, and never negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry, before jitter.
    pub base_delay: Duration,
    /// Jitter as a fraction of the un-jittered delay.
    pub jitter_ratio: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            jitter_ratio: 0.25,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub fn no_retries() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Sets the number of retries.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Total attempts including the first one.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retrying after failed attempt `attempt` (0-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let unit = rand::rng().random_range(-1.0..=1.0);
        self.delay_with_jitter(attempt, unit)
    }

    /// Deterministic form of [`delay_for`](Self::delay_for); `unit` in `[-1, 1]`
    /// selects where in the jitter band the delay lands.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn delay_with_jitter(&self, attempt: u32, unit: f64) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let base_ms = self.base_delay.as_millis() as f64 * 2f64.powi(exponent);
        let jitter_ms = base_ms * self.jitter_ratio * unit.clamp(-1.0, 1.0);
        Duration::from_millis((base_ms + jitter_ms).max(0.0) as u64)
    }
}
