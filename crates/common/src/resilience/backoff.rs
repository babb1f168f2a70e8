//! Backoff strategies and sleep primitives for retry loops
//!
//! The retry loop decides *how long* to wait through [`BackoffStrategy`] and
//! *how* to wait through [`Sleeper`]. Blocking callers use
//! [`Sleeper::sleep`]; async callers use [`Sleeper::sleep_async`]. Keeping
//! both on one trait lets a client carry a single sleeper regardless of the
//! scheduling model it runs under.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

/// Upper bound applied to exponential delays
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(3600);

/// Backoff strategy for calculating retry delays
#[derive(Debug, Clone, PartialEq)]
pub enum BackoffStrategy {
    /// Fixed delay between retries
    Fixed(Duration),
    /// Exponential backoff: initial_delay * base^attempt, capped at max_delay
    Exponential { initial_delay: Duration, base: f64, max_delay: Duration },
}

impl BackoffStrategy {
    /// Whole-second exponential backoff: `factor^attempt` seconds.
    ///
    /// With `factor = 2` the delays for attempts 0, 1, 2 are 1s, 2s, 4s.
    pub fn exponential_seconds(factor: u32) -> Self {
        BackoffStrategy::Exponential {
            initial_delay: Duration::from_secs(1),
            base: f64::from(factor),
            max_delay: DEFAULT_MAX_BACKOFF,
        }
    }

    /// Calculate the delay for the given 0-based attempt index
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        match self {
            BackoffStrategy::Fixed(delay) => *delay,
            BackoffStrategy::Exponential { initial_delay, base, max_delay } => {
                let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
                let delay = initial_delay.as_millis() as f64 * base.powi(exponent);
                let delay_ms = delay.min(max_delay.as_millis() as f64) as u64;
                Duration::from_millis(delay_ms)
            }
        }
    }
}

/// Waiting primitive used between retry attempts
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Block the current thread for `delay`
    fn sleep(&self, delay: Duration);

    /// Suspend the current task for `delay` without blocking the executor
    async fn sleep_async(&self, delay: Duration);
}

/// Production sleeper: `std::thread::sleep` and `tokio::time::sleep`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemSleeper;

#[async_trait]
impl Sleeper for SystemSleeper {
    fn sleep(&self, delay: Duration) {
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }

    async fn sleep_async(&self, delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Test sleeper that records requested delays and returns immediately
///
/// Clones share the same recording, so a test can keep one handle and pass
/// another into the component under test.
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
    delays: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays requested so far, in call order
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().map(|d| d.clone()).unwrap_or_default()
    }

    fn push(&self, delay: Duration) {
        let mut delays = self.delays.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        delays.push(delay);
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    fn sleep(&self, delay: Duration) {
        self.push(delay);
    }

    async fn sleep_async(&self, delay: Duration) {
        self.push(delay);
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for backoff strategies and sleepers

    use super::*;

    /// Validates `BackoffStrategy::Fixed` behavior.
    ///
    /// Assertions:
    /// - Confirms the delay is identical for every attempt.
    #[test]
    fn test_backoff_strategy_fixed() {
        let strategy = BackoffStrategy::Fixed(Duration::from_millis(100));

        assert_eq!(strategy.calculate_delay(0), Duration::from_millis(100));
        assert_eq!(strategy.calculate_delay(5), Duration::from_millis(100));
    }

    /// Validates `BackoffStrategy::exponential_seconds` for factor 2.
    ///
    /// Assertions:
    /// - Confirms attempts 0, 1, 2 map to 1s, 2s, 4s.
    #[test]
    fn test_exponential_seconds_factor_two() {
        let strategy = BackoffStrategy::exponential_seconds(2);

        assert_eq!(strategy.calculate_delay(0), Duration::from_secs(1));
        assert_eq!(strategy.calculate_delay(1), Duration::from_secs(2));
        assert_eq!(strategy.calculate_delay(2), Duration::from_secs(4));
    }

    /// Validates `BackoffStrategy::exponential_seconds` for factor 1.
    ///
    /// Assertions:
    /// - Confirms every attempt waits exactly one second.
    #[test]
    fn test_exponential_seconds_factor_one_is_constant() {
        let strategy = BackoffStrategy::exponential_seconds(1);

        for attempt in 0..5 {
            assert_eq!(strategy.calculate_delay(attempt), Duration::from_secs(1));
        }
    }

    /// Validates the exponential cap.
    ///
    /// Assertions:
    /// - Ensures very large attempts never exceed `DEFAULT_MAX_BACKOFF`.
    #[test]
    fn test_exponential_caps_at_max_delay() {
        let strategy = BackoffStrategy::exponential_seconds(2);

        assert_eq!(strategy.calculate_delay(40), DEFAULT_MAX_BACKOFF);
        assert_eq!(strategy.calculate_delay(u32::MAX), DEFAULT_MAX_BACKOFF);
    }

    #[test]
    fn test_recording_sleeper_shares_recording_between_clones() {
        let sleeper = RecordingSleeper::new();
        let handle = sleeper.clone();

        sleeper.sleep(Duration::from_secs(1));
        sleeper.sleep(Duration::from_secs(2));

        assert_eq!(handle.delays(), vec![Duration::from_secs(1), Duration::from_secs(2)]);
    }

    #[tokio::test]
    async fn test_recording_sleeper_async_does_not_wait() {
        let sleeper = RecordingSleeper::new();
        let started = std::time::Instant::now();

        sleeper.sleep_async(Duration::from_secs(30)).await;

        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(sleeper.delays(), vec![Duration::from_secs(30)]);
    }

    #[tokio::test]
    async fn test_system_sleeper_skips_zero_delay() {
        let started = std::time::Instant::now();
        SystemSleeper.sleep_async(Duration::ZERO).await;
        SystemSleeper.sleep(Duration::ZERO);
        assert!(started.elapsed() < Duration::from_millis(100));
    }
}
