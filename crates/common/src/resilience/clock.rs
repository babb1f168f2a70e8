//! Time abstraction for testability
//!
//! Latency measurement needs a monotonic clock; journal timestamps and
//! response file names need wall-clock time. Both come from one [`Clock`]
//! so a test can drive them together with a [`MockClock`].

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

/// Trait for time operations to enable deterministic testing
pub trait Clock: Send + Sync + 'static {
    /// Get current instant (monotonic time)
    fn now(&self) -> Instant;

    /// Get current wall-clock time in UTC
    fn utc_now(&self) -> DateTime<Utc>;

    /// Milliseconds elapsed since `start`, as a float
    fn millis_since(&self, start: Instant) -> f64 {
        self.now().saturating_duration_since(start).as_secs_f64() * 1000.0
    }
}

/// Real system clock implementation for production use
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<T: Clock> Clock for Arc<T> {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        (**self).utc_now()
    }
}

/// Mock clock for deterministic testing
///
/// Both the monotonic and the wall-clock reading move only when the test
/// calls [`MockClock::advance`] or [`MockClock::set_elapsed`]. Clones share
/// the same elapsed time.
#[derive(Debug, Clone)]
pub struct MockClock {
    start: Instant,
    start_utc: DateTime<Utc>,
    elapsed: Arc<Mutex<Duration>>,
}

impl MockClock {
    /// Create a mock clock whose wall-clock reading starts at the Unix epoch
    pub fn new() -> Self {
        Self::starting_at(DateTime::<Utc>::UNIX_EPOCH)
    }

    /// Create a mock clock whose wall-clock reading starts at `start_utc`
    pub fn starting_at(start_utc: DateTime<Utc>) -> Self {
        Self { start: Instant::now(), start_utc, elapsed: Arc::new(Mutex::new(Duration::ZERO)) }
    }

    /// Advance the mock clock by a duration
    pub fn advance(&self, duration: Duration) {
        let mut elapsed = self.elapsed.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *elapsed += duration;
    }

    /// Advance the mock clock by milliseconds (convenience method)
    pub fn advance_millis(&self, millis: u64) {
        self.advance(Duration::from_millis(millis));
    }

    /// Set the mock clock to a specific elapsed time
    pub fn set_elapsed(&self, duration: Duration) {
        let mut elapsed = self.elapsed.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *elapsed = duration;
    }

    /// Get the current elapsed time
    pub fn elapsed(&self) -> Duration {
        self.elapsed.lock().map(|e| *e).unwrap_or(Duration::ZERO)
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.start + self.elapsed()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        let elapsed = chrono::Duration::from_std(self.elapsed()).unwrap_or(chrono::Duration::zero());
        self.start_utc + elapsed
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    /// Validates `SystemClock` monotonicity.
    ///
    /// Assertions:
    /// - Ensures a later reading is never earlier than a previous one.
    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock;
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }

    /// Validates `MockClock::advance` behavior.
    ///
    /// Assertions:
    /// - Confirms the monotonic and wall-clock readings move together.
    #[test]
    fn test_mock_clock_advance_moves_both_readings() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let clock = MockClock::starting_at(start);
        let t0 = clock.now();

        clock.advance_millis(1500);

        assert_eq!(clock.now() - t0, Duration::from_millis(1500));
        assert_eq!(clock.utc_now(), start + chrono::Duration::milliseconds(1500));
    }

    #[test]
    fn test_mock_clock_set_elapsed_and_clone_share_state() {
        let clock = MockClock::new();
        let shared = clock.clone();

        clock.set_elapsed(Duration::from_secs(10));

        assert_eq!(shared.elapsed(), Duration::from_secs(10));
        assert_eq!(shared.utc_now().timestamp(), 10);
    }

    #[test]
    fn test_millis_since_reports_fractional_milliseconds() {
        let clock = MockClock::new();
        let start = clock.now();
        clock.advance(Duration::from_micros(2500));
        assert!((clock.millis_since(start) - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_arc_clock_delegates() {
        let clock = Arc::new(MockClock::new());
        clock.advance_millis(5);
        assert_eq!(Clock::utc_now(&clock).timestamp_millis(), 5);
    }
}
