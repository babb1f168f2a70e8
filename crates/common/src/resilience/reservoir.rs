//! Bounded uniform sampling for latency statistics
//!
//! [`Reservoir`] keeps at most `capacity` values out of an unbounded stream
//! using Algorithm R: the first `capacity` values are stored directly, and the
//! n-th value after that replaces a random slot with probability
//! `capacity / n`. Every value seen has the same chance of being retained.
//!
//! Percentiles use the nearest-rank-floor rule: sort ascending and take index
//! `floor(len * pct)` clamped to `len - 1`.

use rand::Rng;

/// Default number of samples kept per reservoir
pub const DEFAULT_RESERVOIR_CAPACITY: usize = 1000;

/// Percentile of `values` using the nearest-rank-floor rule.
///
/// Returns `None` for an empty slice. `pct` is a fraction in `[0, 1]`.
pub fn percentile(values: &[f64], pct: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let index = ((sorted.len() as f64 * pct) as usize).min(sorted.len() - 1);
    Some(sorted[index])
}

/// Fixed-capacity uniform sample of an unbounded stream
#[derive(Debug, Clone)]
pub struct Reservoir {
    samples: Vec<f64>,
    seen: u64,
    capacity: usize,
}

impl Reservoir {
    /// Create an empty reservoir; a zero capacity is raised to one
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { samples: Vec::with_capacity(capacity.min(DEFAULT_RESERVOIR_CAPACITY)), seen: 0, capacity }
    }

    /// Offer a value to the reservoir
    pub fn offer<R: Rng + ?Sized>(&mut self, value: f64, rng: &mut R) {
        self.seen += 1;

        if self.samples.len() < self.capacity {
            self.samples.push(value);
            return;
        }

        let slot = rng.gen_range(0..self.seen);
        if let Ok(slot) = usize::try_from(slot) {
            if slot < self.capacity {
                self.samples[slot] = value;
            }
        }
    }

    /// Number of values currently retained
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no value has been retained yet
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Total number of values offered so far
    pub fn seen(&self) -> u64 {
        self.seen
    }

    /// Maximum number of retained values
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Retained values in slot order
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Arithmetic mean of the retained values
    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().sum::<f64>() / self.samples.len() as f64)
    }

    /// Percentile of the retained values
    pub fn percentile(&self, pct: f64) -> Option<f64> {
        percentile(&self.samples, pct)
    }

    /// Drop all samples and reset the seen counter
    pub fn clear(&mut self) {
        self.samples.clear();
        self.seen = 0;
    }
}

impl Default for Reservoir {
    fn default() -> Self {
        Self::new(DEFAULT_RESERVOIR_CAPACITY)
    }
}
