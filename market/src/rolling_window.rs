use std::collections::VecDeque;

pub const DEFAULT_MAX_AGE_MS: u64 = 60_000;

/// A timestamped value used inside the rolling window
#[derive(Clone, Debug)]
pub struct TimedValue<T> {
    pub ts_ms: u64,
    pub value: T,
}

/// Time-bounded window of prices with a running sum for O(1) mean().
#[derive(Debug)]
pub struct RollingWindow {
    /// All values in the window (ordered by time)
    values: VecDeque<TimedValue<f64>>,

    /// Sum of every value currently held
    sum: f64,

    /// Maximum age
    max_age_ms: u64,
}

impl Default for RollingWindow {
    fn default() -> Self {
        Self::with_max_age(DEFAULT_MAX_AGE_MS)
    }
}

impl RollingWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_age(max_age_ms: u64) -> Self {
        Self {
            values: VecDeque::new(),
            sum: 0.0,
            max_age_ms,
        }
    }

    pub fn push(&mut self, ts_ms: u64, price: f64) {
        self.values.push_back(TimedValue {
            ts_ms,
            value: price,
        });
        self.sum += price;

        self.evict_old(ts_ms);
    }

    /// Evict values older than max_age
    fn evict_old(&mut self, now_ms: u64) {
        while let Some(front) = self.values.front() {
            if now_ms.saturating_sub(front.ts_ms) > self.max_age_ms {
                self.sum -= front.value;
                self.values.pop_front();
            } else {
                break;
            }
        }

        if self.values.is_empty() {
            self.sum = 0.0;
        }
    }

    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            None
        } else {
            Some(self.sum / self.values.len() as f64)
        }
    }

    pub fn oldest(&self) -> Option<f64> {
        self.values.front().map(|v| v.value)
    }

    /// Span in ms between the oldest and newest sample.
    pub fn age_ms(&self) -> u64 {
        match (self.values.front(), self.values.back()) {
            (Some(first), Some(last)) => last.ts_ms.saturating_sub(first.ts_ms),
            _ => 0,
        }
    }

    /// Enough history to trust derived values.
    pub fn is_warm(&self, min_samples: usize, min_age_ms: u64) -> bool {
        self.values.len() >= min_samples && self.age_ms() >= min_age_ms
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_tracks_pushed_values() {
        let mut w = RollingWindow::with_max_age(10_000);
        w.push(0, 100.0);
        w.push(1_000, 102.0);
        w.push(2_000, 104.0);

        assert_eq!(w.mean(), Some(102.0));
        assert_eq!(w.oldest(), Some(100.0));
    }

    #[test]
    fn old_values_are_evicted_from_mean() {
        let mut w = RollingWindow::with_max_age(1_000);
        w.push(0, 50.0);
        w.push(500, 60.0);
        w.push(2_000, 70.0);

        assert_eq!(w.len(), 1);
        assert_eq!(w.mean(), Some(70.0));
        assert_eq!(w.oldest(), Some(70.0));
    }

    #[test]
    fn warmth_needs_samples_and_age() {
        let mut w = RollingWindow::with_max_age(60_000);
        w.push(0, 1.0);
        w.push(1_000, 1.0);
        assert!(!w.is_warm(3, 0));

        w.push(1_500, 1.0);
        assert!(w.is_warm(3, 1_500));
        assert!(!w.is_warm(3, 2_000));
    }

    #[test]
    fn empty_window_has_no_mean() {
        let w = RollingWindow::new();
        assert!(w.is_empty());
        assert_eq!(w.mean(), None);
        assert_eq!(w.age_ms(), 0);
    }
}
