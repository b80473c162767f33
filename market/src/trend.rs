use parking_lot::Mutex;

use crate::TrendSignal;
use crate::rolling_window::RollingWindow;

/// Trend analysis
///
/// Measures **price directionality over time**: the latest match price is
/// compared with the OLDEST price still inside the rolling window.
///
/// - change ≤ -threshold → bearish
/// - change ≥ +threshold → bullish
/// - not warm, or in between → neither
#[derive(Clone, Copy, Debug)]
pub struct TrendConfig {
    pub window_ms: u64,
    pub min_samples: usize,
    pub min_age_ms: u64,
    pub threshold_bps: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            window_ms: 300_000,
            min_samples: 5,
            min_age_ms: 30_000,
            threshold_bps: 25.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrendReading {
    /// Current price.
    pub p_now: f64,

    /// Oldest price in the rolling window.
    pub p_oldest: f64,

    /// Signed price movement in basis points (negative = falling).
    pub change_bps: f64,

    /// False while warming up; such readings never raise a flag.
    pub valid: bool,
}

impl Default for TrendReading {
    fn default() -> Self {
        Self {
            p_now: 0.0,
            p_oldest: 0.0,
            change_bps: 0.0,
            valid: false,
        }
    }
}

impl TrendReading {
    pub fn is_bearish(&self, threshold_bps: f64) -> bool {
        self.valid && self.change_bps <= -threshold_bps
    }

    pub fn is_bullish(&self, threshold_bps: f64) -> bool {
        self.valid && self.change_bps >= threshold_bps
    }
}

struct TrendState {
    window: RollingWindow,
    reading: TrendReading,
}

/// Trend signal provider fed from the match stream.
pub struct TrendAnalyzer {
    config: TrendConfig,
    state: Mutex<TrendState>,
}

impl TrendAnalyzer {
    pub fn new(config: TrendConfig) -> Self {
        Self {
            config,
            state: Mutex::new(TrendState {
                window: RollingWindow::with_max_age(config.window_ms),
                reading: TrendReading::default(),
            }),
        }
    }

    /// Records a price and returns the refreshed reading.
    pub fn observe(&self, ts_ms: u64, price: f64) -> TrendReading {
        let mut state = self.state.lock();
        let reading = compute_trend(ts_ms, price, &mut state.window, &self.config);
        state.reading = reading;
        reading
    }

    pub fn reading(&self) -> TrendReading {
        self.state.lock().reading
    }
}

impl TrendSignal for TrendAnalyzer {
    fn is_bearish(&self) -> bool {
        self.reading().is_bearish(self.config.threshold_bps)
    }

    fn is_bullish(&self) -> bool {
        self.reading().is_bullish(self.config.threshold_bps)
    }
}

/// Core trend computation.
///
/// Non-positive prices and an unwarmed window both produce an invalid reading.
fn compute_trend(
    ts_ms: u64,
    p_now: f64,
    window: &mut RollingWindow,
    config: &TrendConfig,
) -> TrendReading {
    if p_now <= 0.0 || !p_now.is_finite() {
        return TrendReading::default();
    }

    window.push(ts_ms, p_now);

    if !window.is_warm(config.min_samples, config.min_age_ms) {
        return TrendReading {
            p_now,
            p_oldest: p_now,
            change_bps: 0.0,
            valid: false,
        };
    }

    let p_oldest = window.oldest().unwrap_or(p_now);
    let change_bps = ((p_now - p_oldest) / p_oldest) * 10_000.0;

    TrendReading {
        p_now,
        p_oldest,
        change_bps,
        valid: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> u64 {
        n * 1000
    }

    fn config() -> TrendConfig {
        TrendConfig {
            window_ms: 60_000,
            min_samples: 3,
            min_age_ms: 2_000,
            threshold_bps: 25.0,
        }
    }

    #[test]
    fn invalid_when_price_not_positive() {
        let mut w = RollingWindow::new();

        let r = compute_trend(ms(0), 0.0, &mut w, &config());
        assert!(!r.valid);
        assert!(w.is_empty());
    }

    #[test]
    fn warmup_blocks_early_signals() {
        let t = TrendAnalyzer::new(config());

        t.observe(ms(0), 100.0);
        t.observe(ms(1), 90.0);

        assert!(!t.reading().valid);
        assert!(!t.is_bearish());
        assert!(!t.is_bullish());
    }

    #[test]
    fn detects_downward_trend() {
        let t = TrendAnalyzer::new(config());

        t.observe(ms(0), 100.0);
        t.observe(ms(1), 99.0);
        let r = t.observe(ms(2), 98.0);

        assert!(r.valid);
        assert!((r.change_bps + 200.0).abs() < 1e-9);
        assert!(t.is_bearish());
        assert!(!t.is_bullish());
    }

    #[test]
    fn detects_upward_trend() {
        let t = TrendAnalyzer::new(config());

        t.observe(ms(0), 100.0);
        t.observe(ms(1), 101.0);
        t.observe(ms(2), 102.0);

        assert!(t.is_bullish());
        assert!(!t.is_bearish());
    }

    #[test]
    fn small_moves_stay_neutral() {
        let t = TrendAnalyzer::new(config());

        t.observe(ms(0), 100.0);
        t.observe(ms(1), 100.1);
        t.observe(ms(2), 100.2);

        assert!(t.reading().valid);
        assert!(!t.is_bearish());
        assert!(!t.is_bullish());
    }

    #[test]
    fn uses_oldest_price_not_latest_spike() {
        let t = TrendAnalyzer::new(config());

        t.observe(ms(0), 100.0); // oldest
        t.observe(ms(1), 120.0); // spike
        let r = t.observe(ms(2), 110.0);

        assert_eq!(r.p_oldest, 100.0);
        assert!(r.change_bps > 0.0);
    }
}
