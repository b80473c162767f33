//! OrderBook
//!
//! Maintains the latest traded price per side and short/long moving
//! averages of match prices. Once both averages are warm, every applied
//! match is announced to subscribers as a [`BookUpdate`].
//!
//! State lives behind a short synchronous lock; readers never observe a
//! half-applied match.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::OrderBookSource;
use crate::rolling_window::RollingWindow;
use crate::trend::{TrendAnalyzer, TrendConfig};
use crate::types::{BookUpdate, Match, MovingAverages, Side};

/// Capacity of the update broadcast; lagging subscribers only lose history.
const UPDATE_CHANNEL_CAPACITY: usize = 64;

#[derive(Clone, Copy, Debug)]
pub struct BookConfig {
    /// Horizon of the short moving average.
    pub short_window_ms: u64,

    /// Horizon of the long moving average.
    pub long_window_ms: u64,

    /// Samples each window needs before updates are published.
    pub min_samples: usize,

    pub trend: TrendConfig,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            short_window_ms: 60_000,
            long_window_ms: 300_000,
            min_samples: 3,
            trend: TrendConfig::default(),
        }
    }
}

#[derive(Default)]
struct BookState {
    last_buy_price: Option<f64>,
    last_sell_price: Option<f64>,
    short: RollingWindow,
    long: RollingWindow,
    matches_seen: u64,
}

pub struct OrderBook {
    config: BookConfig,
    state: Mutex<BookState>,
    trend: Arc<TrendAnalyzer>,
    updates_tx: broadcast::Sender<BookUpdate>,
}

impl OrderBook {
    pub fn new(config: BookConfig) -> Arc<Self> {
        let (updates_tx, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);

        Arc::new(Self {
            config,
            state: Mutex::new(BookState {
                short: RollingWindow::with_max_age(config.short_window_ms),
                long: RollingWindow::with_max_age(config.long_window_ms),
                ..BookState::default()
            }),
            trend: Arc::new(TrendAnalyzer::new(config.trend)),
            updates_tx,
        })
    }

    /// Trend provider fed by this book's matches.
    pub fn trend(&self) -> Arc<TrendAnalyzer> {
        Arc::clone(&self.trend)
    }

    /// Applies one match; returns the update that was broadcast, if any.
    ///
    /// Matches with a non-positive or non-finite price are dropped.
    pub fn apply_match(&self, m: &Match) -> Option<BookUpdate> {
        if m.price <= 0.0 || !m.price.is_finite() {
            warn!(price = m.price, side = %m.side, "dropping match with invalid price");
            return None;
        }

        let update = {
            let mut state = self.state.lock();
            match m.side {
                Side::Buy => state.last_buy_price = Some(m.price),
                Side::Sell => state.last_sell_price = Some(m.price),
            }
            state.matches_seen += 1;
            state.short.push(m.ts_ms, m.price);
            state.long.push(m.ts_ms, m.price);

            let warm = state.short.len() >= self.config.min_samples
                && state.long.len() >= self.config.min_samples;

            match (warm, state.short.mean(), state.long.mean()) {
                (true, Some(short), Some(long)) => Some(BookUpdate {
                    ts_ms: m.ts_ms,
                    moving_averages: MovingAverages { short, long },
                }),
                _ => None,
            }
        };

        self.trend.observe(m.ts_ms, m.price);

        let update = update?;
        debug!(
            short = update.moving_averages.short,
            long = update.moving_averages.long,
            "moving averages updated"
        );
        // No receivers is fine: nobody has subscribed yet.
        let _ = self.updates_tx.send(update.clone());
        Some(update)
    }

    pub fn matches_seen(&self) -> u64 {
        self.state.lock().matches_seen
    }
}

impl OrderBookSource for OrderBook {
    fn subscribe_updates(&self) -> broadcast::Receiver<BookUpdate> {
        self.updates_tx.subscribe()
    }

    fn last_buy_price(&self) -> Option<f64> {
        self.state.lock().last_buy_price
    }

    fn last_sell_price(&self) -> Option<f64> {
        self.state.lock().last_sell_price
    }
}
