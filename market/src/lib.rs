//! Market-side collaborators of the trading loop.
//!
//! - [`OrderBook`] tracks last traded prices per side and moving averages,
//!   and announces a [`BookUpdate`] whenever the averages are meaningful.
//! - [`TrendAnalyzer`] derives the bearish/bullish signal from the same
//!   match stream.
//! - [`feed`] pulls matches off a WebSocket and applies them to the book.
//!
//! The controller only ever sees these through [`OrderBookSource`] and
//! [`TrendSignal`].

pub mod error;
pub mod feed;
pub mod order_book;
pub mod rolling_window;
pub mod trend;
pub mod types;

pub use error::FeedError;
pub use order_book::{BookConfig, OrderBook};
pub use trend::{TrendAnalyzer, TrendConfig, TrendReading};
pub use types::{BookUpdate, Match, MovingAverages, Side};

use tokio::sync::broadcast;

/// Read side of an order book, as consumed by the trading loop.
pub trait OrderBookSource: Send + Sync + 'static {
    /// Notifications fired every time the book produces a derived update.
    fn subscribe_updates(&self) -> broadcast::Receiver<BookUpdate>;

    /// Price of the most recent buy-side match, if any has occurred.
    fn last_buy_price(&self) -> Option<f64>;

    /// Price of the most recent sell-side match, if any has occurred.
    fn last_sell_price(&self) -> Option<f64>;
}

/// Market direction flags read synchronously at tick time.
pub trait TrendSignal: Send + Sync + 'static {
    fn is_bearish(&self) -> bool;
    fn is_bullish(&self) -> bool;
}
