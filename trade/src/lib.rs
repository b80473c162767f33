//! Trade settlement side of the trading loop.
//!
//! [`TradeSettlementSource`] is the seam the controller consumes: a one-shot
//! readiness handshake, a stream of settlement/cancellation events, and an
//! aggregate statistics query. [`PaperTradeManager`] is an in-process
//! implementation backed by a daily ledger.

pub mod error;
pub mod paper;
pub mod types;

pub use error::TradeError;
pub use paper::{ExchangeCredentials, PaperTradeManager};
pub use types::{DailyStats, OrderData, TradeEvent, TradeHistoryStats};

use async_trait::async_trait;
use tokio::sync::mpsc;

/// Source of order settlement events and trade-history statistics.
///
/// Errors are normalized into `anyhow` by the implementation; callers only
/// decide whether to proceed.
#[async_trait]
pub trait TradeSettlementSource: Send + Sync + 'static {
    /// Completes once the source is ready to deliver events.
    async fn init(&self) -> anyhow::Result<()>;

    /// Settlement and cancellation events for every order from now on.
    ///
    /// Each subscriber gets its own unbounded queue: a slow consumer delays
    /// its events but never loses them.
    fn subscribe(&self) -> mpsc::UnboundedReceiver<TradeEvent>;

    /// Aggregate statistics over the trade history.
    async fn trade_history_stats(&self) -> anyhow::Result<TradeHistoryStats>;
}
