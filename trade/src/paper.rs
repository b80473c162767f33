//! In-process trade settlement source.
//!
//! Orders are settled or cancelled by the caller (a strategy, a test, a
//! replay tool). Each call broadcasts the matching [`TradeEvent`] and
//! settlements are booked into a per-UTC-day ledger.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use market::Side;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument};

use crate::TradeSettlementSource;
use crate::error::TradeError;
use crate::types::{DailyStats, OrderData, TradeEvent, TradeHistoryStats};
use common::time::{now_ms, utc_day};

/// Credentials handed to the exchange integration.
#[derive(Clone, Default)]
pub struct ExchangeCredentials {
    pub api_key: String,
    pub api_secret: String,
    pub passphrase: String,
}

impl std::fmt::Debug for ExchangeCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeCredentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("passphrase", &"<redacted>")
            .finish()
    }
}

impl ExchangeCredentials {
    fn validate(&self) -> Result<(), TradeError> {
        if self.api_key.trim().is_empty() {
            return Err(TradeError::MissingCredentials("api_key"));
        }
        if self.api_secret.trim().is_empty() {
            return Err(TradeError::MissingCredentials("api_secret"));
        }
        Ok(())
    }
}

pub struct PaperTradeManager {
    credentials: ExchangeCredentials,
    initialized: AtomicBool,
    ledger: Mutex<HashMap<NaiveDate, DailyStats>>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<TradeEvent>>>,
}

impl PaperTradeManager {
    pub fn new(credentials: ExchangeCredentials) -> Self {
        Self {
            credentials,
            initialized: AtomicBool::new(false),
            ledger: Mutex::new(HashMap::new()),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Books a filled order and announces `buy:settled` / `sell:settled`.
    #[instrument(skip(self, order), fields(order_id = %order.id, side = %order.side))]
    pub fn settle(&self, order: OrderData) -> Result<(), TradeError> {
        self.ensure_ready()?;
        validate_order(&order)?;

        {
            let day = utc_day(order.ts_ms);
            let mut ledger = self.ledger.lock();
            ledger
                .entry(day)
                .or_insert_with(|| DailyStats::empty(day))
                .record(&order);
        }

        info!(price = order.price, size = order.size, "order settled");
        let event = match order.side {
            Side::Buy => TradeEvent::BuySettled(order),
            Side::Sell => TradeEvent::SellSettled(order),
        };
        self.publish(event);
        Ok(())
    }

    /// Announces `buy:cancelled` / `sell:cancelled`; nothing is booked.
    #[instrument(skip(self, order), fields(order_id = %order.id, side = %order.side))]
    pub fn cancel(&self, order: OrderData) -> Result<(), TradeError> {
        self.ensure_ready()?;

        info!("order cancelled");
        let event = match order.side {
            Side::Buy => TradeEvent::BuyCancelled(order),
            Side::Sell => TradeEvent::SellCancelled(order),
        };
        self.publish(event);
        Ok(())
    }

    /// Statistics for the UTC day containing `ts_ms`.
    pub fn stats_for(&self, ts_ms: u64) -> TradeHistoryStats {
        let day = utc_day(ts_ms);
        let daily_stats = self
            .ledger
            .lock()
            .get(&day)
            .cloned()
            .unwrap_or_else(|| DailyStats::empty(day));

        TradeHistoryStats { daily_stats }
    }

    fn ensure_ready(&self) -> Result<(), TradeError> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(TradeError::NotInitialized)
        }
    }

    /// Delivers `event` to every live subscriber, forgetting closed ones.
    fn publish(&self, event: TradeEvent) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        if subscribers.is_empty() {
            debug!(event = event.name(), "no trade event subscribers");
        }
    }
}

fn validate_order(order: &OrderData) -> Result<(), TradeError> {
    let reason = if order.price <= 0.0 || !order.price.is_finite() {
        "price must be positive"
    } else if order.size <= 0.0 || !order.size.is_finite() {
        "size must be positive"
    } else {
        return Ok(());
    };

    Err(TradeError::InvalidOrder {
        id: order.id,
        reason: reason.to_string(),
    })
}

#[async_trait]
impl TradeSettlementSource for PaperTradeManager {
    async fn init(&self) -> anyhow::Result<()> {
        self.credentials.validate()?;
        self.initialized.store(true, Ordering::SeqCst);
        info!(api_key = %self.credentials.api_key, "paper trade manager ready");
        Ok(())
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<TradeEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push(tx);
        rx
    }

    async fn trade_history_stats(&self) -> anyhow::Result<TradeHistoryStats> {
        self.ensure_ready()?;
        Ok(self.stats_for(now_ms()))
    }
}
