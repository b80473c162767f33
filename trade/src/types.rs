use chrono::NaiveDate;
use market::Side;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An order as reported back by the exchange once it settles or is cancelled.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderData {
    pub id: Uuid,
    pub side: Side,
    pub price: f64,
    pub size: f64,
    /// Time the exchange finalized the order (ms since epoch)
    pub ts_ms: u64,
}

impl OrderData {
    pub fn new(side: Side, price: f64, size: f64, ts_ms: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            side,
            price,
            size,
            ts_ms,
        }
    }

    /// Quote-currency value of the order.
    pub fn value(&self) -> f64 {
        self.price * self.size
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TradeEvent {
    BuySettled(OrderData),
    SellSettled(OrderData),
    BuyCancelled(OrderData),
    SellCancelled(OrderData),
}

impl TradeEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            TradeEvent::BuySettled(_) => "buy:settled",
            TradeEvent::SellSettled(_) => "sell:settled",
            TradeEvent::BuyCancelled(_) => "buy:cancelled",
            TradeEvent::SellCancelled(_) => "sell:cancelled",
        }
    }

    pub fn order(&self) -> &OrderData {
        match self {
            TradeEvent::BuySettled(o)
            | TradeEvent::SellSettled(o)
            | TradeEvent::BuyCancelled(o)
            | TradeEvent::SellCancelled(o) => o,
        }
    }
}

/// Totals for a single UTC day.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DailyStats {
    pub day: NaiveDate,
    pub total_buy_value: f64,
    pub total_sell_value: f64,
    pub buy_count: u64,
    pub sell_count: u64,
}

impl DailyStats {
    pub fn empty(day: NaiveDate) -> Self {
        Self {
            day,
            total_buy_value: 0.0,
            total_sell_value: 0.0,
            buy_count: 0,
            sell_count: 0,
        }
    }

    pub fn record(&mut self, order: &OrderData) {
        match order.side {
            Side::Buy => {
                self.total_buy_value += order.value();
                self.buy_count += 1;
            }
            Side::Sell => {
                self.total_sell_value += order.value();
                self.sell_count += 1;
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TradeHistoryStats {
    pub daily_stats: DailyStats,
}
