use notifier::Notifier;
use serde::{Deserialize, Serialize};
use trade::{OrderData, TradeHistoryStats};

/// Periodic status pushed to the observer while the loop is armed.
///
/// Absent prices serialize as `null`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub last_sell_price: Option<f64>,
    pub last_buy_price: Option<f64>,
    pub bearish: bool,
    pub bullish: bool,
}

/// Payload of `buy:settled` / `sell:settled`.
///
/// `stats` is `null` when the statistics fetch failed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SettledReport {
    pub order_data: OrderData,
    pub stats: Option<TradeHistoryStats>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Notification {
    Status(StatusSnapshot),
    BuySettled(SettledReport),
    SellSettled(SettledReport),
    /// Cancellations carry the order data itself, no statistics.
    BuyCancelled(OrderData),
    SellCancelled(OrderData),
}

impl Notification {
    pub fn name(&self) -> &'static str {
        match self {
            Notification::Status(_) => "status",
            Notification::BuySettled(_) => "buy:settled",
            Notification::SellSettled(_) => "sell:settled",
            Notification::BuyCancelled(_) => "buy:cancelled",
            Notification::SellCancelled(_) => "sell:cancelled",
        }
    }

    /// Fire-and-forget delivery; returns whether an observer took it.
    pub fn publish(&self, notifier: &Notifier) -> bool {
        let name = self.name();
        match self {
            Notification::Status(s) => notifier.publish(name, s),
            Notification::BuySettled(r) | Notification::SellSettled(r) => notifier.publish(name, r),
            Notification::BuyCancelled(o) | Notification::SellCancelled(o) => {
                notifier.publish(name, o)
            }
        }
    }
}
