//! Trading loop controller.
//!
//! Owns the arm/disarm state machine and the single periodic timer that
//! evaluates market state. Collaborators are injected through the
//! `market` and `trade` traits; status goes out through a
//! [`notifier::Notifier`].
//!
//! ```text
//!  OrderBookSource ──updates──┐
//!                             v
//!  TradeSettlementSource ──> TradingLoopController ──> Notifier
//!        (events, stats)      │  ^
//!                             └──┘ 1s timer while Armed
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod notification;
pub mod state;

pub use config::ControllerConfig;
pub use controller::TradingLoopController;
pub use error::ControllerError;
pub use notification::{Notification, SettledReport, StatusSnapshot};
pub use state::LoopState;
