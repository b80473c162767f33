//! TradingLoopController
//!
//! Responsibilities:
//!   • Hold the loop state (Unarmed/Armed) and the single periodic timer.
//!   • Turn settlement/cancellation events into re-arms.
//!   • On every tick, read prices and trend and publish a `status` snapshot.
//!
//! Non-responsibilities:
//!   • Order submission. The caller submitting orders brackets it with
//!     [`TradingLoopController::disarm`] and a later settlement re-arms.
//!   • Computing prices, trend, or statistics (collaborators do).
//!
//! Safety properties:
//!   • No tick publishes while Unarmed, or before the order book is ready.
//!   • Arming always cancels the previous timer before scheduling the next,
//!     so at most one timer is ever live.
//!   • A failed trade-source handshake leaves the loop Unarmed forever.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{Instrument, debug, info, instrument, warn};

use common::logger::{task_span, warn_if_slow};
use market::{BookUpdate, OrderBookSource, Side, TrendSignal};
use notifier::Notifier;
use trade::{OrderData, TradeEvent, TradeSettlementSource};

use crate::config::ControllerConfig;
use crate::error::ControllerError;
use crate::notification::{Notification, SettledReport, StatusSnapshot};
use crate::state::{LoopState, TimerSlot};

pub struct TradingLoopController<B, T, S> {
    config: ControllerConfig,

    /// Last prices per side (read at tick time, never cached).
    book: Arc<B>,

    /// Bearish/bullish flags.
    trend: Arc<T>,

    /// Settlement events, init handshake, history stats.
    trades: Arc<S>,

    notifier: Notifier,

    /// Set by the first order book update; gates tick evaluation.
    ready: AtomicBool,

    started: AtomicBool,

    timer: Mutex<TimerSlot>,

    /// Event listeners, the warm-up task and pending settlement reports,
    /// aborted on shutdown.
    background: Mutex<Vec<JoinHandle<()>>>,
}

impl<B, T, S> TradingLoopController<B, T, S>
where
    B: OrderBookSource,
    T: TrendSignal,
    S: TradeSettlementSource,
{
    /// Create a controller wrapped in Arc<Self> so spawned tasks can refer back to it.
    pub fn new(
        config: ControllerConfig,
        book: Arc<B>,
        trend: Arc<T>,
        trades: Arc<S>,
        notifier: Notifier,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            book,
            trend,
            trades,
            notifier,
            ready: AtomicBool::new(false),
            started: AtomicBool::new(false),
            timer: Mutex::new(TimerSlot::default()),
            background: Mutex::new(Vec::new()),
        })
    }

    pub fn state(&self) -> LoopState {
        self.timer.lock().state
    }

    /// Whether the order book has produced at least one derived update.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Whether a periodic timer task is currently live.
    pub fn has_active_timer(&self) -> bool {
        self.timer.lock().has_timer()
    }

    /// Performs the trade-source handshake, then subscribes to collaborator
    /// events and schedules the first arming `warmup` after this call.
    ///
    /// If the handshake fails nothing is subscribed or scheduled and the
    /// loop stays Unarmed; `start` may be retried.
    #[instrument(skip(self), target = "controller")]
    pub async fn start(self: &Arc<Self>) -> Result<(), ControllerError> {
        let started_at = Instant::now();
        self.config.validate()?;

        if self.started.swap(true, Ordering::SeqCst) {
            return Err(ControllerError::AlreadyStarted);
        }

        if let Err(e) = self.trades.init().await {
            self.started.store(false, Ordering::SeqCst);
            warn!(error = %e, "trade settlement source not ready; loop stays unarmed");
            return Err(ControllerError::Init(e));
        }
        info!("trade settlement source ready");

        // Subscribe before spawning so nothing emitted from here on is missed.
        let book_rx = self.book.subscribe_updates();
        let trade_rx = self.trades.subscribe();

        let readiness = tokio::spawn(
            Self::watch_book_updates(Arc::downgrade(self), book_rx)
                .instrument(task_span("book_updates")),
        );
        let events = tokio::spawn(
            Self::watch_trade_events(Arc::downgrade(self), trade_rx)
                .instrument(task_span("trade_events")),
        );

        let weak = Arc::downgrade(self);
        let warmup_deadline = started_at + self.config.warmup;
        let warmup = tokio::spawn(
            async move {
                tokio::time::sleep_until(warmup_deadline).await;
                if let Some(ctrl) = weak.upgrade() {
                    info!("warm-up elapsed; arming trading loop");
                    ctrl.arm();
                }
            }
            .instrument(task_span("warmup")),
        );

        self.background.lock().extend([readiness, events, warmup]);

        info!(
            warmup_ms = self.config.warmup.as_millis() as u64,
            tick_ms = self.config.tick_interval.as_millis() as u64,
            "trading loop controller started"
        );
        Ok(())
    }

    /// Cancels any running timer and schedules a fresh one at `tick_interval`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn arm(self: &Arc<Self>) {
        let period = self.config.tick_period();
        let mut slot = self.timer.lock();

        let generation = slot.begin_arm();
        let first_tick = Instant::now() + period;
        let weak = Arc::downgrade(self);

        let handle = tokio::spawn(
            Self::run_timer(weak, generation, first_tick, period)
                .instrument(tracing::debug_span!("loop_timer", generation)),
        );
        slot.install(handle);

        debug!(generation, "trading loop armed");
    }

    /// Cancels the periodic timer. Idempotent.
    ///
    /// Once this returns no further tick publishes until the next arm.
    pub fn disarm(&self) {
        let had_timer = self.timer.lock().disarm();
        if had_timer {
            debug!("trading loop disarmed");
        }
    }

    /// Runs one evaluation now, provided the loop is armed.
    ///
    /// Returns the snapshot that was published.
    pub fn tick(&self) -> Option<StatusSnapshot> {
        let slot = self.timer.lock();
        if slot.state != LoopState::Armed {
            return None;
        }
        self.evaluate()
    }

    /// Disarms, stops all background listeners and drops settlement reports
    /// whose statistics are still pending.
    pub fn shutdown(&self) {
        self.disarm();
        for handle in self.background.lock().drain(..) {
            handle.abort();
        }
        self.started.store(false, Ordering::SeqCst);
        info!("trading loop controller shut down");
    }

    /// Current status, or `None` while the order book is not ready.
    pub fn snapshot(&self) -> Option<StatusSnapshot> {
        if !self.is_ready() {
            return None;
        }

        Some(StatusSnapshot {
            last_sell_price: self.book.last_sell_price(),
            last_buy_price: self.book.last_buy_price(),
            bearish: self.trend.is_bearish(),
            bullish: self.trend.is_bullish(),
        })
    }

    /// Reacts to one settlement/cancellation event: re-arm first, then report.
    pub fn handle_trade_event(self: &Arc<Self>, event: TradeEvent) {
        info!(event = event.name(), order_id = %event.order().id, "trade event received");

        self.arm();

        match event {
            TradeEvent::BuySettled(order) => self.spawn_settlement_report(Side::Buy, order),
            TradeEvent::SellSettled(order) => self.spawn_settlement_report(Side::Sell, order),
            TradeEvent::BuyCancelled(order) => {
                Notification::BuyCancelled(order).publish(&self.notifier);
            }
            TradeEvent::SellCancelled(order) => {
                Notification::SellCancelled(order).publish(&self.notifier);
            }
        }
    }

    fn mark_ready(&self) {
        if !self.ready.swap(true, Ordering::SeqCst) {
            info!("order book updates available; status evaluation enabled");
        }
    }

    /// Reads current state and publishes it. Caller holds the timer lock.
    fn evaluate(&self) -> Option<StatusSnapshot> {
        let snapshot = self.snapshot()?;

        info!(
            last_buy = ?snapshot.last_buy_price,
            last_sell = ?snapshot.last_sell_price,
            bearish = snapshot.bearish,
            bullish = snapshot.bullish,
            "loop status"
        );

        Notification::Status(snapshot.clone()).publish(&self.notifier);
        Some(snapshot)
    }

    fn on_timer(&self, generation: u64) -> bool {
        // Held across evaluation so a concurrent disarm waits for this tick.
        let slot = self.timer.lock();
        if !slot.is_current(generation) {
            return false;
        }
        self.evaluate();
        true
    }

    /// Fetches stats off the loop and publishes `*:settled` whenever they
    /// resolve. A failed fetch still publishes, with `stats: null`.
    fn spawn_settlement_report(&self, side: Side, order: OrderData) {
        let trades = Arc::clone(&self.trades);
        let notifier = self.notifier.clone();
        let slow = self.config.slow_fetch_threshold;

        let task = tokio::spawn(
            async move {
                let stats = match warn_if_slow(
                    "trade_history_stats",
                    slow,
                    trades.trade_history_stats(),
                )
                .await
                {
                    Ok(stats) => {
                        info!(
                            total_buy_value = stats.daily_stats.total_buy_value,
                            total_sell_value = stats.daily_stats.total_sell_value,
                            "daily trade totals"
                        );
                        Some(stats)
                    }
                    Err(e) => {
                        warn!(error = %e, "trade history stats unavailable; reporting without stats");
                        None
                    }
                };

                let report = SettledReport {
                    order_data: order,
                    stats,
                };
                let notification = match side {
                    Side::Buy => Notification::BuySettled(report),
                    Side::Sell => Notification::SellSettled(report),
                };
                notification.publish(&notifier);
            }
            .instrument(tracing::info_span!("settlement_report", side = %side)),
        );

        let mut background = self.background.lock();
        background.retain(|h| !h.is_finished());
        background.push(task);
    }

    async fn run_timer(weak: Weak<Self>, generation: u64, first_tick: Instant, period: Duration) {
        let mut ticker = interval_at(first_tick, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let Some(ctrl) = weak.upgrade() else { break };
            if !ctrl.on_timer(generation) {
                break;
            }
        }
    }

    async fn watch_book_updates(weak: Weak<Self>, mut rx: broadcast::Receiver<BookUpdate>) {
        loop {
            let received = rx.recv().await;
            let Some(ctrl) = weak.upgrade() else { break };

            match received {
                // Lagging still proves updates are flowing.
                Ok(_) | Err(RecvError::Lagged(_)) => ctrl.mark_ready(),
                Err(RecvError::Closed) => {
                    warn!("order book update stream closed");
                    break;
                }
            }
        }
    }

    async fn watch_trade_events(
        weak: Weak<Self>,
        mut rx: mpsc::UnboundedReceiver<TradeEvent>,
    ) {
        while let Some(event) = rx.recv().await {
            let Some(ctrl) = weak.upgrade() else { return };
            ctrl.handle_trade_event(event);
        }
        warn!("trade event stream closed");
    }
}
