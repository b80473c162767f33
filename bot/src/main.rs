mod config;

use std::sync::Arc;

use anyhow::Context;
use tracing::{Instrument, error, info, warn};

use common::logger::{init_logger, task_span};
use config::AppConfig;
use controller::TradingLoopController;
use market::OrderBook;
use market::feed::{FeedConfig, run_match_feed};
use notifier::{Notifier, NotifierServer};
use trade::PaperTradeManager;

/// Starts the observer WebSocket and returns the notifier the loop publishes to.
async fn start_notifier(cfg: &AppConfig) -> anyhow::Result<Notifier> {
    let notifier = Notifier::new();
    let server = NotifierServer::bind(&cfg.notifier_addr, notifier.clone())
        .await
        .context("failed to start status notifier")?;

    tokio::spawn(
        async move {
            if let Err(e) = server.run().await {
                error!(error = %e, "status notifier stopped");
            }
        }
        .instrument(task_span("notifier")),
    );

    Ok(notifier)
}

/// Feeds the order book from the configured match stream, if any.
fn start_match_feed(cfg: &AppConfig, book: Arc<OrderBook>) {
    let Some(url) = cfg.feed_url.clone() else {
        warn!("FEED_URL not set; order book receives no matches");
        return;
    };

    let mut feed = FeedConfig::new(url);
    feed.subscribe_message = cfg.feed_subscribe.clone();

    tokio::spawn(run_match_feed(feed, book).instrument(task_span("match_feed")));
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cfg = AppConfig::from_env()?;
    init_logger("bot", cfg.json_logs);

    info!("Starting trading bot...");

    let notifier = start_notifier(&cfg).await?;

    let book = OrderBook::new(cfg.book);
    start_match_feed(&cfg, Arc::clone(&book));

    let trades = Arc::new(PaperTradeManager::new(cfg.credentials.clone()));

    let controller =
        TradingLoopController::new(cfg.controller, Arc::clone(&book), book.trend(), trades, notifier);

    if let Err(e) = controller.start().await {
        error!(error = %e, "trading loop failed to start");
        return Err(e.into());
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    controller.shutdown();

    Ok(())
}
