//! WebSocket match feed.
//!
//! Connects to a match stream, parses each text frame into a [`Match`] and
//! applies it to the [`OrderBook`]. Frames look like
//! `{"side":"buy","price":105.2,"size":0.5,"time_ms":1700000000000}`.
//! Anything else (heartbeats, acks) is skipped at debug level.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use crate::error::FeedError;
use crate::order_book::OrderBook;
use crate::types::Match;

#[derive(Clone, Debug)]
pub struct FeedConfig {
    pub url: String,

    /// Sent verbatim right after connecting, when the venue needs a subscribe request.
    pub subscribe_message: Option<String>,

    pub reconnect_delay: Duration,
}

impl FeedConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            subscribe_message: None,
            reconnect_delay: Duration::from_secs(3),
        }
    }
}

/// Parses one text frame into a validated match.
pub fn parse_match(raw: &str) -> Result<Match, FeedError> {
    let m: Match = serde_json::from_str(raw)?;

    if m.price <= 0.0 || !m.price.is_finite() {
        return Err(FeedError::InvalidPrice(m.price));
    }
    if m.size < 0.0 || !m.size.is_finite() {
        return Err(FeedError::InvalidSize(m.size));
    }

    Ok(m)
}

/// Runs the feed forever, reconnecting after `reconnect_delay` whenever the
/// connection drops or cannot be established.
pub async fn run_match_feed(config: FeedConfig, book: Arc<OrderBook>) {
    loop {
        match stream_once(&config, &book).await {
            Ok(()) => warn!(url = %config.url, "match feed closed by remote"),
            Err(e) => error!(url = %config.url, error = %e, "match feed failed"),
        }

        info!(
            delay_ms = config.reconnect_delay.as_millis() as u64,
            "reconnecting match feed"
        );
        tokio::time::sleep(config.reconnect_delay).await;
    }
}

async fn stream_once(config: &FeedConfig, book: &OrderBook) -> Result<(), FeedError> {
    let (ws, _) = connect_async(config.url.as_str()).await?;
    info!(url = %config.url, "match feed connected");

    let (mut write, mut read) = ws.split();

    if let Some(sub) = &config.subscribe_message {
        write.send(Message::Text(sub.clone().into())).await?;
    }

    while let Some(msg) = read.next().await {
        let msg = msg?;

        match msg {
            Message::Text(text) => match parse_match(text.as_str()) {
                Ok(m) => {
                    book.apply_match(&m);
                }
                Err(e) => debug!(error = %e, "skipping frame"),
            },
            Message::Ping(payload) => write.send(Message::Pong(payload)).await?,
            Message::Close(_) => break,
            _ => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Side;

    #[test]
    fn parses_well_formed_frame() {
        let m = parse_match(r#"{"side":"sell","price":105.2,"size":0.5,"time_ms":42}"#)
            .expect("valid frame");

        assert_eq!(m.side, Side::Sell);
        assert_eq!(m.price, 105.2);
        assert_eq!(m.ts_ms, 42);
    }

    #[test]
    fn rejects_non_positive_price() {
        let err = parse_match(r#"{"side":"buy","price":0,"size":1,"time_ms":1}"#).unwrap_err();
        assert!(matches!(err, FeedError::InvalidPrice(_)));
    }

    #[test]
    fn rejects_unknown_shape() {
        let err = parse_match(r#"{"type":"heartbeat"}"#).unwrap_err();
        assert!(matches!(err, FeedError::Json(_)));
    }
}
