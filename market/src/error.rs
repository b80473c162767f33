use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("malformed match frame: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid match price {0}")]
    InvalidPrice(f64),

    #[error("invalid match size {0}")]
    InvalidSize(f64),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}
