use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotifierError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("accept failed: {0}")]
    Accept(#[from] std::io::Error),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("payload serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}
