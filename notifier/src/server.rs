//! WebSocket front-end for the [`Notifier`].
//!
//! Every accepted connection becomes the current observer and receives each
//! published [`Envelope`] as one JSON text frame. Inbound frames are ignored
//! apart from close/ping handling.

use std::net::SocketAddr;

use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::error::NotifierError;
use crate::registry::Notifier;

pub struct NotifierServer {
    listener: TcpListener,
    notifier: Notifier,
}

impl NotifierServer {
    pub async fn bind(addr: &str, notifier: Notifier) -> Result<Self, NotifierError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| NotifierError::Bind {
                addr: addr.to_string(),
                source,
            })?;

        Ok(Self { listener, notifier })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, NotifierError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept loop. Only returns on a listener failure.
    pub async fn run(self) -> Result<(), NotifierError> {
        info!(addr = ?self.listener.local_addr().ok(), "notifier listening");

        loop {
            let (stream, peer) = self.listener.accept().await?;
            let notifier = self.notifier.clone();

            tokio::spawn(
                async move {
                    if let Err(e) = serve_connection(stream, notifier).await {
                        warn!(error = %e, "observer connection ended with error");
                    }
                }
                .instrument(info_span!("observer_connection", %peer)),
            );
        }
    }
}

async fn serve_connection(stream: TcpStream, notifier: Notifier) -> Result<(), NotifierError> {
    let ws = accept_async(stream).await?;
    let (mut write, mut read) = ws.split();

    let (id, mut rx) = notifier.connect();

    let result = async {
        loop {
            tokio::select! {
                envelope = rx.recv() => {
                    // Sender dropped: a newer observer replaced us.
                    let Some(envelope) = envelope else { break };
                    let text = envelope.to_json()?;
                    write.send(Message::Text(text.into())).await?;
                }
                inbound = read.next() => match inbound {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(payload))) => write.send(Message::Pong(payload)).await?,
                    Some(Ok(_)) => debug!("ignoring inbound frame"),
                    Some(Err(e)) => return Err(NotifierError::from(e)),
                },
            }
        }
        Ok::<(), NotifierError>(())
    }
    .await;

    notifier.disconnect(id);
    let _ = write.close().await;
    result
}
