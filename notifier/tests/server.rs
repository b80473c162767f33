use std::time::Duration;

use futures::StreamExt;
use notifier::{Envelope, Notifier, NotifierServer};
use serde_json::json;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

async fn start_server() -> anyhow::Result<(Notifier, String)> {
    let notifier = Notifier::new();
    let server = NotifierServer::bind("127.0.0.1:0", notifier.clone()).await?;
    let addr = server.local_addr()?;
    tokio::spawn(server.run());
    Ok((notifier, format!("ws://{addr}")))
}

async fn wait_until_connected(notifier: &Notifier) {
    for _ in 0..100 {
        if notifier.is_connected() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("observer never registered");
}

#[tokio::test]
async fn websocket_observer_receives_published_messages() -> anyhow::Result<()> {
    let (notifier, url) = start_server().await?;

    let (mut ws, _) = connect_async(url.as_str()).await?;
    wait_until_connected(&notifier).await;

    assert!(notifier.publish("status", &json!({"last_sell_price": 105.2})));

    let frame = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await?
        .expect("frame")?;
    let Message::Text(text) = frame else {
        panic!("expected text frame, got {frame:?}");
    };
    let env: Envelope = serde_json::from_str(text.as_str())?;

    assert_eq!(env.event, "status");
    assert_eq!(env.data, json!({"last_sell_price": 105.2}));

    Ok(())
}

#[tokio::test]
async fn closing_the_socket_empties_the_slot() -> anyhow::Result<()> {
    let (notifier, url) = start_server().await?;

    let (mut ws, _) = connect_async(url.as_str()).await?;
    wait_until_connected(&notifier).await;

    ws.close(None).await?;

    for _ in 0..100 {
        if !notifier.is_connected() {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("observer slot not cleared after close");
}
