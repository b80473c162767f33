use market::Side;
use trade::{
    ExchangeCredentials, OrderData, PaperTradeManager, TradeError, TradeEvent,
    TradeSettlementSource,
};

const DAY_MS: u64 = 86_400_000;

fn creds() -> ExchangeCredentials {
    ExchangeCredentials {
        api_key: "key".into(),
        api_secret: "secret".into(),
        passphrase: "pass".into(),
    }
}

async fn ready_manager() -> PaperTradeManager {
    let mgr = PaperTradeManager::new(creds());
    mgr.init().await.expect("init with credentials");
    mgr
}

#[tokio::test]
async fn init_fails_closed_without_credentials() {
    let mgr = PaperTradeManager::new(ExchangeCredentials::default());

    let err = mgr.init().await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TradeError>(),
        Some(TradeError::MissingCredentials("api_key"))
    ));
    assert!(!mgr.is_initialized());
}

#[tokio::test]
async fn settle_before_init_is_rejected() {
    let mgr = PaperTradeManager::new(creds());

    let res = mgr.settle(OrderData::new(Side::Buy, 100.0, 1.0, 0));
    assert!(matches!(res, Err(TradeError::NotInitialized)));
}

#[tokio::test]
async fn settlements_and_cancellations_are_broadcast() -> anyhow::Result<()> {
    let mgr = ready_manager().await;
    let mut rx = mgr.subscribe();

    let buy = OrderData::new(Side::Buy, 100.0, 1.0, 0);
    let sell = OrderData::new(Side::Sell, 101.0, 1.0, 0);
    mgr.settle(buy.clone())?;
    mgr.cancel(sell.clone())?;

    assert_eq!(rx.recv().await, Some(TradeEvent::BuySettled(buy)));
    assert_eq!(rx.recv().await, Some(TradeEvent::SellCancelled(sell)));

    Ok(())
}

#[tokio::test]
async fn event_bursts_reach_an_idle_subscriber_in_full() -> anyhow::Result<()> {
    let mgr = ready_manager().await;
    let mut rx = mgr.subscribe();

    for i in 0..1_000u64 {
        mgr.cancel(OrderData::new(Side::Buy, 100.0, 1.0, i))?;
    }

    let mut received = 0;
    while let Ok(event) = rx.try_recv() {
        assert_eq!(event.order().ts_ms, received);
        received += 1;
    }
    assert_eq!(received, 1_000);

    Ok(())
}

#[tokio::test]
async fn dropped_subscribers_do_not_block_others() -> anyhow::Result<()> {
    let mgr = ready_manager().await;
    let gone = mgr.subscribe();
    let mut live = mgr.subscribe();
    drop(gone);

    let order = OrderData::new(Side::Sell, 101.0, 1.0, 0);
    mgr.settle(order.clone())?;

    assert_eq!(live.try_recv().ok(), Some(TradeEvent::SellSettled(order)));
    Ok(())
}

#[tokio::test]
async fn only_settlements_are_booked_per_day() -> anyhow::Result<()> {
    let mgr = ready_manager().await;

    mgr.settle(OrderData::new(Side::Buy, 100.0, 2.0, 10))?;
    mgr.settle(OrderData::new(Side::Sell, 120.0, 1.0, 20))?;
    mgr.cancel(OrderData::new(Side::Buy, 999.0, 1.0, 30))?;
    mgr.settle(OrderData::new(Side::Sell, 50.0, 1.0, DAY_MS + 1))?;

    let day0 = mgr.stats_for(0).daily_stats;
    assert_eq!(day0.total_buy_value, 200.0);
    assert_eq!(day0.total_sell_value, 120.0);
    assert_eq!((day0.buy_count, day0.sell_count), (1, 1));

    let day1 = mgr.stats_for(DAY_MS).daily_stats;
    assert_eq!(day1.total_buy_value, 0.0);
    assert_eq!(day1.total_sell_value, 50.0);

    Ok(())
}

#[tokio::test]
async fn invalid_orders_are_not_booked() {
    let mgr = ready_manager().await;

    let res = mgr.settle(OrderData::new(Side::Buy, 100.0, 0.0, 0));
    assert!(matches!(res, Err(TradeError::InvalidOrder { .. })));
    assert_eq!(mgr.stats_for(0).daily_stats.buy_count, 0);
}

#[test]
fn credentials_debug_redacts_secrets() {
    let dbg = format!("{:?}", creds());
    assert!(dbg.contains("key"));
    assert!(!dbg.contains("secret\""));
    assert!(dbg.contains("<redacted>"));
}
