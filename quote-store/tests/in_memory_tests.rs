use std::sync::Arc;

use chrono::{Duration, Utc};
use common::decimal::dec;
use common::error::Error;
use common::model::{
    ExecutionLeg, ExecutionLog, LegState, MarketSnapshot, OrderStatus, OrderType, Pair, Quote, Side,
};
use quote_store::{ExecutionLogStore, InMemorySwapStore, QuoteStore};
use uuid::Uuid;

fn quote() -> Quote {
    let now = Utc::now();
    Quote {
        id: Uuid::new_v4(),
        pair: Pair::new("BTC", "USDT"),
        last_traded_price: dec!(27000),
        spread: dec!(0),
        fee: dec!(0.1),
        spread_bid: dec!(27000),
        spread_ask: dec!(27000),
        total_spread_bid: dec!(2.7),
        total_spread_ask: dec!(2.7),
        volume: dec!(0.0001),
        trade_volume: dec!(0.00009),
        fee_volume: dec!(0.00001),
        expire_at: now + Duration::seconds(65),
        created_at: now,
    }
}

fn log_for(quote: &Quote, order_id: &str) -> ExecutionLog {
    let now = Utc::now();
    ExecutionLog {
        swap_id: quote.id,
        pair: quote.pair.clone(),
        venue_pair: quote.pair.clone(),
        side: Side::Buy,
        order_id: order_id.to_string(),
        order_price: quote.spread_bid,
        filled_price: dec!(0),
        volume: quote.volume,
        filled_volume: dec!(0),
        spread: quote.spread,
        fee: quote.fee,
        fee_volume: quote.fee_volume,
        fee_price: dec!(0),
        status: OrderStatus::Live,
        bridge_rate: None,
        created_at: now,
        updated_at: now,
    }
}

fn leg(swap_id: Uuid, sequence: u8, state: LegState) -> ExecutionLeg {
    ExecutionLeg {
        swap_id,
        sequence,
        pair: Pair::new("USDC", "USDT"),
        side: Side::Sell,
        order_type: OrderType::Market,
        size: dec!(10),
        price: None,
        order_id: Some(format!("leg-{}", sequence)),
        state,
        detail: None,
        recorded_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_quote_round_trip() {
    let store = InMemorySwapStore::new();
    let quote = quote();
    store.create_quote(&quote).await.unwrap();

    assert_eq!(store.get_quote(quote.id).await.unwrap(), Some(quote));
    assert!(store.get_quote(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_latest_snapshot_is_most_recent() {
    let store = InMemorySwapStore::new();
    let pair = Pair::new("USDC", "USDT");
    for price in [dec!(0.9998), dec!(1.0002)] {
        store
            .save_snapshot(&MarketSnapshot {
                pair: pair.clone(),
                last_traded_price: price,
                spread_bid: price,
                spread_ask: price,
                spread: dec!(0),
                taken_at: Utc::now(),
            })
            .await
            .unwrap();
    }

    let latest = store.latest_snapshot(&pair).await.unwrap().unwrap();
    assert_eq!(latest.last_traded_price, dec!(1.0002));
    assert!(store.latest_snapshot(&Pair::new("BTC", "USDT")).await.unwrap().is_none());
}

#[tokio::test]
async fn test_second_log_for_quote_is_refused() {
    let store = InMemorySwapStore::new();
    let quote = quote();
    store.create_quote(&quote).await.unwrap();

    store.insert_log(&log_for(&quote, "1")).await.unwrap();
    let second = store.insert_log(&log_for(&quote, "2")).await;

    assert!(matches!(second, Err(Error::AlreadyExecuted(_))));
    assert_eq!(store.get_by_swap_id(quote.id).await.unwrap().unwrap().order_id, "1");
    assert!(store.get_by_order_id("2").await.unwrap().is_none());
}

#[tokio::test]
async fn test_log_requires_quote() {
    let store = InMemorySwapStore::new();
    let result = store.insert_log(&log_for(&quote(), "1")).await;
    assert!(matches!(result, Err(Error::QuoteNotFound(_))));
}

#[tokio::test]
async fn test_concurrent_inserts_keep_one_log() {
    let store = Arc::new(InMemorySwapStore::new());
    let quote = quote();
    store.create_quote(&quote).await.unwrap();

    let attempts = (0..8).map(|i| {
        let store = store.clone();
        let log = log_for(&quote, &i.to_string());
        tokio::spawn(async move { store.insert_log(&log).await })
    });
    let results = futures::future::join_all(attempts).await;

    let inserted = results.into_iter().filter(|r| matches!(r, Ok(Ok(())))).count();
    assert_eq!(inserted, 1);
    assert_eq!(store.logs.len(), 1);
}

#[tokio::test]
async fn test_update_fill_persists_refreshed_fields() {
    let store = InMemorySwapStore::new();
    let quote = quote();
    store.create_quote(&quote).await.unwrap();
    let mut log = log_for(&quote, "1");
    store.insert_log(&log).await.unwrap();

    log.filled_price = dec!(26999.5);
    log.filled_volume = dec!(0.00009);
    log.status = OrderStatus::Filled;
    store.update_fill(&log).await.unwrap();

    let stored = store.get_by_order_id("1").await.unwrap().unwrap();
    assert_eq!(stored.filled_price, dec!(26999.5));
    assert_eq!(stored.status, OrderStatus::Filled);
}

#[tokio::test]
async fn test_dangling_legs_exclude_completed_quotes() {
    let store = InMemorySwapStore::new();
    let completed = quote();
    let failed = quote();
    store.create_quote(&completed).await.unwrap();
    store.create_quote(&failed).await.unwrap();

    store.record_leg(&leg(completed.id, 1, LegState::Filled)).await.unwrap();
    store.insert_log(&log_for(&completed, "leg-1")).await.unwrap();

    store.record_leg(&leg(failed.id, 1, LegState::Placed)).await.unwrap();
    store
        .update_leg_state(failed.id, 1, LegState::Filled, None)
        .await
        .unwrap();
    store.record_leg(&leg(failed.id, 2, LegState::Rejected)).await.unwrap();

    let dangling = store.dangling_legs().await.unwrap();
    assert_eq!(dangling.len(), 2);
    assert!(dangling.iter().all(|l| l.swap_id == failed.id));
    assert_eq!(dangling[0].state, LegState::Filled);

    let duplicate = store.record_leg(&leg(failed.id, 2, LegState::Placed)).await;
    assert!(matches!(duplicate, Err(Error::AlreadyExecuted(_))));

    let legs = store.legs_for(failed.id).await.unwrap();
    assert_eq!(legs.iter().map(|l| l.sequence).collect::<Vec<_>>(), vec![1, 2]);
}
