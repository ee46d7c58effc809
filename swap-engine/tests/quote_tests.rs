mod support;

use chrono::{Duration, Utc};
use common::decimal::dec;
use common::error::Error;
use common::model::{Pair, QuoteDefaults};
use quote_store::QuoteStore;
use support::{harness, request};

#[tokio::test]
async fn test_zero_spread_quotes_last_price_on_both_sides() {
    let h = harness().await;
    let quote = h
        .engine
        .quotes
        .create_quote(request("BTC-USDT", dec!(0.0001), Some(dec!(0)), Some(dec!(0.1))))
        .await
        .unwrap();

    assert_eq!(quote.last_traded_price, dec!(27000));
    assert_eq!(quote.buy.max_unit_price, quote.last_traded_price);
    assert_eq!(quote.sell.min_unit_price, quote.last_traded_price);
    assert_eq!(quote.buy.fee_volume, dec!(0.00001));
    assert_eq!(quote.buy.trade_volume, dec!(0.00009));
}

#[tokio::test]
async fn test_spread_moves_bid_down_and_ask_up() {
    let h = harness().await;
    let quote = h
        .engine
        .quotes
        .create_quote(request("BTC-USDT", dec!(0.0001), Some(dec!(0.1)), Some(dec!(0.1))))
        .await
        .unwrap();

    assert_eq!(quote.buy.max_unit_price, quote.last_traded_price * dec!(0.9));
    assert_eq!(quote.sell.min_unit_price, quote.last_traded_price * dec!(1.1));
    assert!(quote.buy.max_unit_price <= quote.last_traded_price);
    assert!(quote.last_traded_price <= quote.sell.min_unit_price);
}

#[tokio::test]
async fn test_totals_and_fee_split() {
    let h = harness().await;
    let quote = h
        .engine
        .quotes
        .create_quote(request("ETH-USDT", dec!(1.5), Some(dec!(0.002)), Some(dec!(0.03))))
        .await
        .unwrap();

    assert_eq!(quote.buy.max_total_price, quote.buy.max_unit_price * dec!(1.5));
    assert_eq!(quote.sell.min_total_price, quote.sell.min_unit_price * dec!(1.5));
    assert_eq!(quote.buy.fee_volume + quote.buy.trade_volume, quote.volume);
    assert_eq!(quote.sell.min_fee_price, quote.sell.min_total_price * dec!(0.03));
    assert_eq!(
        quote.sell.min_fee_price + quote.sell.min_final_price,
        quote.sell.min_total_price
    );
}

#[tokio::test]
async fn test_defaults_apply_when_omitted() {
    let h = harness().await;
    let quote = h
        .engine
        .quotes
        .create_quote(request("btc-usdt", dec!(1), None, None))
        .await
        .unwrap();

    assert_eq!(quote.pair, Pair::new("BTC", "USDT"));
    assert_eq!(quote.spread, dec!(0.0001));
    assert_eq!(quote.fee, dec!(0.08));
}

#[tokio::test]
async fn test_reloaded_defaults_take_effect() {
    let h = harness().await;
    h.store
        .save_defaults(&QuoteDefaults {
            fee: dec!(0.02),
            spread: dec!(0.005),
        })
        .await
        .unwrap();

    let before = h
        .engine
        .quotes
        .create_quote(request("BTC-USDT", dec!(1), None, None))
        .await
        .unwrap();
    assert_eq!(before.fee, dec!(0.08));

    h.engine.defaults.reload().await.unwrap();
    let after = h
        .engine
        .quotes
        .create_quote(request("BTC-USDT", dec!(1), None, None))
        .await
        .unwrap();
    assert_eq!(after.fee, dec!(0.02));
    assert_eq!(after.spread, dec!(0.005));
}

#[tokio::test]
async fn test_quote_expires_after_validity_window() {
    let h = harness().await;
    let before = Utc::now();
    let quote = h
        .engine
        .quotes
        .create_quote(request("BTC-USDT", dec!(1), None, None))
        .await
        .unwrap();

    assert!(quote.expire_at >= before + Duration::seconds(65));
    assert!(quote.expire_at <= Utc::now() + Duration::seconds(65));

    let stored = h.store.get_quote(quote.id).await.unwrap().unwrap();
    assert_eq!(stored.expire_at, quote.expire_at);
}

#[tokio::test]
async fn test_synthetic_pair_priced_through_bridge() {
    let h = harness().await;
    let quote = h
        .engine
        .quotes
        .create_quote(request("AAVE-USDC", dec!(2), Some(dec!(0.01)), Some(dec!(0.1))))
        .await
        .unwrap();

    // 60 USDT per AAVE at 1.25 USDT per USDC
    assert_eq!(quote.pair, Pair::new("AAVE", "USDC"));
    assert_eq!(quote.last_traded_price, dec!(48));
    assert_eq!(quote.buy.max_unit_price, dec!(47.52));
    // the bridged ask is left unspread
    assert_eq!(quote.sell.min_unit_price, dec!(48));

    let bridge = h
        .store
        .latest_snapshot(&Pair::new("USDC", "USDT"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(bridge.last_traded_price, dec!(1.25));
    assert_eq!(bridge.spread, dec!(0));

    let venue = h
        .store
        .latest_snapshot(&Pair::new("AAVE", "USDT"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(venue.last_traded_price, dec!(60));
    assert_eq!(venue.spread_bid, dec!(59.4));

    assert!(h
        .store
        .latest_snapshot(&Pair::new("AAVE", "USDC"))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_invalid_requests_persist_nothing() {
    let h = harness().await;
    let invalid = [
        request("BTC-USDT", dec!(1), None, Some(dec!(1))),
        request("BTC-USDT", dec!(1), Some(dec!(-0.1)), None),
        request("BTC-USDT", dec!(0), None, None),
        request("DOGE-USDT", dec!(1), None, None),
        request("BTCUSDT", dec!(1), None, None),
    ];

    for req in invalid {
        let result = h.engine.quotes.create_quote(req.clone()).await;
        assert!(
            matches!(result, Err(Error::ValidationError(_))),
            "{:?} should be rejected, got {:?}",
            req,
            result
        );
    }

    assert!(h.store.quotes.is_empty());
    assert!(h.store.snapshots.is_empty());
}

#[tokio::test]
async fn test_unlisted_venue_instrument_is_not_defaulted_to_zero() {
    let h = harness().await;
    h.venue.remove_price(&Pair::new("BTC", "USDT"));

    let result = h
        .engine
        .quotes
        .create_quote(request("BTC-USDT", dec!(1), None, None))
        .await;
    assert!(matches!(result, Err(Error::PairNotListed(_))));
    assert!(h.store.quotes.is_empty());
}

#[tokio::test]
async fn test_gateway_outage_surfaces_without_retry() {
    let h = harness().await;
    h.venue.set_unavailable(true);

    let result = h
        .engine
        .quotes
        .create_quote(request("ETH-USDT", dec!(1), None, None))
        .await;
    assert!(matches!(result, Err(Error::GatewayUnavailable(_))));
}

#[tokio::test]
async fn test_non_positive_last_price_is_never_quoted() {
    let h = harness().await;
    h.venue.set_price(Pair::new("BTC", "USDT"), dec!(0));
    h.venue.set_price(Pair::new("AAVE", "USDT"), dec!(-1));

    for pair in ["BTC-USDT", "AAVE-USDC"] {
        let result = h
            .engine
            .quotes
            .create_quote(request(pair, dec!(1), None, None))
            .await;
        assert!(
            matches!(result, Err(Error::GatewayUnavailable(_))),
            "{} should be refused, got {:?}",
            pair,
            result
        );
    }

    assert!(h.store.quotes.is_empty());
    assert!(h.store.snapshots.is_empty());
}
