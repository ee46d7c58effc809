use std::sync::Arc;
use std::time::Duration;

use common::decimal::dec;
use common::model::Pair;
use quote_store::InMemorySwapStore;
use swap_engine::{QuoteRequest, RoutingTable, SwapEngine, SwapEngineConfig};
use venue_gateway::SimulatedVenue;

pub struct Harness {
    pub venue: Arc<SimulatedVenue>,
    pub store: Arc<InMemorySwapStore>,
    pub engine: SwapEngine,
}

/// Venue with USDC-USDT at 1.25 so synthetic AAVE-USDC prices stay exact
pub async fn harness() -> Harness {
    let venue = Arc::new(SimulatedVenue::new());
    venue.set_price(Pair::new("BTC", "USDT"), dec!(27000));
    venue.set_price(Pair::new("ETH", "USDT"), dec!(1650));
    venue.set_price(Pair::new("USDC", "USDT"), dec!(1.25));
    venue.set_price(Pair::new("AAVE", "USDT"), dec!(60));
    venue.set_price(Pair::new("BTC", "USDC"), dec!(27000));
    venue.set_balance("BTC", dec!(1));
    venue.set_balance("AAVE", dec!(10));
    venue.set_balance("USDT", dec!(100000));
    venue.set_balance("USDC", dec!(100000));

    let store = Arc::new(InMemorySwapStore::new());
    let config = SwapEngineConfig::new(60, 3, Duration::from_millis(1));
    let engine = SwapEngine::build(
        venue.clone(),
        venue.clone(),
        store.clone(),
        RoutingTable::default_listing(),
        config,
    )
    .await
    .unwrap();

    Harness { venue, store, engine }
}

#[allow(dead_code)]
pub fn request(pair: &str, volume: rust_decimal::Decimal, spread: Option<rust_decimal::Decimal>, fee: Option<rust_decimal::Decimal>) -> QuoteRequest {
    QuoteRequest {
        pair: pair.to_string(),
        volume,
        spread,
        fee,
    }
}
