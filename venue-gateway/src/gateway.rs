//! Venue gateway contracts

use async_trait::async_trait;

use common::error::Result;
use common::model::{Balance, OrderFill, OrderRequest, Pair, PlacedOrder, Ticker};

/// Source of current venue prices
#[async_trait]
pub trait MarketDataGateway: Send + Sync {
    /// Current ticker for a venue instrument.
    ///
    /// Fails with `PairNotListed` when the venue does not list the pair and
    /// with `GatewayUnavailable` on transport or authentication failure.
    async fn get_ticker(&self, pair: &Pair) -> Result<Ticker>;
}

/// Order entry and account queries against the venue
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Place an order; a venue refusal surfaces as `VenueRejected`
    async fn place_order(&self, request: &OrderRequest) -> Result<PlacedOrder>;

    /// Current fill state of an order
    async fn get_order(&self, order_id: &str, pair: &Pair) -> Result<OrderFill>;

    /// Available balance of an asset
    async fn get_balance(&self, asset: &str) -> Result<Balance>;
}
