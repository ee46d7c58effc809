//! Quote creation

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use common::decimal::{Amount, Price, Quantity, Rate};
use common::error::{Error, Result};
use common::model::{Pair, Quote};
use quote_store::SwapStore;
use venue_gateway::MarketDataGateway;
#[cfg(feature = "utoipa")]
use utoipa::ToSchema;

use crate::config::SwapEngineConfig;
use crate::defaults::DefaultsHandle;
use crate::price::PriceEngine;
use crate::routing::RoutingTable;

/// Caller input for a quote
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteRequest {
    /// Pair symbol, case-insensitive
    pub pair: String,
    /// Volume of the base asset
    pub volume: Quantity,
    /// Spread override
    pub spread: Option<Rate>,
    /// Fee override
    pub fee: Option<Rate>,
}

/// Terms offered to a buyer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct BuyTerms {
    pub max_unit_price: Price,
    pub max_total_price: Amount,
    pub fee_volume: Quantity,
    pub trade_volume: Quantity,
}

/// Terms offered to a seller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct SellTerms {
    pub min_unit_price: Price,
    pub min_total_price: Amount,
    pub min_fee_price: Amount,
    pub min_final_price: Amount,
}

/// A created quote as presented to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct SwapQuote {
    pub id: Uuid,
    #[cfg_attr(feature = "utoipa", schema(value_type = String, example = "BTC-USDT"))]
    pub pair: Pair,
    pub last_traded_price: Price,
    pub spread: Rate,
    pub fee: Rate,
    pub volume: Quantity,
    pub expire_at: DateTime<Utc>,
    pub buy: BuyTerms,
    pub sell: SellTerms,
}

impl From<&Quote> for SwapQuote {
    fn from(quote: &Quote) -> Self {
        Self {
            id: quote.id,
            pair: quote.pair.clone(),
            last_traded_price: quote.last_traded_price,
            spread: quote.spread,
            fee: quote.fee,
            volume: quote.volume,
            expire_at: quote.expire_at,
            buy: BuyTerms {
                max_unit_price: quote.spread_bid,
                max_total_price: quote.total_spread_bid,
                fee_volume: quote.fee_volume,
                trade_volume: quote.trade_volume,
            },
            sell: SellTerms {
                min_unit_price: quote.spread_ask,
                min_total_price: quote.total_spread_ask,
                min_fee_price: quote.total_spread_ask * quote.fee,
                min_final_price: quote.total_spread_ask * (Decimal::ONE - quote.fee),
            },
        }
    }
}

/// Creates and persists quotes
pub struct SwapQuoteService {
    routing: Arc<RoutingTable>,
    price_engine: PriceEngine,
    store: Arc<dyn SwapStore>,
    defaults: Arc<DefaultsHandle>,
    config: SwapEngineConfig,
}

impl SwapQuoteService {
    pub fn new(
        routing: Arc<RoutingTable>,
        market_data: Arc<dyn MarketDataGateway>,
        store: Arc<dyn SwapStore>,
        defaults: Arc<DefaultsHandle>,
        config: SwapEngineConfig,
    ) -> Self {
        Self {
            routing,
            price_engine: PriceEngine::new(market_data, store.clone()),
            store,
            defaults,
            config,
        }
    }

    /// Price and persist a quote
    ///
    /// Input is validated before any venue or store call. Gateway failures are
    /// not retried.
    #[instrument(skip(self, request), fields(pair = %request.pair, volume = %request.volume))]
    pub async fn create_quote(&self, request: QuoteRequest) -> Result<SwapQuote> {
        let pair: Pair = request.pair.parse()?;
        let route = self.routing.resolve(&pair)?;

        if request.volume <= Decimal::ZERO {
            return Err(Error::ValidationError("volume must be greater than zero".to_string()));
        }
        if let Some(spread) = request.spread {
            if spread < Decimal::ZERO {
                return Err(Error::ValidationError("spread must not be negative".to_string()));
            }
        }
        if let Some(fee) = request.fee {
            if fee < Decimal::ZERO || fee >= Decimal::ONE {
                return Err(Error::ValidationError("fee must be in [0, 1)".to_string()));
            }
        }

        let defaults = self.defaults.current().await;
        let fee = request.fee.unwrap_or(defaults.fee);
        let prices = self
            .price_engine
            .price_route(route, request.spread, &defaults)
            .await?;

        let volume = request.volume;
        let now = Utc::now();
        let quote = Quote {
            id: Uuid::new_v4(),
            pair,
            last_traded_price: prices.last_traded_price,
            spread: prices.spread,
            fee,
            spread_bid: prices.spread_bid,
            spread_ask: prices.spread_ask,
            total_spread_bid: prices.spread_bid * volume,
            total_spread_ask: prices.spread_ask * volume,
            volume,
            trade_volume: volume * (Decimal::ONE - fee),
            fee_volume: volume * fee,
            expire_at: now + self.config.validity_window(),
            created_at: now,
        };

        self.store.create_quote(&quote).await?;
        info!(quote_id = %quote.id, pair = %quote.pair, expire_at = %quote.expire_at, "Quote created");

        Ok(SwapQuote::from(&quote))
    }

    /// A stored quote
    pub async fn get_quote(&self, id: Uuid) -> Result<SwapQuote> {
        self.store
            .get_quote(id)
            .await?
            .map(|quote| SwapQuote::from(&quote))
            .ok_or_else(|| Error::QuoteNotFound(id.to_string()))
    }

    /// Pairs that can be quoted
    pub fn listed_pairs(&self) -> Vec<Pair> {
        self.routing.pairs().cloned().collect()
    }
}
