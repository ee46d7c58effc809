//! Quote price computation

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, instrument};

use common::decimal::{Price, Rate};
use common::error::{Error, Result};
use common::model::{MarketSnapshot, Pair, QuoteDefaults};
use quote_store::SwapStore;
use venue_gateway::MarketDataGateway;

use crate::routing::SwapRoute;

/// Prices derived from a last traded price
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceQuote {
    pub last_traded_price: Price,
    pub spread_bid: Price,
    pub spread_ask: Price,
    pub spread: Rate,
}

impl PriceQuote {
    /// Apply `spread` to `last_price * cross_multiplier`
    ///
    /// The ask is left unspread unless `apply_spread_to_ask` is set.
    pub fn from_last_price(
        last_price: Price,
        spread: Rate,
        cross_multiplier: Decimal,
        apply_spread_to_ask: bool,
    ) -> Self {
        let price = last_price * cross_multiplier;
        let spread_ask = if apply_spread_to_ask {
            price * (Decimal::ONE + spread)
        } else {
            price
        };
        Self {
            last_traded_price: price,
            spread_bid: price * (Decimal::ONE - spread),
            spread_ask,
            spread,
        }
    }

    /// Priced fields divided by `divisor`
    pub fn scaled_down(&self, divisor: Decimal) -> Self {
        Self {
            last_traded_price: self.last_traded_price / divisor,
            spread_bid: self.spread_bid / divisor,
            spread_ask: self.spread_ask / divisor,
            spread: self.spread,
        }
    }

    /// Audit record of these prices under `pair`
    pub fn snapshot(&self, pair: &Pair, taken_at: DateTime<Utc>) -> MarketSnapshot {
        MarketSnapshot {
            pair: pair.clone(),
            last_traded_price: self.last_traded_price,
            spread_bid: self.spread_bid,
            spread_ask: self.spread_ask,
            spread: self.spread,
            taken_at,
        }
    }
}

/// Computes quote prices from venue tickers
pub struct PriceEngine {
    market_data: Arc<dyn MarketDataGateway>,
    store: Arc<dyn SwapStore>,
}

impl PriceEngine {
    pub fn new(market_data: Arc<dyn MarketDataGateway>, store: Arc<dyn SwapStore>) -> Self {
        Self { market_data, store }
    }

    /// Price a venue instrument
    ///
    /// `requested_spread` falls back to `defaults.spread`. A missing ticker is
    /// reported as `PairNotListed` and a non-positive last price as
    /// `GatewayUnavailable`, never as a zero price.
    #[instrument(skip(self, defaults), fields(pair = %pair))]
    pub async fn compute_quote(
        &self,
        pair: &Pair,
        requested_spread: Option<Rate>,
        defaults: &QuoteDefaults,
        cross_multiplier: Decimal,
        apply_spread_to_ask: bool,
    ) -> Result<PriceQuote> {
        let ticker = self.market_data.get_ticker(pair).await?;
        if ticker.last_price <= Decimal::ZERO {
            return Err(Error::GatewayUnavailable(format!(
                "{} reported non-positive last price {}",
                pair, ticker.last_price
            )));
        }
        let spread = requested_spread.unwrap_or(defaults.spread);
        debug!(last_price = %ticker.last_price, spread = %spread, "Pricing pair");

        Ok(PriceQuote::from_last_price(
            ticker.last_price,
            spread,
            cross_multiplier,
            apply_spread_to_ask,
        ))
    }

    /// Price a listed pair along its route, recording market snapshots
    ///
    /// Synthetic pairs are priced through their bridge: the bridge is quoted
    /// unspread, its last price becomes the bridge rate, and the venue symbol
    /// is priced with `1 / bridge rate` and an unspread ask.
    pub async fn price_route(
        &self,
        route: &SwapRoute,
        requested_spread: Option<Rate>,
        defaults: &QuoteDefaults,
    ) -> Result<PriceQuote> {
        match route {
            SwapRoute::Direct { pair } => {
                let quote = self
                    .compute_quote(pair, requested_spread, defaults, Decimal::ONE, true)
                    .await?;
                self.store.save_snapshot(&quote.snapshot(pair, Utc::now())).await?;
                Ok(quote)
            }
            SwapRoute::Synthetic {
                bridge,
                venue_symbol,
                ..
            } => {
                let bridge_quote = self
                    .compute_quote(bridge, Some(Decimal::ZERO), defaults, Decimal::ONE, false)
                    .await?;
                let cross_multiplier = Decimal::ONE / bridge_quote.last_traded_price;
                let quote = self
                    .compute_quote(venue_symbol, requested_spread, defaults, cross_multiplier, false)
                    .await?;

                // both legs priced before either snapshot is recorded
                self.store
                    .save_snapshot(&bridge_quote.snapshot(bridge, Utc::now()))
                    .await?;
                self.store
                    .save_snapshot(&quote.scaled_down(cross_multiplier).snapshot(venue_symbol, Utc::now()))
                    .await?;
                Ok(quote)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_spread_applied_to_both_sides() {
        let quote = PriceQuote::from_last_price(dec!(100), dec!(0.1), Decimal::ONE, true);
        assert_eq!(quote.spread_bid, dec!(90));
        assert_eq!(quote.spread_ask, dec!(110));
        assert!(quote.spread_bid <= quote.last_traded_price && quote.last_traded_price <= quote.spread_ask);
    }

    #[test]
    fn test_unspread_ask_and_multiplier() {
        let quote = PriceQuote::from_last_price(dec!(60), dec!(0.01), dec!(0.5), false);
        assert_eq!(quote.last_traded_price, dec!(30));
        assert_eq!(quote.spread_bid, dec!(29.7));
        assert_eq!(quote.spread_ask, dec!(30));
    }

    #[test]
    fn test_scaled_down_restores_venue_prices() {
        let quote = PriceQuote::from_last_price(dec!(60), dec!(0.01), dec!(0.5), false);
        let venue = quote.scaled_down(dec!(0.5));
        assert_eq!(venue.last_traded_price, dec!(60));
        assert_eq!(venue.spread_bid, dec!(59.4));
    }
}
