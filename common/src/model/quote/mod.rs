//! Swap quote models

use chrono::{DateTime, Utc};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{Amount, Price, Quantity, Rate};
use crate::model::market::Pair;
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// A priced swap offer, valid for execution until `expire_at`
///
/// Quotes are written once and never mutated; execution results live in
/// [`ExecutionLog`](crate::model::ExecutionLog).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct Quote {
    /// Quote id
    pub id: Uuid,
    /// Pair as requested by the caller
    #[cfg_attr(feature = "utoipa", schema(value_type = String, example = "BTC-USDT"))]
    pub pair: Pair,
    /// Last traded price the quote was derived from
    pub last_traded_price: Price,
    /// Spread applied
    pub spread: Rate,
    /// Fee applied
    pub fee: Rate,
    /// Unit price offered to buyers
    pub spread_bid: Price,
    /// Unit price offered to sellers
    pub spread_ask: Price,
    /// `spread_bid * volume`
    pub total_spread_bid: Amount,
    /// `spread_ask * volume`
    pub total_spread_ask: Amount,
    /// Requested volume
    pub volume: Quantity,
    /// Volume net of fee
    pub trade_volume: Quantity,
    /// Volume taken as fee
    pub fee_volume: Quantity,
    /// Last instant at which the quote may be executed
    pub expire_at: DateTime<Utc>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Quote {
    /// Whether the quote can no longer be executed at `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expire_at
    }

    /// Quoted unit price for the given side
    pub fn unit_price(&self, side: crate::model::Side) -> Price {
        match side {
            crate::model::Side::Buy => self.spread_bid,
            crate::model::Side::Sell => self.spread_ask,
        }
    }
}

/// Default fee and spread applied when a quote request omits them
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct QuoteDefaults {
    /// Default fee rate
    pub fee: Rate,
    /// Default spread rate
    pub spread: Rate,
}

impl Default for QuoteDefaults {
    fn default() -> Self {
        Self {
            fee: dec!(0.08),
            spread: dec!(0.0001),
        }
    }
}
