//! Instrument pairs and market price models

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::{Price, Rate};
use crate::error::Error;
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Instrument pair identified as `BASE-QUOTE` (e.g. "BTC-USDT")
///
/// Serialized as its symbol string; schemas embedding a pair document it as a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pair {
    /// Base asset (the asset being bought or sold)
    pub base: String,
    /// Quote asset (the asset prices are expressed in)
    pub quote: String,
}

impl Pair {
    /// Create a pair from its two assets, normalising to upper case
    pub fn new(base: impl AsRef<str>, quote: impl AsRef<str>) -> Self {
        Self {
            base: base.as_ref().to_uppercase(),
            quote: quote.as_ref().to_uppercase(),
        }
    }

    /// Venue instrument symbol
    pub fn symbol(&self) -> String {
        format!("{}-{}", self.base, self.quote)
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.base, self.quote)
    }
}

impl FromStr for Pair {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split('-');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(base), Some(quote), None) if !base.is_empty() && !quote.is_empty() => {
                Ok(Pair::new(base, quote))
            }
            _ => Err(Error::ValidationError(format!(
                "Pair must be formatted as BASE-QUOTE, got '{}'",
                s
            ))),
        }
    }
}

impl Serialize for Pair {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.symbol())
    }
}

impl<'de> Deserialize<'de> for Pair {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Current venue ticker for a pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticker {
    /// Pair the ticker belongs to
    pub pair: Pair,
    /// Last traded price
    pub last_price: Price,
}

/// Audit record of the prices computed for a pair at quote time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct MarketSnapshot {
    /// Pair the prices are expressed in
    #[cfg_attr(feature = "utoipa", schema(value_type = String, example = "USDC-USDT"))]
    pub pair: Pair,
    /// Last traded price
    pub last_traded_price: Price,
    /// Bid after spread
    pub spread_bid: Price,
    /// Ask after spread
    pub spread_ask: Price,
    /// Spread applied
    pub spread: Rate,
    /// When the snapshot was taken
    pub taken_at: DateTime<Utc>,
}
