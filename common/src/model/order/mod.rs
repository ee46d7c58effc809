//! Venue order models and related types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::decimal::{Amount, Price, Quantity};
use crate::error::Error;
use crate::model::market::Pair;
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Order side (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Lower-case wire form used by the venue
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "buy" => Ok(Side::Buy),
            "sell" => Ok(Side::Sell),
            other => Err(Error::ValidationError(format!("Side must be buy or sell, got '{}'", other))),
        }
    }
}

/// Order type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    /// Market order to be executed immediately at the current market price
    Market,
    /// Limit order to be executed at specified price or better
    Limit,
}

impl OrderType {
    /// Lower-case wire form used by the venue
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Market => "market",
            OrderType::Limit => "limit",
        }
    }
}

impl FromStr for OrderType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "market" => Ok(OrderType::Market),
            "limit" => Ok(OrderType::Limit),
            other => Err(Error::Internal(format!("Unknown order type '{}'", other))),
        }
    }
}

/// Venue order state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Resting on the book, nothing filled yet
    Live,
    /// Some size filled, remainder resting
    PartiallyFilled,
    /// Fully filled
    Filled,
    /// Canceled by the user or the venue
    Canceled,
}

impl OrderStatus {
    /// Whether the venue may still change the order's fill
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Filled | OrderStatus::Canceled)
    }

    /// Wire form used by the venue
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Live => "live",
            OrderStatus::PartiallyFilled => "partially_filled",
            OrderStatus::Filled => "filled",
            OrderStatus::Canceled => "canceled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "live" => Ok(OrderStatus::Live),
            "partially_filled" => Ok(OrderStatus::PartiallyFilled),
            "filled" => Ok(OrderStatus::Filled),
            // the venue reports market-maker-protection cancels separately
            "canceled" | "mmp_canceled" => Ok(OrderStatus::Canceled),
            other => Err(Error::Internal(format!("Unknown order status '{}'", other))),
        }
    }
}

/// Order to be placed on the venue
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    /// Venue instrument
    pub pair: Pair,
    /// Venue side
    pub side: Side,
    /// Limit or market
    pub order_type: OrderType,
    /// Size; base currency except for market buys, which are sized in quote currency
    pub size: Quantity,
    /// Limit price
    pub price: Option<Price>,
}

impl OrderRequest {
    /// Create a limit order
    pub fn limit(pair: Pair, side: Side, size: Quantity, price: Price) -> Self {
        Self {
            pair,
            side,
            order_type: OrderType::Limit,
            size,
            price: Some(price),
        }
    }

    /// Create a market order
    pub fn market(pair: Pair, side: Side, size: Quantity) -> Self {
        Self {
            pair,
            side,
            order_type: OrderType::Market,
            size,
            price: None,
        }
    }
}

/// Acknowledgement of a placed order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedOrder {
    /// Venue order id
    pub order_id: String,
}

/// Fill details of a venue order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderFill {
    /// Price of the latest fill, zero when nothing filled
    pub filled_price: Price,
    /// Size of the latest fill
    pub filled_volume: Quantity,
    /// Current order state
    pub status: OrderStatus,
    /// Average fill price, zero when nothing filled
    pub avg_price: Price,
    /// Accumulated filled size
    pub accumulated_fill_size: Quantity,
}

impl OrderFill {
    /// Size filled across every trade of the order
    pub fn total_volume(&self) -> Quantity {
        if self.accumulated_fill_size.is_zero() {
            self.filled_volume
        } else {
            self.accumulated_fill_size
        }
    }

    /// Average price across every trade, the latest trade price when the venue gave none
    pub fn average_price(&self) -> Price {
        if self.avg_price.is_zero() {
            self.filled_price
        } else {
            self.avg_price
        }
    }

    /// Quote asset received or spent so far
    pub fn proceeds(&self) -> Amount {
        self.total_volume() * self.average_price()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_parsing() {
        assert_eq!("BUY".parse::<Side>().unwrap(), Side::Buy);
        assert_eq!(" sell ".parse::<Side>().unwrap(), Side::Sell);
        assert!("hold".parse::<Side>().is_err());
    }

    #[test]
    fn test_order_status_terminality() {
        assert!(!"live".parse::<OrderStatus>().unwrap().is_terminal());
        assert!(!"partially_filled".parse::<OrderStatus>().unwrap().is_terminal());
        assert!("filled".parse::<OrderStatus>().unwrap().is_terminal());
        assert_eq!("mmp_canceled".parse::<OrderStatus>().unwrap(), OrderStatus::Canceled);
    }

    #[test]
    fn test_fill_aggregates_span_every_trade() {
        use rust_decimal_macros::dec;

        let fill = OrderFill {
            filled_price: dec!(59),
            filled_volume: dec!(1),
            status: OrderStatus::Filled,
            avg_price: dec!(60),
            accumulated_fill_size: dec!(2),
        };
        assert_eq!(fill.total_volume(), dec!(2));
        assert_eq!(fill.average_price(), dec!(60));
        assert_eq!(fill.proceeds(), dec!(120));

        let sparse = OrderFill {
            avg_price: dec!(0),
            accumulated_fill_size: dec!(0),
            ..fill
        };
        assert_eq!(sparse.total_volume(), dec!(1));
        assert_eq!(sparse.average_price(), dec!(59));
    }
}
