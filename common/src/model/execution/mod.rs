//! Execution log and leg records

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{Price, Quantity, Rate};
use crate::error::Error;
use crate::model::market::Pair;
use crate::model::order::{OrderFill, OrderStatus, OrderType, Side};
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Result of executing a quote, one per quote id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct ExecutionLog {
    /// Id of the executed quote
    pub swap_id: Uuid,
    /// Pair as quoted
    #[cfg_attr(feature = "utoipa", schema(value_type = String, example = "AAVE-USDC"))]
    pub pair: Pair,
    /// Venue instrument of the order whose fill is reported
    #[cfg_attr(feature = "utoipa", schema(value_type = String, example = "AAVE-USDT"))]
    pub venue_pair: Pair,
    /// Side requested by the caller
    pub side: Side,
    /// Venue order id of the reported order
    pub order_id: String,
    /// Quoted unit price
    pub order_price: Price,
    /// Fill price in the quoted pair's unit
    pub filled_price: Price,
    /// Volume requested
    pub volume: Quantity,
    /// Volume filled
    pub filled_volume: Quantity,
    /// Spread the quote was priced with
    pub spread: Rate,
    /// Fee the quote was priced with
    pub fee: Rate,
    /// Fee taken in volume (buys)
    pub fee_volume: Quantity,
    /// Fee taken from proceeds (sells)
    pub fee_price: Price,
    /// Venue order state
    pub status: OrderStatus,
    /// Bridge rate used to normalise venue fills, absent for direct pairs
    pub bridge_rate: Option<Rate>,
    /// Insert time
    pub created_at: DateTime<Utc>,
    /// Last refresh time
    pub updated_at: DateTime<Utc>,
}

impl ExecutionLog {
    /// Whether the venue may still report further fills
    pub fn needs_refresh(&self) -> bool {
        !self.status.is_terminal()
    }

    /// Fill price expressed in the quoted pair's unit
    pub fn normalise_price(&self, venue_price: Price) -> Price {
        match self.bridge_rate {
            Some(rate) if !rate.is_zero() => venue_price / rate,
            _ => venue_price,
        }
    }

    /// Apply a venue fill to the log
    ///
    /// Records the whole order (accumulated size at the average price), not
    /// just its latest trade. Fee price is recomputed for sells only; buys
    /// paid their fee in volume at quote time.
    pub fn apply_fill(&mut self, fill: &OrderFill, now: DateTime<Utc>) {
        self.filled_price = self.normalise_price(fill.average_price());
        self.filled_volume = fill.total_volume();
        self.status = fill.status;
        if self.side == Side::Sell {
            self.fee_price = self.filled_price * self.fee;
        }
        self.updated_at = now;
    }
}

/// State of a single venue order placed for an execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum LegState {
    /// Accepted by the venue, fill not yet confirmed
    Placed,
    /// Confirmed filled
    Filled,
    /// Refused by the venue, or never filled
    Rejected,
}

impl LegState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LegState::Placed => "placed",
            LegState::Filled => "filled",
            LegState::Rejected => "rejected",
        }
    }
}

impl fmt::Display for LegState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LegState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "placed" => Ok(LegState::Placed),
            "filled" => Ok(LegState::Filled),
            "rejected" => Ok(LegState::Rejected),
            other => Err(Error::Internal(format!("Unknown leg state '{}'", other))),
        }
    }
}

/// Saga record of one venue order placed while executing a quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct ExecutionLeg {
    /// Id of the quote being executed
    pub swap_id: Uuid,
    /// 1 for the first order, 2 for the second
    pub sequence: u8,
    /// Venue instrument
    #[cfg_attr(feature = "utoipa", schema(value_type = String, example = "USDC-USDT"))]
    pub pair: Pair,
    /// Venue side
    pub side: Side,
    /// Venue order type
    pub order_type: OrderType,
    /// Order size
    pub size: Quantity,
    /// Limit price
    pub price: Option<Price>,
    /// Venue order id, absent when the venue refused the order outright
    pub order_id: Option<String>,
    /// Leg state
    pub state: LegState,
    /// Venue diagnostics for rejected legs
    pub detail: Option<String>,
    /// Last state change
    pub recorded_at: DateTime<Utc>,
}

/// Position of a quote in the execution state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionState {
    Created,
    Executing,
    Completed,
    Expired,
    Failed,
}

impl ExecutionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExecutionState::Completed | ExecutionState::Expired | ExecutionState::Failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn log(side: Side, bridge_rate: Option<Rate>) -> ExecutionLog {
        let now = Utc::now();
        ExecutionLog {
            swap_id: Uuid::new_v4(),
            pair: Pair::new("AAVE", "USDC"),
            venue_pair: Pair::new("AAVE", "USDT"),
            side,
            order_id: "1".to_string(),
            order_price: dec!(50),
            filled_price: dec!(0),
            volume: dec!(2),
            filled_volume: dec!(0),
            spread: dec!(0.01),
            fee: dec!(0.1),
            fee_volume: dec!(0),
            fee_price: dec!(0),
            status: OrderStatus::Live,
            bridge_rate,
            created_at: now,
            updated_at: now,
        }
    }

    fn fill(price: Price) -> OrderFill {
        OrderFill {
            filled_price: price,
            filled_volume: dec!(2),
            status: OrderStatus::Filled,
            avg_price: price,
            accumulated_fill_size: dec!(2),
        }
    }

    #[test]
    fn test_apply_fill_normalises_and_charges_sell_fee() {
        let mut entry = log(Side::Sell, Some(dec!(2)));
        assert!(entry.needs_refresh());

        entry.apply_fill(&fill(dec!(100)), Utc::now());

        assert_eq!(entry.filled_price, dec!(50));
        assert_eq!(entry.fee_price, dec!(5));
        assert!(!entry.needs_refresh());
    }

    #[test]
    fn test_apply_fill_leaves_buy_fee_price_untouched() {
        let mut entry = log(Side::Buy, None);
        entry.apply_fill(&fill(dec!(100)), Utc::now());

        assert_eq!(entry.filled_price, dec!(100));
        assert_eq!(entry.fee_price, dec!(0));
    }

    #[test]
    fn test_apply_fill_records_every_trade() {
        let mut entry = log(Side::Sell, Some(dec!(1.25)));
        entry.apply_fill(
            &OrderFill {
                filled_price: dec!(59),
                filled_volume: dec!(1),
                status: OrderStatus::Filled,
                avg_price: dec!(60),
                accumulated_fill_size: dec!(2),
            },
            Utc::now(),
        );

        assert_eq!(entry.filled_volume, dec!(2));
        assert_eq!(entry.filled_price, dec!(48));
        assert_eq!(entry.fee_price, dec!(4.8));
    }

    #[test]
    fn test_execution_state_wire_form() {
        let json = serde_json::to_string(&ExecutionState::Executing).unwrap();
        assert_eq!(json, "\"EXECUTING\"");
        assert!(ExecutionState::Failed.is_terminal());
        assert!(!ExecutionState::Created.is_terminal());
    }
}
