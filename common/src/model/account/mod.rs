//! Venue account models

use serde::{Deserialize, Serialize};

use crate::decimal::Quantity;
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Balance of one asset on the venue account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct Balance {
    /// Asset symbol (e.g., "BTC", "USDT")
    pub asset: String,
    /// Available balance (not locked in orders)
    pub available: Quantity,
}

impl Balance {
    /// Create a balance
    pub fn new(asset: impl Into<String>, available: Quantity) -> Self {
        Self {
            asset: asset.into(),
            available,
        }
    }

    /// Whether the available amount covers `amount`
    pub fn covers(&self, amount: Quantity) -> bool {
        self.available >= amount
    }
}
