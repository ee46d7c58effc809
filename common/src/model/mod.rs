//! Domain models for the swap desk

pub mod market;
pub mod order;
pub mod account;
pub mod quote;
pub mod execution;

pub use market::{MarketSnapshot, Pair, Ticker};
pub use order::{OrderFill, OrderRequest, OrderStatus, OrderType, PlacedOrder, Side};
pub use account::Balance;
pub use quote::{Quote, QuoteDefaults};
pub use execution::{ExecutionLeg, ExecutionLog, ExecutionState, LegState};
