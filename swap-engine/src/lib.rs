//! Swap quoting and execution engine
//!
//! Prices pairs from venue tickers with a spread and fee, persists quotes with
//! an expiry, and executes them as one direct order or two bridged legs.

pub mod config;
pub mod defaults;
mod engine;
pub mod execution;
pub mod price;
pub mod quote;
pub mod routing;

pub use config::SwapEngineConfig;
pub use defaults::DefaultsHandle;
pub use engine::SwapEngine;
pub use execution::{ExecutionReceipt, StatusLookup, SwapExecutionService};
pub use price::{PriceEngine, PriceQuote};
pub use quote::{BuyTerms, QuoteRequest, SellTerms, SwapQuote, SwapQuoteService};
pub use routing::{RoutingTable, SwapRoute};
