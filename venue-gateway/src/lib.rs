//! Gateways to the external spot venue
//!
//! The swap engine only talks to the venue through [`MarketDataGateway`] and
//! [`OrderGateway`]. Two implementations ship: an OKX v5 REST client and an
//! in-process simulated venue used by tests and demo mode.

mod gateway;
pub mod okx;
pub mod simulated;

pub use gateway::{MarketDataGateway, OrderGateway};
pub use okx::{HmacSigner, OkxClient, OkxConfig, RequestSigner};
pub use simulated::{FillMode, SimulatedVenue};
