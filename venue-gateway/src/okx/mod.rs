//! OKX v5 REST venue

mod api_types;
mod client;
mod config;
mod signer;

pub use client::OkxClient;
pub use config::OkxConfig;
pub use signer::{HmacSigner, RequestSigner};
