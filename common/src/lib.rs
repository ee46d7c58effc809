//! Common types and utilities for the swap desk
//!
//! This library contains shared types, utilities, and abstractions used across
//! the swap desk crates. It provides a unified approach to error handling,
//! database bootstrap, and the domain models for pairs, quotes and executions.

pub mod error;
pub mod model;
pub mod decimal;
pub mod db;

/// Re-export important types
pub use error::{Error, Result, ErrorExt, IntoError};
pub use decimal::*;

// Re-export utoipa for use in model ToSchema derives
#[cfg(feature = "utoipa")]
pub use utoipa;
