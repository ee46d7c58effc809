//! Error types for the swap desk
//!
//! This module provides a unified error handling system for every crate in
//! the workspace. It defines the error taxonomy surfaced to callers of the
//! quoting and execution services and provides consistent error conversion.

use std::fmt::Display;
use thiserror::Error;

/// Swap desk error type
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or missing caller input
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Unknown quote id
    #[error("Quote not found: {0}")]
    QuoteNotFound(String),

    /// Unknown order id or order without an execution log
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// The venue does not list the requested instrument
    #[error("Pair not listed on venue: {0}")]
    PairNotListed(String),

    /// Quote is past its expiry and can no longer be executed
    #[error("Quote expired: {0}")]
    QuoteExpired(String),

    /// Quote already has an execution attempt on record
    #[error("Quote already executed: {0}")]
    AlreadyExecuted(String),

    /// Available venue balance does not cover the instrument being sold
    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),

    /// The venue refused an order
    #[error("Venue rejected order: code {code}: {message}")]
    VenueRejected {
        /// Top level venue response code
        code: String,
        /// Human-readable message, including any dangling-leg notice
        message: String,
        /// Per-order status code reported by the venue
        s_code: String,
        /// Per-order status message reported by the venue
        s_msg: String,
        /// Venue order id when one was assigned
        order_id: String,
    },

    /// A leg that later legs depend on never reached a filled state
    #[error("Leg incomplete: {0}")]
    LegIncomplete(String),

    /// Transport or authentication failure talking to the venue
    #[error("Venue unavailable: {0}")]
    GatewayUnavailable(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Database migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Decimal conversion error
    #[error("Decimal conversion error: {0}")]
    DecimalError(String),
}

impl Error {
    /// Build a venue rejection that carries only a code and message
    pub fn venue_rejected(code: impl Into<String>, message: impl Into<String>) -> Self {
        Error::VenueRejected {
            code: code.into(),
            message: message.into(),
            s_code: String::new(),
            s_msg: String::new(),
            order_id: String::new(),
        }
    }

    /// Whether the caller may retry the same request later
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::GatewayUnavailable(_))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait to add context to error results
pub trait ErrorExt<T> {
    /// Add context information to an error
    fn with_context<C, F>(self, context_fn: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display;
}

impl<T> ErrorExt<T> for Result<T> {
    fn with_context<C, F>(self, context_fn: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display,
    {
        self.map_err(|e| {
            let context = context_fn().to_string();
            match e {
                Error::ValidationError(msg) => Error::ValidationError(format!("{}: {}", context, msg)),
                Error::QuoteNotFound(msg) => Error::QuoteNotFound(format!("{}: {}", context, msg)),
                Error::OrderNotFound(msg) => Error::OrderNotFound(format!("{}: {}", context, msg)),
                Error::PairNotListed(msg) => Error::PairNotListed(format!("{}: {}", context, msg)),
                Error::QuoteExpired(msg) => Error::QuoteExpired(format!("{}: {}", context, msg)),
                Error::AlreadyExecuted(msg) => Error::AlreadyExecuted(format!("{}: {}", context, msg)),
                Error::InsufficientBalance(msg) => Error::InsufficientBalance(format!("{}: {}", context, msg)),
                Error::VenueRejected { code, message, s_code, s_msg, order_id } => Error::VenueRejected {
                    code,
                    message: format!("{}: {}", context, message),
                    s_code,
                    s_msg,
                    order_id,
                },
                Error::LegIncomplete(msg) => Error::LegIncomplete(format!("{}: {}", context, msg)),
                Error::GatewayUnavailable(msg) => Error::GatewayUnavailable(format!("{}: {}", context, msg)),
                Error::ConfigurationError(msg) => Error::ConfigurationError(format!("{}: {}", context, msg)),
                Error::Internal(msg) => Error::Internal(format!("{}: {}", context, msg)),
                Error::Database(e) => Error::Database(e),
                Error::Migration(e) => Error::Migration(e),
                Error::Serialization(e) => Error::Serialization(e),
                Error::DecimalError(msg) => Error::DecimalError(format!("{}: {}", context, msg)),
            }
        })
    }
}

/// Trait for converting other error types to our Error type
pub trait IntoError {
    /// Convert to Error
    fn into_error(self, message: &str) -> Error;
}

impl<E: std::error::Error> IntoError for E {
    fn into_error(self, message: &str) -> Error {
        Error::Internal(format!("{}: {}", message, self))
    }
}

/// Convert string messages into an error
impl From<String> for Error {
    fn from(message: String) -> Self {
        Error::Internal(message)
    }
}

/// Convert static string references into an error
impl From<&str> for Error {
    fn from(message: &str) -> Self {
        Error::Internal(message.to_string())
    }
}

/// From rust_decimal::Error
impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::DecimalError(err.to_string())
    }
}
