//! Unified error type for the storefront core.
//!
//! Every fallible operation returns [`Result`]. Absent records (unknown dish id,
//! unknown order code) are reported as `Ok(None)` rather than as an error.

use crate::core::status::OrderStatus;
use thiserror::Error;

/// All errors the storefront core can surface to a caller.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Caller-supplied input was rejected (empty cart, missing customer field, ...)
    #[error("Validation error: {message}")]
    Validation {
        /// Human-readable reason shown to the customer or admin
        message: String,
    },

    /// An admin edit referenced a dish that does not exist
    #[error("Dish not found: {id}")]
    DishNotFound {
        /// The dish id that was requested
        id: String,
    },

    /// An order with this code is already stored
    #[error("Order code already in use: {code}")]
    DuplicateCode {
        /// The colliding order code
        code: String,
    },

    /// An authoritative status write tried to move an order backwards
    #[error("Order status cannot move from {from} back to {to}")]
    StatusRegression {
        /// Status currently stored
        from: OrderStatus,
        /// Status that was requested
        to: OrderStatus,
    },

    /// The durable copy could not be written or read
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// A persisted slot held data that could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem error while reading configuration
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A required environment variable was missing or invalid
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

impl Error {
    /// Shorthand for building a [`Error::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Whether the failure happened while talking to durable storage.
    ///
    /// Callers use this to warn that the cart or order may not survive a reload.
    #[must_use]
    pub const fn is_persistence(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Serialization(_))
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
