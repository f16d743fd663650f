//! Domain error types.

use thiserror::Error;

/// Errors from cart mutation and pricing arithmetic.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommerceError {
    /// Line item not found in the cart.
    #[error("Line item not in cart: {0}")]
    LineNotInCart(String),

    /// Quantity must be positive.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// Quantity exceeds the per-line cap.
    #[error("Quantity {0} exceeds maximum allowed ({1})")]
    QuantityExceedsLimit(i64, i64),

    /// Unit price must not be negative.
    #[error("Invalid unit price: {0}")]
    InvalidUnitPrice(i64),

    /// Mixed currencies in one cart.
    #[error("Currency mismatch: expected {expected}, got {got}")]
    CurrencyMismatch { expected: String, got: String },

    /// Arithmetic overflow in money calculation.
    #[error("Arithmetic overflow in money calculation")]
    Overflow,

    /// Cart persistence failure.
    #[error("Cart storage error: {0}")]
    Storage(String),

    /// Serialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for CommerceError {
    fn from(e: serde_json::Error) -> Self {
        CommerceError::Serialization(e.to_string())
    }
}

impl From<std::io::Error> for CommerceError {
    fn from(e: std::io::Error) -> Self {
        CommerceError::Storage(e.to_string())
    }
}
