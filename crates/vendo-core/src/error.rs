//! # Error Types
//!
//! Domain-specific error types for vendo-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  vendo-core errors (this file)                                         │
//! │  ├── CoreError        - Domain failures (not found, underflow, ...)    │
//! │  └── ValidationError  - Malformed input (coin value, code, price)      │
//! │                                                                         │
//! │  vendo-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → session message → re-prompt       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## What Is NOT an Error
//! Out-of-stock and insufficient funds during a purchase are ordinary
//! branches of the purchase state machine and come back as
//! [`Evaluation`](crate::transaction::Evaluation) variants. `OutOfStock`
//! exists here only for the catalog's `decrement_stock` contract.

use thiserror::Error;

use crate::denomination::Denomination;

// =============================================================================
// Core Error
// =============================================================================

/// Core vending errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Product code does not exist in the catalog.
    #[error("Product with code {0} does not exist")]
    ProductNotFound(String),

    /// Coin value outside the machine's allowed denominations.
    ///
    /// ## When This Occurs
    /// - Storage holds a coin row the configuration no longer lists
    /// - A deposit names a value that was never validated
    ///
    /// Inserted coins are validated on insertion, so during a purchase this
    /// is a configuration bug and aborts the transaction with a full refund.
    #[error("Unknown coin denomination: {0}")]
    UnknownDenomination(u32),

    /// Product has no units left.
    #[error("Product {code} is out of stock")]
    OutOfStock { code: String },

    /// Withdrawal would take a denomination below its reserve.
    #[error(
        "Cannot withdraw {requested} x {denomination}: only {available} available above the reserve"
    )]
    InventoryUnderflow {
        denomination: Denomination,
        requested: u32,
        available: u32,
    },

    /// A product with this code is already loaded.
    #[error("Product with code {0} already exists")]
    DuplicateProduct(String),

    /// Every product slot is occupied.
    #[error("No free slots available (limit {limit})")]
    SlotLimitReached { limit: usize },

    /// Transaction is not in a state that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Inserting a coin after the customer moved on to product selection
    /// - Any operation on a completed or cancelled transaction
    #[error("Transaction is {state}, cannot {action}")]
    InvalidTransactionState {
        state: String,
        action: &'static str,
    },

    /// Machine configuration is unusable.
    #[error("Invalid machine configuration: {0}")]
    InvalidConfig(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Returns true for errors the customer can fix by trying again.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CoreError::Validation(_) | CoreError::ProductNotFound(_) | CoreError::OutOfStock { .. }
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: u64, max: u64 },

    /// Invalid format (e.g., non-numeric coin, malformed price).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InventoryUnderflow {
            denomination: Denomination::new(50),
            requested: 3,
            available: 1,
        };
        assert_eq!(
            err.to_string(),
            "Cannot withdraw 3 x 50st: only 1 available above the reserve"
        );

        let err = CoreError::ProductNotFound("A7".to_string());
        assert_eq!(err.to_string(), "Product with code A7 does not exist");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "code".to_string(),
        };
        assert_eq!(err.to_string(), "code is required");

        let err = ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: 10,
        };
        assert_eq!(err.to_string(), "quantity must be between 1 and 10");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "code".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert!(core_err.is_recoverable());
    }

    #[test]
    fn test_unknown_denomination_is_not_recoverable() {
        assert!(!CoreError::UnknownDenomination(7).is_recoverable());
    }
}
