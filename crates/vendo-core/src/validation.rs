//! # Validation Module
//!
//! Input validation for vendor-entered product data and coin counts.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Console prompt                                               │
//! │  ├── Parses text into numbers / money / coins                          │
//! │  └── Re-prompts on malformed input                                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Catalog / machine (Rust)                                     │
//! │  └── THIS MODULE: Business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints (quantity, price)                               │
//! │  └── UNIQUE product code                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use vendo_core::validation::{validate_product_code, validate_quantity};
//!
//! validate_product_code("B3").unwrap();
//! validate_quantity(5, 10).unwrap();
//! ```

use crate::error::ValidationError;
use crate::money::Money;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted product code.
pub const MAX_CODE_LEN: usize = 10;

/// Longest accepted product name.
pub const MAX_NAME_LEN: usize = 100;

/// Largest price a slot can carry (the storage column limit).
pub const MAX_PRICE: Money = Money::from_stotinki(i32::MAX as u64);

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product code (the slot label the customer types).
///
/// ## Rules
/// - Must not be empty
/// - At most [`MAX_CODE_LEN`] characters
/// - Letters and digits only
///
/// ## Example
/// ```rust
/// use vendo_core::validation::validate_product_code;
///
/// assert!(validate_product_code("02").is_ok());
/// assert!(validate_product_code("B3").is_ok());
/// assert!(validate_product_code("").is_err());
/// assert!(validate_product_code("A 1").is_err());
/// ```
pub fn validate_product_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.chars().count() > MAX_CODE_LEN {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: MAX_CODE_LEN,
        });
    }

    if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters and digits".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty
/// - At most [`MAX_NAME_LEN`] characters
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a product quantity a vendor loads into a slot.
///
/// ## Rules
/// - Must be between 1 and `max` (a slot is never loaded empty)
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Vendor: Update quantity                                                │
/// │                                                                         │
/// │  Vendor enters quantity: 12                                             │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(12, 10) ← THIS FUNCTION                              │
/// │       │                                                                 │
/// │       ├── qty == 0?  → Error: "quantity must be between 1 and 10"       │
/// │       ├── qty > 10?  → Error: "quantity must be between 1 and 10"       │
/// │       └── OK → update the slot                                          │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: u32, max: u32) -> ValidationResult<()> {
    if qty == 0 || qty > max {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: max as u64,
        });
    }

    Ok(())
}

/// Validates a product price.
///
/// ## Rules
/// - Must be positive (nothing in the machine is free)
/// - Must not exceed [`MAX_PRICE`]
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if !price.is_positive() || price > MAX_PRICE {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 1,
            max: MAX_PRICE.stotinki(),
        });
    }

    Ok(())
}

/// Validates a coin count for a vendor deposit or collection.
pub fn validate_coin_count(count: u32) -> ValidationResult<()> {
    if count == 0 {
        return Err(ValidationError::OutOfRange {
            field: "coin quantity".to_string(),
            min: 1,
            max: u32::MAX as u64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_product_code() {
        assert!(validate_product_code("02").is_ok());
        assert!(validate_product_code("B3").is_ok());
        assert!(validate_product_code(" A1 ").is_ok());

        assert!(validate_product_code("").is_err());
        assert!(validate_product_code("   ").is_err());
        assert!(validate_product_code("A-1").is_err());
        assert!(validate_product_code(&"A".repeat(11)).is_err());
    }

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Coca-Cola 330ml").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(&"A".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1, 10).is_ok());
        assert!(validate_quantity(10, 10).is_ok());

        assert!(validate_quantity(0, 10).is_err());
        assert!(validate_quantity(11, 10).is_err());
    }

    #[test]
    fn test_validate_price() {
        assert!(validate_price(Money::from_stotinki(120)).is_ok());
        assert!(validate_price(Money::zero()).is_err());
        assert!(validate_price(Money::from_stotinki(i32::MAX as u64 + 1)).is_err());
    }

    #[test]
    fn test_validate_coin_count() {
        assert!(validate_coin_count(3).is_ok());
        assert!(validate_coin_count(0).is_err());
    }
}
