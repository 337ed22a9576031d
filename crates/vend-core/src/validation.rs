//! # Validation Module
//!
//! Input checks for admin commands. Every check runs before the store is
//! touched, so a rejected command never leaves a partial mutation.
//!
//! ## Limits
//! ```text
//! ┌───────────────────────────┬──────────────┐
//! │ item name                 │ 1..=100 chars│
//! │ price (add item)          │ 1..=10000    │
//! │ initial stock (add item)  │ 0..=1000     │
//! │ restock amount            │ 0..=1000     │
//! │ change refill amount      │ 0..=1000     │
//! └───────────────────────────┴──────────────┘
//! ```

use crate::cash::{Denomination, CHANGE_DENOMINATIONS};
use crate::error::ValidationError;
use crate::types::normalize_name;
use crate::{MAX_INITIAL_STOCK, MAX_NAME_LEN, MAX_PRICE, MAX_REFILL_AMOUNT, MAX_RESTOCK_AMOUNT};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates an item name and returns its normalized (lowercase) form.
///
/// ## Example
/// ```rust
/// use vend_core::validation::validate_item_name;
///
/// assert_eq!(validate_item_name(" Cola ").unwrap(), "cola");
/// assert!(validate_item_name("   ").is_err());
/// ```
pub fn validate_item_name(name: &str) -> ValidationResult<String> {
    let name = normalize_name(name);

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

    Ok(name)
}

/// Validates an item price. Prices are strictly positive.
pub fn validate_price(price: i64) -> ValidationResult<()> {
    check_range("price", price, 1, MAX_PRICE)
}

/// Validates the stock given to a newly added item.
pub fn validate_initial_stock(stock: i64) -> ValidationResult<()> {
    check_range("stock", stock, 0, MAX_INITIAL_STOCK)
}

/// Validates a restock amount.
pub fn validate_restock_amount(amount: i64) -> ValidationResult<()> {
    check_range("amount", amount, 0, MAX_RESTOCK_AMOUNT)
}

/// Validates a change refill: the amount range, and that the denomination is
/// one the change reserve holds (100 is never refilled).
pub fn validate_refill(denomination: Denomination, amount: i64) -> ValidationResult<()> {
    if !denomination.is_change() {
        return Err(ValidationError::NotAllowed {
            field: "denomination".to_string(),
            allowed: CHANGE_DENOMINATIONS
                .iter()
                .map(|d| d.label().to_string())
                .collect(),
        });
    }

    check_range("amount", amount, 0, MAX_REFILL_AMOUNT)
}

fn check_range(field: &str, value: i64, min: i64, max: i64) -> ValidationResult<()> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min,
            max,
        });
    }
    Ok(())
}
