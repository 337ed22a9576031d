//! # Error Types
//!
//! Domain-specific error types for vend-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  vend-core errors (this file)                                          │
//! │  ├── CoreError        - Ledger and purchase rule violations            │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  vend-db errors (separate crate)                                       │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  vend-engine errors                                                    │
//! │  └── VendError        - What the UI layer sees (with an ErrorCode)     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → VendError → UI          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Every variant is reported to the caller verbatim. None of them is retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// No item with this (normalized) name exists.
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// The selected item has no stock left.
    ///
    /// ## When This Occurs
    /// - Purchase entry with `stock <= 0` (no tender loop is started)
    /// - Commit finds the stock already at zero (late detection)
    #[error("Item '{0}' is out of stock")]
    OutOfStock(String),

    /// A stock adjustment would drive the count below zero.
    #[error("Stock for '{item}' cannot go negative: current {current}, delta {delta}")]
    NegativeStock {
        item: String,
        current: i64,
        delta: i64,
    },

    /// Exact change cannot be formed from the cash reserve.
    ///
    /// ## User Workflow
    /// ```text
    /// Tender 20 + 20 for a 23 item
    ///      │
    ///      ▼
    /// change_due = 17, reserve {10:0, 5:3, 1:1}
    ///      │
    ///      ▼
    /// 5×3 + 1×1 = 16, shortfall 1
    ///      │
    ///      ▼
    /// InsufficientChange { change_due: 17, shortfall: 1 }
    ///      │
    ///      ▼
    /// No ledger touched, tender is handed back
    /// ```
    #[error("Unable to provide exact change of {change_due} ({shortfall} short)")]
    InsufficientChange { change_due: i64, shortfall: i64 },

    /// A reserve decrement would drive a denomination count below zero.
    ///
    /// The change algorithm pre-checks the reserve, so this is a late-detected
    /// invariant violation.
    #[error("Cash reserve for {denomination} cannot cover {requested} (available {available})")]
    InsufficientReserve {
        denomination: String,
        available: i64,
        requested: i64,
    },

    /// A purchase step was attempted from a state that does not allow it.
    ///
    /// ## When This Occurs
    /// - Inserting tender after the purchase already completed
    /// - Committing before change was computed
    #[error("Purchase is {state}, cannot {action}")]
    InvalidTransition { state: String, action: String },

    /// The operating condition gate refused purchase mode.
    #[error("Vending machine is not operational: {reasons}")]
    NotOperational { reasons: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any mutation is attempted.
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
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., duplicate item name).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

impl ValidationError {
    /// Creates the duplicate-item error raised by the inventory ledger.
    pub fn duplicate_item(name: impl Into<String>) -> Self {
        ValidationError::Duplicate {
            field: "item".to_string(),
            value: name.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
