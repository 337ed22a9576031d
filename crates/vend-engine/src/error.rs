//! # Engine Error Type
//!
//! What the UI layer sees when a query, command or purchase fails.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ValidationError ─► CoreError ──────────────────────┐                   │
//! │                        │                            │                   │
//! │                        ▼                            ▼                   │
//! │  sqlx::Error ─────► DbError ── Domain(e) ─────► VendError::Domain       │
//! │                        │                                                │
//! │                        └─────── anything else ─► VendError::Persistence │
//! │                                                   (logged here)         │
//! │                                                                         │
//! │  VendError::code() ─► ErrorCode  ("OUT_OF_STOCK", "NOT_FOUND", ...)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Errors are handed back verbatim. Nothing is retried.

use serde::Serialize;
use thiserror::Error;
use vend_core::{CoreError, ValidationError};
use vend_db::DbError;

/// Engine error.
#[derive(Debug, Error)]
pub enum VendError {
    /// A machine rule rejected the request. The ledgers are unchanged.
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// The store failed. During a purchase commit this means the whole
    /// purchase was rolled back.
    #[error("Persistence error: {0}")]
    Persistence(DbError),
}

/// Machine-readable error codes.
///
/// ## Usage in a UI
/// ```typescript
/// switch (e.code) {
///   case 'INSUFFICIENT_CHANGE':
///     showNotification('Please use exact change');
///     break;
///   case 'NOT_OPERATIONAL':
///     showOutOfService(e.message);
///     break;
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Bad admin input (range, duplicate name, negative stock)
    ValidationError,

    /// Unknown item
    NotFound,

    /// Item has no stock left
    OutOfStock,

    /// Exact change cannot be formed
    InsufficientChange,

    /// Reserve decrement guard missed
    InsufficientReserve,

    /// Purchase step out of order
    InvalidState,

    /// Store failure
    PersistenceError,

    /// Purchase mode refused by the operating gate
    NotOperational,
}

impl ErrorCode {
    /// Wire form, same as the serialized value.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::OutOfStock => "OUT_OF_STOCK",
            ErrorCode::InsufficientChange => "INSUFFICIENT_CHANGE",
            ErrorCode::InsufficientReserve => "INSUFFICIENT_RESERVE",
            ErrorCode::InvalidState => "INVALID_STATE",
            ErrorCode::PersistenceError => "PERSISTENCE_ERROR",
            ErrorCode::NotOperational => "NOT_OPERATIONAL",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl VendError {
    /// Error code for programmatic handling.
    pub fn code(&self) -> ErrorCode {
        match self {
            VendError::Domain(err) => match err {
                CoreError::ItemNotFound(_) => ErrorCode::NotFound,
                CoreError::OutOfStock(_) => ErrorCode::OutOfStock,
                CoreError::NegativeStock { .. } | CoreError::Validation(_) => {
                    ErrorCode::ValidationError
                }
                CoreError::InsufficientChange { .. } => ErrorCode::InsufficientChange,
                CoreError::InsufficientReserve { .. } => ErrorCode::InsufficientReserve,
                CoreError::InvalidTransition { .. } => ErrorCode::InvalidState,
                CoreError::NotOperational { .. } => ErrorCode::NotOperational,
            },
            VendError::Persistence(_) => ErrorCode::PersistenceError,
        }
    }

    /// Serializable `{ code, message }` pair.
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

/// Serialized form of a [`VendError`]:
/// ```json
/// {
///   "code": "INSUFFICIENT_CHANGE",
///   "message": "Unable to provide exact change of 17 (1 short)"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub message: String,
}

/// Store errors: ledger rule violations detected at the store become
/// domain errors again, everything else is a persistence failure.
impl From<DbError> for VendError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Domain(e) => VendError::Domain(e),
            other => {
                tracing::error!(error = %other, "Store operation failed");
                VendError::Persistence(other)
            }
        }
    }
}

impl From<ValidationError> for VendError {
    fn from(err: ValidationError) -> Self {
        VendError::Domain(CoreError::Validation(err))
    }
}

/// Result type for engine operations.
pub type VendResult<T> = Result<T, VendError>;
