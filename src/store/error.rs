//! Store Errors
//!
//! Error types for persistence operations.

use chrono::NaiveDate;

/// Errors that can occur in the closing and sales stores
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A closing already exists for the business date
    #[error("Closing already recorded for {0}")]
    DuplicateClosing(NaiveDate),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored row cannot be turned back into a domain value
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Check if this error is a uniqueness conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::DuplicateClosing(_))
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Database(_))
    }
}
