//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use chrono::NaiveDate;
use thiserror::Error;

use super::AmountError;

/// Maximum length of the observations field of a closing
pub const MAX_OBSERVATIONS_LEN: usize = 500;

/// Domain-specific errors
///
/// These errors represent caller contract violations and business rule
/// failures. They are independent of the web/infrastructure layer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Negative, non-finite or malformed input reached the engine
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Observations longer than allowed
    #[error("Observations exceed {MAX_OBSERVATIONS_LEN} characters (got {0})")]
    ObservationsTooLong(usize),

    /// Operator did not acknowledge the security checklist
    #[error("Security checklist must be acknowledged before closing")]
    SecurityNotAcknowledged,

    /// A closing for this business date is already on record
    #[error("A closing for {0} already exists")]
    ClosingAlreadyExists(NaiveDate),

    /// Sale for a business date whose drawer is already closed
    #[error("Business date {0} is already closed")]
    BusinessDateClosed(NaiveDate),

    /// Closing record not found
    #[error("Closing not found: {0}")]
    ClosingNotFound(String),

    /// Workflow is already submitted and can no longer change
    #[error("Closing already submitted")]
    ClosingAlreadySubmitted,

    /// Workflow transition not allowed from the current stage
    #[error("Invalid stage transition: {from} -> {to}")]
    InvalidStageTransition { from: String, to: String },

    /// Scoring thresholds are not ordered
    #[error("Invalid thresholds: {0}")]
    InvalidThresholds(String),
}

impl DomainError {
    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Check if this is a client error (caller's fault)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_)
                | Self::ObservationsTooLong(_)
                | Self::SecurityNotAcknowledged
                | Self::InvalidStageTransition { .. }
        )
    }

    /// Check if this is a conflict with existing state
    pub fn is_conflict_error(&self) -> bool {
        matches!(
            self,
            Self::ClosingAlreadyExists(_)
                | Self::BusinessDateClosed(_)
                | Self::ClosingAlreadySubmitted
        )
    }
}

impl From<AmountError> for DomainError {
    fn from(err: AmountError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_invalid_input_error() {
        let err = DomainError::invalid_input("expected cash is negative");

        assert!(err.is_client_error());
        assert!(!err.is_conflict_error());
        assert!(err.to_string().contains("expected cash"));
    }

    #[test]
    fn test_amount_error_maps_to_invalid_input() {
        let err: DomainError = AmountError::Negative(Decimal::NEGATIVE_ONE).into();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn test_duplicate_closing_is_conflict() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let err = DomainError::ClosingAlreadyExists(date);

        assert!(!err.is_client_error());
        assert!(err.is_conflict_error());
        assert!(err.to_string().contains("2026-03-14"));
        assert!(DomainError::BusinessDateClosed(date).is_conflict_error());
    }
}
