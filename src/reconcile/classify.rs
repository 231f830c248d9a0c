//! Difference classification
//!
//! Turns expected vs. counted cash into a signed, cent-rounded difference
//! and one of three drawer states.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::amount::MONEY_SCALE;
use crate::domain::{format_currency, round_money, DomainError};

/// Outcome of a drawer count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationState {
    /// Counted equals expected
    Balanced,
    /// Counted below expected
    Shortage,
    /// Counted above expected
    Surplus,
}

impl ReconciliationState {
    /// State for an already-rounded difference
    pub fn from_difference(difference: Decimal) -> Self {
        if difference.is_zero() {
            ReconciliationState::Balanced
        } else if difference.is_sign_negative() {
            ReconciliationState::Shortage
        } else {
            ReconciliationState::Surplus
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReconciliationState::Balanced => "balanced",
            ReconciliationState::Shortage => "shortage",
            ReconciliationState::Surplus => "surplus",
        }
    }
}

impl std::fmt::Display for ReconciliationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of [`classify_difference`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifferenceClassification {
    /// `counted - expected`, rounded half-up to cents
    pub difference: Decimal,
    pub state: ReconciliationState,
    /// Display text, e.g. "Shortage of $12.50"
    pub message: String,
}

/// Classify the gap between expected and counted cash.
///
/// # Errors
/// `DomainError::InvalidInput` if either amount is negative.
pub fn classify_difference(
    expected_cash: Decimal,
    counted_cash: Decimal,
) -> Result<DifferenceClassification, DomainError> {
    ensure_non_negative("expected cash", expected_cash)?;
    ensure_non_negative("counted cash", counted_cash)?;

    let mut difference = round_money(counted_cash - expected_cash);
    if difference.is_zero() {
        // No "-0.00"
        difference = Decimal::ZERO;
    }
    difference.rescale(MONEY_SCALE);
    let state = ReconciliationState::from_difference(difference);
    let message = match state {
        ReconciliationState::Balanced => "Balanced".to_string(),
        ReconciliationState::Shortage => {
            format!("Shortage of {}", format_currency(difference.abs()))
        }
        ReconciliationState::Surplus => {
            format!("Surplus of {}", format_currency(difference.abs()))
        }
    };

    Ok(DifferenceClassification {
        difference,
        state,
        message,
    })
}

pub(crate) fn ensure_non_negative(field: &str, value: Decimal) -> Result<(), DomainError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(DomainError::invalid_input(format!(
            "{} must not be negative (got {})",
            field, value
        )));
    }
    Ok(())
}
