//! Closing submission
//!
//! What the operator sends when closing the drawer. Difference and state
//! are deliberately absent: the server computes them from its own
//! expected cash, so any such fields in the payload are ignored.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{CashAmount, DenominationBreakdown, DomainError, MAX_OBSERVATIONS_LEN};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosingSubmission {
    pub counted_cash: CashAmount,
    #[serde(default)]
    pub observations: Option<String>,
    #[serde(default)]
    pub count_duration_seconds: Option<u32>,
    #[serde(default)]
    pub denomination_breakdown: Option<DenominationBreakdown>,
    #[serde(default)]
    pub security_acknowledged: bool,
    /// Defaults to today (UTC)
    #[serde(default)]
    pub business_date: Option<NaiveDate>,
}

impl ClosingSubmission {
    pub fn new(counted_cash: CashAmount) -> Self {
        Self {
            counted_cash,
            observations: None,
            count_duration_seconds: None,
            denomination_breakdown: None,
            security_acknowledged: false,
            business_date: None,
        }
    }

    pub fn acknowledged(mut self) -> Self {
        self.security_acknowledged = true;
        self
    }

    pub fn with_observations(mut self, observations: impl Into<String>) -> Self {
        self.observations = Some(observations.into());
        self
    }

    pub fn with_duration(mut self, seconds: u32) -> Self {
        self.count_duration_seconds = Some(seconds);
        self
    }

    pub fn with_breakdown(mut self, breakdown: DenominationBreakdown) -> Self {
        self.denomination_breakdown = Some(breakdown);
        self
    }

    pub fn for_date(mut self, date: NaiveDate) -> Self {
        self.business_date = Some(date);
        self
    }

    /// Form-level preconditions checked before the engine runs.
    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(observations) = &self.observations {
            let len = observations.chars().count();
            if len > MAX_OBSERVATIONS_LEN {
                return Err(DomainError::ObservationsTooLong(len));
            }
        }

        if !self.security_acknowledged {
            return Err(DomainError::SecurityNotAcknowledged);
        }

        Ok(())
    }

    /// Observations trimmed, with blank text treated as absent
    pub fn clean_observations(&self) -> Option<String> {
        self.observations
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}
