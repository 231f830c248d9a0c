//! Scoring thresholds
//!
//! Provisional business defaults for risk tiers, counting-time bands and
//! recommendation triggers. Overridable through `Config`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Tunable limits used by the scoring functions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringThresholds {
    /// Difference ratio (percent) from which risk is Medium
    pub risk_medium_percent: Decimal,
    /// Difference ratio (percent) from which risk is High
    pub risk_high_percent: Decimal,
    /// Counts shorter than this are Excellent
    pub efficiency_excellent_secs: u32,
    /// Counts shorter than this are Good
    pub efficiency_good_secs: u32,
    /// Counts shorter than this are Fair, longer are Slow
    pub efficiency_fair_secs: u32,
    /// Precision below this triggers "improve counting process"
    pub precision_review_percent: Decimal,
    /// Counts longer than this trigger "optimize counting time"
    pub slow_count_alert_secs: u32,
}

impl Default for ScoringThresholds {
    fn default() -> Self {
        Self {
            risk_medium_percent: Decimal::from(5),
            risk_high_percent: Decimal::from(10),
            efficiency_excellent_secs: 120,
            efficiency_good_secs: 300,
            efficiency_fair_secs: 600,
            precision_review_percent: Decimal::from(90),
            slow_count_alert_secs: 600,
        }
    }
}

impl ScoringThresholds {
    /// Check that tiers are ordered and within range.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.risk_medium_percent <= Decimal::ZERO
            || self.risk_medium_percent >= self.risk_high_percent
        {
            return Err(DomainError::InvalidThresholds(format!(
                "risk tiers must satisfy 0 < medium ({}) < high ({})",
                self.risk_medium_percent, self.risk_high_percent
            )));
        }

        if !(self.efficiency_excellent_secs < self.efficiency_good_secs
            && self.efficiency_good_secs < self.efficiency_fair_secs)
        {
            return Err(DomainError::InvalidThresholds(format!(
                "efficiency bands must satisfy excellent ({}) < good ({}) < fair ({})",
                self.efficiency_excellent_secs,
                self.efficiency_good_secs,
                self.efficiency_fair_secs
            )));
        }

        if self.precision_review_percent < Decimal::ZERO
            || self.precision_review_percent > Decimal::ONE_HUNDRED
        {
            return Err(DomainError::InvalidThresholds(format!(
                "precision review threshold {} outside [0, 100]",
                self.precision_review_percent
            )));
        }

        Ok(())
    }
}
