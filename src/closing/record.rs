//! Closing record
//!
//! The persisted result of one drawer closing. Derived classification is
//! not stored as truth: it is recomputed from the amounts on every read.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{CashAmount, DenominationBreakdown, DomainError, PaymentSummary};
use crate::reconcile::{reconcile, ReconciliationInput, ReconciliationResult, ScoringThresholds};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosingRecord {
    pub id: Uuid,
    pub business_date: NaiveDate,
    pub operator: String,
    pub expected_cash: Decimal,
    pub counted_cash: Decimal,
    /// Server-computed difference, kept for SQL reporting
    pub difference: Decimal,
    pub observations: Option<String>,
    pub count_duration_seconds: Option<u32>,
    pub denomination_breakdown: Option<DenominationBreakdown>,
    pub payment_summary: PaymentSummary,
    pub security_acknowledged: bool,
    pub closed_at: DateTime<Utc>,
}

impl ClosingRecord {
    /// Engine input rebuilt from the stored amounts
    pub fn reconciliation_input(&self) -> Result<ReconciliationInput, DomainError> {
        let mut input = ReconciliationInput::new(
            CashAmount::new(self.expected_cash)?,
            CashAmount::new(self.counted_cash)?,
        );
        input.count_duration_seconds = self.count_duration_seconds;
        input.manual_count_total = self
            .denomination_breakdown
            .as_ref()
            .map(DenominationBreakdown::total)
            .transpose()?;
        Ok(input)
    }

    /// Re-derive the classification of this record.
    pub fn classify(&self, thresholds: &ScoringThresholds) -> Result<ReconciliationResult, DomainError> {
        reconcile(&self.reconciliation_input()?, thresholds)
    }
}

/// A record together with its derived classification
#[derive(Debug, Clone, Serialize)]
pub struct ClosingView {
    #[serde(flatten)]
    pub record: ClosingRecord,
    pub reconciliation: ReconciliationResult,
}

impl ClosingView {
    pub fn build(record: ClosingRecord, thresholds: &ScoringThresholds) -> Result<Self, DomainError> {
        let reconciliation = record.classify(thresholds)?;
        Ok(Self {
            record,
            reconciliation,
        })
    }
}
