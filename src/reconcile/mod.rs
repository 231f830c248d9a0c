//! Reconciliation engine
//!
//! Pure functions that classify a cash-drawer count against the expected
//! cash. Every call is stateless: the same input always yields the same
//! result, so records can be re-classified at read time without storing
//! the derived values.

pub mod classify;
pub mod recommendations;
pub mod scoring;
pub mod thresholds;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{CashAmount, DomainError};

pub use classify::{classify_difference, DifferenceClassification, ReconciliationState};
pub use recommendations::{
    evaluate_rules, generate_recommendations, Priority, Recommendation, RecommendationContext,
    RecommendationKind, RecommendationRule, DEFAULT_RULES,
};
pub use scoring::{
    compute_efficiency_band, compute_precision, compute_risk_level, difference_ratio_percent,
    EfficiencyBand, RiskLevel,
};
pub use thresholds::ScoringThresholds;

/// Everything the engine needs for one drawer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationInput {
    pub expected_cash: CashAmount,
    pub counted_cash: CashAmount,
    #[serde(default)]
    pub count_duration_seconds: Option<u32>,
    /// Total of a manual denomination count, if one was done
    #[serde(default)]
    pub manual_count_total: Option<Decimal>,
}

impl ReconciliationInput {
    pub fn new(expected_cash: CashAmount, counted_cash: CashAmount) -> Self {
        Self {
            expected_cash,
            counted_cash,
            count_duration_seconds: None,
            manual_count_total: None,
        }
    }

    pub fn with_duration(mut self, seconds: u32) -> Self {
        self.count_duration_seconds = Some(seconds);
        self
    }

    pub fn with_manual_count(mut self, total: Decimal) -> Self {
        self.manual_count_total = Some(total);
        self
    }
}

/// Classified outcome of one drawer count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    pub expected_cash: Decimal,
    pub counted_cash: Decimal,
    pub difference: Decimal,
    pub state: ReconciliationState,
    pub message: String,
    pub precision_percent: Decimal,
    pub risk_level: RiskLevel,
    pub efficiency_band: EfficiencyBand,
    pub recommendations: Vec<Recommendation>,
}

/// Run every engine step for one input.
pub fn reconcile(
    input: &ReconciliationInput,
    thresholds: &ScoringThresholds,
) -> Result<ReconciliationResult, DomainError> {
    let expected = input.expected_cash.value();
    let counted = input.counted_cash.value();

    let classification = classify_difference(expected, counted)?;
    let precision_percent = compute_precision(classification.difference, expected);
    let risk_level = compute_risk_level(classification.difference, expected, thresholds);
    let efficiency_band = compute_efficiency_band(input.count_duration_seconds, thresholds);

    let recommendations = generate_recommendations(
        &RecommendationContext {
            state: classification.state,
            precision_percent,
            count_duration_seconds: input.count_duration_seconds,
            manual_count_total: input.manual_count_total,
            entered_total: Some(counted),
        },
        thresholds,
    );

    Ok(ReconciliationResult {
        expected_cash: expected,
        counted_cash: counted,
        difference: classification.difference,
        state: classification.state,
        message: classification.message,
        precision_percent,
        risk_level,
        efficiency_band,
        recommendations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn amount(value: Decimal) -> CashAmount {
        CashAmount::new(value).unwrap()
    }

    fn run(expected: Decimal, counted: Decimal) -> ReconciliationResult {
        let input = ReconciliationInput::new(amount(expected), amount(counted));
        reconcile(&input, &ScoringThresholds::default()).unwrap()
    }

    #[test]
    fn test_scenario_balanced() {
        let result = run(dec!(100.00), dec!(100.00));
        assert_eq!(result.difference, Decimal::ZERO);
        assert_eq!(result.state, ReconciliationState::Balanced);
        assert_eq!(result.precision_percent, dec!(100));
        assert_eq!(result.risk_level, RiskLevel::Low);
        assert_eq!(result.efficiency_band, EfficiencyBand::Unmeasured);
        assert!(result.recommendations.is_empty());
    }

    #[test]
    fn test_scenario_large_shortage() {
        let result = run(dec!(100.00), dec!(88.00));
        assert_eq!(result.difference, dec!(-12.00));
        assert_eq!(result.state, ReconciliationState::Shortage);
        assert_eq!(result.precision_percent, dec!(88.0));
        assert_eq!(result.risk_level, RiskLevel::High);
        assert_eq!(result.message, "Shortage of $12.00");
    }

    #[test]
    fn test_scenario_small_shortage() {
        let result = run(dec!(100.00), dec!(97.00));
        assert_eq!(result.difference, dec!(-3.00));
        assert_eq!(result.state, ReconciliationState::Shortage);
        assert_eq!(result.precision_percent, dec!(97.0));
        assert_eq!(result.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_scenario_no_cash_sales() {
        let result = run(dec!(0.00), dec!(0.00));
        assert_eq!(result.difference, Decimal::ZERO);
        assert_eq!(result.state, ReconciliationState::Balanced);
        assert_eq!(result.precision_percent, dec!(100));
        assert_eq!(result.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_scenario_slow_surplus() {
        let input = ReconciliationInput::new(amount(dec!(200.00)), amount(dec!(215.00)))
            .with_duration(700);
        let result = reconcile(&input, &ScoringThresholds::default()).unwrap();

        assert_eq!(result.difference, dec!(15.00));
        assert_eq!(result.state, ReconciliationState::Surplus);
        assert_eq!(result.precision_percent, dec!(92.5));
        assert_eq!(result.risk_level, RiskLevel::Medium);
        assert_eq!(result.efficiency_band, EfficiencyBand::Slow);

        let kinds: Vec<_> = result.recommendations.iter().map(|r| r.kind).collect();
        assert!(kinds.contains(&RecommendationKind::VerifyDuplicateSales));
        assert!(kinds.contains(&RecommendationKind::OptimizeCountingTime));
    }

    #[test]
    fn test_manual_count_mismatch_flows_through() {
        let input = ReconciliationInput::new(amount(dec!(50)), amount(dec!(50)))
            .with_manual_count(dec!(45));
        let result = reconcile(&input, &ScoringThresholds::default()).unwrap();

        assert_eq!(result.state, ReconciliationState::Balanced);
        assert_eq!(result.recommendations.len(), 1);
        assert_eq!(result.recommendations[0].kind, RecommendationKind::ManualCountMismatch);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let input = ReconciliationInput::new(amount(dec!(321.10)), amount(dec!(300)))
            .with_duration(250)
            .with_manual_count(dec!(300));
        let thresholds = ScoringThresholds::default();

        assert_eq!(
            reconcile(&input, &thresholds).unwrap(),
            reconcile(&input, &thresholds).unwrap()
        );
    }
}
