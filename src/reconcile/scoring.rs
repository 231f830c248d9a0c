//! Precision, risk and counting-efficiency scores.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ScoringThresholds;

/// Coarse review flag derived from the relative size of the difference
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Band for the time the operator spent counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EfficiencyBand {
    Excellent,
    Good,
    Fair,
    Slow,
    Unmeasured,
}

/// `|difference| / expected * 100`, or `None` when nothing was expected.
///
/// A ratio too large to represent saturates at `Decimal::MAX`.
pub fn difference_ratio_percent(difference: Decimal, expected_cash: Decimal) -> Option<Decimal> {
    if expected_cash <= Decimal::ZERO {
        return None;
    }
    let ratio = difference
        .abs()
        .checked_div(expected_cash)
        .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::MAX);
    Some(ratio)
}

/// Precision score in `[0, 100]`; 100 when nothing was expected.
pub fn compute_precision(difference: Decimal, expected_cash: Decimal) -> Decimal {
    match difference_ratio_percent(difference, expected_cash) {
        None => Decimal::ONE_HUNDRED,
        Some(ratio) => (Decimal::ONE_HUNDRED - ratio)
            .max(Decimal::ZERO)
            .min(Decimal::ONE_HUNDRED),
    }
}

/// Risk tier; the lower bound of each higher tier is inclusive.
pub fn compute_risk_level(
    difference: Decimal,
    expected_cash: Decimal,
    thresholds: &ScoringThresholds,
) -> RiskLevel {
    match difference_ratio_percent(difference, expected_cash) {
        None => RiskLevel::Low,
        Some(ratio) if ratio >= thresholds.risk_high_percent => RiskLevel::High,
        Some(ratio) if ratio >= thresholds.risk_medium_percent => RiskLevel::Medium,
        Some(_) => RiskLevel::Low,
    }
}

/// Counting-time band; `None` and zero mean the count was not timed.
pub fn compute_efficiency_band(
    count_duration_seconds: Option<u32>,
    thresholds: &ScoringThresholds,
) -> EfficiencyBand {
    match count_duration_seconds {
        None | Some(0) => EfficiencyBand::Unmeasured,
        Some(secs) if secs < thresholds.efficiency_excellent_secs => EfficiencyBand::Excellent,
        Some(secs) if secs < thresholds.efficiency_good_secs => EfficiencyBand::Good,
        Some(secs) if secs < thresholds.efficiency_fair_secs => EfficiencyBand::Fair,
        Some(_) => EfficiencyBand::Slow,
    }
}
