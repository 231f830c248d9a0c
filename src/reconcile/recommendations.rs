//! Advisory recommendations
//!
//! An ordered table of `(predicate, recommendation)` rules. Every rule is
//! evaluated in table order and every match is emitted. Recommendations
//! are advice for the operator and never block a submission.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ReconciliationState, ScoringThresholds};

/// How urgently the operator should act
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// Every recommendation the engine can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    VerifyUnregisteredSales,
    VerifyChangeGiven,
    VerifyDuplicateSales,
    VerifyChangeNotGiven,
    ImproveCountingProcess,
    OptimizeCountingTime,
    ManualCountMismatch,
}

impl RecommendationKind {
    pub fn title(&self) -> &'static str {
        match self {
            Self::VerifyUnregisteredSales => "Verify unregistered sales",
            Self::VerifyChangeGiven => "Verify change given",
            Self::VerifyDuplicateSales => "Verify duplicate sales",
            Self::VerifyChangeNotGiven => "Verify change not given",
            Self::ImproveCountingProcess => "Improve counting process",
            Self::OptimizeCountingTime => "Optimize counting time",
            Self::ManualCountMismatch => "Mismatch between manual count and entered total",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::VerifyUnregisteredSales => {
                "The drawer is short. Check for cash sales that were not registered in the system."
            }
            Self::VerifyChangeGiven => {
                "Check whether too much change was handed back to customers."
            }
            Self::VerifyDuplicateSales => {
                "The drawer has a surplus. Check for sales that were registered twice."
            }
            Self::VerifyChangeNotGiven => {
                "Check whether change was left undelivered to a customer."
            }
            Self::ImproveCountingProcess => {
                "Precision is low. Count each denomination separately and recount before closing."
            }
            Self::OptimizeCountingTime => {
                "Counting took long. Pre-sort bills and coins during the day to speed up the close."
            }
            Self::ManualCountMismatch => {
                "The denomination count does not add up to the entered total. Recount or fix the entry."
            }
        }
    }

    pub fn priority(&self) -> Priority {
        match self {
            Self::VerifyUnregisteredSales | Self::VerifyDuplicateSales => Priority::High,
            Self::ManualCountMismatch => Priority::High,
            Self::VerifyChangeGiven | Self::VerifyChangeNotGiven => Priority::Medium,
            Self::ImproveCountingProcess => Priority::Medium,
            Self::OptimizeCountingTime => Priority::Low,
        }
    }
}

/// One emitted recommendation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub title: String,
    pub description: String,
    pub priority: Priority,
}

impl From<RecommendationKind> for Recommendation {
    fn from(kind: RecommendationKind) -> Self {
        Self {
            kind,
            title: kind.title().to_string(),
            description: kind.description().to_string(),
            priority: kind.priority(),
        }
    }
}

/// Facts the rules are evaluated against
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationContext {
    pub state: ReconciliationState,
    pub precision_percent: Decimal,
    pub count_duration_seconds: Option<u32>,
    /// Total of the denomination breakdown, when one was counted
    pub manual_count_total: Option<Decimal>,
    /// Amount the operator typed in
    pub entered_total: Option<Decimal>,
}

type Predicate = fn(&RecommendationContext, &ScoringThresholds) -> bool;

/// A `(predicate, recommendation)` pair
#[derive(Clone, Copy)]
pub struct RecommendationRule {
    pub kind: RecommendationKind,
    pub applies: Predicate,
}

impl std::fmt::Debug for RecommendationRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecommendationRule")
            .field("kind", &self.kind)
            .finish()
    }
}

fn is_shortage(ctx: &RecommendationContext, _: &ScoringThresholds) -> bool {
    ctx.state == ReconciliationState::Shortage
}

fn is_surplus(ctx: &RecommendationContext, _: &ScoringThresholds) -> bool {
    ctx.state == ReconciliationState::Surplus
}

fn low_precision(ctx: &RecommendationContext, t: &ScoringThresholds) -> bool {
    ctx.precision_percent < t.precision_review_percent
}

fn slow_count(ctx: &RecommendationContext, t: &ScoringThresholds) -> bool {
    ctx.count_duration_seconds
        .map_or(false, |secs| secs > t.slow_count_alert_secs)
}

fn manual_count_mismatch(ctx: &RecommendationContext, _: &ScoringThresholds) -> bool {
    match (ctx.manual_count_total, ctx.entered_total) {
        (Some(manual), Some(entered)) => manual != entered,
        _ => false,
    }
}

/// The rule table, in evaluation order.
pub const DEFAULT_RULES: &[RecommendationRule] = &[
    RecommendationRule { kind: RecommendationKind::VerifyUnregisteredSales, applies: is_shortage },
    RecommendationRule { kind: RecommendationKind::VerifyChangeGiven, applies: is_shortage },
    RecommendationRule { kind: RecommendationKind::VerifyDuplicateSales, applies: is_surplus },
    RecommendationRule { kind: RecommendationKind::VerifyChangeNotGiven, applies: is_surplus },
    RecommendationRule { kind: RecommendationKind::ImproveCountingProcess, applies: low_precision },
    RecommendationRule { kind: RecommendationKind::OptimizeCountingTime, applies: slow_count },
    RecommendationRule { kind: RecommendationKind::ManualCountMismatch, applies: manual_count_mismatch },
];

/// Evaluate a rule table against the context.
pub fn evaluate_rules(
    rules: &[RecommendationRule],
    ctx: &RecommendationContext,
    thresholds: &ScoringThresholds,
) -> Vec<Recommendation> {
    rules
        .iter()
        .filter(|rule| (rule.applies)(ctx, thresholds))
        .map(|rule| Recommendation::from(rule.kind))
        .collect()
}

/// Evaluate the default rule table.
pub fn generate_recommendations(
    ctx: &RecommendationContext,
    thresholds: &ScoringThresholds,
) -> Vec<Recommendation> {
    evaluate_rules(DEFAULT_RULES, ctx, thresholds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ctx(state: ReconciliationState) -> RecommendationContext {
        RecommendationContext {
            state,
            precision_percent: dec!(100),
            count_duration_seconds: None,
            manual_count_total: None,
            entered_total: None,
        }
    }

    fn kinds(recs: &[Recommendation]) -> Vec<RecommendationKind> {
        recs.iter().map(|r| r.kind).collect()
    }

    #[test]
    fn test_balanced_clean_count_has_no_recommendations() {
        let recs = generate_recommendations(&ctx(ReconciliationState::Balanced), &Default::default());
        assert!(recs.is_empty());
    }

    #[test]
    fn test_shortage_rules() {
        let recs = generate_recommendations(&ctx(ReconciliationState::Shortage), &Default::default());
        assert_eq!(
            kinds(&recs),
            vec![
                RecommendationKind::VerifyUnregisteredSales,
                RecommendationKind::VerifyChangeGiven
            ]
        );
        assert_eq!(recs[0].priority, Priority::High);
        assert_eq!(recs[1].priority, Priority::Medium);
    }

    #[test]
    fn test_surplus_rules() {
        let recs = generate_recommendations(&ctx(ReconciliationState::Surplus), &Default::default());
        assert_eq!(
            kinds(&recs),
            vec![
                RecommendationKind::VerifyDuplicateSales,
                RecommendationKind::VerifyChangeNotGiven
            ]
        );
    }

    #[test]
    fn test_all_matching_rules_in_table_order() {
        let context = RecommendationContext {
            state: ReconciliationState::Shortage,
            precision_percent: dec!(80),
            count_duration_seconds: Some(601),
            manual_count_total: Some(dec!(79)),
            entered_total: Some(dec!(80)),
        };

        let recs = generate_recommendations(&context, &Default::default());
        assert_eq!(
            kinds(&recs),
            vec![
                RecommendationKind::VerifyUnregisteredSales,
                RecommendationKind::VerifyChangeGiven,
                RecommendationKind::ImproveCountingProcess,
                RecommendationKind::OptimizeCountingTime,
                RecommendationKind::ManualCountMismatch,
            ]
        );
        assert_eq!(recs[3].priority, Priority::Low);
        assert_eq!(recs[4].priority, Priority::High);
    }

    #[test]
    fn test_precision_threshold_is_strict() {
        let mut context = ctx(ReconciliationState::Balanced);
        context.precision_percent = dec!(90);
        assert!(generate_recommendations(&context, &Default::default()).is_empty());

        context.precision_percent = dec!(89.99);
        assert_eq!(
            kinds(&generate_recommendations(&context, &Default::default())),
            vec![RecommendationKind::ImproveCountingProcess]
        );
    }

    #[test]
    fn test_slow_count_threshold_is_strict() {
        let mut context = ctx(ReconciliationState::Balanced);
        context.count_duration_seconds = Some(600);
        assert!(generate_recommendations(&context, &Default::default()).is_empty());

        context.count_duration_seconds = Some(700);
        assert_eq!(
            kinds(&generate_recommendations(&context, &Default::default())),
            vec![RecommendationKind::OptimizeCountingTime]
        );
    }

    #[test]
    fn test_manual_count_match_emits_nothing() {
        let mut context = ctx(ReconciliationState::Balanced);
        context.manual_count_total = Some(dec!(100.00));
        context.entered_total = Some(dec!(100));
        assert!(generate_recommendations(&context, &Default::default()).is_empty());

        // Missing breakdown means no comparison
        context.manual_count_total = None;
        context.entered_total = Some(dec!(5));
        assert!(generate_recommendations(&context, &Default::default()).is_empty());
    }

    #[test]
    fn test_custom_rule_table() {
        let rules = [RecommendationRule {
            kind: RecommendationKind::OptimizeCountingTime,
            applies: |_, _| true,
        }];
        let recs = evaluate_rules(&rules, &ctx(ReconciliationState::Balanced), &Default::default());
        assert_eq!(kinds(&recs), vec![RecommendationKind::OptimizeCountingTime]);
        assert_eq!(recs[0].title, "Optimize counting time");
    }
}
