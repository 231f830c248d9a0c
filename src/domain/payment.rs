//! Payment methods and per-method sales summary.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a sale was paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Transfer => "transfer",
        }
    }

    /// Only cash payments end up in the drawer
    pub fn counts_toward_drawer(&self) -> bool {
        matches!(self, PaymentMethod::Cash)
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "transfer" => Ok(PaymentMethod::Transfer),
            other => Err(format!("unknown payment method '{}'", other)),
        }
    }
}

/// Count and total for one payment method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MethodTotals {
    pub count: u64,
    pub total: Decimal,
}

/// Sales of one business date grouped by payment method
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentSummary(BTreeMap<PaymentMethod, MethodTotals>);

impl PaymentSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one sale to the summary
    pub fn record(&mut self, method: PaymentMethod, amount: Decimal) {
        let entry = self.0.entry(method).or_default();
        entry.count += 1;
        entry.total += amount;
    }

    /// Replace the totals of one method, e.g. from an aggregated query
    pub fn set_totals(&mut self, method: PaymentMethod, totals: MethodTotals) {
        self.0.insert(method, totals);
    }

    pub fn get(&self, method: PaymentMethod) -> MethodTotals {
        self.0.get(&method).copied().unwrap_or_default()
    }

    /// Cash the drawer should hold according to recorded sales
    pub fn expected_cash(&self) -> Decimal {
        self.0
            .iter()
            .filter(|(method, _)| method.counts_toward_drawer())
            .map(|(_, totals)| totals.total)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PaymentMethod, &MethodTotals)> {
        self.0.iter()
    }
}

impl FromIterator<(PaymentMethod, Decimal)> for PaymentSummary {
    fn from_iter<I: IntoIterator<Item = (PaymentMethod, Decimal)>>(iter: I) -> Self {
        let mut summary = PaymentSummary::new();
        for (method, amount) in iter {
            summary.record(method, amount);
        }
        summary
    }
}
