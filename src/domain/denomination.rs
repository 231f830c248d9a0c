//! Denomination breakdown of a manual drawer count.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use super::{CashAmount, DomainError};

/// Bills and coins counted, keyed by face value.
///
/// On the wire the keys are strings: `{"20": 3, "0.50": 4}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, u32>", into = "BTreeMap<String, u32>")]
pub struct DenominationBreakdown(BTreeMap<Decimal, u32>);

impl DenominationBreakdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` pieces of `value`.
    ///
    /// Face values must be positive cents no larger than the biggest cash
    /// amount. `20` and `20.00` land on the same key.
    pub fn add(&mut self, value: Decimal, count: u32) -> Result<(), DomainError> {
        let value = CashAmount::new(value)?.value();
        if value.is_zero() {
            return Err(DomainError::invalid_input("denomination must be positive"));
        }

        let entry = self.0.entry(value).or_insert(0);
        *entry = entry.checked_add(count).ok_or_else(|| {
            DomainError::invalid_input(format!("too many pieces of denomination {}", value))
        })?;
        Ok(())
    }

    /// Sum of value * count over all denominations
    pub fn total(&self) -> Result<Decimal, DomainError> {
        self.0.iter().try_fold(Decimal::ZERO, |sum, (value, count)| {
            value
                .checked_mul(Decimal::from(*count))
                .and_then(|subtotal| sum.checked_add(subtotal))
                .ok_or_else(|| DomainError::invalid_input("denomination total overflows"))
        })
    }

    pub fn pieces(&self) -> u64 {
        self.0.values().map(|c| u64::from(*c)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<BTreeMap<String, u32>> for DenominationBreakdown {
    type Error = DomainError;

    fn try_from(raw: BTreeMap<String, u32>) -> Result<Self, Self::Error> {
        let mut breakdown = DenominationBreakdown::new();
        for (key, count) in raw {
            let value = Decimal::from_str(key.trim()).map_err(|_| {
                DomainError::invalid_input(format!("invalid denomination '{}'", key))
            })?;
            breakdown.add(value, count)?;
        }
        Ok(breakdown)
    }
}

impl From<DenominationBreakdown> for BTreeMap<String, u32> {
    fn from(breakdown: DenominationBreakdown) -> Self {
        breakdown
            .0
            .into_iter()
            .map(|(value, count)| (value.to_string(), count))
            .collect()
    }
}
