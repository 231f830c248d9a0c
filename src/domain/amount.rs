//! Cash amount type
//!
//! Domain primitive for drawer amounts. Validated at construction time so
//! a negative or malformed amount never reaches the reconciliation engine.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;
use std::str::FromStr;

/// Maximum amount accepted for a single drawer (1 billion)
const MAX_AMOUNT: i64 = 1_000_000_000;

/// Monetary scale (cents)
pub const MONEY_SCALE: u32 = 2;

/// CashAmount represents a validated, non-negative monetary value.
///
/// # Invariants
/// - Value is zero or positive
/// - At most 2 decimal places
/// - At most 1 billion
///
/// # Example
/// ```
/// use rust_decimal::Decimal;
/// use cash_closing::domain::CashAmount;
///
/// let amount = CashAmount::new(Decimal::new(10050, 2)).unwrap();
/// assert_eq!(amount.to_string(), "100.50");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "AmountRepr", into = "String")]
pub struct CashAmount(Decimal);

/// Errors that can occur when creating a CashAmount
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("Amount must not be negative (got {0})")]
    Negative(Decimal),

    #[error("Amount has too many decimal places (max {MONEY_SCALE}, got {0})")]
    TooManyDecimals(u32),

    #[error("Amount exceeds maximum allowed value ({MAX_AMOUNT})")]
    Overflow,

    #[error("Amount is not a finite number")]
    NotFinite,

    #[error("Invalid amount format: {0}")]
    ParseError(String),
}

impl CashAmount {
    /// Create a new CashAmount with validation.
    ///
    /// # Errors
    /// - `AmountError::Negative` if value < 0
    /// - `AmountError::TooManyDecimals` if more than 2 decimal places
    /// - `AmountError::Overflow` if value > 1 billion
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(AmountError::Negative(value));
        }

        // Trailing zeros ("12.500") are not extra precision
        let normalized = value.normalize();
        if normalized.scale() > MONEY_SCALE {
            return Err(AmountError::TooManyDecimals(normalized.scale()));
        }

        if value > Decimal::from(MAX_AMOUNT) {
            return Err(AmountError::Overflow);
        }

        Ok(Self(normalized.abs()))
    }

    /// Create a CashAmount from a float entered in a form.
    ///
    /// Floats cannot carry exact cents, so the value is rounded half-up
    /// to 2 decimal places after the finite/non-negative checks.
    pub fn from_f64(value: f64) -> Result<Self, AmountError> {
        if !value.is_finite() {
            return Err(AmountError::NotFinite);
        }
        if value < 0.0 {
            let shown = Decimal::from_f64(value).unwrap_or(Decimal::NEGATIVE_ONE);
            return Err(AmountError::Negative(shown));
        }
        let decimal = Decimal::from_f64(value).ok_or(AmountError::Overflow)?;
        Self::new(round_money(decimal))
    }

    /// Zero cash
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Get the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Add two amounts, failing on overflow.
    pub fn try_add(&self, other: &CashAmount) -> Result<CashAmount, AmountError> {
        CashAmount::new(self.0 + other.0)
    }
}

/// Round a decimal to cents, half away from zero.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Format a value as currency, e.g. `$1,234.50` or `-$12.00`.
pub fn format_currency(value: Decimal) -> String {
    let rounded = round_money(value);
    let plain = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{}${}.{}", sign, grouped, frac_part)
}

impl fmt::Display for CashAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for CashAmount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decimal = Decimal::from_str(s.trim())
            .map_err(|e| AmountError::ParseError(e.to_string()))?;
        CashAmount::new(decimal)
    }
}

/// Wire representation: forms send either `"100.50"` or `100.5`.
#[derive(Deserialize)]
#[serde(untagged)]
enum AmountRepr {
    Text(String),
    Number(f64),
}

impl TryFrom<AmountRepr> for CashAmount {
    type Error = AmountError;

    fn try_from(value: AmountRepr) -> Result<Self, Self::Error> {
        match value {
            AmountRepr::Text(s) => CashAmount::from_str(&s),
            AmountRepr::Number(n) => CashAmount::from_f64(n),
        }
    }
}

impl From<CashAmount> for String {
    fn from(amount: CashAmount) -> Self {
        amount.to_string()
    }
}

impl Add for CashAmount {
    type Output = Result<CashAmount, AmountError>;

    fn add(self, rhs: Self) -> Self::Output {
        self.try_add(&rhs)
    }
}

impl Default for CashAmount {
    fn default() -> Self {
        Self::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amount_zero_allowed() {
        let amount = CashAmount::new(Decimal::ZERO).unwrap();
        assert!(amount.is_zero());
    }

    #[test]
    fn test_amount_negative_rejected() {
        let amount = CashAmount::new(dec!(-0.01));
        assert!(matches!(amount, Err(AmountError::Negative(_))));
    }

    #[test]
    fn test_amount_too_many_decimals() {
        let amount = CashAmount::new(dec!(10.005));
        assert!(matches!(amount, Err(AmountError::TooManyDecimals(3))));
    }

    #[test]
    fn test_amount_trailing_zeros_ok() {
        let amount = CashAmount::new(dec!(12.500)).unwrap();
        assert_eq!(amount.value(), dec!(12.5));
        assert_eq!(amount.to_string(), "12.50");
    }

    #[test]
    fn test_amount_overflow() {
        let amount = CashAmount::new(dec!(1000000000.01));
        assert!(matches!(amount, Err(AmountError::Overflow)));
    }

    #[test]
    fn test_amount_from_f64() {
        assert_eq!(CashAmount::from_f64(88.0).unwrap().value(), dec!(88));
        assert_eq!(CashAmount::from_f64(0.1 + 0.2).unwrap().value(), dec!(0.30));
        assert!(matches!(CashAmount::from_f64(f64::NAN), Err(AmountError::NotFinite)));
        assert!(matches!(CashAmount::from_f64(f64::INFINITY), Err(AmountError::NotFinite)));
        assert!(matches!(CashAmount::from_f64(-5.0), Err(AmountError::Negative(_))));
    }

    #[test]
    fn test_amount_from_str() {
        let amount: CashAmount = " 215.00 ".parse().unwrap();
        assert_eq!(amount.value(), dec!(215));
        assert!(matches!("abc".parse::<CashAmount>(), Err(AmountError::ParseError(_))));
    }

    #[test]
    fn test_amount_deserialize_string_or_number() {
        let from_text: CashAmount = serde_json::from_str("\"97.00\"").unwrap();
        let from_number: CashAmount = serde_json::from_str("97").unwrap();
        assert_eq!(from_text, from_number);
        assert!(serde_json::from_str::<CashAmount>("-1").is_err());
        assert_eq!(serde_json::to_string(&from_text).unwrap(), "\"97.00\"");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(dec!(12.5)), "$12.50");
        assert_eq!(format_currency(dec!(0)), "$0.00");
        assert_eq!(format_currency(dec!(1234567.891)), "$1,234,567.89");
        assert_eq!(format_currency(dec!(-15)), "-$15.00");
        assert_eq!(format_currency(dec!(100)), "$100.00");
    }

    #[test]
    fn test_round_money_half_up() {
        assert_eq!(round_money(dec!(0.005)), dec!(0.01));
        assert_eq!(round_money(dec!(-0.005)), dec!(-0.01));
        assert_eq!(round_money(dec!(2.344)), dec!(2.34));
    }
}
