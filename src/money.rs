//! Fixed-point monetary type with 2 decimal places precision.
//!
//! Uses `rust_decimal` internally. Inputs carrying more precision than the
//! scale supports are rejected instead of rounded, so balances never drift.

use crate::error::{LedgerError, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// An exact monetary amount with exactly 2 decimal places.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use bank_ledger::Money;
///
/// let amount = Money::from_str("10.5").unwrap();
/// assert_eq!(amount.to_string(), "10.50");
/// assert!(Money::from_str("10.505").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(Decimal);

impl Money {
    /// The number of decimal places to maintain.
    pub const SCALE: u32 = 2;

    /// Zero value.
    pub const ZERO: Self = Money(Decimal::ZERO);

    /// Creates a `Money` from a `Decimal`, failing if it carries more than
    /// 2 significant fractional digits.
    pub fn from_decimal(value: Decimal) -> Result<Self> {
        if value.normalize().scale() > Self::SCALE {
            return Err(LedgerError::InvalidAmount(format!(
                "{} has more than {} decimal places",
                value,
                Self::SCALE
            )));
        }
        let mut scaled = value;
        scaled.rescale(Self::SCALE);
        Ok(Money(scaled))
    }

    /// Creates a `Money` from a whole number of currency units.
    pub fn from_units(units: i64) -> Self {
        let mut value = Decimal::from(units);
        value.rescale(Self::SCALE);
        Money(value)
    }

    /// Returns the underlying decimal value.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Returns `true` if this value is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns `true` if this value is strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn checked_add(self, rhs: Self) -> Result<Self> {
        self.0
            .checked_add(rhs.0)
            .map(Money)
            .ok_or_else(|| LedgerError::InvalidAmount(format!("{} + {} overflows", self, rhs)))
    }

    pub fn checked_sub(self, rhs: Self) -> Result<Self> {
        self.0
            .checked_sub(rhs.0)
            .map(Money)
            .ok_or_else(|| LedgerError::InvalidAmount(format!("{} - {} overflows", self, rhs)))
    }

    /// Multiplies by a rate, rounding half away from zero to 2 places.
    ///
    /// This is the only place the engine rounds.
    pub fn apply_rate(&self, rate: Decimal) -> Result<Self> {
        let product = self
            .0
            .checked_mul(rate)
            .ok_or_else(|| LedgerError::InvalidAmount(format!("{} * {} overflows", self, rate)))?;
        let mut rounded =
            product.round_dp_with_strategy(Self::SCALE, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(Self::SCALE);
        Ok(Money(rounded))
    }
}

impl FromStr for Money {
    type Err = LedgerError;

    /// Accepts an optional sign, digits and at most one decimal point.
    /// Separators, exponents and special values are rejected.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if !is_plain_decimal(trimmed) {
            return Err(LedgerError::InvalidAmount(format!(
                "{:?} is not a decimal amount",
                trimmed
            )));
        }
        let decimal = Decimal::from_str(trimmed)
            .map_err(|e| LedgerError::InvalidAmount(format!("{:?}: {}", trimmed, e)))?;
        Money::from_decimal(decimal)
    }
}

fn is_plain_decimal(s: &str) -> bool {
    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
    let mut parts = unsigned.splitn(2, '.');
    let whole = parts.next().unwrap_or_default();
    let fraction = parts.next().unwrap_or_default();

    (!whole.is_empty() || !fraction.is_empty())
        && whole.bytes().all(|b| b.is_ascii_digit())
        && fraction.bytes().all(|b| b.is_ascii_digit())
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{:.2}", self.0))
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Money::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_normalizes_scale() {
        let m = Money::from_str("1").unwrap();
        assert_eq!(m.to_string(), "1.00");

        let m = Money::from_str("1.5").unwrap();
        assert_eq!(m.to_string(), "1.50");

        let m = Money::from_str("  2.25  ").unwrap();
        assert_eq!(m.to_string(), "2.25");

        // Trailing zeros carry no extra precision
        let m = Money::from_str("3.1000").unwrap();
        assert_eq!(m.to_string(), "3.10");
    }

    #[test]
    fn test_from_str_rejects_excess_precision() {
        assert!(matches!(
            Money::from_str("1.005"),
            Err(LedgerError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_from_str_rejects_non_numeric() {
        for input in [
            "", "abc", "1,000", "1_000", "1__0.5_0", "NaN", "inf", "1.2.3", "1e3", "-", ".", "--1",
        ] {
            assert!(
                matches!(Money::from_str(input), Err(LedgerError::InvalidAmount(_))),
                "accepted {:?}",
                input
            );
        }
    }

    #[test]
    fn test_from_str_accepts_sign() {
        assert_eq!(Money::from_str("-12.5").unwrap().to_string(), "-12.50");
        assert_eq!(Money::from_str("+7").unwrap().to_string(), "7.00");
    }

    #[test]
    fn test_arithmetic_preserves_scale() {
        let a = Money::from_str("1.5").unwrap();
        let b = Money::from_str("2.25").unwrap();

        assert_eq!(a.checked_add(b).unwrap().to_string(), "3.75");
        assert_eq!(b.checked_sub(a).unwrap().to_string(), "0.75");
        assert_eq!(a.checked_sub(b).unwrap().to_string(), "-0.75");
    }

    #[test]
    fn test_checked_arithmetic_reports_overflow() {
        let max = Money::from_str("79228162514264337593543950335").unwrap();

        assert!(matches!(
            max.checked_add(max),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert!(matches!(
            Money::from_str("-79228162514264337593543950335")
                .unwrap()
                .checked_sub(max),
            Err(LedgerError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_apply_rate_rounds_half_away_from_zero() {
        let rate = Decimal::from_str("0.001").unwrap();

        let fee = Money::from_units(6_000_000).apply_rate(rate).unwrap();
        assert_eq!(fee.to_string(), "6000.00");

        // 5000000.05 * 0.001 = 5000.00005
        let fee = Money::from_str("5000000.05").unwrap().apply_rate(rate).unwrap();
        assert_eq!(fee.to_string(), "5000.00");

        // 5.00 * 0.001 = 0.005
        let fee = Money::from_units(5).apply_rate(rate).unwrap();
        assert_eq!(fee.to_string(), "0.01");
    }

    #[test]
    fn test_sign_checks() {
        assert!(Money::ZERO.is_zero());
        assert!(!Money::ZERO.is_positive());
        assert!(Money::from_units(1).is_positive());
        assert!(!Money::from_units(-1).is_positive());
    }
}
