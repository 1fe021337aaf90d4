//! Amount type for handling monetary values with optional euro signs.
//!
//! This module provides the `Amount` type which wraps `Decimal` and handles parsing values that
//! may or may not include a euro sign, an `EUR` suffix and thousands separators.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Represents how euro amounts were (or should be) formatted.
///
/// # Examples
///  - `AmountFormat{ euro: true, commas: true }` -> `-€60,000.00`
///  - `AmountFormat{ euro: false, commas: true }` -> `-60,000.00`
///  - `AmountFormat{ euro: false, commas: false }` -> `-60000.00`
///  - `AmountFormat{ euro: true, commas: false }` -> `-€60000.00`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AmountFormat {
    /// Whether a euro sign (or `EUR` suffix) is present in the formatting.
    euro: bool,
    /// Whether commas are present as thousands separators in the formatting.
    commas: bool,
}

impl Default for AmountFormat {
    fn default() -> Self {
        PLAIN_FORMAT
    }
}

/// The default format is a bare decimal, as found in most exported CSV files: e.g. `-60000.00`.
const PLAIN_FORMAT: AmountFormat = AmountFormat {
    euro: false,
    commas: false,
};

/// Represents a euro amount.
///
/// This type wraps `Decimal`, so sums are exact and keep the scale of their inputs.
///
/// Formatting is considered significant for the purposes of equality, so for numeric comparisons,
/// you should access the `Decimal` value and use that.
///
/// # Examples
///
/// ```
/// # use txn_dashboard::model::Amount;
/// # use std::str::FromStr;
/// let a = Amount::from_str("-5000.00").unwrap();
/// let b = Amount::from_str("-€5,000.00").unwrap();
/// assert_ne!(a, b);
/// assert_eq!(b.to_string(), "-€5,000.00");
/// assert_eq!(a.value(), b.value());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount {
    /// The parsed numerical value.
    value: Decimal,
    /// The way the numerical value was parsed from, or should be written to, a `String`.
    format: AmountFormat,
}

impl Amount {
    /// Creates a new Amount from a Decimal value with plain `String` formatting.
    pub const fn new(value: Decimal) -> Self {
        Self {
            value,
            format: PLAIN_FORMAT,
        }
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.value
    }

    /// Lossy conversion for charting.
    pub fn to_f64(&self) -> f64 {
        self.value.to_f64().unwrap_or_default()
    }

    /// Adds two amounts, or `None` if the result does not fit in a `Decimal`. The result is
    /// plain-formatted regardless of how the inputs were written.
    pub fn checked_add(&self, other: &Amount) -> Option<Amount> {
        self.value.checked_add(other.value).map(Amount::new)
    }

    pub fn is_zero(&self) -> bool {
        self.value().is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.value().is_sign_negative() && !self.is_zero()
    }
}

/// An error that can occur when parsing strings into `Amount` values.
#[derive(Debug)]
pub enum AmountError {
    /// The number itself is not a valid decimal.
    Decimal(rust_decimal::Error),
    /// A comma that is not a thousands separator, e.g. the decimal comma in `12,50`.
    Separator(String),
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AmountError::Decimal(e) => Display::fmt(e, f),
            AmountError::Separator(s) => write!(
                f,
                "'{s}' uses ',' other than as a thousands separator (e.g. 1,234.50)"
            ),
        }
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AmountError::Decimal(e) => Some(e),
            AmountError::Separator(_) => None,
        }
    }
}

/// Removes thousands separators. Commas are only accepted between groups of exactly three digits
/// in the whole-number part: `1,234,567.89` is fine, `12,50` and `1,2,3` are not.
fn strip_thousands(s: &str) -> Result<String, AmountError> {
    if !s.contains(',') {
        return Ok(s.to_string());
    }
    let unsigned = s.strip_prefix('-').unwrap_or(s);
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (unsigned, None),
    };
    let mut groups = whole.split(',');
    let first = groups.next().unwrap_or_default();
    let first_ok = (1..=3).contains(&first.len()) && first.bytes().all(|b| b.is_ascii_digit());
    let rest_ok = groups.all(|g| g.len() == 3 && g.bytes().all(|b| b.is_ascii_digit()));
    if !first_ok || !rest_ok || fraction.is_some_and(|f| f.contains(',')) {
        return Err(AmountError::Separator(s.to_string()));
    }
    Ok(s.replace(',', ""))
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut euro = false;

        let trimmed = s.trim();

        // An empty cell counts as nothing spent
        if trimmed.is_empty() {
            return Ok(Amount::default());
        }

        // Remove an `EUR` suffix or a trailing euro sign: "50.00 EUR", "50.00€"
        let without_suffix = if let Some(before) = trimmed
            .strip_suffix("EUR")
            .or_else(|| trimmed.strip_suffix('€'))
        {
            euro = true;
            before.trim_end()
        } else {
            trimmed
        };

        // Remove a leading euro sign, which may follow the minus sign: "-€50.00", "€-50.00"
        let without_euro = if let Some(after_minus) = without_suffix.strip_prefix('-') {
            if let Some(after_euro) = after_minus.strip_prefix('€') {
                euro = true;
                format!("-{}", after_euro.trim_start())
            } else {
                without_suffix.to_string()
            }
        } else if let Some(after_euro) = without_suffix.strip_prefix('€') {
            euro = true;
            after_euro.trim_start().to_string()
        } else {
            without_suffix.to_string()
        };

        let without_commas = strip_thousands(&without_euro)?;
        let commas = without_commas.len() < without_euro.len();

        let value = Decimal::from_str(&without_commas).map_err(AmountError::Decimal)?;
        Ok(Amount {
            value,
            format: AmountFormat { euro, commas },
        })
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        let num = self.value().abs();

        let eur = if self.format.euro { "€" } else { "" };

        if self.format.commas {
            write!(
                f,
                "{sign}{eur}{}",
                format_num::format_num!(",.2", num.to_f64().unwrap_or_default())
            )
        } else {
            write!(f, "{sign}{eur}{num}")
        }
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Amount::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_plain() {
        let amount = Amount::from_str("50.00").unwrap();
        assert_eq!(amount.value(), dec("50.00"));
        assert_eq!(amount.to_string(), "50.00");
    }

    #[test]
    fn test_parse_with_euro_sign() {
        let amount = Amount::from_str("€50.00").unwrap();
        assert_eq!(amount.value(), dec("50.00"));
        assert_eq!(amount.to_string(), "€50.00");
    }

    #[test]
    fn test_parse_with_trailing_euro_sign() {
        let amount = Amount::from_str("12.50 €").unwrap();
        assert_eq!(amount.value(), dec("12.50"));
    }

    #[test]
    fn test_parse_with_eur_suffix() {
        let amount = Amount::from_str("-7.25 EUR").unwrap();
        assert_eq!(amount.value(), dec("-7.25"));
        assert_eq!(amount.to_string(), "-€7.25");
    }

    #[test]
    fn test_parse_negative_with_euro_sign() {
        let a = Amount::from_str("-€50.00").unwrap();
        assert_eq!(a.value(), dec("-50.00"));
        let b = Amount::from_str("€-50.00").unwrap();
        assert_eq!(b.value(), dec("-50.00"));
    }

    #[test]
    fn test_parse_empty_string() {
        let amount = Amount::from_str("  ").unwrap();
        assert_eq!(amount.value(), Decimal::ZERO);
    }

    #[test]
    fn test_parse_garbage() {
        assert!(Amount::from_str("ten euros").is_err());
        assert!(Amount::from_str("€").is_err());
    }

    #[test]
    fn test_parse_large_amount_with_commas() {
        let amount = Amount::from_str("-€60,000.00").unwrap();
        assert_eq!(amount.value(), dec("-60000.00"));
        assert_eq!(amount.to_string(), "-€60,000.00");
    }

    #[test]
    fn test_display_negative_zero() {
        let amount = Amount::new(dec("-0.00"));
        assert_eq!(amount.to_string(), "0.00");
    }

    #[test]
    fn test_parse_thousands_groups() {
        assert_eq!(Amount::from_str("1,234,567.89").unwrap().value(), dec("1234567.89"));
        assert_eq!(Amount::from_str("1,234.5").unwrap().value(), dec("1234.5"));
        assert_eq!(Amount::from_str("-999,000").unwrap().value(), dec("-999000"));
    }

    #[test]
    fn test_parse_decimal_comma_is_rejected() {
        let err = Amount::from_str("12,50").unwrap_err();
        assert!(matches!(err, AmountError::Separator(_)), "{err}");
        assert!(Amount::from_str("€12,50").is_err());
    }

    #[test]
    fn test_parse_misplaced_commas() {
        for s in ["1,2,3", ",100", "100,", "1,0000.00", "1234,567", "1.234,56", "1,,000"] {
            assert!(Amount::from_str(s).is_err(), "{s} should not parse");
        }
    }

    #[test]
    fn test_checked_add_keeps_scale() {
        let total = Amount::from_str("10.00")
            .unwrap()
            .checked_add(&Amount::from_str("€5.50").unwrap())
            .unwrap();
        assert_eq!(total.value(), dec("15.50"));
        assert_eq!(total.to_string(), "15.50");
    }

    #[test]
    fn test_checked_add_overflow() {
        let max = Amount::new(Decimal::MAX);
        assert!(max.checked_add(&Amount::new(Decimal::ONE)).is_none());
    }

    #[test]
    fn test_serialize() {
        let amount = Amount::from_str("€1,000.00").unwrap();
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"€1,000.00\"");
    }

    #[test]
    fn test_deserialize() {
        let amount: Amount = serde_json::from_str("\"-3.10\"").unwrap();
        assert_eq!(amount.value(), dec("-3.10"));
    }
}
