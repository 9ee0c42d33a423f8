//! Money values that remember how they were written.
//!
//! A bank statement may say `-$1,500.00` where a ledger says `-1500.00`.
//! `Amount` keeps the `Decimal` value together with the dollar-sign and
//! separator style it was parsed with, so printing a value back produces
//! what was read.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// The writing style of an amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AmountFormat {
    /// A leading `$`.
    dollar_sign: bool,
    /// Commas between thousands.
    separators: bool,
}

impl AmountFormat {
    /// Dollar sign with comma separators, e.g. `-$60,000.00`.
    pub(crate) const DEFAULT: Self = Self {
        dollar_sign: true,
        separators: true,
    };
}

impl Default for AmountFormat {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A monetary amount.
///
/// Parsing keeps the writing style, so `1200.00` and `$1,200.00` compare
/// unequal as `Amount`s even though they are the same number. Compare with
/// [`Amount::value`] when only the number matters.
///
/// ```
/// # use pennybook::Amount;
/// # use std::str::FromStr;
/// let plain = Amount::from_str("1200.00").unwrap();
/// let fancy = Amount::from_str("$1,200.00").unwrap();
/// assert_ne!(plain, fancy);
/// assert_eq!(plain.value(), fancy.value());
/// assert_eq!(fancy.to_string(), "$1,200.00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount {
    /// The number itself.
    value: Decimal,
    /// How to print it back.
    format: AmountFormat,
}

impl Amount {
    /// Wraps a `Decimal` in the default writing style.
    pub const fn new(value: Decimal) -> Self {
        Self {
            value,
            format: AmountFormat::DEFAULT,
        }
    }

    /// Wraps a `Decimal` in the given writing style.
    pub const fn new_with_format(value: Decimal, format: AmountFormat) -> Self {
        Self { value, format }
    }

    /// The underlying `Decimal` value.
    pub fn value(&self) -> Decimal {
        self.value
    }

    /// The value as a bare decimal string with no dollar sign or commas, e.g.
    /// `-1500.00`. This is the canonical form stored in the database and
    /// written to CSV.
    pub fn plain(&self) -> String {
        self.value.to_string()
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.value.is_sign_positive()
    }

    pub fn is_negative(&self) -> bool {
        self.value.is_sign_negative()
    }
}

/// Returned when a string cannot be read as a money amount.
pub struct AmountError(rust_decimal::Error);

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();

        // A blank cell reads as zero in the default style.
        if text.is_empty() {
            return Ok(Amount::default());
        }

        // The dollar sign may sit on either side of the minus sign.
        let (dollar_sign, numeric) = match (text.strip_prefix("-$"), text.strip_prefix('$')) {
            (Some(tail), _) => (true, format!("-{tail}")),
            (None, Some(tail)) => (true, tail.to_string()),
            (None, None) => (false, text.to_string()),
        };

        let digits = numeric.replace(',', "");
        let separators = digits.len() != numeric.len();

        let value = Decimal::from_str(&digits).map_err(AmountError)?;
        Ok(Amount {
            value,
            format: AmountFormat {
                dollar_sign,
                separators,
            },
        })
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negative() {
            f.write_str("-")?;
        }
        if self.format.dollar_sign {
            f.write_str("$")?;
        }
        let magnitude = self.value.abs();
        if self.format.separators {
            write!(
                f,
                "{}",
                format_num::format_num!(",.2", magnitude.to_f64().unwrap_or_default())
            )
        } else {
            write!(f, "{magnitude}")
        }
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
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

    #[test]
    fn test_parse_sign_and_dollar_placements() {
        for (input, expected) in [
            ("$75.00", "75.00"),
            ("75.00", "75.00"),
            ("-$75.00", "-75.00"),
            ("$-75.00", "-75.00"),
            ("-75.00", "-75.00"),
            ("  $75.00  ", "75.00"),
        ] {
            let parsed = Amount::from_str(input).unwrap();
            assert_eq!(
                parsed.value(),
                Decimal::from_str(expected).unwrap(),
                "{input}"
            );
        }
    }

    #[test]
    fn test_parse_blank_as_zero() {
        for input in ["", "   "] {
            let parsed = Amount::from_str(input).unwrap();
            assert!(parsed.is_zero());
            assert_eq!(parsed.to_string(), "$0.00");
        }
    }

    #[test]
    fn test_parse_with_separators() {
        let big = Amount::from_str("$2,345,678.90").unwrap();
        assert_eq!(big.value(), Decimal::from_str("2345678.90").unwrap());

        let rent = Amount::from_str("-$12,000.00").unwrap();
        assert_eq!(rent.value(), Decimal::from_str("-12000.00").unwrap());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Amount::from_str("--75").is_err());
        assert!(Amount::from_str("seventy five").is_err());
    }

    #[test]
    fn test_display_remembers_style() {
        for s in ["2,000,000.00", "-$250000.00", "-$2,750.25", "19.00"] {
            assert_eq!(Amount::from_str(s).unwrap().to_string(), s);
        }
    }

    #[test]
    fn test_display_default_style() {
        let refund = Amount::new(Decimal::from_str("-75.5").unwrap());
        assert_eq!(refund.to_string(), "-$75.50");
        assert_eq!(Amount::new(Decimal::ZERO).to_string(), "$0.00");
    }

    #[test]
    fn test_plain_strips_style() {
        assert_eq!(Amount::from_str("-$2,750.25").unwrap().plain(), "-2750.25");
        assert_eq!(Amount::from_str("7").unwrap().plain(), "7");
    }

    #[test]
    fn test_serde_uses_display_form() {
        let amount = Amount::from_str("-$75.00").unwrap();
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"-$75.00\"");
        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, amount);
    }

    #[test]
    fn test_style_counts_in_equality() {
        let with_sign = Amount::from_str("$75.00").unwrap();
        let without = Amount::from_str("75.00").unwrap();
        assert_ne!(with_sign, without);
        assert_eq!(with_sign.value(), without.value());
    }

    #[test]
    fn test_signs() {
        let zero = Amount::from_str("0.00").unwrap();
        let credit = Amount::from_str("$9.99").unwrap();
        let debit = Amount::from_str("-$9.99").unwrap();
        assert!(zero.is_zero() && !zero.is_positive() && !zero.is_negative());
        assert!(credit.is_positive() && !credit.is_negative());
        assert!(debit.is_negative() && !debit.is_positive());
    }
}
