//! Non-negative money amounts using decimal arithmetic.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing [`Money`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// The amount is below zero.
    #[error("amount cannot be negative (got {0})")]
    Negative(Decimal),
}

/// A non-negative amount in the cafe's single currency.
///
/// Arithmetic saturates instead of overflowing; menu prices and order
/// totals are many orders of magnitude below the decimal range.
///
/// Serialized as a decimal string (e.g. `"25.50"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create an amount, rejecting negative values.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Negative` if `amount < 0`.
    pub fn new(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::Negative(amount));
        }
        Ok(Self(amount))
    }

    /// Create an amount from whole currency units.
    #[must_use]
    pub fn from_major(units: u32) -> Self {
        Self(Decimal::from(units))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units at this unit price.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(Decimal::from(quantity)))
    }

    /// Whether the amount is exactly zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Self> for Money {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_negative() {
        assert!(matches!(
            Money::new(Decimal::new(-1, 2)),
            Err(MoneyError::Negative(_))
        ));
        assert!(Money::new(Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_times_and_sum() {
        let espresso = Money::from_major(25).times(2);
        let cheesecake = Money::from_major(65);
        let total: Money = [espresso, cheesecake].into_iter().sum();
        assert_eq!(total, Money::from_major(115));
    }

    #[test]
    fn test_display_two_decimals() {
        let price = Money::new(Decimal::new(4550, 2)).unwrap();
        assert_eq!(price.to_string(), "$45.50");
        assert_eq!(Money::from_major(30).to_string(), "$30.00");
    }

    #[test]
    fn test_serde_as_string() {
        let price = Money::new(Decimal::new(2550, 2)).unwrap();
        let json = serde_json::to_string(&price).unwrap();
        assert_eq!(json, "\"25.50\"");
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back, price);
        assert!(serde_json::from_str::<Money>("\"-3\"").is_err());
    }
}
