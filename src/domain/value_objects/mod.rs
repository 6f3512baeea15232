//! Value Objects for storefront pricing

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};

/// Number of decimal places every displayed amount carries.
pub const CURRENCY_DECIMAL_PLACES: u32 = 2;

/// Money value object.
///
/// Single-currency amount backed by a `Decimal`. Arithmetic is exact; call
/// [`Money::rounded`] at the documented rounding points only. Serialises as a
/// plain JSON number.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub const fn new(amount: Decimal) -> Self { Self(amount) }
    pub fn amount(&self) -> Decimal { self.0 }
    pub fn is_negative(&self) -> bool { self.0.is_sign_negative() && !self.0.is_zero() }

    /// Round to two places, midpoint away from zero.
    pub fn rounded(&self) -> Money {
        Money(self.0.round_dp_with_strategy(CURRENCY_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero))
    }

    pub fn multiply(&self, qty: Quantity) -> Money { Money(self.0 * Decimal::from(qty.value())) }

    /// Multiply by a rate such as `0.10`.
    pub fn scale(&self, rate: Decimal) -> Money { Money(self.0 * rate) }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self { Self(amount) }
}

impl Add for Money {
    type Output = Money;
    fn add(self, rhs: Money) -> Money { Money(self.0 + rhs.0) }
}

impl Sub for Money {
    type Output = Money;
    fn sub(self, rhs: Money) -> Money { Money(self.0 - rhs.0) }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money { iter.fold(Money::ZERO, Add::add) }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{:.2}", self.rounded().0) }
}

/// Quantity value object. Always at least one unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    pub const MAX: u32 = 1_000_000;

    pub fn new(value: u32) -> Result<Self, QuantityError> {
        if value == 0 { return Err(QuantityError::Zero); }
        if value > Self::MAX { return Err(QuantityError::TooLarge(value)); }
        Ok(Self(value))
    }
    pub fn value(&self) -> u32 { self.0 }
    pub fn add(&self, other: Quantity) -> Result<Self, QuantityError> {
        let sum = self.0.checked_add(other.0).ok_or(QuantityError::TooLarge(u32::MAX))?;
        Self::new(sum)
    }
}

impl TryFrom<u32> for Quantity {
    type Error = QuantityError;
    fn try_from(value: u32) -> Result<Self, Self::Error> { Self::new(value) }
}

impl From<Quantity> for u32 {
    fn from(q: Quantity) -> u32 { q.0 }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum QuantityError { Zero, TooLarge(u32) }
impl std::error::Error for QuantityError {}
impl fmt::Display for QuantityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zero => write!(f, "quantity must be at least 1"),
            Self::TooLarge(v) => write!(f, "quantity {} exceeds maximum of {}", v, Quantity::MAX),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_rounding_midpoint_away_from_zero() {
        assert_eq!(Money::new(dec!(100.005)).rounded().amount(), dec!(100.01));
        assert_eq!(Money::new(dec!(100.004)).rounded().amount(), dec!(100.00));
    }
    #[test]
    fn test_money_display() { assert_eq!(Money::new(dec!(1080)).to_string(), "1080.00"); }
    #[test]
    fn test_money_multiply_and_sum() {
        let qty = Quantity::new(3).unwrap();
        let total: Money = [Money::new(dec!(19.99)).multiply(qty), Money::new(dec!(0.03))].into_iter().sum();
        assert_eq!(total.amount(), dec!(60.00));
    }
    #[test]
    fn test_quantity_bounds() {
        assert_eq!(Quantity::new(0), Err(QuantityError::Zero));
        assert!(matches!(Quantity::new(Quantity::MAX + 1), Err(QuantityError::TooLarge(_))));
        assert_eq!(Quantity::new(4).unwrap().value(), 4);
    }
    #[test]
    fn test_quantity_add_is_bounded() {
        let big = Quantity::new(Quantity::MAX - 1).unwrap();
        assert_eq!(big.add(Quantity::new(1).unwrap()).unwrap().value(), Quantity::MAX);
        assert_eq!(big.add(Quantity::new(5).unwrap()), Err(QuantityError::TooLarge(Quantity::MAX + 4)));
    }
    #[test]
    fn test_quantity_deserialize_rejects_zero() {
        assert!(serde_json::from_str::<Quantity>("0").is_err());
        assert_eq!(serde_json::from_str::<Quantity>("2").unwrap().value(), 2);
    }
}
