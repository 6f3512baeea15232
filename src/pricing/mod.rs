//! Order total calculation.
//!
//! The discount rule lives in exactly one place, [`PricingPolicy`], and is
//! applied by [`compute_total`]. [`OrderTotalCalculator`] layers the dual-path
//! protocol on top: a delegated [`PricingEngine`] is asked first and its answer
//! is accepted only when it agrees with the local rule; every failure falls
//! back to the local breakdown.
//!
//! ## Rounding
//! The subtotal is summed exactly and rounded once to two places. The
//! threshold test and the discount use that rounded subtotal; the discount is
//! rounded to two places; the total is the exact difference. Displayed values
//! therefore always satisfy `total == subtotal - discount`.
//!
//! Per-line amounts shown on carts and orders are rounded separately for
//! display and never feed back into the subtotal. With sub-cent unit prices
//! the displayed line amounts can differ from the subtotal by a cent.

mod process;
pub mod wire;

pub use process::ProcessEngine;

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::value_objects::{Money, Quantity, QuantityError};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PricingError {
    #[error("unit price must be non-negative, got {0}")]
    NegativePrice(Decimal),

    #[error("unit price {0} exceeds maximum of {}", LineItem::MAX_UNIT_PRICE)]
    PriceTooLarge(Decimal),

    #[error("invalid quantity: {0}")]
    InvalidQuantity(#[from] QuantityError),

    #[error("invalid pricing policy: {0}")]
    InvalidPolicy(String),
}

/// Why a delegated computation was not used.
#[derive(Error, Debug)]
pub enum DelegationError {
    #[error("failed to start calculator {program}: {source}")]
    Spawn { program: PathBuf, source: std::io::Error },

    #[error("calculator I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("calculator timed out after {0:?}")]
    TimedOut(Duration),

    #[error("calculator exited with status {code:?}: {stderr}")]
    ExitStatus { code: Option<i32>, stderr: String },

    #[error("calculator produced malformed output: {0:?}")]
    MalformedOutput(String),

    #[error("calculator total {delegated} disagrees with policy total {expected}")]
    Drift { delegated: Money, expected: Money },
}

/// The threshold discount rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PricingPolicy {
    threshold: Money,
    rate: Decimal,
}

impl PricingPolicy {
    /// 10% off any subtotal strictly above 1000.
    pub const STANDARD: PricingPolicy = PricingPolicy {
        threshold: Money::new(Decimal::from_parts(1000, 0, 0, false, 0)),
        rate: Decimal::from_parts(10, 0, 0, false, 2),
    };

    pub fn new(threshold: Money, rate: Decimal) -> Result<Self, PricingError> {
        if threshold.is_negative() {
            return Err(PricingError::InvalidPolicy(format!("threshold {threshold} is negative")));
        }
        if rate < Decimal::ZERO || rate > Decimal::ONE {
            return Err(PricingError::InvalidPolicy(format!("rate {rate} is outside 0..=1")));
        }
        Ok(Self { threshold, rate })
    }

    pub fn threshold(&self) -> Money { self.threshold }
    pub fn rate(&self) -> Decimal { self.rate }

    /// Discount owed on an already-rounded subtotal.
    pub fn discount_for(&self, subtotal: Money) -> Money {
        if subtotal > self.threshold {
            subtotal.scale(self.rate).rounded()
        } else {
            Money::ZERO
        }
    }
}

impl Default for PricingPolicy {
    fn default() -> Self { Self::STANDARD }
}

/// One product-quantity pairing, priced at time of purchase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineItem {
    unit_price: Money,
    quantity: Quantity,
}

impl LineItem {
    pub const MAX_UNIT_PRICE: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

    pub fn new(unit_price: Decimal, quantity: u32) -> Result<Self, PricingError> {
        if unit_price.is_sign_negative() && !unit_price.is_zero() {
            return Err(PricingError::NegativePrice(unit_price));
        }
        if unit_price > Self::MAX_UNIT_PRICE {
            return Err(PricingError::PriceTooLarge(unit_price));
        }
        Ok(Self { unit_price: Money::new(unit_price), quantity: Quantity::new(quantity)? })
    }

    pub fn unit_price(&self) -> Money { self.unit_price }
    pub fn quantity(&self) -> Quantity { self.quantity }

    /// `unit_price × quantity`, unrounded.
    pub fn extended(&self) -> Money { self.unit_price.multiply(self.quantity) }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TotalBreakdown {
    pub subtotal: Money,
    pub discount: Money,
    pub total: Money,
}

/// Price a list of line items under `policy`.
pub fn compute_total(items: &[LineItem], policy: &PricingPolicy) -> TotalBreakdown {
    let subtotal = items.iter().map(LineItem::extended).sum::<Money>().rounded();
    let discount = policy.discount_for(subtotal);
    TotalBreakdown { subtotal, discount, total: subtotal - discount }
}

/// An execution strategy that returns the final total for a list of items.
pub trait PricingEngine: Send + Sync {
    fn compute(&self, items: &[LineItem]) -> impl Future<Output = Result<Money, DelegationError>> + Send;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PricingSource {
    Delegated,
    Local,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    #[serde(flatten)]
    pub breakdown: TotalBreakdown,
    pub source: PricingSource,
    /// Set when a configured delegate was bypassed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded: Option<String>,
}

impl Quote {
    pub fn total(&self) -> Money { self.breakdown.total }
    pub fn is_degraded(&self) -> bool { self.degraded.is_some() }
}

/// Computes order totals, delegating when an engine is configured.
#[derive(Clone, Debug)]
pub struct OrderTotalCalculator<E = ProcessEngine> {
    policy: PricingPolicy,
    delegate: Option<E>,
}

impl<E: PricingEngine> OrderTotalCalculator<E> {
    pub fn new(policy: PricingPolicy) -> Self { Self { policy, delegate: None } }

    pub fn with_delegate(policy: PricingPolicy, delegate: E) -> Self { Self { policy, delegate: Some(delegate) } }

    pub fn policy(&self) -> &PricingPolicy { &self.policy }
    pub fn has_delegate(&self) -> bool { self.delegate.is_some() }

    /// Local path only.
    pub fn breakdown(&self, items: &[LineItem]) -> TotalBreakdown { compute_total(items, &self.policy) }

    /// Try the delegate, fall back to the local rule on any failure. Never errors.
    pub async fn quote(&self, items: &[LineItem]) -> Quote {
        let breakdown = self.breakdown(items);
        let Some(delegate) = &self.delegate else {
            return Quote { breakdown, source: PricingSource::Local, degraded: None };
        };

        let outcome = delegate.compute(items).await.and_then(|delegated| {
            if delegated.rounded() == breakdown.total {
                Ok(delegated)
            } else {
                Err(DelegationError::Drift { delegated, expected: breakdown.total })
            }
        });

        match outcome {
            Ok(total) => {
                debug!(%total, items = items.len(), "delegated pricing accepted");
                Quote { breakdown, source: PricingSource::Delegated, degraded: None }
            }
            Err(err) => {
                warn!(error = %err, fallback_total = %breakdown.total, "delegated pricing unavailable, using local rule");
                Quote { breakdown, source: PricingSource::Local, degraded: Some(err.to_string()) }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(price: Decimal, qty: u32) -> LineItem { LineItem::new(price, qty).unwrap() }

    fn money(d: Decimal) -> Money { Money::new(d) }

    enum Behaviour { Total(Money), Fail }
    struct FakeEngine(Behaviour);

    impl PricingEngine for FakeEngine {
        async fn compute(&self, _items: &[LineItem]) -> Result<Money, DelegationError> {
            match &self.0 {
                Behaviour::Total(total) => Ok(*total),
                Behaviour::Fail => Err(DelegationError::ExitStatus { code: Some(1), stderr: "boom".into() }),
            }
        }
    }

    #[test]
    fn test_empty_cart_is_zero() {
        let b = compute_total(&[], &PricingPolicy::STANDARD);
        assert_eq!(b, TotalBreakdown::default());
    }

    #[test]
    fn test_below_threshold_no_discount() {
        let b = compute_total(&[item(dec!(500), 1)], &PricingPolicy::STANDARD);
        assert_eq!((b.subtotal, b.discount, b.total), (money(dec!(500)), Money::ZERO, money(dec!(500))));
    }

    #[test]
    fn test_above_threshold_discounted() {
        let b = compute_total(&[item(dec!(600), 2)], &PricingPolicy::STANDARD);
        assert_eq!(b.subtotal, money(dec!(1200)));
        assert_eq!(b.discount, money(dec!(120)));
        assert_eq!(b.total, money(dec!(1080)));
    }

    #[test]
    fn test_threshold_is_strict() {
        let b = compute_total(&[item(dec!(1000), 1)], &PricingPolicy::STANDARD);
        assert_eq!(b.discount, Money::ZERO);
        assert_eq!(b.total, money(dec!(1000)));

        let b = compute_total(&[item(dec!(1000.01), 1)], &PricingPolicy::STANDARD);
        assert_eq!(b.discount, money(dec!(100.00)));
        assert_eq!(b.total, money(dec!(900.01)));
    }

    #[test]
    fn test_rounding_keeps_total_consistent() {
        // 1000.05 * 0.10 = 100.005 -> 100.01
        let b = compute_total(&[item(dec!(1000.05), 1)], &PricingPolicy::STANDARD);
        assert_eq!(b.discount, money(dec!(100.01)));
        assert_eq!(b.total, money(dec!(900.04)));
        assert_eq!(b.total, b.subtotal - b.discount);
    }

    #[test]
    fn test_subtotal_sums_every_line() {
        let items = [item(dec!(19.99), 3), item(dec!(0.01), 1), item(dec!(250), 2)];
        let b = compute_total(&items, &PricingPolicy::STANDARD);
        assert_eq!(b.subtotal, money(dec!(559.98)));
        assert_eq!(b.total, b.subtotal);
    }

    #[test]
    fn test_compute_is_idempotent() {
        let items = [item(dec!(333.33), 4), item(dec!(12.5), 7)];
        assert_eq!(compute_total(&items, &PricingPolicy::STANDARD), compute_total(&items, &PricingPolicy::STANDARD));
    }

    #[test]
    fn test_line_item_rejects_bad_input() {
        assert_eq!(LineItem::new(dec!(-1), 1), Err(PricingError::NegativePrice(dec!(-1))));
        assert_eq!(LineItem::new(dec!(5), 0), Err(PricingError::InvalidQuantity(QuantityError::Zero)));
        assert!(matches!(LineItem::new(dec!(1000000001), 1), Err(PricingError::PriceTooLarge(_))));
        assert!(LineItem::new(dec!(0), 1).is_ok());
    }

    #[test]
    fn test_policy_validation() {
        assert!(PricingPolicy::new(money(dec!(1000)), dec!(1.5)).is_err());
        assert!(PricingPolicy::new(money(dec!(-1)), dec!(0.1)).is_err());
        assert_eq!(PricingPolicy::new(money(dec!(1000)), dec!(0.10)).unwrap(), PricingPolicy::default());
    }

    #[tokio::test]
    async fn test_quote_without_delegate_is_local() {
        let calc: OrderTotalCalculator<FakeEngine> = OrderTotalCalculator::new(PricingPolicy::STANDARD);
        let q = calc.quote(&[item(dec!(500), 1)]).await;
        assert_eq!(q.source, PricingSource::Local);
        assert!(!q.is_degraded());
    }

    #[tokio::test]
    async fn test_quote_accepts_agreeing_delegate() {
        let calc = OrderTotalCalculator::with_delegate(PricingPolicy::STANDARD, FakeEngine(Behaviour::Total(money(dec!(1080.00)))));
        let q = calc.quote(&[item(dec!(600), 2)]).await;
        assert_eq!(q.source, PricingSource::Delegated);
        assert_eq!(q.total(), money(dec!(1080)));
    }

    #[tokio::test]
    async fn test_failed_delegate_falls_back_to_identical_result() {
        let items = [item(dec!(300), 4)];
        let calc = OrderTotalCalculator::with_delegate(PricingPolicy::STANDARD, FakeEngine(Behaviour::Fail));
        let q = calc.quote(&items).await;
        assert_eq!(q.source, PricingSource::Local);
        assert!(q.is_degraded());
        assert_eq!(q.breakdown.subtotal, money(dec!(1200)));
        assert_eq!(q.breakdown.discount, money(dec!(120)));
        assert_eq!(q.total(), money(dec!(1080)));
        assert_eq!(q.breakdown, compute_total(&items, &PricingPolicy::STANDARD));
    }

    #[tokio::test]
    async fn test_drifting_delegate_is_rejected() {
        // a stale calculator that never discounts
        let calc = OrderTotalCalculator::with_delegate(PricingPolicy::STANDARD, FakeEngine(Behaviour::Total(money(dec!(1200)))));
        let q = calc.quote(&[item(dec!(600), 2)]).await;
        assert_eq!(q.source, PricingSource::Local);
        assert_eq!(q.total(), money(dec!(1080)));
        assert!(q.degraded.as_deref().unwrap().contains("disagrees"));
    }
}
