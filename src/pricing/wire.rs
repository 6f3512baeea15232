//! Argument and output format shared by the service and `price-calculator`.
//!
//! Each line item travels as one argument, `<price>,<quantity>`. The
//! calculator answers with a single line holding the total to two places.

use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

use super::{DelegationError, LineItem, PricingError};
use crate::domain::value_objects::Money;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum WireError {
    #[error("invalid format {0:?}, expected price,quantity")]
    MissingSeparator(String),

    #[error("invalid price {0:?}")]
    InvalidPrice(String),

    #[error("invalid quantity {0:?}")]
    InvalidQuantity(String),

    #[error(transparent)]
    Item(#[from] PricingError),
}

pub fn encode_item(item: &LineItem) -> String {
    format!("{},{}", item.unit_price().amount().normalize(), item.quantity())
}

pub fn encode_args(items: &[LineItem]) -> Vec<String> {
    items.iter().map(encode_item).collect()
}

pub fn decode_item(arg: &str) -> Result<LineItem, WireError> {
    let (price, quantity) = arg.split_once(',').ok_or_else(|| WireError::MissingSeparator(arg.to_string()))?;
    let price = Decimal::from_str(price.trim()).map_err(|_| WireError::InvalidPrice(price.to_string()))?;
    let quantity = quantity.trim().parse::<u32>().map_err(|_| WireError::InvalidQuantity(quantity.to_string()))?;
    Ok(LineItem::new(price, quantity)?)
}

pub fn format_total(total: Money) -> String {
    total.to_string()
}

/// Parse calculator stdout. Anything but one non-negative decimal is malformed.
pub fn parse_total(stdout: &str) -> Result<Money, DelegationError> {
    let text = stdout.trim();
    let malformed = || DelegationError::MalformedOutput(stdout.to_string());
    if text.is_empty() || text.lines().count() != 1 {
        return Err(malformed());
    }
    let total = Decimal::from_str(text).map_err(|_| malformed())?;
    let total = Money::new(total);
    if total.is_negative() {
        return Err(malformed());
    }
    Ok(total)
}
