//! Order Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::value_objects::{Money, Quantity};
use crate::pricing::{LineItem, PricingSource, Quote};

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    id: Uuid,
    customer_name: String,
    contact: String,
    address: String,
    payment_method: PaymentMethod,
    items: Vec<OrderItem>,
    subtotal: Money,
    discount: Money,
    total_amount: Money,
    pricing_source: PricingSource,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: u64,
    pub quantity: Quantity,
    pub unit_price: Money,
    /// Line total rounded to two places for display. The order subtotal is
    /// rounded once over the exact line totals, so with sub-cent unit prices
    /// the line subtotals may not add up to it.
    pub subtotal: Money,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomerDetails { pub name: String, pub contact: String, pub address: String }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    #[default]
    Pending,
    Preparing,
    #[serde(rename = "Out for Delivery")]
    OutForDelivery,
    Completed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "Cash on Delivery")]
    CashOnDelivery,
    #[serde(rename = "Credit Card")]
    CreditCard,
    #[serde(rename = "E-Wallet")]
    EWallet,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Preparing => "Preparing",
            Self::OutForDelivery => "Out for Delivery",
            Self::Completed => "Completed",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for OrderStatus {
    type Err = OrderError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::Pending, Self::Preparing, Self::OutForDelivery, Self::Completed]
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| OrderError::UnknownStatus(s.to_string()))
    }
}

impl Order {
    /// Builds a pending order from priced checkout lines. `lines` pairs each
    /// product id with the line item the quote was computed from.
    pub fn place(customer: CustomerDetails, payment_method: PaymentMethod, lines: &[(u64, LineItem)], quote: &Quote) -> Result<Self, OrderError> {
        if lines.is_empty() { return Err(OrderError::NoItems); }
        let id = Uuid::now_v7();
        let now = Utc::now();
        let items = lines
            .iter()
            .map(|(product_id, line)| OrderItem {
                product_id: *product_id,
                quantity: line.quantity(),
                unit_price: line.unit_price(),
                subtotal: line.extended().rounded(),
            })
            .collect();
        let mut order = Self {
            id, customer_name: customer.name, contact: customer.contact, address: customer.address, payment_method,
            items, subtotal: quote.breakdown.subtotal, discount: quote.breakdown.discount, total_amount: quote.total(),
            pricing_source: quote.source, status: OrderStatus::Pending, created_at: now, updated_at: now, events: vec![],
        };
        order.raise_event(DomainEvent::Order(OrderEvent::Placed { order_id: id, total_amount: order.total_amount }));
        Ok(order)
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn status(&self) -> OrderStatus { self.status }
    pub fn total_amount(&self) -> Money { self.total_amount }
    pub fn discount(&self) -> Money { self.discount }
    pub fn subtotal(&self) -> Money { self.subtotal }
    pub fn pricing_source(&self) -> PricingSource { self.pricing_source }
    pub fn items(&self) -> &[OrderItem] { &self.items }
    pub fn customer_name(&self) -> &str { &self.customer_name }
    pub fn payment_method(&self) -> PaymentMethod { self.payment_method }

    /// Admins may move an order to any status.
    pub fn update_status(&mut self, status: OrderStatus) {
        if status == self.status { return; }
        let from = self.status;
        self.status = status;
        self.touch();
        self.raise_event(DomainEvent::Order(OrderEvent::StatusChanged { order_id: self.id, from, to: status }));
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum OrderError { NoItems, UnknownStatus(String) }
impl std::error::Error for OrderError {}
impl std::fmt::Display for OrderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoItems => write!(f, "order has no items"),
            Self::UnknownStatus(s) => write!(f, "unknown order status {:?}", s),
        }
    }
}
