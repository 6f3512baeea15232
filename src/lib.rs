//! Storefront Pricing
//!
//! Cart pricing and checkout for the storefront.
//!
//! ## Features
//! - Order totals with a threshold discount ([`pricing::PricingPolicy`])
//! - Delegated calculation through an external `price-calculator` process,
//!   with a transparent local fallback
//! - Cart and order aggregates
//! - HTTP surface for quoting and checkout
//! - Optional NATS publication of domain events

pub mod api;
pub mod config;
pub mod domain;
pub mod messaging;
pub mod pricing;

use thiserror::Error;

pub use domain::aggregates::{Cart, CartItem, Order, OrderStatus, PaymentMethod};
pub use domain::value_objects::{Money, Quantity};
pub use pricing::{compute_total, LineItem, OrderTotalCalculator, PricingPolicy, PricingSource, Quote, TotalBreakdown};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum StorefrontError {
    #[error(transparent)]
    Pricing(#[from] pricing::PricingError),

    #[error(transparent)]
    Order(#[from] domain::aggregates::OrderError),

    #[error("validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

pub type Result<T> = std::result::Result<T, StorefrontError>;
