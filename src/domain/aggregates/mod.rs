//! Aggregates module
pub mod order;
pub mod cart;

pub use order::{CustomerDetails, Order, OrderError, OrderItem, OrderStatus, PaymentMethod};
pub use cart::{Cart, CartError, CartItem};
