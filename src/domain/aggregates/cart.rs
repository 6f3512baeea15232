//! Cart Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::value_objects::{Money, Quantity};
use crate::pricing::{compute_total, LineItem, PricingError, PricingPolicy, TotalBreakdown};

#[derive(Clone, Debug)]
pub struct Cart {
    id: Uuid,
    items: Vec<CartItem>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CartItem {
    pub product_id: u64,
    pub name: String,
    line: LineItem,
}

impl CartItem {
    pub fn new(product_id: u64, name: impl Into<String>, unit_price: Decimal, quantity: u32) -> Result<Self, PricingError> {
        Ok(Self { product_id, name: name.into(), line: LineItem::new(unit_price, quantity)? })
    }

    pub fn unit_price(&self) -> Money { self.line.unit_price() }
    pub fn quantity(&self) -> Quantity { self.line.quantity() }
    pub fn line_item(&self) -> LineItem { self.line }
    /// Rounded for display; see [`crate::pricing`] on rounding.
    pub fn line_total(&self) -> Money { self.line.extended().rounded() }
}

impl Cart {
    pub fn new() -> Self {
        let now = Utc::now();
        Self { id: Uuid::new_v4(), items: vec![], created_at: now, updated_at: now }
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn item_count(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    /// Merges into an existing line for the same product, keeping the newest price.
    pub fn add_item(&mut self, item: CartItem) -> Result<(), CartError> {
        if let Some(existing) = self.items.iter_mut().find(|i| i.product_id == item.product_id) {
            let quantity = existing.quantity().add(item.quantity()).map_err(PricingError::from)?;
            existing.line = LineItem::new(item.unit_price().amount(), quantity.value())?;
            existing.name = item.name;
        } else {
            self.items.push(item);
        }
        self.touch();
        Ok(())
    }

    /// A quantity of zero removes the line.
    pub fn update_quantity(&mut self, product_id: u64, quantity: u32) -> Result<(), CartError> {
        let item = self.items.iter_mut().find(|i| i.product_id == product_id).ok_or(CartError::ItemNotFound(product_id))?;
        if quantity == 0 {
            self.items.retain(|i| i.product_id != product_id);
        } else {
            item.line = LineItem::new(item.unit_price().amount(), quantity)?;
        }
        self.touch();
        Ok(())
    }

    pub fn remove_item(&mut self, product_id: u64) -> Result<(), CartError> {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        if self.items.len() == before { return Err(CartError::ItemNotFound(product_id)); }
        self.touch();
        Ok(())
    }

    pub fn clear(&mut self) { self.items.clear(); self.touch(); }

    pub fn line_items(&self) -> Vec<LineItem> { self.items.iter().map(CartItem::line_item).collect() }

    pub fn breakdown(&self, policy: &PricingPolicy) -> TotalBreakdown { compute_total(&self.line_items(), policy) }

    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

impl Default for Cart {
    fn default() -> Self { Self::new() }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum CartError { ItemNotFound(u64), Pricing(PricingError) }
impl std::error::Error for CartError {}
impl From<PricingError> for CartError {
    fn from(e: PricingError) -> Self { Self::Pricing(e) }
}
impl std::fmt::Display for CartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ItemNotFound(id) => write!(f, "product {} is not in the cart", id),
            Self::Pricing(e) => write!(f, "{}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::QuantityError;
    use rust_decimal_macros::dec;

    fn laptop(qty: u32) -> CartItem { CartItem::new(1, "Laptop", dec!(600), qty).unwrap() }

    #[test]
    fn test_cart_operations() {
        let mut cart = Cart::new();
        cart.add_item(laptop(1)).unwrap();
        cart.add_item(CartItem::new(2, "Mouse", dec!(25.50), 2).unwrap()).unwrap();
        assert_eq!(cart.item_count(), 2);
        cart.add_item(laptop(1)).unwrap();
        assert_eq!(cart.items()[0].quantity().value(), 2); // Merged
        assert_eq!(cart.items()[0].line_total(), Money::new(dec!(1200)));

        let b = cart.breakdown(&PricingPolicy::STANDARD);
        assert_eq!(b.subtotal, Money::new(dec!(1251)));
        assert_eq!(b.discount, Money::new(dec!(125.10)));
        assert_eq!(b.total, Money::new(dec!(1125.90)));
    }

    #[test]
    fn test_merge_beyond_max_quantity_is_rejected() {
        let mut cart = Cart::new();
        cart.add_item(laptop(999_999)).unwrap();
        assert_eq!(
            cart.add_item(laptop(5)),
            Err(CartError::Pricing(PricingError::InvalidQuantity(QuantityError::TooLarge(1_000_004))))
        );
        assert_eq!(cart.items()[0].quantity().value(), 999_999);
    }

    #[test]
    fn test_update_and_remove() {
        let mut cart = Cart::new();
        cart.add_item(laptop(2)).unwrap();
        cart.update_quantity(1, 1).unwrap();
        assert_eq!(cart.breakdown(&PricingPolicy::STANDARD).total, Money::new(dec!(600)));
        cart.update_quantity(1, 0).unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.remove_item(1), Err(CartError::ItemNotFound(1)));
        assert_eq!(cart.update_quantity(9, 1), Err(CartError::ItemNotFound(9)));
    }

    #[test]
    fn test_empty_cart_breakdown() {
        let mut cart = Cart::new();
        cart.add_item(laptop(3)).unwrap();
        cart.clear();
        assert_eq!(cart.breakdown(&PricingPolicy::STANDARD), TotalBreakdown::default());
    }
}
