//! The working cart for the active billing-entity context.
//!
//! One cart per session; it is stored in the session and discarded when
//! the user switches billing entities or an order is submitted
//! successfully. The total is recomputed on every call because quantities
//! are mutable and prices come from the product snapshot taken at add
//! time.

use pedidoflex_core::{CartItem, Currency, Money, Product, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The per-session product selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Add one unit of a product.
    ///
    /// If the product is already in the cart its quantity is incremented;
    /// otherwise a new line is appended, so existing lines keep their
    /// position.
    pub fn add(&mut self, product: &Product) {
        match self
            .items
            .iter_mut()
            .find(|item| item.product_id == product.id)
        {
            Some(item) => item.quantity = item.quantity.saturating_add(1),
            None => self.items.push(CartItem::from_product(product)),
        }
    }

    /// Adjust a line's quantity by `delta`, clamping at 1.
    ///
    /// A negative delta never removes the line; removal is only ever
    /// explicit via [`Cart::remove`]. Returns `false` if the product is not
    /// in the cart.
    pub fn adjust_quantity(&mut self, product_id: &ProductId, delta: i32) -> bool {
        let Some(item) = self
            .items
            .iter_mut()
            .find(|item| &item.product_id == product_id)
        else {
            return false;
        };
        let adjusted = i64::from(item.quantity) + i64::from(delta);
        item.quantity = u32::try_from(adjusted.max(1)).unwrap_or(u32::MAX);
        true
    }

    /// Remove a line entirely, regardless of quantity.
    ///
    /// Returns `false` if the product is not in the cart.
    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| &item.product_id != product_id);
        self.items.len() != before
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of price × quantity over all lines, recomputed fresh.
    #[must_use]
    pub fn total(&self) -> Money {
        let currency = self
            .items
            .first()
            .map_or(Currency::Brl, |item| item.unit_price.currency);
        let amount: Decimal = self.items.iter().map(|item| item.line_total().amount).sum();
        Money::new(amount, currency)
    }

    /// The cart lines, in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(id: &str, cents: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Produto {id}"),
            unit_price: Money::brl(Decimal::new(cents, 2)),
            stock: 100,
            image_url: String::new(),
            category: "Snacks".to_owned(),
        }
    }

    #[test]
    fn test_add_same_product_twice_merges() {
        let mut cart = Cart::new();
        let juice = product("1", 1250);
        cart.add(&juice);
        cart.add(&juice);

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.items()[0].quantity, 2);
        assert_eq!(cart.total().amount, Decimal::new(2500, 2));
    }

    #[test]
    fn test_quantity_clamps_at_one() {
        let mut cart = Cart::new();
        cart.add(&product("1", 1250));

        assert!(cart.adjust_quantity(&ProductId::new("1"), -5));
        assert_eq!(cart.items()[0].quantity, 1);

        assert!(cart.adjust_quantity(&ProductId::new("1"), 3));
        assert_eq!(cart.items()[0].quantity, 4);

        assert!(!cart.adjust_quantity(&ProductId::new("missing"), 1));
    }

    #[test]
    fn test_remove_deletes_regardless_of_quantity() {
        let mut cart = Cart::new();
        cart.add(&product("1", 1250));
        cart.adjust_quantity(&ProductId::new("1"), 9);

        assert!(cart.remove(&ProductId::new("1")));
        assert!(cart.is_empty());
        assert!(!cart.remove(&ProductId::new("1")));
    }

    #[test]
    fn test_existing_lines_keep_position() {
        let mut cart = Cart::new();
        cart.add(&product("1", 100));
        cart.add(&product("2", 200));
        cart.add(&product("1", 100));
        cart.add(&product("3", 300));

        let ids: Vec<_> = cart
            .items()
            .iter()
            .map(|item| item.product_id.as_str().to_owned())
            .collect();
        assert_eq!(ids, ["1", "2", "3"]);
    }

    #[test]
    fn test_total_tracks_arbitrary_mutation_sequences() {
        let mut cart = Cart::new();
        let items = [product("1", 1250), product("2", 4590), product("3", 250)];
        for item in &items {
            cart.add(item);
        }
        cart.adjust_quantity(&ProductId::new("2"), 2);
        cart.adjust_quantity(&ProductId::new("3"), -10);
        cart.remove(&ProductId::new("1"));

        // Recompute the expected total from the surviving lines.
        let expected: Decimal = cart
            .items()
            .iter()
            .map(|item| item.unit_price.amount * Decimal::from(item.quantity))
            .sum();
        assert_eq!(cart.total().amount, expected);
        assert!(cart.items().iter().all(|item| item.quantity >= 1));
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        cart.add(&product("1", 1250));
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total().amount, Decimal::ZERO);
    }
}
