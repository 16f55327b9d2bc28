//! Domain records shared across the portal and tooling.
//!
//! These are plain data definitions; the behavior that manipulates them
//! (cart arithmetic, visibility rules, the submission workflow) lives in
//! the portal crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{
    Email, EntityId, Money, OrderId, OrderStatus, PostId, ProductId, TaxId, UserId, UserRole,
};

/// A portal account.
///
/// `entity_ids` lists the billing entities the user owns. For an
/// [`UserRole::Admin`] the list is informational only: admins implicitly
/// see every entity regardless of its contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub role: UserRole,
    #[serde(default)]
    pub entity_ids: Vec<EntityId>,
}

/// A structured Brazilian address, as the checkout provider expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Address {
    pub postal_code: String,
    pub street: String,
    pub number: String,
    pub district: String,
    pub city: String,
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complement: Option<String>,
}

impl Address {
    /// The fields the checkout provider requires to prefill its forms.
    pub const REQUIRED_FIELDS: [&'static str; 6] = [
        "postal_code",
        "street",
        "number",
        "district",
        "city",
        "state",
    ];

    /// Names of required fields that are blank.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let values = [
            &self.postal_code,
            &self.street,
            &self.number,
            &self.district,
            &self.city,
            &self.state,
        ];
        Self::REQUIRED_FIELDS
            .iter()
            .zip(values)
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect()
    }

    /// Whether every required field is filled in.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

/// A registered billing entity (a CNPJ record).
///
/// Created and edited only through the backoffice; never deleted in-band.
/// An entity without a complete [`Address`] can still be browsed against,
/// but order submission will fail at the billing-address phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingEntity {
    pub id: EntityId,
    /// Trade name (nome fantasia).
    pub name: String,
    /// Registered legal name (razão social), when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legal_name: Option<String>,
    /// The CNPJ (or CPF, for individual buyers) this entity invoices under.
    pub tax_number: TaxId,
    /// CPF of the legal responsible, required by the checkout provider for
    /// B2B registrations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responsible_cpf: Option<TaxId>,
    /// Which distributor serves this entity.
    pub distributor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<Email>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub unit_price: Money,
    pub stock: u32,
    pub image_url: String,
    pub category: String,
}

/// A line in a cart: a point-in-time copy of the product plus a quantity.
///
/// Quantity is always at least 1; decrementing clamps rather than removes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Money,
    pub stock: u32,
    pub image_url: String,
    pub category: String,
    pub quantity: u32,
}

impl CartItem {
    /// Snapshot a product as a new line with quantity 1.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price: product.unit_price,
            stock: product.stock,
            image_url: product.image_url.clone(),
            category: product.category.clone(),
            quantity: 1,
        }
    }

    /// Price × quantity for this line.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}

/// The payment handle returned by the checkout provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReference {
    /// The provider's order reference.
    pub reference_id: String,
    /// Where the buyer completes payment.
    pub payment_url: String,
}

/// A submitted order.
///
/// Immutable once created: `total` and `items` reflect the cart at
/// submission time, and the billing entity's tax number is denormalized so
/// later entity edits do not rewrite history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub entity_id: EntityId,
    pub tax_number: TaxId,
    pub created_at: DateTime<Utc>,
    pub total: Money,
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentReference>,
    pub items: Vec<CartItem>,
}

/// An informational post shown on the portal's news feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsPost {
    pub id: PostId,
    pub title: String,
    pub body: String,
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::types::Currency;

    fn juice() -> Product {
        Product {
            id: ProductId::new("p1"),
            name: "Suco Natural Integral 1L".to_owned(),
            unit_price: Money::new(Decimal::new(1250, 2), Currency::Brl),
            stock: 150,
            image_url: "https://images.example.com/suco.jpg".to_owned(),
            category: "Bebidas".to_owned(),
        }
    }

    #[test]
    fn test_cart_item_snapshot() {
        let item = CartItem::from_product(&juice());
        assert_eq!(item.quantity, 1);
        assert_eq!(item.product_id, ProductId::new("p1"));
        assert_eq!(item.line_total().amount, Decimal::new(1250, 2));
    }

    #[test]
    fn test_address_missing_fields() {
        let mut address = Address {
            postal_code: "01310-100".to_owned(),
            street: "Avenida Paulista".to_owned(),
            number: "1000".to_owned(),
            district: "Bela Vista".to_owned(),
            city: "São Paulo".to_owned(),
            state: "SP".to_owned(),
            complement: None,
        };
        assert!(address.is_complete());

        address.number.clear();
        address.district = "  ".to_owned();
        assert_eq!(address.missing_fields(), vec!["number", "district"]);
    }
}
