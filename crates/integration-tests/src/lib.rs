//! Shared fixtures for the PedidoFlex integration tests.
//!
//! Tests drive the portal library in-process over the in-memory
//! persistence backend, with a scripted checkout provider standing in for
//! the external service.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use pedidoflex_core::{
    Address, BillingEntity, CartItem, Currency, Email, EntityId, Money, Product, ProductId,
    TaxId, User, UserId, UserRole,
};
use pedidoflex_portal::checkout::{
    CheckoutError, CheckoutProvider, CheckoutSession,
};
use rust_decimal::Decimal;
use tokio::sync::Notify;

/// What the scripted provider should do on `create_order`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MockBehavior {
    /// Answer every call successfully.
    #[default]
    Succeed,
    /// Refuse the customer at validation time.
    RejectValidation,
    /// Fail the payment-session call with a transient (timeout) error.
    TimeOutOnCreate,
}

/// A checkout provider scripted for tests.
///
/// Records every handoff it receives so tests can assert on the exact
/// snapshot the workflow sent.
#[derive(Default)]
pub struct MockCheckout {
    pub behavior: MockBehavior,
    /// When set, `create_order` blocks until the gate is notified - used
    /// to hold a submission in flight.
    pub create_gate: Option<Notify>,
    pub validate_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
    /// Every (items, total) pair handed to `create_order`.
    pub received: Mutex<Vec<(Vec<CartItem>, Money)>>,
}

impl MockCheckout {
    /// A provider that succeeds on every call.
    #[must_use]
    pub fn succeeding() -> Self {
        Self::default()
    }

    /// A provider scripted with the given behavior.
    #[must_use]
    pub fn with_behavior(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            ..Self::default()
        }
    }

    /// A succeeding provider whose `create_order` blocks until notified.
    #[must_use]
    pub fn gated() -> Self {
        Self {
            create_gate: Some(Notify::new()),
            ..Self::default()
        }
    }

    /// Release a gated `create_order`.
    pub fn release(&self) {
        if let Some(gate) = &self.create_gate {
            gate.notify_one();
        }
    }

    /// How many times each endpoint was called.
    #[must_use]
    pub fn calls(&self) -> (usize, usize) {
        (
            self.validate_calls.load(Ordering::SeqCst),
            self.create_calls.load(Ordering::SeqCst),
        )
    }
}

#[async_trait]
impl CheckoutProvider for MockCheckout {
    async fn validate_customer(&self, _tax_number: &TaxId) -> Result<(), CheckoutError> {
        self.validate_calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            MockBehavior::RejectValidation => {
                Err(CheckoutError::Rejected("cadastro não habilitado".to_owned()))
            }
            _ => Ok(()),
        }
    }

    async fn create_order(
        &self,
        _entity: &BillingEntity,
        items: &[CartItem],
        total: &Money,
    ) -> Result<CheckoutSession, CheckoutError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.create_gate {
            gate.notified().await;
        }
        if self.behavior == MockBehavior::TimeOutOnCreate {
            return Err(CheckoutError::Timeout(Duration::from_secs(30)));
        }

        if let Ok(mut received) = self.received.lock() {
            received.push((items.to_vec(), *total));
        }
        Ok(CheckoutSession {
            reference_id: "TRAY-584201".to_owned(),
            payment_url: "https://checkout.tray.example/pay/584201".to_owned(),
        })
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// A BRL amount from cents.
#[must_use]
pub fn brl(cents: i64) -> Money {
    Money::new(Decimal::new(cents, 2), Currency::Brl)
}

/// A catalog product.
#[must_use]
pub fn product(id: &str, name: &str, price_cents: i64) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_owned(),
        unit_price: brl(price_cents),
        stock: 100,
        image_url: format!("https://cdn.pedidoflex.com.br/produtos/{id}.jpg"),
        category: "Bebidas".to_owned(),
    }
}

/// A billing entity with a complete address (checkout can prefill).
///
/// # Panics
///
/// Panics if the fixture tax numbers fail to parse.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn entity_with_address(id: &str) -> BillingEntity {
    BillingEntity {
        id: EntityId::new(id),
        name: "Lanches Mirante".to_owned(),
        legal_name: Some("Mirante Alimentos LTDA".to_owned()),
        tax_number: TaxId::parse("11.222.333/0001-81").unwrap(),
        responsible_cpf: Some(TaxId::parse("123.456.789-09").unwrap()),
        distributor: "Distribuidora Norte".to_owned(),
        contact_email: Some(Email::parse("financeiro@lanchesmirante.com.br").unwrap()),
        phone: Some("11999998888".to_owned()),
        address: Some(Address {
            postal_code: "01310-100".to_owned(),
            street: "Avenida Paulista".to_owned(),
            number: "1000".to_owned(),
            district: "Bela Vista".to_owned(),
            city: "São Paulo".to_owned(),
            state: "SP".to_owned(),
            complement: None,
        }),
    }
}

/// A billing entity with no recorded address.
///
/// # Panics
///
/// Panics if the fixture tax number fails to parse.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn entity_without_address(id: &str) -> BillingEntity {
    BillingEntity {
        id: EntityId::new(id),
        name: "Empório Niklaus".to_owned(),
        legal_name: None,
        tax_number: TaxId::parse("98.765.432/0001-98").unwrap(),
        responsible_cpf: None,
        distributor: "Distribuidora Sul".to_owned(),
        contact_email: None,
        phone: None,
        address: None,
    }
}

/// A representative owning the given entity ids.
///
/// # Panics
///
/// Panics if the fixture email fails to parse.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn representative(id: &str, owned: &[&str]) -> User {
    User {
        id: UserId::new(id),
        email: Email::parse(&format!("{id}@pedidoflex.com.br")).unwrap(),
        name: "Representante".to_owned(),
        role: UserRole::Representative,
        entity_ids: owned.iter().map(|e| EntityId::new(*e)).collect(),
    }
}

/// An administrator.
///
/// # Panics
///
/// Panics if the fixture email fails to parse.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn admin(id: &str) -> User {
    User {
        id: UserId::new(id),
        email: Email::parse(&format!("{id}@pedidoflex.com.br")).unwrap(),
        name: "Admin".to_owned(),
        role: UserRole::Admin,
        entity_ids: Vec::new(),
    }
}
