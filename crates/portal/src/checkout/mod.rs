//! External checkout provider integration.
//!
//! The portal never processes payment itself: a finished cart is handed to
//! the provider, which returns a payment URL the buyer completes the
//! purchase on. When the billing entity carries a complete address the
//! provider prefills its registration forms and the buyer skips straight
//! to payment.

mod tray;

pub use tray::TrayCheckout;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pedidoflex_core::{Address, BillingEntity, CartItem, Money, TaxId};
use serde::Deserialize;
use thiserror::Error;

/// Errors surfaced by a checkout provider.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The billing entity lacks address fields the provider needs to
    /// prefill its forms. Actionable: edit the entity, then retry.
    #[error("billing entity is missing required address fields: {}", missing.join(", "))]
    IncompleteAddress { missing: Vec<&'static str> },

    /// The provider refused the order (invalid customer data, closed
    /// account, ...). Not retryable without changing the request.
    #[error("checkout provider rejected the request: {0}")]
    Rejected(String),

    /// Transport-level failure. Retryable.
    #[error("checkout provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider did not answer within the configured deadline.
    /// Retryable.
    #[error("checkout provider timed out after {0:?}")]
    Timeout(Duration),

    /// The provider answered with a body we could not decode. Retryable:
    /// this is usually an intermediary error page.
    #[error("invalid checkout provider response: {0}")]
    Parse(#[from] serde_json::Error),
}

impl CheckoutError {
    /// Whether retrying the same request later could succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Timeout(_) | Self::Parse(_))
    }
}

/// The payment session returned by a successful handoff.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    /// The provider's order reference.
    pub reference_id: String,
    /// Where the buyer completes payment.
    pub payment_url: String,
}

/// The external checkout provider.
#[async_trait]
pub trait CheckoutProvider: Send + Sync {
    /// Confirm the tax number is registered (or registrable) with the
    /// provider.
    async fn validate_customer(&self, tax_number: &TaxId) -> Result<(), CheckoutError>;

    /// Hand the finished cart off and obtain a payment session.
    async fn create_order(
        &self,
        entity: &BillingEntity,
        items: &[CartItem],
        total: &Money,
    ) -> Result<CheckoutSession, CheckoutError>;
}

/// Shared handle to the configured provider.
pub type SharedCheckout = Arc<dyn CheckoutProvider>;

/// Verify the entity can prefill the provider's checkout forms.
///
/// # Errors
///
/// Returns [`CheckoutError::IncompleteAddress`] naming the blank fields,
/// or listing every required field when no address is recorded at all.
pub fn verify_prefill(entity: &BillingEntity) -> Result<&Address, CheckoutError> {
    let Some(address) = entity.address.as_ref() else {
        return Err(CheckoutError::IncompleteAddress {
            missing: Address::REQUIRED_FIELDS.to_vec(),
        });
    };
    let missing = address.missing_fields();
    if missing.is_empty() {
        Ok(address)
    } else {
        Err(CheckoutError::IncompleteAddress { missing })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pedidoflex_core::EntityId;

    use super::*;

    fn entity(address: Option<Address>) -> BillingEntity {
        BillingEntity {
            id: EntityId::new("c1"),
            name: "Lanches Mirante".to_owned(),
            legal_name: None,
            tax_number: TaxId::parse("11.222.333/0001-81").unwrap(),
            responsible_cpf: None,
            distributor: "Distribuidora Norte".to_owned(),
            contact_email: None,
            phone: None,
            address,
        }
    }

    #[test]
    fn test_verify_prefill_no_address() {
        let err = verify_prefill(&entity(None)).unwrap_err();
        match err {
            CheckoutError::IncompleteAddress { missing } => {
                assert_eq!(missing, Address::REQUIRED_FIELDS.to_vec());
            }
            other => panic!("expected IncompleteAddress, got {other}"),
        }
    }

    #[test]
    fn test_verify_prefill_partial_address() {
        let address = Address {
            postal_code: "01310-100".to_owned(),
            street: "Avenida Paulista".to_owned(),
            ..Address::default()
        };
        let err = verify_prefill(&entity(Some(address))).unwrap_err();
        match err {
            CheckoutError::IncompleteAddress { missing } => {
                assert_eq!(missing, vec!["number", "district", "city", "state"]);
            }
            other => panic!("expected IncompleteAddress, got {other}"),
        }
    }

    #[test]
    fn test_transient_classification() {
        let incomplete = CheckoutError::IncompleteAddress { missing: vec![] };
        assert!(!incomplete.is_transient());
        assert!(!CheckoutError::Rejected("conta encerrada".to_owned()).is_transient());
        assert!(CheckoutError::Timeout(Duration::from_secs(30)).is_transient());
    }
}
