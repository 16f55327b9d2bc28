//! Tray checkout client.
//!
//! Talks to the Tray commerce API over JSON. The customer payload carries
//! the billing entity's registration data and full address so Tray skips
//! its signup screen and lands the buyer directly on payment.

use async_trait::async_trait;
use pedidoflex_core::{Address, BillingEntity, CartItem, Money, TaxId};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{CheckoutError, CheckoutProvider, CheckoutSession, verify_prefill};
use crate::config::CheckoutConfig;

/// Client for the Tray checkout API.
#[derive(Clone)]
pub struct TrayCheckout {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
    timeout: std::time::Duration,
}

impl TrayCheckout {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &CheckoutConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            access_token: config.access_token.expose_secret().to_owned(),
            timeout: config.request_timeout,
        })
    }

    async fn post<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, CheckoutError> {
        let url = format!("{}{path}", self.base_url);
        self.client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CheckoutError::Timeout(self.timeout)
                } else {
                    CheckoutError::Http(e)
                }
            })
    }
}

#[async_trait]
impl CheckoutProvider for TrayCheckout {
    #[instrument(skip(self))]
    async fn validate_customer(&self, tax_number: &TaxId) -> Result<(), CheckoutError> {
        let body = ValidateCustomerPayload {
            tax_number: tax_number.digits(),
        };
        let response = self.post("/customers/validation", &body).await?;

        if response.status().is_success() {
            return Ok(());
        }
        Err(rejection(response).await)
    }

    #[instrument(skip_all, fields(entity = %entity.id, items = items.len()))]
    async fn create_order(
        &self,
        entity: &BillingEntity,
        items: &[CartItem],
        total: &Money,
    ) -> Result<CheckoutSession, CheckoutError> {
        let address = verify_prefill(entity)?;

        let body = CreateOrderPayload {
            customer: CustomerPayload::new(entity, address),
            items: items.iter().map(ItemPayload::from).collect(),
            total: format_amount(total),
            currency: total.currency.code(),
        };
        let response = self.post("/checkout/sessions", &body).await?;

        let status = response.status();
        // Read the body as text first so a failed decode can be logged.
        let text = response.text().await?;
        if !status.is_success() {
            tracing::warn!(%status, body = %text.chars().take(200).collect::<String>(),
                "Tray refused checkout session");
            return Err(CheckoutError::Rejected(extract_message(&text, status)));
        }

        let session: CheckoutSession = serde_json::from_str(&text).map_err(|e| {
            tracing::error!(error = %e, body = %text.chars().take(200).collect::<String>(),
                "unparseable Tray response");
            CheckoutError::Parse(e)
        })?;
        Ok(session)
    }
}

/// Turn a non-success response into a `Rejected` error with the provider's
/// message when one is present.
async fn rejection(response: reqwest::Response) -> CheckoutError {
    let status = response.status();
    match response.text().await {
        Ok(text) => CheckoutError::Rejected(extract_message(&text, status)),
        Err(e) => CheckoutError::Http(e),
    }
}

fn extract_message(body: &str, status: reqwest::StatusCode) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .map_or_else(|_| format!("HTTP {status}"), |e| e.message)
}

/// Amounts go over the wire as plain decimal strings with two places.
fn format_amount(money: &Money) -> String {
    format!("{:.2}", money.amount.round_dp(2))
}

#[derive(Serialize)]
struct ValidateCustomerPayload<'a> {
    tax_number: &'a str,
}

#[derive(Serialize)]
struct CreateOrderPayload<'a> {
    customer: CustomerPayload<'a>,
    items: Vec<ItemPayload<'a>>,
    total: String,
    currency: &'static str,
}

#[derive(Serialize)]
struct CustomerPayload<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    legal_name: Option<&'a str>,
    tax_number: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    responsible_cpf: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<&'a str>,
    address: AddressPayload<'a>,
}

impl<'a> CustomerPayload<'a> {
    fn new(entity: &'a BillingEntity, address: &'a Address) -> Self {
        Self {
            name: &entity.name,
            legal_name: entity.legal_name.as_deref(),
            tax_number: entity.tax_number.digits(),
            responsible_cpf: entity.responsible_cpf.as_ref().map(TaxId::digits),
            email: entity.contact_email.as_ref().map(pedidoflex_core::Email::as_str),
            phone: entity.phone.as_deref(),
            address: AddressPayload {
                zip_code: &address.postal_code,
                street: &address.street,
                number: &address.number,
                district: &address.district,
                city: &address.city,
                state: &address.state,
                complement: address.complement.as_deref(),
            },
        }
    }
}

#[derive(Serialize)]
struct AddressPayload<'a> {
    zip_code: &'a str,
    street: &'a str,
    number: &'a str,
    district: &'a str,
    city: &'a str,
    state: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    complement: Option<&'a str>,
}

#[derive(Serialize)]
struct ItemPayload<'a> {
    reference: &'a str,
    name: &'a str,
    quantity: u32,
    unit_price: String,
}

impl<'a> From<&'a CartItem> for ItemPayload<'a> {
    fn from(item: &'a CartItem) -> Self {
        Self {
            reference: item.product_id.as_str(),
            name: &item.name,
            quantity: item.quantity,
            unit_price: format_amount(&item.unit_price),
        }
    }
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_format_amount_two_places() {
        assert_eq!(format_amount(&Money::brl(Decimal::new(2500, 2))), "25.00");
        assert_eq!(format_amount(&Money::brl(Decimal::new(125, 1))), "12.50");
    }

    #[test]
    fn test_extract_message() {
        let status = reqwest::StatusCode::UNPROCESSABLE_ENTITY;
        assert_eq!(
            extract_message(r#"{"message":"CNPJ não habilitado"}"#, status),
            "CNPJ não habilitado"
        );
        assert_eq!(
            extract_message("<html>gateway error</html>", status),
            "HTTP 422 Unprocessable Entity"
        );
    }
}
