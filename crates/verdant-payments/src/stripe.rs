//! Stripe Checkout Sessions client.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error};
use verdant_core::error::DomainError;
use verdant_marketplace::domain::repository::{CheckoutGateway, CheckoutRequest, CheckoutSession};

use crate::error::PaymentError;

const CHECKOUT_SESSIONS_ENDPOINT: &str = "https://api.stripe.com/v1/checkout/sessions";
const CURRENCY: &str = "usd";

/// Creates hosted checkout pages through the Stripe REST API.
#[derive(Debug, Clone)]
pub struct StripeClient {
    client: reqwest::Client,
    secret_key: String,
    endpoint: String,
}

#[derive(Deserialize)]
struct SessionResponse {
    id: String,
    url: Option<String>,
}

impl StripeClient {
    /// Creates a client authenticated with `secret_key` (`sk_...`).
    #[must_use]
    pub fn new(client: reqwest::Client, secret_key: String) -> Self {
        Self {
            client,
            secret_key,
            endpoint: CHECKOUT_SESSIONS_ENDPOINT.to_owned(),
        }
    }

    /// Overrides the API endpoint (used against local fakes).
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn create_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.secret_key)
            .form(&form_params(request))
            .send()
            .await
            .map_err(|e| PaymentError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PaymentError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let session: SessionResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::InvalidPayload(e.to_string()))?;
        let url = session.url.ok_or_else(|| {
            PaymentError::InvalidPayload("checkout session without url".to_owned())
        })?;
        Ok(CheckoutSession {
            session_id: session.id,
            url,
        })
    }
}

/// Flattens a checkout request into Stripe's bracketed form encoding.
fn form_params(request: &CheckoutRequest) -> Vec<(String, String)> {
    let mut params = vec![
        ("mode".to_owned(), "payment".to_owned()),
        ("success_url".to_owned(), request.success_url.clone()),
        ("cancel_url".to_owned(), request.cancel_url.clone()),
        ("customer_email".to_owned(), request.customer_email.clone()),
    ];
    for (i, item) in request.line_items.iter().enumerate() {
        let prefix = format!("line_items[{i}]");
        params.push((
            format!("{prefix}[price_data][currency]"),
            CURRENCY.to_owned(),
        ));
        params.push((
            format!("{prefix}[price_data][unit_amount]"),
            item.amount_cents.to_string(),
        ));
        params.push((
            format!("{prefix}[price_data][product_data][name]"),
            item.name.clone(),
        ));
        params.push((
            format!("{prefix}[price_data][product_data][description]"),
            item.description.clone(),
        ));
        params.push((format!("{prefix}[quantity]"), "1".to_owned()));
    }
    for (key, value) in &request.metadata {
        params.push((format!("metadata[{key}]"), value.clone()));
    }
    params
}

#[async_trait]
impl CheckoutGateway for StripeClient {
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, DomainError> {
        match self.create_session(request).await {
            Ok(session) => {
                debug!(session_id = %session.session_id, "stripe checkout session created");
                Ok(session)
            }
            Err(e) => {
                error!(error = %e, "stripe checkout session creation failed");
                Err(DomainError::Infrastructure(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use verdant_marketplace::domain::repository::CheckoutLineItem;

    use super::*;

    #[test]
    fn test_form_params_flatten_line_items_and_metadata() {
        // Arrange
        let request = CheckoutRequest {
            customer_email: "ana@acme.test".to_owned(),
            line_items: vec![
                CheckoutLineItem {
                    name: "Aire limpio".to_owned(),
                    description: "100 empleados".to_owned(),
                    amount_cents: 9_000,
                },
                CheckoutLineItem {
                    name: "Cero residuos".to_owned(),
                    description: "100 empleados".to_owned(),
                    amount_cents: 4_500,
                },
            ],
            metadata: BTreeMap::from([("purchase_type".to_owned(), "corporate".to_owned())]),
            success_url: "https://verdant.app/ok".to_owned(),
            cancel_url: "https://verdant.app/cart".to_owned(),
        };

        // Act
        let params = form_params(&request);

        // Assert
        let get = |key: &str| {
            params
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("mode"), Some("payment"));
        assert_eq!(get("line_items[0][price_data][unit_amount]"), Some("9000"));
        assert_eq!(
            get("line_items[1][price_data][product_data][name]"),
            Some("Cero residuos")
        );
        assert_eq!(get("line_items[1][quantity]"), Some("1"));
        assert_eq!(get("line_items[0][price_data][currency]"), Some("usd"));
        assert_eq!(get("metadata[purchase_type]"), Some("corporate"));
        assert_eq!(get("customer_email"), Some("ana@acme.test"));
    }
}
