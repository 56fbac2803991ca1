//! Payment gateway collaborator
//!
//! The engine only needs one call from the provider: create a payment
//! intent for an amount and get back the intent id plus the client-side
//! continuation secret. Confirmation arrives later through signed webhooks.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// A provider payment intent
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: Option<String>,
}

/// Gateway call failures. These never mutate payment state and are safe to retry.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    Request(String),

    #[error("gateway returned an unusable response: {0}")]
    Response(String),
}

/// The slice of the provider the engine depends on
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a payment intent for `amount_minor` (minor currency units)
    async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        order_id: i64,
    ) -> Result<PaymentIntent, GatewayError>;
}

/// Stripe-backed gateway
pub struct StripeGateway {
    client: reqwest::Client,
    secret_key: String,
    api_base: String,
}

impl StripeGateway {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            secret_key: secret_key.into(),
            api_base: "https://api.stripe.com".into(),
        }
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        order_id: i64,
    ) -> Result<PaymentIntent, GatewayError> {
        let params = [
            ("amount", amount_minor.to_string()),
            ("currency", currency.to_string()),
            ("metadata[order_id]", order_id.to_string()),
        ];
        let response = self
            .client
            .post(format!("{}/v1/payment_intents", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&params)
            .send()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Response(format!("{status}: {body}")));
        }

        response
            .json::<PaymentIntent>()
            .await
            .map_err(|e| GatewayError::Response(e.to_string()))
    }
}

/// In-process gateway for development and tests.
///
/// Issues `pi_…` intents locally; can be switched into a failing mode to
/// exercise the error path.
#[derive(Default)]
pub struct MockGateway {
    fail: std::sync::atomic::AtomicBool,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail
    pub fn set_failing(&self, failing: bool) {
        self.fail
            .store(failing, std::sync::atomic::Ordering::Relaxed);
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_payment_intent(
        &self,
        _amount_minor: i64,
        _currency: &str,
        _order_id: i64,
    ) -> Result<PaymentIntent, GatewayError> {
        if self.fail.load(std::sync::atomic::Ordering::Relaxed) {
            return Err(GatewayError::Request("mock gateway is failing".into()));
        }
        let token = uuid::Uuid::new_v4().simple().to_string();
        Ok(PaymentIntent {
            id: format!("pi_{token}"),
            client_secret: Some(format!("pi_{token}_secret")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_gateway_issues_distinct_intents() {
        let gateway = MockGateway::new();
        let a = gateway.create_payment_intent(7900, "usd", 1).await.unwrap();
        let b = gateway.create_payment_intent(7900, "usd", 1).await.unwrap();
        assert!(a.id.starts_with("pi_"));
        assert_ne!(a.id, b.id);
        assert!(a.client_secret.unwrap().ends_with("_secret"));
    }

    #[tokio::test]
    async fn test_mock_gateway_failure_mode() {
        let gateway = MockGateway::new();
        gateway.set_failing(true);
        assert!(gateway.create_payment_intent(100, "usd", 1).await.is_err());
        gateway.set_failing(false);
        assert!(gateway.create_payment_intent(100, "usd", 1).await.is_ok());
    }
}
