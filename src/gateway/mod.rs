//! Payment gateway client.
//!
//! The gateway is an external collaborator: it creates a remote payment
//! intent ("gateway order") for an amount expressed in the smallest currency
//! subunit, and later the paying client hands back a payment id plus an HMAC
//! signature covering the whole gateway transaction. The trait keeps the
//! remote dependency injectable; tests swap in a mock.

pub mod signature;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, instrument};

use crate::errors::ServiceError;

/// Request to open a remote gateway order.
#[derive(Debug, Clone, Serialize)]
pub struct GatewayOrderRequest {
    /// Amount in the smallest currency subunit (paise for INR)
    pub amount: i64,
    pub currency: String,
    /// Uniquely derived receipt label for reconciliation on the gateway side
    pub receipt: String,
    pub notes: serde_json::Value,
}

/// Remote gateway order as returned by the processor.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayOrder {
    /// Opaque gateway-assigned order identifier
    pub id: String,
    pub amount: i64,
    pub currency: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a payment-intent order at the gateway.
    async fn create_order(&self, request: GatewayOrderRequest)
        -> Result<GatewayOrder, ServiceError>;
}

/// Razorpay-style HTTP gateway client authenticated with basic auth.
pub struct HttpPaymentGateway {
    http: reqwest::Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

impl HttpPaymentGateway {
    pub fn new(base_url: String, key_id: String, key_secret: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            key_id,
            key_secret,
        }
    }

    /// Build a gateway client from configuration; `None` when the gateway
    /// credentials are absent, in which case order creation is unavailable.
    pub fn from_config(cfg: &crate::config::AppConfig) -> Option<Self> {
        match (cfg.gateway_key_id.as_deref(), cfg.gateway_key_secret.as_deref()) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => Some(Self::new(
                cfg.gateway_base_url.clone(),
                id.to_string(),
                secret.to_string(),
            )),
            _ => None,
        }
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    #[instrument(skip(self, request), fields(amount = request.amount, currency = %request.currency))]
    async fn create_order(
        &self,
        request: GatewayOrderRequest,
    ) -> Result<GatewayOrder, ServiceError> {
        let url = format!("{}/v1/orders", self.base_url);

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Gateway order creation request failed");
                ServiceError::GatewayError(format!("gateway request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Gateway rejected order creation");
            return Err(ServiceError::GatewayError(format!(
                "gateway returned {}",
                status
            )));
        }

        response.json::<GatewayOrder>().await.map_err(|e| {
            error!(error = %e, "Gateway returned an unparseable order payload");
            ServiceError::GatewayError(format!("invalid gateway response: {}", e))
        })
    }
}
