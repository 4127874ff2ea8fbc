//! Mercado Pago checkout client.
//!
//! Creates checkout preferences for placed orders. The access token is read
//! from the admin configuration on every call, so the client itself only
//! holds the HTTP connection pool and the API base URL.

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use edujuegos_core::CurrencyCode;

use crate::models::OrderWithItems;

/// Errors that can occur when talking to Mercado Pago.
#[derive(Debug, Error)]
pub enum MercadoPagoError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// A created checkout preference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preference {
    pub id: String,
    /// URL the buyer is redirected to.
    pub init_point: String,
}

#[derive(Debug, Serialize)]
struct PreferenceRequest<'a> {
    items: Vec<PreferenceItem<'a>>,
    payer: Payer<'a>,
    external_reference: String,
    back_urls: BackUrls,
    auto_return: &'static str,
}

#[derive(Debug, Serialize)]
struct PreferenceItem<'a> {
    id: String,
    title: &'a str,
    quantity: i32,
    #[serde(with = "rust_decimal::serde::float")]
    unit_price: Decimal,
    currency_id: CurrencyCode,
}

#[derive(Debug, Serialize)]
struct Payer<'a> {
    name: &'a str,
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct BackUrls {
    success: String,
    failure: String,
    pending: String,
}

/// Mercado Pago API client.
#[derive(Clone)]
pub struct MercadoPagoClient {
    client: reqwest::Client,
    api_url: String,
}

impl MercadoPagoClient {
    /// Create a client for the given API base URL.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(api_url: &str) -> Result<Self, MercadoPagoError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a checkout preference for an order.
    ///
    /// # Errors
    ///
    /// Returns `MercadoPagoError::Api` for non-success responses and
    /// `MercadoPagoError::Http` when the request cannot be sent.
    pub async fn create_preference(
        &self,
        access_token: &SecretString,
        order: &OrderWithItems,
        public_url: &str,
    ) -> Result<Preference, MercadoPagoError> {
        let url = format!("{}/checkout/preferences", self.api_url);
        let body = preference_request(order, public_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(access_token.expose_secret())
            .json(&body)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MercadoPagoError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let preference: Preference = response
            .json()
            .await
            .map_err(|e| MercadoPagoError::Parse(e.to_string()))?;

        tracing::info!(
            order_id = %order.order.id,
            preference_id = %preference.id,
            "Mercado Pago preference created"
        );
        Ok(preference)
    }
}

fn preference_request<'a>(order: &'a OrderWithItems, public_url: &str) -> PreferenceRequest<'a> {
    let items = order
        .items
        .iter()
        .map(|item| PreferenceItem {
            id: item.product_id.to_string(),
            title: &item.product.name,
            quantity: item.quantity,
            unit_price: item.price.amount(),
            currency_id: CurrencyCode::default(),
        })
        .collect();

    let back_url = |outcome: &str| format!("{public_url}/checkout/{outcome}?order={}", order.order.id);

    PreferenceRequest {
        items,
        payer: Payer {
            name: &order.order.customer_name,
            email: &order.order.customer_email,
        },
        external_reference: order.order.id.to_string(),
        back_urls: BackUrls {
            success: back_url("success"),
            failure: back_url("failure"),
            pending: back_url("pending"),
        },
        auto_return: "approved",
    }
}
