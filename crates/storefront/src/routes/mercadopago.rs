//! Mercado Pago checkout route handlers.
//!
//! Keys are read from the admin configuration on every request so that a
//! newly saved token takes effect without a restart.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use edujuegos_core::OrderId;

use crate::db::{AdminConfigRepository, OrderRepository};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireUser;
use crate::routes::ApiJson;
use crate::services::Preference;
use crate::state::AppState;

/// Public checkout settings for the browser SDK.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicConfig {
    pub public_key: Option<String>,
    pub configured: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub order_id: OrderId,
}

#[instrument(skip(state))]
pub async fn config(State(state): State<AppState>) -> Result<Json<PublicConfig>> {
    let config = AdminConfigRepository::new(state.pool()).get().await?;

    Ok(Json(match config {
        Some(config) => PublicConfig {
            configured: config.mercadopago_configured(),
            public_key: config.mp_public_key,
        },
        None => PublicConfig {
            public_key: None,
            configured: false,
        },
    }))
}

/// Create a checkout preference for one of the caller's orders.
#[instrument(skip(state, user, request), fields(user_id = %user.id, order_id = %request.order_id))]
pub async fn create_payment(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiJson(request): ApiJson<CreatePaymentRequest>,
) -> Result<Json<Preference>> {
    let access_token = AdminConfigRepository::new(state.pool())
        .get()
        .await?
        .and_then(|config| config.mercadopago_access_token())
        .ok_or_else(|| AppError::BadRequest("MercadoPago no configurado".to_string()))?;

    let order = OrderRepository::new(state.pool())
        .get_with_items(request.order_id)
        .await?
        .filter(|order| user.is_admin() || order.order.user_id == user.id)
        .ok_or_else(|| AppError::NotFound("Orden no encontrada".to_string()))?;

    let preference = state
        .mercadopago()
        .create_preference(&access_token, &order, &state.config().public_url)
        .await?;

    add_breadcrumb(
        "payment",
        "Checkout preference created",
        Some(&[("preference_id", preference.id.as_str())]),
    );

    Ok(Json(preference))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use super::*;
    use crate::routes::tests::{json_request, send};

    #[test]
    fn test_public_config_shape() {
        let json = serde_json::to_value(PublicConfig {
            public_key: Some("APP_USR-public".to_string()),
            configured: true,
        })
        .unwrap();
        assert_eq!(json["publicKey"], "APP_USR-public");
        assert_eq!(json["configured"], true);
    }

    #[tokio::test]
    async fn test_create_payment_requires_token() {
        let response = send(json_request(
            "POST",
            "/api/mercadopago/create-payment",
            &json!({ "orderId": "00000000-0000-0000-0000-000000000000" }),
        ))
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
