//! Admin-only route handlers: client listing and store configuration.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::instrument;

use crate::db::{AdminConfigRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{AdminConfigInput, AdminConfigView, User};
use crate::routes::ApiJson;
use crate::state::AppState;

/// Every account, newest first. Password hashes are never serialized.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn clients(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<Vec<User>>> {
    let users = UserRepository::new(state.pool()).list().await?;
    Ok(Json(users))
}

/// Current configuration with secrets masked, or `{}` before the first save.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn get_config(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Response> {
    let config = AdminConfigRepository::new(state.pool()).get().await?;

    Ok(match config {
        Some(config) => Json(AdminConfigView::from(&config)).into_response(),
        None => Json(json!({})).into_response(),
    })
}

/// Save the configuration.
///
/// Masked secrets echoed back by the admin panel keep the stored value.
#[instrument(skip(state, admin, input), fields(admin_id = %admin.id))]
pub async fn save_config(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(input): ApiJson<AdminConfigInput>,
) -> Result<(StatusCode, Json<AdminConfigView>)> {
    let repo = AdminConfigRepository::new(state.pool());
    let existing = repo.get().await?;
    let values = input
        .normalize(existing.as_ref())
        .map_err(AppError::BadRequest)?;

    let saved = repo.save(&values).await?;
    tracing::info!(
        smtp_configured = saved.smtp_settings().is_some(),
        mercadopago_configured = saved.mercadopago_configured(),
        "Admin configuration saved"
    );

    Ok((StatusCode::CREATED, Json(AdminConfigView::from(&saved))))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };

    use crate::routes::tests::send;

    #[tokio::test]
    async fn test_clients_requires_token() {
        let request = Request::builder()
            .uri("/api/admin/clients")
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(request).await.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_config_rejects_malformed_token() {
        let request = Request::builder()
            .uri("/api/admin/config")
            .header(header::AUTHORIZATION, "Bearer mock_token_nope")
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(request).await.status(), StatusCode::UNAUTHORIZED);
    }
}
