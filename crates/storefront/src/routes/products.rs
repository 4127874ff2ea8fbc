//! Product catalog route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};
use tracing::instrument;

use edujuegos_core::ProductId;

use crate::db::{ProductRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{NewProduct, Product, ProductUpdate};
use crate::routes::{ApiJson, ApiPath};
use crate::state::AppState;

const PRODUCT_NOT_FOUND: &str = "Producto no encontrado";

fn not_found(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::NotFound => AppError::NotFound(PRODUCT_NOT_FOUND.to_string()),
        other => AppError::Database(other),
    }
}

/// List active products, newest first.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool()).list_active().await?;
    Ok(Json(products))
}

/// Show a single product. Inactive products stay reachable by ID.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Product>> {
    ProductRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(PRODUCT_NOT_FOUND.to_string()))
}

/// Create a product.
#[instrument(skip(state, admin, product), fields(admin_id = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(product): ApiJson<NewProduct>,
) -> Result<(StatusCode, Json<Product>)> {
    product.validate().map_err(AppError::BadRequest)?;

    let created = ProductRepository::new(state.pool()).create(&product).await?;
    tracing::info!(product_id = %created.id, name = %created.name, "Product created");

    Ok((StatusCode::CREATED, Json(created)))
}

/// Apply a partial update.
#[instrument(skip(state, admin, update), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(update): ApiJson<ProductUpdate>,
) -> Result<Json<Product>> {
    update.validate().map_err(AppError::BadRequest)?;

    let product = ProductRepository::new(state.pool())
        .update(id, &update)
        .await
        .map_err(not_found)?;

    Ok(Json(product))
}

/// Soft delete a product.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Value>> {
    ProductRepository::new(state.pool())
        .deactivate(id)
        .await
        .map_err(not_found)?;

    tracing::info!(product_id = %id, "Product deactivated");
    Ok(Json(json!({ "message": "Producto eliminado correctamente" })))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::json;

    use super::*;
    use crate::routes::tests::{body_json, json_request, send};

    #[test]
    fn test_not_found_maps_to_product_message() {
        let err = not_found(RepositoryError::NotFound);
        assert!(matches!(err, AppError::NotFound(ref msg) if msg == PRODUCT_NOT_FOUND));
    }

    #[tokio::test]
    async fn test_create_requires_token() {
        let response = send(json_request(
            "POST",
            "/api/products",
            &json!({ "name": "Kit" }),
        ))
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_show_rejects_malformed_id() {
        let request = Request::builder()
            .uri("/api/products/not-a-uuid")
            .body(Body::empty())
            .unwrap();
        let response = send(request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["message"], "Identificador inválido");
    }
}
