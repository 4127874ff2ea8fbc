//! Order route handlers.
//!
//! Customers see and create their own orders; admins see every order and
//! drive status and shipment tracking.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use edujuegos_core::OrderId;

use crate::db::{OrderRepository, RepositoryError, StatsRepository};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::{RequireAdmin, RequireUser};
use crate::models::{
    NewOrder, NewTracking, Order, OrderDetail, OrderStatusUpdate, OrderTracking, OrderWithItems,
    User,
};
use crate::routes::{ApiJson, ApiPath};
use crate::state::AppState;

const ORDER_NOT_FOUND: &str = "Orden no encontrada";

fn order_not_found() -> AppError {
    AppError::NotFound(ORDER_NOT_FOUND.to_string())
}

/// Load an order header the user may see. Other users' orders read as absent.
async fn visible_order(repo: &OrderRepository<'_>, user: &User, id: OrderId) -> Result<Order> {
    repo.get(id)
        .await?
        .filter(|order| user.is_admin() || order.user_id == user.id)
        .ok_or_else(order_not_found)
}

/// List orders: all of them for admins, the caller's own otherwise.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Vec<OrderWithItems>>> {
    let repo = OrderRepository::new(state.pool());
    let orders = if user.is_admin() {
        repo.list_all().await?
    } else {
        repo.list_for_user(user.id).await?
    };
    Ok(Json(orders))
}

/// Place an order for the authenticated user.
#[instrument(skip(state, user, order), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiJson(order): ApiJson<NewOrder>,
) -> Result<(StatusCode, Json<OrderWithItems>)> {
    order.validate().map_err(AppError::BadRequest)?;

    let placed = OrderRepository::new(state.pool())
        .place(user.id, &order)
        .await?;

    tracing::info!(
        order_id = %placed.order.id,
        total = %placed.order.total,
        items = placed.items.len(),
        "Order placed"
    );
    add_breadcrumb(
        "order",
        "Order placed",
        Some(&[("order_id", &placed.order.id.to_string())]),
    );

    if let Err(e) = StatsRepository::new(state.pool()).refresh(user.id).await {
        tracing::warn!(error = %e, "Failed to refresh user stats after order");
    }

    Ok((StatusCode::CREATED, Json(placed)))
}

/// Show an order with its items and tracking history.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<OrderDetail>> {
    let detail = OrderRepository::new(state.pool())
        .get_detail(id)
        .await?
        .filter(|detail| user.is_admin() || detail.order.user_id == user.id)
        .ok_or_else(order_not_found)?;
    Ok(Json(detail))
}

/// Change an order's status.
#[instrument(skip(state, admin, update), fields(admin_id = %admin.id))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<OrderId>,
    ApiJson(update): ApiJson<OrderStatusUpdate>,
) -> Result<Json<Order>> {
    let tracking_number = update
        .tracking_number
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());

    let order = OrderRepository::new(state.pool())
        .update_status(id, update.status, tracking_number)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => order_not_found(),
            other => AppError::Database(other),
        })?;

    tracing::info!(order_id = %order.id, status = %order.status, "Order status updated");
    Ok(Json(order))
}

/// Tracking history of an order, oldest first.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn tracking(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<Vec<OrderTracking>>> {
    let repo = OrderRepository::new(state.pool());
    let order = visible_order(&repo, &user, id).await?;
    Ok(Json(repo.tracking(order.id).await?))
}

/// Append a tracking entry.
#[instrument(skip(state, admin, entry), fields(admin_id = %admin.id))]
pub async fn add_tracking(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<OrderId>,
    ApiJson(entry): ApiJson<NewTracking>,
) -> Result<(StatusCode, Json<OrderTracking>)> {
    let created = OrderRepository::new(state.pool())
        .add_tracking(id, &entry)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => order_not_found(),
            other => AppError::Database(other),
        })?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use serde_json::json;

    use crate::routes::tests::{body_json, json_request, send};

    #[tokio::test]
    async fn test_list_requires_token() {
        let request = Request::builder()
            .uri("/api/orders")
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(request).await.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_rejects_non_bearer_scheme() {
        let mut request = json_request("POST", "/api/orders", &json!({ "items": [] }));
        request
            .headers_mut()
            .insert(header::AUTHORIZATION, "Basic YWRtaW46YWRtaW4=".parse().unwrap());
        let response = send(request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["message"], "No autorizado");
    }
}
