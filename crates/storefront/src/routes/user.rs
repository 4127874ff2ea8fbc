//! Per-user data: favorites, purchase stats and notification preferences.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::instrument;

use edujuegos_core::ProductId;

use crate::db::{FavoriteRepository, NotificationRepository, RepositoryError, StatsRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::models::{
    Favorite, FavoriteWithProduct, NotificationPreferences, NotificationPreferencesUpdate,
    UserStats,
};
use crate::routes::{ApiJson, ApiPath};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteCheck {
    pub is_favorite: bool,
}

/// Favorites with their products, most recent first.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn favorites(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Vec<FavoriteWithProduct>>> {
    let favorites = FavoriteRepository::new(state.pool()).list(user.id).await?;
    Ok(Json(favorites))
}

/// Mark a product as favorite. Repeating the call returns the same favorite.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn add_favorite(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiPath(product_id): ApiPath<ProductId>,
) -> Result<(StatusCode, Json<Favorite>)> {
    let favorite = FavoriteRepository::new(state.pool())
        .add(user.id, product_id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("Producto no encontrado".to_string()),
            other => AppError::Database(other),
        })?;

    Ok((StatusCode::CREATED, Json(favorite)))
}

/// Unmark a favorite. Removing a product that was not a favorite succeeds.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn remove_favorite(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiPath(product_id): ApiPath<ProductId>,
) -> Result<Json<Value>> {
    let removed = FavoriteRepository::new(state.pool())
        .remove(user.id, product_id)
        .await?;
    if !removed {
        tracing::debug!(product_id = %product_id, "Favorite was already absent");
    }

    Ok(Json(json!({ "message": "Favorito eliminado" })))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn is_favorite(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiPath(product_id): ApiPath<ProductId>,
) -> Result<Json<FavoriteCheck>> {
    let is_favorite = FavoriteRepository::new(state.pool())
        .contains(user.id, product_id)
        .await?;
    Ok(Json(FavoriteCheck { is_favorite }))
}

/// Recompute and return the caller's purchase stats.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn stats(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<UserStats>> {
    let stats = StatsRepository::new(state.pool()).refresh(user.id).await?;
    Ok(Json(stats))
}

/// Notification preferences, created with defaults on first read.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn notifications(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<NotificationPreferences>> {
    let prefs = NotificationRepository::new(state.pool())
        .get_or_init(user.id)
        .await?;
    Ok(Json(prefs))
}

#[instrument(skip(state, user, update), fields(user_id = %user.id))]
pub async fn update_notifications(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiJson(update): ApiJson<NotificationPreferencesUpdate>,
) -> Result<Json<NotificationPreferences>> {
    let prefs = NotificationRepository::new(state.pool())
        .update(user.id, update)
        .await?;
    Ok(Json(prefs))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };

    use super::*;
    use crate::routes::tests::send;

    #[test]
    fn test_favorite_check_shape() {
        let json = serde_json::to_value(FavoriteCheck { is_favorite: true }).unwrap();
        assert_eq!(json, serde_json::json!({ "isFavorite": true }));
    }

    #[tokio::test]
    async fn test_stats_require_token() {
        let request = Request::builder()
            .uri("/api/user/stats")
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(request).await.status(), StatusCode::UNAUTHORIZED);
    }
}
