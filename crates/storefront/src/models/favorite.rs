//! Favorite product types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use edujuegos_core::{FavoriteId, ProductId, UserId};

use super::Product;

/// A product a user marked as favorite.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub id: FavoriteId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub created_at: DateTime<Utc>,
}

/// A favorite with the product it points to.
#[derive(Debug, Clone, Serialize)]
pub struct FavoriteWithProduct {
    #[serde(flatten)]
    pub favorite: Favorite,
    pub product: Product,
}
