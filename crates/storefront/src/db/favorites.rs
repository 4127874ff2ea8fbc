//! Favorite products repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use edujuegos_core::{FavoriteId, ProductId, UserId};

use super::RepositoryError;
use crate::models::{Favorite, FavoriteWithProduct, Product};

#[derive(sqlx::FromRow)]
struct FavoriteRow {
    favorite_id: FavoriteId,
    user_id: UserId,
    favorited_at: DateTime<Utc>,
    #[sqlx(flatten)]
    product: Product,
}

/// Repository for user favorites.
pub struct FavoriteRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> FavoriteRepository<'a> {
    /// Create a new favorites repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A user's favorites with their products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<FavoriteWithProduct>, RepositoryError> {
        let rows = sqlx::query_as::<_, FavoriteRow>(concat!(
            "SELECT f.id AS favorite_id, f.user_id, f.created_at AS favorited_at, ",
            product_columns!(),
            " FROM user_favorites f JOIN products p ON p.id = f.product_id \
             WHERE f.user_id = $1 ORDER BY f.created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| FavoriteWithProduct {
                favorite: Favorite {
                    id: row.favorite_id,
                    user_id: row.user_id,
                    product_id: row.product.id,
                    created_at: row.favorited_at,
                },
                product: row.product,
            })
            .collect())
    }

    /// Mark a product as favorite. Adding an existing favorite returns it unchanged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn add(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Favorite, RepositoryError> {
        sqlx::query_as::<_, Favorite>(
            "INSERT INTO user_favorites (user_id, product_id) VALUES ($1, $2) \
             ON CONFLICT (user_id, product_id) DO UPDATE SET user_id = EXCLUDED.user_id \
             RETURNING id, user_id, product_id, created_at",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            RepositoryError::Database(e)
        })
    }

    /// Remove a favorite. Returns whether anything was deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM user_favorites WHERE user_id = $1 AND product_id = $2")
                .bind(user_id)
                .bind(product_id)
                .execute(self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Whether a product is among a user's favorites.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn contains(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM user_favorites WHERE user_id = $1 AND product_id = $2)",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }
}
