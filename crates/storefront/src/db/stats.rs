//! User statistics repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use edujuegos_core::{Price, UserId};

use super::RepositoryError;
use crate::models::UserStats;
use crate::models::stats::loyalty_points;

#[derive(sqlx::FromRow)]
struct OrderAggregate {
    total_orders: i64,
    total_spent: Decimal,
    last_order_date: Option<DateTime<Utc>>,
    favorite_products: i64,
}

/// Repository for per-user statistics.
pub struct StatsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StatsRepository<'a> {
    /// Create a new stats repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Recompute a user's stats from their orders and favorites and store them.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the average order value is out of range.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn refresh(&self, user_id: UserId) -> Result<UserStats, RepositoryError> {
        let aggregate = sqlx::query_as::<_, OrderAggregate>(
            "SELECT COUNT(o.id) AS total_orders, \
                    COALESCE(SUM(o.total), 0) AS total_spent, \
                    MAX(o.created_at) AS last_order_date, \
                    (SELECT COUNT(*) FROM user_favorites f WHERE f.user_id = $1) \
                      AS favorite_products \
             FROM orders o WHERE o.user_id = $1",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        let total_orders = i32::try_from(aggregate.total_orders).unwrap_or(i32::MAX);
        let favorite_products = i32::try_from(aggregate.favorite_products).unwrap_or(i32::MAX);
        let average = Price::average_of(aggregate.total_spent, aggregate.total_orders)
            .map_err(|e| RepositoryError::DataCorruption(format!("average order value: {e}")))?;

        let stats = sqlx::query_as::<_, UserStats>(
            "INSERT INTO user_stats (user_id, total_orders, total_spent, favorite_products, \
               last_order_date, average_order_value, loyalty_points) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (user_id) DO UPDATE SET \
               total_orders = EXCLUDED.total_orders, \
               total_spent = EXCLUDED.total_spent, \
               favorite_products = EXCLUDED.favorite_products, \
               last_order_date = EXCLUDED.last_order_date, \
               average_order_value = EXCLUDED.average_order_value, \
               loyalty_points = EXCLUDED.loyalty_points, \
               updated_at = now() \
             RETURNING user_id, total_orders, total_spent, favorite_products, last_order_date, \
               average_order_value, loyalty_points, created_at, updated_at",
        )
        .bind(user_id)
        .bind(total_orders)
        .bind(aggregate.total_spent)
        .bind(favorite_products)
        .bind(aggregate.last_order_date)
        .bind(average)
        .bind(loyalty_points(total_orders))
        .fetch_one(self.pool)
        .await?;

        Ok(stats)
    }
}
