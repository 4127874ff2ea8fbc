//! Database operations for the storefront `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `users` - Accounts (customers and admins)
//! - `products` - Catalog, soft-deleted through `is_active`
//! - `orders`, `order_items`, `order_tracking` - Purchases and shipment timeline
//! - `support_tickets`, `support_ticket_replies` - Customer support threads
//! - `user_favorites`, `user_stats`, `user_notification_preferences` - Per-user data
//! - `password_recovery_tokens` - One-hour password reset tokens
//! - `admin_config` - Singleton row with runtime-editable settings
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p edujuegos-cli -- migrate
//! ```

/// Product column list for queries that alias `products` as `p`.
///
/// `image` falls back to `image_url` so clients always get a displayable URL.
macro_rules! product_columns {
    () => {
        "p.id, p.name, p.description, p.price, p.image_url, \
         COALESCE(p.image, p.image_url) AS image, p.category, p.age_range, p.type, \
         p.stock, p.is_active, p.featured, p.tags, p.created_at, p.updated_at"
    };
}

pub mod admin_config;
pub mod favorites;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod recovery;
pub mod stats;
pub mod support;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use admin_config::AdminConfigRepository;
pub use favorites::FavoriteRepository;
pub use notifications::NotificationRepository;
pub use orders::{OrderRepository, PlaceOrderError};
pub use products::ProductRepository;
pub use recovery::RecoveryTokenRepository;
pub use stats::StatsRepository;
pub use support::SupportRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Underlying database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database failed validation.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested row does not exist.
    #[error("not found")]
    NotFound,

    /// Unique or foreign-key constraint violation.
    #[error("conflict: {0}")]
    Conflict(String),
}

/// Map unique violations to `Conflict`, everything else to `Database`.
pub(crate) fn map_unique_violation(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Create a pool that connects on first use.
///
/// Router tests use this for endpoints that reject requests before any query runs.
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL cannot be parsed.
pub fn create_lazy_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(2))
        .connect_lazy(database_url.expose_secret())
}
