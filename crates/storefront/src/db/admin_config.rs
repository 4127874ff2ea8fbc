//! Admin configuration repository.
//!
//! The table holds at most one row; saves upsert on the `singleton` key.

use sqlx::PgPool;

use super::RepositoryError;
use crate::models::{AdminConfig, AdminConfigValues};

const CONFIG_COLUMNS: &str = "id, business_name, business_address, business_phone, \
     business_email, logo_url, smtp_email, smtp_password, smtp_host, smtp_port, \
     mp_access_token, mp_public_key, created_at, updated_at";

/// Repository for the singleton admin configuration.
pub struct AdminConfigRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AdminConfigRepository<'a> {
    /// Create a new admin configuration repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The stored configuration, if it was ever saved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self) -> Result<Option<AdminConfig>, RepositoryError> {
        let config =
            sqlx::query_as::<_, AdminConfig>(&format!("SELECT {CONFIG_COLUMNS} FROM admin_config"))
                .fetch_optional(self.pool)
                .await?;

        Ok(config)
    }

    /// Insert or replace the configuration.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn save(&self, values: &AdminConfigValues) -> Result<AdminConfig, RepositoryError> {
        let config = sqlx::query_as::<_, AdminConfig>(&format!(
            "INSERT INTO admin_config (business_name, business_address, business_phone, \
               business_email, logo_url, smtp_email, smtp_password, smtp_host, smtp_port, \
               mp_access_token, mp_public_key) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             ON CONFLICT (singleton) DO UPDATE SET \
               business_name = EXCLUDED.business_name, \
               business_address = EXCLUDED.business_address, \
               business_phone = EXCLUDED.business_phone, \
               business_email = EXCLUDED.business_email, \
               logo_url = EXCLUDED.logo_url, \
               smtp_email = EXCLUDED.smtp_email, \
               smtp_password = EXCLUDED.smtp_password, \
               smtp_host = EXCLUDED.smtp_host, \
               smtp_port = EXCLUDED.smtp_port, \
               mp_access_token = EXCLUDED.mp_access_token, \
               mp_public_key = EXCLUDED.mp_public_key, \
               updated_at = now() \
             RETURNING {CONFIG_COLUMNS}"
        ))
        .bind(values.business_name.as_deref())
        .bind(values.business_address.as_deref())
        .bind(values.business_phone.as_deref())
        .bind(values.business_email.as_deref())
        .bind(values.logo_url.as_deref())
        .bind(values.smtp_email.as_deref())
        .bind(values.smtp_password.as_deref())
        .bind(values.smtp_host.as_deref())
        .bind(values.smtp_port)
        .bind(values.mp_access_token.as_deref())
        .bind(values.mp_public_key.as_deref())
        .fetch_one(self.pool)
        .await?;

        Ok(config)
    }
}
