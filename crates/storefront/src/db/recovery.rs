//! Password recovery token repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use edujuegos_core::UserId;

use super::RepositoryError;

/// Repository for password recovery tokens.
pub struct RecoveryTokenRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RecoveryTokenRepository<'a> {
    /// Create a new recovery token repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a token for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` on a token collision.
    pub async fn create(
        &self,
        user_id: UserId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO password_recovery_tokens (user_id, token, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .execute(self.pool)
        .await
        .map_err(|e| super::map_unique_violation(e, "recovery token"))?;

        Ok(())
    }

    /// Redeem a token and set the owner's password in one transaction.
    ///
    /// Only an unused, unexpired token is accepted. Marking it used locks the
    /// row, so concurrent redeems of the same token succeed at most once.
    /// Returns the owner, or `None` when the token cannot be redeemed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn redeem(
        &self,
        token: &str,
        password_hash: &str,
    ) -> Result<Option<UserId>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let user_id: Option<UserId> = sqlx::query_scalar(
            "UPDATE password_recovery_tokens SET used = TRUE \
             WHERE token = $1 AND NOT used AND expires_at > now() \
             RETURNING user_id",
        )
        .bind(token)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(user_id) = user_id else {
            return Ok(None);
        };

        sqlx::query("UPDATE users SET password = $2, updated_at = now() WHERE id = $1")
            .bind(user_id)
            .bind(password_hash)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(user_id))
    }

    /// Delete used and expired tokens, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn purge(&self) -> Result<u64, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM password_recovery_tokens WHERE used OR expires_at <= now()")
                .execute(self.pool)
                .await?;

        Ok(result.rows_affected())
    }
}
