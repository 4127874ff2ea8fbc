//! Password recovery token maintenance.

use edujuegos_storefront::db::RecoveryTokenRepository;

use super::{CommandError, connect};

/// Delete recovery tokens that were used or have expired.
///
/// # Errors
///
/// Returns an error if the database is unreachable or the delete fails.
pub async fn purge() -> Result<(), CommandError> {
    let pool = connect().await?;

    let deleted = RecoveryTokenRepository::new(&pool).purge().await?;
    tracing::info!(deleted, "Recovery tokens purged");

    Ok(())
}
