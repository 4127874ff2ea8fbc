//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! ej-cli admin create -e admin@edujuegos.com -n "Administrador" -p admin123
//! ```
//!
//! An existing account with the same email is promoted to admin and keeps
//! its password.

use edujuegos_core::UserId;
use edujuegos_storefront::services::AuthService;

use super::{CommandError, connect};

/// Create an admin user, or promote an existing one.
///
/// # Returns
///
/// The ID of the admin user.
///
/// # Errors
///
/// Returns an error if the input is invalid or the database is unreachable.
pub async fn create_user(email: &str, name: &str, password: &str) -> Result<UserId, CommandError> {
    let pool = connect().await?;

    tracing::info!("Creating admin user: {}", email);
    let user = AuthService::new(&pool)
        .create_admin(name, email, password)
        .await?;

    tracing::info!(
        "Admin user ready! ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        user.role
    );

    Ok(user.id)
}
