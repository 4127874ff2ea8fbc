//! Authentication service.
//!
//! Password registration and login, profile and password changes, and the
//! password recovery token flow. Passwords are hashed with Argon2.

mod error;
mod token;

pub use error::AuthError;
pub use token::{TOKEN_PREFIX, issue_token, parse_token};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use rand::Rng;
use sqlx::PgPool;

use edujuegos_core::{Email, UserId, UserRole};

use crate::db::{RecoveryTokenRepository, RepositoryError, UserRepository};
use crate::models::User;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// How long a recovery token stays valid, in hours.
pub const RECOVERY_TOKEN_TTL_HOURS: i64 = 1;

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    recovery: RecoveryTokenRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
            recovery: RecoveryTokenRepository::new(pool),
        }
    }

    /// Register a new customer account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidInput` if the name is blank.
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password is too short.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let name = require_name(name)?;
        let email = Email::parse(email)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        self.create_account(name, &email, &password_hash, UserRole::User)
            .await
    }

    /// Create an admin account, or promote an existing one.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`Self::register`], except that an existing
    /// email is promoted instead of rejected.
    pub async fn create_admin(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let name = require_name(name)?;
        let email = Email::parse(email)?;
        validate_password(password)?;

        if let Some(existing) = self.users.get_by_email(&email).await? {
            self.users.set_role(existing.id, UserRole::Admin).await?;
            tracing::info!(user_id = %existing.id, "Promoted existing user to admin");
            return self
                .users
                .get_by_id(existing.id)
                .await?
                .ok_or(AuthError::UserNotFound);
        }

        let password_hash = hash_password(password)?;
        self.create_account(name, &email, &password_hash, UserRole::Admin)
            .await
    }

    async fn create_account(
        &self,
        name: &str,
        email: &Email,
        password_hash: &str,
        role: UserRole,
    ) -> Result<User, AuthError> {
        let user = self
            .users
            .create(name, email, password_hash, role)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, role = %user.role, "User registered");
        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let user = self
            .users
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &user.password_hash)?;

        Ok(user)
    }

    /// Change a user's display name and email.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidInput` if the name is blank.
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::UserAlreadyExists` if another account owns the email.
    /// Returns `AuthError::UserNotFound` if the user no longer exists.
    pub async fn update_profile(
        &self,
        user_id: UserId,
        name: &str,
        email: &str,
    ) -> Result<User, AuthError> {
        let name = require_name(name)?;
        let email = Email::parse(email)?;

        self.users
            .update_profile(user_id, name, &email)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                RepositoryError::NotFound => AuthError::UserNotFound,
                other => AuthError::Repository(other),
            })
    }

    /// Replace a password after checking the current one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::IncorrectPassword` if `current` does not match.
    /// Returns `AuthError::WeakPassword` if the new password is too short.
    pub async fn change_password(
        &self,
        user: &User,
        current: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        if current.is_empty() {
            return Err(AuthError::InvalidInput(
                "Contraseña actual requerida".to_string(),
            ));
        }
        validate_password(new_password)?;
        verify_password(current, &user.password_hash).map_err(|_| AuthError::IncorrectPassword)?;

        let password_hash = hash_password(new_password)?;
        self.users.update_password(user.id, &password_hash).await?;

        tracing::info!(user_id = %user.id, "Password changed");
        Ok(())
    }

    /// Issue a recovery token for the account behind `email`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if no account uses the email.
    pub async fn start_password_recovery(&self, email: &str) -> Result<(User, String), AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::UserNotFound)?;
        let user = self
            .users
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let token = generate_recovery_token();
        self.recovery
            .create(user.id, &token, Utc::now() + Duration::hours(RECOVERY_TOKEN_TTL_HOURS))
            .await?;

        tracing::info!(user_id = %user.id, "Password recovery token issued");
        Ok((user, token))
    }

    /// Redeem a recovery token and set a new password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` if the new password is too short.
    /// Returns `AuthError::InvalidRecoveryToken` if the token is unknown, used or expired.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        validate_password(new_password)?;

        let password_hash = hash_password(new_password)?;
        let user_id = self
            .recovery
            .redeem(token, &password_hash)
            .await?
            .ok_or(AuthError::InvalidRecoveryToken)?;

        tracing::info!(user_id = %user_id, "Password reset through recovery token");
        Ok(())
    }
}

fn require_name(name: &str) -> Result<&str, AuthError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AuthError::InvalidInput("El nombre es requerido".to_string()));
    }
    Ok(name)
}

/// Validate password requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "La contraseña debe tener al menos {MIN_PASSWORD_LENGTH} caracteres"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// 32 random bytes, hex-encoded.
fn generate_recovery_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("admin123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("admin123", &hash).is_ok());
        assert!(matches!(
            verify_password("admin124", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        assert!(verify_password("secret", "not-a-phc-string").is_err());
    }

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
        assert!(validate_password("ñandú!").is_ok());
    }

    #[test]
    fn test_require_name_trims() {
        assert_eq!(require_name("  Ana ").unwrap(), "Ana");
        assert!(require_name("   ").is_err());
    }

    #[test]
    fn test_recovery_token_format() {
        let token = generate_recovery_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_recovery_token());
    }
}
