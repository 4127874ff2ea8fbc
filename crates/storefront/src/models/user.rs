//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use edujuegos_core::{Email, UserId, UserRole};

/// A storefront account.
///
/// Serializes without the password hash, which is what the admin client
/// listing returns.
#[derive(Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Login email, unique across accounts.
    pub email: Email,
    /// Argon2 PHC string.
    #[serde(skip)]
    #[sqlx(rename = "password")]
    pub password_hash: String,
    /// Permission level.
    pub role: UserRole,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub avatar: Option<String>,
    /// When the user registered.
    pub created_at: DateTime<Utc>,
    /// When the profile last changed.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether this user may call admin endpoints.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

/// The subset of a user returned by the auth endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub role: UserRole,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_user(role: UserRole) -> User {
        User {
            id: UserId::generate(),
            name: "Ana".to_string(),
            email: Email::parse("ana@example.com").unwrap(),
            password_hash: "$argon2id$v=19$secret".to_string(),
            role,
            phone: None,
            address: None,
            avatar: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_serialize_omits_password_hash() {
        let json = serde_json::to_value(sample_user(UserRole::User)).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["role"], "user");
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn test_debug_redacts_password_hash() {
        let debug_output = format!("{:?}", sample_user(UserRole::Admin));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("argon2id"));
    }

    #[test]
    fn test_public_user_shape() {
        let user = sample_user(UserRole::Admin);
        let json = serde_json::to_value(PublicUser::from(&user)).unwrap();
        let mut keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["email", "id", "name", "role"]);
    }
}
