//! Bearer tokens.
//!
//! A token is the user ID behind a fixed prefix. Tokens never expire and carry
//! no signature; the user is loaded from the database on every request.

use edujuegos_core::UserId;

/// Prefix shared by every issued token.
pub const TOKEN_PREFIX: &str = "mock_token_";

/// Issue the bearer token for a user.
#[must_use]
pub fn issue_token(user_id: UserId) -> String {
    format!("{TOKEN_PREFIX}{user_id}")
}

/// Recover the user ID from a token.
///
/// Returns `None` when the prefix is missing or the rest is not a UUID.
#[must_use]
pub fn parse_token(token: &str) -> Option<UserId> {
    token.strip_prefix(TOKEN_PREFIX)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_then_parse() {
        let id = UserId::generate();
        let token = issue_token(id);
        assert!(token.starts_with("mock_token_"));
        assert_eq!(parse_token(&token), Some(id));
    }

    #[test]
    fn test_parse_rejects_wrong_prefix() {
        let id = UserId::generate();
        assert_eq!(parse_token(&format!("token_{id}")), None);
        assert_eq!(parse_token(&id.to_string()), None);
    }

    #[test]
    fn test_parse_rejects_garbage_id() {
        assert_eq!(parse_token("mock_token_42"), None);
        assert_eq!(parse_token("mock_token_"), None);
    }
}
