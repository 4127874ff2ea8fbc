//! Bearer token extractors.
//!
//! Every authenticated request carries `Authorization: Bearer <token>`; the
//! token is parsed back into a user ID and the user is loaded from the database.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::db::{RepositoryError, UserRepository};
use crate::error::set_sentry_user;
use crate::models::User;
use crate::services::auth::parse_token;
use crate::state::AppState;

/// Extractor that requires a valid bearer token.
///
/// ```rust,ignore
/// async fn me(RequireUser(user): RequireUser) -> Json<PublicUser> {
///     Json(PublicUser::from(&user))
/// }
/// ```
pub struct RequireUser(pub User);

/// Extractor that requires a valid bearer token belonging to an admin.
pub struct RequireAdmin(pub User);

/// Why an authenticated request was rejected.
#[derive(Debug)]
pub enum AuthRejection {
    /// No `Authorization: Bearer` header.
    MissingToken,
    /// Token prefix or user ID is malformed.
    InvalidToken,
    /// Token refers to a user that does not exist.
    UserNotFound,
    /// Authenticated but not an admin.
    Forbidden,
    /// The user lookup failed.
    Database(RepositoryError),
}

impl From<RepositoryError> for AuthRejection {
    fn from(e: RepositoryError) -> Self {
        Self::Database(e)
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::MissingToken => (StatusCode::UNAUTHORIZED, "No autorizado"),
            Self::InvalidToken => (StatusCode::UNAUTHORIZED, "Token inválido"),
            Self::UserNotFound => (StatusCode::UNAUTHORIZED, "Usuario no encontrado"),
            Self::Forbidden => (StatusCode::FORBIDDEN, "Acceso denegado"),
            Self::Database(e) => {
                let event_id = sentry::capture_error(&e);
                tracing::error!(error = %e, sentry_event_id = %event_id, "User lookup failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error interno del servidor",
                )
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

/// The token part of a `Bearer` authorization header.
fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AuthRejection::MissingToken)?;
        let user_id = parse_token(token).ok_or(AuthRejection::InvalidToken)?;

        let user = UserRepository::new(state.pool())
            .get_by_id(user_id)
            .await?
            .ok_or(AuthRejection::UserNotFound)?;

        set_sentry_user(&user.id, Some(user.email.as_str()));

        Ok(Self(user))
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireUser(user) = RequireUser::from_request_parts(parts, state).await?;

        if !user.is_admin() {
            tracing::warn!(user_id = %user.id, path = %parts.uri.path(), "Admin route denied");
            return Err(AuthRejection::Forbidden);
        }

        Ok(Self(user))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/auth/me");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(
            bearer_token(&parts_with(Some("Bearer mock_token_abc"))),
            Some("mock_token_abc")
        );
        assert_eq!(bearer_token(&parts_with(Some("Basic dXNlcg=="))), None);
        assert_eq!(bearer_token(&parts_with(None)), None);
    }

    #[test]
    fn test_rejection_status_codes() {
        assert_eq!(
            AuthRejection::MissingToken.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthRejection::InvalidToken.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthRejection::Forbidden.into_response().status(),
            StatusCode::FORBIDDEN
        );
    }
}
