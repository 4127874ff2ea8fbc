//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//! Every error response has the body `{"message": "..."}`.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::{PlaceOrderError, RepositoryError};
use crate::services::{AuthError, EmailError, MercadoPagoError};

const EMAIL_NOT_CONFIGURED: &str = "Email no configurado. Contacta al administrador.";
const EMAIL_SEND_FAILED: &str =
    "Error al enviar email. Verifica la configuración SMTP en el panel de administración.";

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Mercado Pago API operation failed.
    #[error("Payment error: {0}")]
    Payment(#[from] MercadoPagoError),

    /// SMTP delivery failed.
    #[error("Email error: {0}")]
    Email(#[from] EmailError),

    /// No SMTP account in the admin configuration.
    #[error("Email not configured")]
    EmailNotConfigured,

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User lacks permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<PlaceOrderError> for AppError {
    fn from(err: PlaceOrderError) -> Self {
        match err {
            PlaceOrderError::ProductUnavailable(id) => {
                Self::BadRequest(format!("Producto no disponible: {id}"))
            }
            PlaceOrderError::InsufficientStock { name, .. } => {
                Self::BadRequest(format!("Stock insuficiente para {name}"))
            }
            PlaceOrderError::TotalTooLarge => {
                Self::BadRequest("El total de la orden excede el máximo permitido".to_string())
            }
            PlaceOrderError::Repository(e) => Self::Database(e),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(format!("Datos inválidos: {}", rejection.body_text()))
    }
}

impl AppError {
    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Database(_)
                | Self::Internal(_)
                | Self::Payment(_)
                | Self::Email(_)
                | Self::Auth(AuthError::Repository(_) | AuthError::PasswordHash)
        )
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            Self::Database(_) | Self::Internal(_) | Self::Email(_) | Self::EmailNotConfigured => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Payment(_) => StatusCode::BAD_GATEWAY,
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::UserNotFound => StatusCode::NOT_FOUND,
                AuthError::UserAlreadyExists
                | AuthError::WeakPassword(_)
                | AuthError::InvalidEmail(_)
                | AuthError::InvalidInput(_)
                | AuthError::IncorrectPassword
                | AuthError::InvalidRecoveryToken => StatusCode::BAD_REQUEST,
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Client-facing message. Internal details never leave the server.
    fn message(&self) -> String {
        match self {
            Self::Database(RepositoryError::NotFound) => "Recurso no encontrado".to_string(),
            Self::Database(_) | Self::Internal(_) => "Error interno del servidor".to_string(),
            Self::Payment(_) => "Error al comunicarse con MercadoPago".to_string(),
            Self::Email(_) => EMAIL_SEND_FAILED.to_string(),
            Self::EmailNotConfigured => EMAIL_NOT_CONFIGURED.to_string(),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Credenciales inválidas".to_string(),
                AuthError::UserNotFound => "Usuario no encontrado".to_string(),
                AuthError::UserAlreadyExists => "El usuario ya existe".to_string(),
                AuthError::WeakPassword(msg) | AuthError::InvalidInput(msg) => msg.clone(),
                AuthError::InvalidEmail(_) => "Email inválido".to_string(),
                AuthError::IncorrectPassword => "Contraseña actual incorrecta".to_string(),
                AuthError::InvalidRecoveryToken => "Token inválido o expirado".to_string(),
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    "Error interno del servidor".to_string()
                }
            },
            Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::BadRequest(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else if matches!(self, Self::EmailNotConfigured) {
            tracing::warn!("Password recovery requested but SMTP is not configured");
        }

        let status = self.status();
        let message = self.message();

        let body = if matches!(self, Self::Email(_) | Self::EmailNotConfigured) {
            json!({ "message": message, "emailConfigured": false })
        } else {
            json!({ "message": message })
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("Producto no encontrado".to_string());
        assert_eq!(err.to_string(), "Not found: Producto no encontrado");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Payment(MercadoPagoError::Parse("x".to_string()))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn test_auth_errors_map_to_spanish_messages() {
        let (status, body) = body_json(AppError::Auth(AuthError::UserAlreadyExists)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "El usuario ya existe");

        let (status, body) = body_json(AppError::Auth(AuthError::InvalidCredentials)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Credenciales inválidas");

        let (status, body) = body_json(AppError::Auth(AuthError::InvalidRecoveryToken)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Token inválido o expirado");
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let (_, body) = body_json(AppError::Internal("pool exhausted".to_string())).await;
        assert_eq!(body["message"], "Error interno del servidor");
    }

    #[tokio::test]
    async fn test_email_errors_flag_email_configuration() {
        let (status, body) = body_json(AppError::EmailNotConfigured).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["emailConfigured"], false);
        assert_eq!(body["message"], EMAIL_NOT_CONFIGURED);
    }

    #[test]
    fn test_place_order_errors_are_bad_requests() {
        let err = AppError::from(PlaceOrderError::InsufficientStock {
            product_id: edujuegos_core::ProductId::generate(),
            name: "Kit".to_string(),
        });
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "Stock insuficiente para Kit");
    }

    #[test]
    fn test_oversized_order_total_is_bad_request() {
        let err = AppError::from(PlaceOrderError::TotalTooLarge);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(!err.is_server_error());
    }
}
