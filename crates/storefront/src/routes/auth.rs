//! Authentication route handlers.
//!
//! Register, login and password recovery are public; the rest require a
//! bearer token.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::instrument;

use crate::db::AdminConfigRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireUser;
use crate::models::PublicUser;
use crate::routes::ApiJson;
use crate::services::auth::issue_token;
use crate::services::{AuthService, EmailService};
use crate::state::AppState;

/// Registration form.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Login form.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct RecoveryRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub new_password: String,
}

/// Successful login payload.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: PublicUser,
    pub token: String,
}

/// Response carrying a message and the affected user.
#[derive(Debug, Serialize)]
pub struct UserMessage {
    pub message: &'static str,
    pub user: PublicUser,
}

/// Handle registration.
#[instrument(skip(state, form), fields(email = %form.email))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserMessage>)> {
    let user = AuthService::new(state.pool())
        .register(&form.name, &form.email, &form.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(UserMessage {
            message: "Usuario registrado exitosamente",
            user: PublicUser::from(&user),
        }),
    ))
}

/// Handle login.
#[instrument(skip(state, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    if form.email.trim().is_empty() || form.password.is_empty() {
        return Err(AppError::BadRequest(
            "Email y contraseña son requeridos".to_string(),
        ));
    }

    let user = AuthService::new(state.pool())
        .login(&form.email, &form.password)
        .await?;

    tracing::info!(user_id = %user.id, "User logged in");
    add_breadcrumb("auth", "Login", Some(&[("user_id", &user.id.to_string())]));

    Ok(Json(LoginResponse {
        token: issue_token(user.id),
        user: PublicUser::from(&user),
    }))
}

/// Tokens are stateless; the client discards its copy.
pub async fn logout() -> Json<Value> {
    Json(json!({ "message": "Sesión cerrada correctamente" }))
}

/// Return the authenticated user.
pub async fn me(RequireUser(user): RequireUser) -> Json<PublicUser> {
    Json(PublicUser::from(&user))
}

/// Update the authenticated user's name and email.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiJson(form): ApiJson<ProfileRequest>,
) -> Result<Json<UserMessage>> {
    let updated = AuthService::new(state.pool())
        .update_profile(user.id, &form.name, &form.email)
        .await?;

    Ok(Json(UserMessage {
        message: "Perfil actualizado exitosamente",
        user: PublicUser::from(&updated),
    }))
}

/// Change the authenticated user's password.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn change_password(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiJson(form): ApiJson<ChangePasswordRequest>,
) -> Result<Json<Value>> {
    AuthService::new(state.pool())
        .change_password(&user, &form.current_password, &form.new_password)
        .await?;

    Ok(Json(json!({ "message": "Contraseña actualizada exitosamente" })))
}

/// Issue a recovery token and email the reset link.
///
/// The token is stored before SMTP is checked, so a failed send leaves an
/// unused token behind until `ej-cli tokens purge` removes it.
#[instrument(skip(state, form), fields(email = %form.email))]
pub async fn password_recovery(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<RecoveryRequest>,
) -> Result<Json<Value>> {
    if form.email.trim().is_empty() {
        return Err(AppError::BadRequest("El email es requerido".to_string()));
    }

    let (user, token) = AuthService::new(state.pool())
        .start_password_recovery(&form.email)
        .await?;

    let smtp = AdminConfigRepository::new(state.pool())
        .get()
        .await?
        .and_then(|config| config.smtp_settings())
        .ok_or(AppError::EmailNotConfigured)?;

    let link = state.config().password_recovery_link(&token);
    let mailer = EmailService::new(&smtp)?;
    mailer.verify().await?;
    mailer
        .send_password_recovery(user.email.as_str(), &user.name, &link)
        .await?;

    Ok(Json(json!({
        "message": "Email de recuperación enviado",
        "email": user.email,
    })))
}

/// Redeem a recovery token.
#[instrument(skip(state, form))]
pub async fn reset_password(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<ResetPasswordRequest>,
) -> Result<Json<Value>> {
    if form.token.trim().is_empty() {
        return Err(AppError::BadRequest("Token requerido".to_string()));
    }

    AuthService::new(state.pool())
        .reset_password(form.token.trim(), &form.new_password)
        .await?;

    Ok(Json(json!({ "message": "Contraseña restablecida exitosamente" })))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use serde_json::json;

    use crate::routes::tests::{body_json, json_request, send};

    #[tokio::test]
    async fn test_login_requires_email_and_password() {
        let response = send(json_request(
            "POST",
            "/api/auth/login",
            &json!({ "email": "ana@example.com" }),
        ))
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["message"],
            "Email y contraseña son requeridos"
        );
    }

    #[tokio::test]
    async fn test_logout_needs_no_token() {
        let response = send(json_request("POST", "/api/auth/logout", &json!({}))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await["message"],
            "Sesión cerrada correctamente"
        );
    }

    #[tokio::test]
    async fn test_me_without_token_is_unauthorized() {
        let request = Request::builder()
            .uri("/api/auth/me")
            .body(Body::empty())
            .unwrap();
        let response = send(request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["message"], "No autorizado");
    }

    #[tokio::test]
    async fn test_me_with_foreign_token_is_invalid() {
        let request = Request::builder()
            .uri("/api/auth/me")
            .header(header::AUTHORIZATION, "Bearer session_abc")
            .body(Body::empty())
            .unwrap();
        let response = send(request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["message"], "Token inválido");
    }

    #[tokio::test]
    async fn test_reset_password_requires_token() {
        let response = send(json_request(
            "POST",
            "/api/auth/reset-password",
            &json!({ "newPassword": "secreto" }),
        ))
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
