//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                              - Liveness
//! GET  /health/ready                        - Readiness (database)
//! GET  /api/health                          - Catalog and admin health report
//!
//! # Auth
//! POST /api/auth/register                   - Create account (rate limited)
//! POST /api/auth/login                      - Issue bearer token (rate limited)
//! POST /api/auth/logout                     - Acknowledge logout
//! GET  /api/auth/me                         - Current user
//! PUT  /api/auth/profile                    - Update name and email
//! PUT  /api/auth/change-password            - Change password
//! POST /api/auth/password-recovery          - Email a reset link (rate limited)
//! POST /api/auth/reset-password             - Redeem a reset token (rate limited)
//!
//! # Products
//! GET    /api/products                      - Active products
//! GET    /api/products/{id}                 - Product detail
//! POST   /api/products                      - Create (admin)
//! PUT    /api/products/{id}                 - Partial update (admin)
//! DELETE /api/products/{id}                 - Soft delete (admin)
//!
//! # Orders
//! GET  /api/orders                          - Own orders, or all for admins
//! POST /api/orders                          - Place an order
//! GET  /api/orders/{id}                     - Order with items and tracking
//! PUT  /api/orders/{id}/status              - Change status (admin)
//! GET  /api/orders/{id}/tracking            - Tracking history
//! POST /api/orders/{id}/tracking            - Add tracking entry (admin)
//!
//! # Admin
//! GET  /api/admin/clients                   - All users
//! GET  /api/admin/config                    - Store configuration (masked)
//! POST /api/admin/config                    - Save store configuration
//!
//! # Support
//! GET  /api/support/tickets                 - Own tickets, or all for admins
//! POST /api/support/tickets                 - Open a ticket
//! GET  /api/support/tickets/{id}            - Ticket with replies
//! GET  /api/support/tickets/{id}/replies    - Replies
//! POST /api/support/tickets/{id}/replies    - Reply
//! PUT  /api/support/tickets/{id}/status     - Change status (admin)
//!
//! # User
//! GET    /api/user/favorites                - Favorites with products
//! GET    /api/user/favorites/{productId}    - Favorite check
//! POST   /api/user/favorites/{productId}    - Add favorite
//! DELETE /api/user/favorites/{productId}    - Remove favorite
//! GET    /api/user/stats                    - Recomputed purchase stats
//! GET    /api/user/notifications            - Notification preferences
//! PUT    /api/user/notifications            - Update preferences
//!
//! # Mercado Pago
//! GET  /api/mercadopago/config              - Public key and status
//! POST /api/mercadopago/create-payment      - Checkout preference for an order
//! ```

pub mod admin;
pub mod auth;
pub mod health;
pub mod mercadopago;
pub mod orders;
pub mod products;
pub mod support;
pub mod user;

use axum::{
    Router,
    extract::{FromRequest, FromRequestParts, Path, rejection::PathRejection},
    routing::{get, post, put},
};

use crate::error::AppError;
use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// JSON body extractor whose rejections use the API error shape.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Path extractor whose rejections use the API error shape.
#[derive(FromRequestParts)]
#[from_request(via(Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!(error = %rejection, "Rejected path parameter");
        Self::BadRequest("Identificador inválido".to_string())
    }
}

/// Create the auth routes router.
///
/// Credential endpoints sit behind the auth rate limiter.
pub fn auth_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route("/password-recovery", post(auth::password_recovery))
        .route("/reset-password", post(auth::reset_password))
        .layer(auth_rate_limiter());

    Router::new()
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .route("/profile", put(auth::update_profile))
        .route("/change-password", put(auth::change_password))
        .merge(limited)
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index).post(orders::create))
        .route("/{id}", get(orders::show))
        .route("/{id}/status", put(orders::update_status))
        .route(
            "/{id}/tracking",
            get(orders::tracking).post(orders::add_tracking),
        )
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/clients", get(admin::clients))
        .route("/config", get(admin::get_config).post(admin::save_config))
}

/// Create the support routes router.
pub fn support_routes() -> Router<AppState> {
    Router::new()
        .route("/tickets", get(support::index).post(support::create))
        .route("/tickets/{id}", get(support::show))
        .route(
            "/tickets/{id}/replies",
            get(support::replies).post(support::reply),
        )
        .route("/tickets/{id}/status", put(support::update_status))
}

/// Create the user data routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/favorites", get(user::favorites))
        .route(
            "/favorites/{product_id}",
            get(user::is_favorite)
                .post(user::add_favorite)
                .delete(user::remove_favorite),
        )
        .route("/stats", get(user::stats))
        .route(
            "/notifications",
            get(user::notifications).put(user::update_notifications),
        )
}

/// Create the Mercado Pago routes router.
pub fn mercadopago_routes() -> Router<AppState> {
    Router::new()
        .route("/config", get(mercadopago::config))
        .route("/create-payment", post(mercadopago::create_payment))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route("/api/health", get(health::report))
        .nest("/api/auth", auth_routes())
        .nest("/api/products", product_routes())
        .nest("/api/orders", order_routes())
        .nest("/api/admin", admin_routes())
        .nest("/api/support", support_routes())
        .nest("/api/user", user_routes())
        .nest("/api/mercadopago", mercadopago_routes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
        response::Response,
    };
    use secrecy::SecretString;
    use tower::ServiceExt;

    use crate::config::tests::test_config;
    use crate::db::create_lazy_pool;
    use crate::state::AppState;

    /// An app whose pool points at a closed port; any query fails fast.
    pub(crate) fn test_app() -> axum::Router {
        let pool =
            create_lazy_pool(&SecretString::from("postgres://nobody@127.0.0.1:9/none")).unwrap();
        let state = AppState::new(test_config(), pool).unwrap();
        crate::app(state)
    }

    pub(crate) async fn send(request: Request<Body>) -> Response {
        test_app().oneshot(request).await.unwrap()
    }

    pub(crate) fn json_request(method: &str, uri: &str, body: &serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", "203.0.113.10")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub(crate) async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = send(
            Request::builder()
                .uri("/api/nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_json_is_400_with_message() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", "203.0.113.11")
            .body(Body::from("{not json"))
            .unwrap();
        let response = send(request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["message"].as_str().unwrap().starts_with("Datos inválidos"));
    }

    #[tokio::test]
    async fn test_cors_preflight_allows_configured_origin() {
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/api/products")
            .header(header::ORIGIN, "http://localhost:5173")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Body::empty())
            .unwrap();
        let response = send(request).await;
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:5173"
        );
    }

    #[tokio::test]
    async fn test_responses_carry_request_id() {
        let response = send(Request::builder().uri("/health").body(Body::empty()).unwrap()).await;
        assert!(response.headers().contains_key("x-request-id"));
    }
}
