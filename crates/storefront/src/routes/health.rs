//! Health check endpoints.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::{ProductRepository, RepositoryError, UserRepository};
use crate::state::AppState;

/// Catalog health report.
#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub database: &'static str,
    pub products_count: i64,
    pub admin_exists: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct UnhealthyReport {
    status: &'static str,
    database: &'static str,
    error: &'static str,
    timestamp: DateTime<Utc>,
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn liveness() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Product count and admin presence, or 500 when the database is down.
pub async fn report(State(state): State<AppState>) -> Response {
    match gather(&state).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(UnhealthyReport {
                    status: "unhealthy",
                    database: "disconnected",
                    error: "Base de datos no disponible",
                    timestamp: Utc::now(),
                }),
            )
                .into_response()
        }
    }
}

async fn gather(state: &AppState) -> Result<HealthReport, RepositoryError> {
    let products_count = ProductRepository::new(state.pool()).count_active().await?;
    let admin_exists = UserRepository::new(state.pool()).admin_exists().await?;

    Ok(HealthReport {
        status: "healthy",
        database: "connected",
        products_count,
        admin_exists,
        timestamp: Utc::now(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };

    use crate::routes::tests::{body_json, send};

    #[tokio::test]
    async fn test_liveness() {
        let response = send(Request::builder().uri("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn test_readiness_without_database() {
        let response = send(
            Request::builder()
                .uri("/health/ready")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_report_without_database_is_unhealthy() {
        let response = send(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["status"], "unhealthy");
        assert_eq!(body["database"], "disconnected");
        assert!(body.get("timestamp").is_some());
    }
}
