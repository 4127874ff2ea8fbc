//! Integration tests for the EduJuegos storefront API.
//!
//! # Running Tests
//!
//! ```bash
//! # Prepare the database and an admin account
//! cargo run -p edujuegos-cli -- migrate
//! cargo run -p edujuegos-cli -- seed
//! cargo run -p edujuegos-cli -- admin create -e admin@edujuegos.com -n Administrador -p admin123
//!
//! # Start the server, then run the ignored tests
//! cargo run -p edujuegos-storefront &
//! cargo test -p edujuegos-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_BASE_URL` - Server under test (default: `http://localhost:5000`)
//! - `TEST_ADMIN_EMAIL` / `TEST_ADMIN_PASSWORD` - Admin login (default: the account above)
//! - `STOREFRONT_DATABASE_URL` / `DATABASE_URL` - Database behind the server, for
//!   tests that plant rows the API cannot create (e.g. expired recovery tokens)

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

/// Base URL for the storefront API.
#[must_use]
pub fn base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:5000".to_string())
}

/// Connect to the database the server under test uses.
pub async fn db_pool() -> PgPool {
    let url = std::env::var("STOREFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("STOREFRONT_DATABASE_URL or DATABASE_URL must be set");
    PgPool::connect(&url)
        .await
        .expect("Failed to connect to database")
}

/// An HTTP client bound to the server under test, optionally logged in.
///
/// Each client sends its own `X-Forwarded-For` address so tests do not share
/// the credential endpoints' rate limit bucket.
pub struct TestClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    client_ip: String,
}

impl TestClient {
    /// Anonymous client.
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            client: Client::new(),
            base_url: base_url(),
            token: None,
            client_ip: random_client_ip(),
        }
    }

    /// Register a fresh customer and log in as them.
    pub async fn new_customer() -> Self {
        Self::register(&unique_email(), "secreto123").await
    }

    /// Register a customer with the given credentials and log in as them.
    pub async fn register(email: &str, password: &str) -> Self {
        let mut client = Self::anonymous();

        let resp = client
            .post("/api/auth/register")
            .json(&json!({ "name": "Cliente Test", "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to register");
        assert_eq!(resp.status(), StatusCode::CREATED);

        client.login(email, password).await;
        client
    }

    /// Log in with the configured admin account.
    pub async fn admin() -> Self {
        let email = std::env::var("TEST_ADMIN_EMAIL")
            .unwrap_or_else(|_| "admin@edujuegos.com".to_string());
        let password =
            std::env::var("TEST_ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string());

        let mut client = Self::anonymous();
        client.login(&email, &password).await;
        client
    }

    /// Log in, returning the response status instead of asserting success.
    pub async fn login_status(email: &str, password: &str) -> StatusCode {
        Self::anonymous()
            .post("/api/auth/login")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to log in")
            .status()
    }

    async fn login(&mut self, email: &str, password: &str) {
        let resp = self
            .post("/api/auth/login")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to log in");
        assert_eq!(resp.status(), StatusCode::OK, "login failed for {email}");

        let body: Value = resp.json().await.expect("Invalid login response");
        self.token = body["token"].as_str().map(String::from);
    }

    /// Bearer token issued at login.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.header("x-forwarded-for", &self.client_ip);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    #[must_use]
    pub fn get(&self, path: &str) -> RequestBuilder {
        self.authorize(self.client.get(format!("{}{path}", self.base_url)))
    }

    #[must_use]
    pub fn post(&self, path: &str) -> RequestBuilder {
        self.authorize(self.client.post(format!("{}{path}", self.base_url)))
    }

    #[must_use]
    pub fn put(&self, path: &str) -> RequestBuilder {
        self.authorize(self.client.put(format!("{}{path}", self.base_url)))
    }

    #[must_use]
    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.authorize(self.client.delete(format!("{}{path}", self.base_url)))
    }
}

/// A random address in 10.0.0.0/8.
fn random_client_ip() -> String {
    let [a, b, c, ..] = *Uuid::new_v4().as_bytes();
    format!("10.{a}.{b}.{c}")
}

/// An email address no other test run has used.
#[must_use]
pub fn unique_email() -> String {
    format!("test-{}@example.com", Uuid::new_v4().simple())
}
