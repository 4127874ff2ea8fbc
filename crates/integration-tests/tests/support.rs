//! Integration tests for support tickets, favorites and admin configuration.
//!
//! These tests require:
//! - A migrated and seeded `PostgreSQL` database (ej-cli migrate, ej-cli seed)
//! - An admin account (ej-cli admin create)
//! - The storefront server running (cargo run -p edujuegos-storefront)
//!
//! Run with: cargo test -p edujuegos-integration-tests -- --ignored

use edujuegos_integration_tests::TestClient;
use reqwest::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
#[ignore = "Requires running storefront server, database and admin account"]
async fn test_ticket_thread_between_customer_and_support() {
    let customer = TestClient::new_customer().await;
    let resp = customer
        .post("/api/support/tickets")
        .json(&json!({
            "type": "product",
            "subject": "No puedo descargar",
            "description": "El enlace del material digital no funciona",
        }))
        .send()
        .await
        .expect("Failed to open ticket");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let ticket: Value = resp.json().await.expect("Invalid ticket JSON");
    assert_eq!(ticket["priority"], "medium");
    let id = ticket["id"].as_str().expect("Ticket id").to_string();

    let admin = TestClient::admin().await;
    let resp = admin
        .post(&format!("/api/support/tickets/{id}/replies"))
        .json(&json!({ "message": "Ya lo revisamos" }))
        .send()
        .await
        .expect("Failed to reply");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let reply: Value = resp.json().await.expect("Invalid reply JSON");
    assert_eq!(reply["isFromSupport"], true);

    let resp = admin
        .put(&format!("/api/support/tickets/{id}/status"))
        .json(&json!({ "status": "resolved", "resolution": "Enlace regenerado" }))
        .send()
        .await
        .expect("Failed to update ticket");
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = resp.json().await.expect("Invalid ticket JSON");
    assert!(!updated["resolvedAt"].is_null());

    let detail: Value = customer
        .get(&format!("/api/support/tickets/{id}"))
        .send()
        .await
        .expect("Failed to fetch ticket")
        .json()
        .await
        .expect("Invalid detail JSON");
    assert_eq!(detail["replies"].as_array().map(Vec::len), Some(1));

    let stranger = TestClient::new_customer().await;
    let resp = stranger
        .get(&format!("/api/support/tickets/{id}/replies"))
        .send()
        .await
        .expect("Failed to fetch replies");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded database"]
async fn test_favorites_are_idempotent() {
    let customer = TestClient::new_customer().await;
    let products: Vec<Value> = customer
        .get("/api/products")
        .send()
        .await
        .expect("Failed to list products")
        .json()
        .await
        .expect("Invalid listing JSON");
    let id = products[0]["id"].as_str().expect("Product id").to_string();

    for _ in 0..2 {
        let resp = customer
            .post(&format!("/api/user/favorites/{id}"))
            .send()
            .await
            .expect("Failed to add favorite");
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let favorites: Vec<Value> = customer
        .get("/api/user/favorites")
        .send()
        .await
        .expect("Failed to list favorites")
        .json()
        .await
        .expect("Invalid favorites JSON");
    assert_eq!(favorites.len(), 1);

    let stats: Value = customer
        .get("/api/user/stats")
        .send()
        .await
        .expect("Failed to fetch stats")
        .json()
        .await
        .expect("Invalid stats JSON");
    assert_eq!(stats["favoriteProducts"], 1);
    assert_eq!(stats["loyaltyPoints"], 0);
}

#[tokio::test]
#[ignore = "Requires running storefront server, database and admin account"]
async fn test_admin_config_masks_secrets() {
    let admin = TestClient::admin().await;
    let resp = admin
        .post("/api/admin/config")
        .json(&json!({
            "businessName": "EduJuegos",
            "mpAccessToken": "TEST-1234567890-abcd",
            "mpPublicKey": "TEST-public-key",
            "smtpPort": "587",
        }))
        .send()
        .await
        .expect("Failed to save config");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let saved: Value = resp.json().await.expect("Invalid config JSON");
    assert_eq!(saved["mpAccessToken"], "********abcd");

    let public: Value = TestClient::anonymous()
        .get("/api/mercadopago/config")
        .send()
        .await
        .expect("Failed to fetch public config")
        .json()
        .await
        .expect("Invalid public config JSON");
    assert_eq!(public["publicKey"], "TEST-public-key");
    assert_eq!(public["configured"], true);
}
