//! Integration tests for the catalog, order placement and stock.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (ej-cli migrate)
//! - An admin account (ej-cli admin create)
//! - The storefront server running (cargo run -p edujuegos-storefront)
//!
//! Run with: cargo test -p edujuegos-integration-tests -- --ignored

use edujuegos_integration_tests::TestClient;
use reqwest::StatusCode;
use serde_json::{Value, json};

/// Create a product as admin and return its JSON.
async fn create_product(admin: &TestClient, product_type: &str, stock: Option<i32>) -> Value {
    let resp = admin
        .post("/api/products")
        .json(&json!({
            "name": format!("Producto {}", uuid::Uuid::new_v4().simple()),
            "description": "Producto de prueba",
            "price": "1500.00",
            "category": "Juegos",
            "ageRange": "6-10",
            "type": product_type,
            "stock": stock,
        }))
        .send()
        .await
        .expect("Failed to create product");
    assert_eq!(resp.status(), StatusCode::CREATED);
    resp.json().await.expect("Invalid product JSON")
}

fn order_body(product_id: &Value, quantity: i32) -> Value {
    json!({
        "customerName": "Ana",
        "customerEmail": "ana@example.com",
        "customerPhone": "+54 11 5555-5555",
        "customerAddress": "Av. Siempre Viva 742",
        "paymentMethod": "transfer",
        "items": [{ "productId": product_id, "quantity": quantity }],
    })
}

async fn fetch_product(client: &TestClient, id: &Value) -> Value {
    let id = id.as_str().expect("Product id is not a string");
    client
        .get(&format!("/api/products/{id}"))
        .send()
        .await
        .expect("Failed to fetch product")
        .json()
        .await
        .expect("Invalid product JSON")
}

#[tokio::test]
#[ignore = "Requires running storefront server, database and admin account"]
async fn test_order_decrements_physical_stock() {
    let admin = TestClient::admin().await;
    let product = create_product(&admin, "physical", Some(5)).await;

    let customer = TestClient::new_customer().await;
    let resp = customer
        .post("/api/orders")
        .json(&order_body(&product["id"], 2))
        .send()
        .await
        .expect("Failed to place order");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let order: Value = resp.json().await.expect("Invalid order JSON");
    assert_eq!(order["total"], "3000.00");
    assert_eq!(order["status"], "pending");

    let product = fetch_product(&customer, &product["id"]).await;
    assert_eq!(product["stock"], 3);
}

#[tokio::test]
#[ignore = "Requires running storefront server, database and admin account"]
async fn test_insufficient_stock_rejects_order() {
    let admin = TestClient::admin().await;
    let product = create_product(&admin, "physical", Some(1)).await;

    let customer = TestClient::new_customer().await;
    let resp = customer
        .post("/api/orders")
        .json(&order_body(&product["id"], 2))
        .send()
        .await
        .expect("Failed to place order");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let product = fetch_product(&customer, &product["id"]).await;
    assert_eq!(product["stock"], 1);

    let orders: Vec<Value> = customer
        .get("/api/orders")
        .send()
        .await
        .expect("Failed to list orders")
        .json()
        .await
        .expect("Invalid orders JSON");
    assert!(orders.is_empty());
}

#[tokio::test]
#[ignore = "Requires running storefront server, database and admin account"]
async fn test_failed_line_rolls_back_earlier_lines() {
    let admin = TestClient::admin().await;
    let plenty = create_product(&admin, "physical", Some(5)).await;
    let scarce = create_product(&admin, "physical", Some(1)).await;

    let mut body = order_body(&plenty["id"], 2);
    body["items"] = json!([
        { "productId": plenty["id"], "quantity": 2 },
        { "productId": scarce["id"], "quantity": 3 },
    ]);

    let customer = TestClient::new_customer().await;
    let resp = customer
        .post("/api/orders")
        .json(&body)
        .send()
        .await
        .expect("Failed to place order");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    assert_eq!(fetch_product(&customer, &plenty["id"]).await["stock"], 5);
    assert_eq!(fetch_product(&customer, &scarce["id"]).await["stock"], 1);
}

#[tokio::test]
#[ignore = "Requires running storefront server, database and admin account"]
async fn test_oversized_total_is_rejected() {
    let admin = TestClient::admin().await;
    let product = create_product(&admin, "digital", None).await;

    let customer = TestClient::new_customer().await;
    let resp = customer
        .post("/api/orders")
        .json(&order_body(&product["id"], 1_000_000))
        .send()
        .await
        .expect("Failed to place order");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Invalid JSON");
    assert_eq!(body["message"], "El total de la orden excede el máximo permitido");
}

#[tokio::test]
#[ignore = "Requires running storefront server, database and admin account"]
async fn test_digital_products_have_no_stock() {
    let admin = TestClient::admin().await;
    let product = create_product(&admin, "digital", Some(10)).await;
    assert!(product["stock"].is_null());

    let customer = TestClient::new_customer().await;
    let resp = customer
        .post("/api/orders")
        .json(&order_body(&product["id"], 3))
        .send()
        .await
        .expect("Failed to place order");
    assert_eq!(resp.status(), StatusCode::CREATED);
}

#[tokio::test]
#[ignore = "Requires running storefront server, database and admin account"]
async fn test_soft_deleted_product_leaves_listing() {
    let admin = TestClient::admin().await;
    let product = create_product(&admin, "physical", Some(1)).await;
    let id = product["id"].as_str().expect("Product id");

    let resp = admin
        .delete(&format!("/api/products/{id}"))
        .send()
        .await
        .expect("Failed to delete product");
    assert_eq!(resp.status(), StatusCode::OK);

    let listing: Vec<Value> = admin
        .get("/api/products")
        .send()
        .await
        .expect("Failed to list products")
        .json()
        .await
        .expect("Invalid listing JSON");
    assert!(listing.iter().all(|p| p["id"] != product["id"]));

    let fetched = fetch_product(&admin, &product["id"]).await;
    assert_eq!(fetched["isActive"], false);
}

#[tokio::test]
#[ignore = "Requires running storefront server, database and admin account"]
async fn test_other_customers_cannot_see_order() {
    let admin = TestClient::admin().await;
    let product = create_product(&admin, "digital", None).await;

    let owner = TestClient::new_customer().await;
    let order: Value = owner
        .post("/api/orders")
        .json(&order_body(&product["id"], 1))
        .send()
        .await
        .expect("Failed to place order")
        .json()
        .await
        .expect("Invalid order JSON");
    let id = order["id"].as_str().expect("Order id");

    let stranger = TestClient::new_customer().await;
    let resp = stranger
        .get(&format!("/api/orders/{id}"))
        .send()
        .await
        .expect("Failed to fetch order");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = admin
        .get(&format!("/api/orders/{id}/tracking"))
        .send()
        .await
        .expect("Failed to fetch tracking");
    assert_eq!(resp.status(), StatusCode::OK);
    let tracking: Vec<Value> = resp.json().await.expect("Invalid tracking JSON");
    assert_eq!(tracking[0]["status"], "processing");
}
