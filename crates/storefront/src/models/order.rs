//! Order, line item and shipment tracking types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use edujuegos_core::{
    OrderId, OrderItemId, OrderStatus, Price, ProductId, TrackingId, TrackingStatus, UserId,
};

use super::Product;

/// An order header.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    /// Buyer account.
    pub user_id: UserId,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub customer_address: String,
    /// Sum of `quantity * price` over the items.
    pub total: Price,
    pub status: OrderStatus,
    pub payment_method: String,
    pub tracking_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A purchased line with the product it refers to.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i32,
    /// Unit price when the order was placed.
    pub price: Price,
    pub created_at: DateTime<Utc>,
    pub product: Product,
}

/// An order with its items, as returned by the listing endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// One entry in an order's shipment timeline.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderTracking {
    pub id: TrackingId,
    pub order_id: OrderId,
    pub status: TrackingStatus,
    pub description: Option<String>,
    pub location: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// An order with items and tracking history.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub tracking: Vec<OrderTracking>,
}

/// One requested line of a new order.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderLine {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Payload for `POST /api/orders`.
///
/// Prices are not accepted from the client; the total is computed from the
/// catalog when the order is placed.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub payment_method: String,
    pub items: Vec<NewOrderLine>,
}

impl NewOrder {
    /// Check header fields and line quantities.
    ///
    /// # Errors
    ///
    /// Returns a client-facing message describing the first problem.
    pub fn validate(&self) -> Result<(), String> {
        for (field, value) in [
            ("customerName", &self.customer_name),
            ("customerEmail", &self.customer_email),
            ("customerPhone", &self.customer_phone),
            ("customerAddress", &self.customer_address),
            ("paymentMethod", &self.payment_method),
        ] {
            if value.trim().is_empty() {
                return Err(format!("El campo {field} es requerido"));
            }
        }
        if self.items.is_empty() {
            return Err("La orden debe contener al menos un producto".to_string());
        }
        if self.items.iter().any(|line| line.quantity <= 0) {
            return Err("La cantidad debe ser mayor a cero".to_string());
        }
        Ok(())
    }
}

/// Payload for `PUT /api/orders/{id}/status`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
    #[serde(default)]
    pub tracking_number: Option<String>,
}

/// Payload for `POST /api/orders/{id}/tracking`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTracking {
    pub status: TrackingStatus,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub estimated_delivery: Option<DateTime<Utc>>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn order_json(items: serde_json::Value) -> serde_json::Value {
        serde_json::json!({
            "customerName": "Ana",
            "customerEmail": "ana@example.com",
            "customerPhone": "+54 11 5555-5555",
            "customerAddress": "Av. Siempre Viva 742",
            "paymentMethod": "transfer",
            "items": items,
        })
    }

    #[test]
    fn test_new_order_valid() {
        let order: NewOrder = serde_json::from_value(order_json(serde_json::json!([
            {"productId": "00000000-0000-0000-0000-000000000001", "quantity": 2}
        ])))
        .unwrap();
        assert!(order.validate().is_ok());
    }

    #[test]
    fn test_new_order_rejects_empty_items() {
        let order: NewOrder = serde_json::from_value(order_json(serde_json::json!([]))).unwrap();
        assert!(order.validate().is_err());
    }

    #[test]
    fn test_new_order_rejects_non_positive_quantity() {
        let order: NewOrder = serde_json::from_value(order_json(serde_json::json!([
            {"productId": "00000000-0000-0000-0000-000000000001", "quantity": 0}
        ])))
        .unwrap();
        assert_eq!(
            order.validate().unwrap_err(),
            "La cantidad debe ser mayor a cero"
        );
    }

    #[test]
    fn test_new_order_ignores_client_prices() {
        // Unknown fields such as `total` or per-line `price` are dropped.
        let mut json = order_json(serde_json::json!([
            {"productId": "00000000-0000-0000-0000-000000000001", "quantity": 1, "price": "1"}
        ]));
        json["total"] = serde_json::json!("1");
        assert!(serde_json::from_value::<NewOrder>(json).is_ok());
    }

    #[test]
    fn test_status_update_rejects_unknown_status() {
        let result =
            serde_json::from_value::<OrderStatusUpdate>(serde_json::json!({"status": "lost"}));
        assert!(result.is_err());
    }
}
