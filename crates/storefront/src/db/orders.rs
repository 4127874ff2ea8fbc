//! Order repository: orders, line items and shipment tracking.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use thiserror::Error;

use edujuegos_core::{
    OrderId, OrderItemId, OrderStatus, Price, ProductId, ProductType, TrackingStatus, UserId,
};

use super::RepositoryError;
use crate::models::{
    NewOrder, NewTracking, Order, OrderDetail, OrderItem, OrderTracking, OrderWithItems, Product,
};

const ORDER_COLUMNS: &str = "id, user_id, customer_name, customer_email, customer_phone, \
     customer_address, total, status, payment_method, tracking_number, created_at, updated_at";

const TRACKING_COLUMNS: &str =
    "id, order_id, status, description, location, estimated_delivery, created_at";

/// Errors that can occur while placing an order.
#[derive(Debug, Error)]
pub enum PlaceOrderError {
    /// The product does not exist or was deleted.
    #[error("product {0} is not available")]
    ProductUnavailable(ProductId),

    /// Not enough units on hand.
    #[error("insufficient stock for {name}")]
    InsufficientStock { product_id: ProductId, name: String },

    /// The order total does not fit in `NUMERIC(10, 2)`.
    #[error("order total is too large")]
    TotalTooLarge,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for PlaceOrderError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// An order item joined with its product.
#[derive(sqlx::FromRow)]
struct OrderItemRow {
    item_id: OrderItemId,
    order_id: OrderId,
    quantity: i32,
    unit_price: Price,
    item_created_at: DateTime<Utc>,
    #[sqlx(flatten)]
    product: Product,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: row.item_id,
            order_id: row.order_id,
            product_id: row.product.id,
            quantity: row.quantity,
            price: row.unit_price,
            created_at: row.item_created_at,
            product: row.product,
        }
    }
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every order with its items, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_all(&self) -> Result<Vec<OrderWithItems>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        self.attach_items(orders).await
    }

    /// A user's orders with their items, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<OrderWithItems>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        self.attach_items(orders).await
    }

    /// Get an order header by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(order)
    }

    /// An order with its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_with_items(
        &self,
        id: OrderId,
    ) -> Result<Option<OrderWithItems>, RepositoryError> {
        let Some(order) = self.get(id).await? else {
            return Ok(None);
        };
        let items = self.items_for(&[order.id]).await?;

        Ok(Some(OrderWithItems { order, items }))
    }

    /// An order with its items and tracking history.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_detail(&self, id: OrderId) -> Result<Option<OrderDetail>, RepositoryError> {
        let Some(order) = self.get(id).await? else {
            return Ok(None);
        };
        let items = self.items_for(&[order.id]).await?;
        let tracking = self.tracking(order.id).await?;

        Ok(Some(OrderDetail {
            order,
            items,
            tracking,
        }))
    }

    async fn items_for(&self, order_ids: &[OrderId]) -> Result<Vec<OrderItem>, RepositoryError> {
        let ids: Vec<uuid::Uuid> = order_ids.iter().map(OrderId::as_uuid).collect();
        let rows = sqlx::query_as::<_, OrderItemRow>(concat!(
            "SELECT oi.id AS item_id, oi.order_id, oi.quantity, oi.price AS unit_price, \
             oi.created_at AS item_created_at, ",
            product_columns!(),
            " FROM order_items oi JOIN products p ON p.id = oi.product_id \
             WHERE oi.order_id = ANY($1) ORDER BY oi.created_at, oi.id"
        ))
        .bind(ids)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(OrderItem::from).collect())
    }

    async fn attach_items(
        &self,
        orders: Vec<Order>,
    ) -> Result<Vec<OrderWithItems>, RepositoryError> {
        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<OrderId> = orders.iter().map(|o| o.id).collect();
        let mut by_order: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for item in self.items_for(&ids).await? {
            by_order.entry(item.order_id).or_default().push(item);
        }

        Ok(orders
            .into_iter()
            .map(|order| {
                let items = by_order.remove(&order.id).unwrap_or_default();
                OrderWithItems { order, items }
            })
            .collect())
    }

    /// Place an order in a single transaction.
    ///
    /// Unit prices and the total come from the catalog. Physical products with
    /// tracked stock are decremented only if enough units remain; any failure
    /// rolls back the whole order.
    ///
    /// # Errors
    ///
    /// Returns `PlaceOrderError::ProductUnavailable` for unknown or inactive products.
    /// Returns `PlaceOrderError::InsufficientStock` when a line exceeds stock.
    /// Returns `PlaceOrderError::Repository` for database errors.
    pub async fn place(
        &self,
        user_id: UserId,
        order: &NewOrder,
    ) -> Result<OrderWithItems, PlaceOrderError> {
        let mut tx = self.pool.begin().await?;

        let mut priced = Vec::with_capacity(order.items.len());
        for line in &order.items {
            let product = sqlx::query_as::<_, Product>(concat!(
                "SELECT ",
                product_columns!(),
                " FROM products p WHERE p.id = $1 AND p.is_active FOR UPDATE"
            ))
            .bind(line.product_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(PlaceOrderError::ProductUnavailable(line.product_id))?;

            if product.product_type == ProductType::Physical && product.stock.is_some() {
                let updated = sqlx::query(
                    "UPDATE products SET stock = stock - $2, updated_at = now() \
                     WHERE id = $1 AND stock >= $2",
                )
                .bind(product.id)
                .bind(line.quantity)
                .execute(&mut *tx)
                .await?;

                if updated.rows_affected() == 0 {
                    return Err(PlaceOrderError::InsufficientStock {
                        product_id: product.id,
                        name: product.name,
                    });
                }
            }

            priced.push((product, line.quantity));
        }

        let total = priced
            .iter()
            .try_fold(Price::ZERO, |total, (product, quantity)| {
                product
                    .price
                    .checked_mul(*quantity)
                    .and_then(|line| total.checked_add(line))
            })
            .map_err(|_| PlaceOrderError::TotalTooLarge)?;

        let header = sqlx::query_as::<_, Order>(&format!(
            "INSERT INTO orders \
             (user_id, customer_name, customer_email, customer_phone, customer_address, \
              total, status, payment_method) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {ORDER_COLUMNS}"
        ))
        .bind(user_id)
        .bind(order.customer_name.trim())
        .bind(order.customer_email.trim())
        .bind(order.customer_phone.trim())
        .bind(order.customer_address.trim())
        .bind(total)
        .bind(OrderStatus::Pending)
        .bind(order.payment_method.trim())
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(priced.len());
        for (product, quantity) in priced {
            let (id, created_at): (OrderItemId, DateTime<Utc>) = sqlx::query_as(
                "INSERT INTO order_items (order_id, product_id, quantity, price) \
                 VALUES ($1, $2, $3, $4) RETURNING id, created_at",
            )
            .bind(header.id)
            .bind(product.id)
            .bind(quantity)
            .bind(product.price)
            .fetch_one(&mut *tx)
            .await?;

            items.push(OrderItem {
                id,
                order_id: header.id,
                product_id: product.id,
                quantity,
                price: product.price,
                created_at,
                product,
            });
        }

        sqlx::query(
            "INSERT INTO order_tracking (order_id, status, description) VALUES ($1, $2, $3)",
        )
        .bind(header.id)
        .bind(TrackingStatus::Processing)
        .bind("Pedido recibido")
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(OrderWithItems {
            order: header,
            items,
        })
    }

    /// Set an order's status and, optionally, its tracking number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
        tracking_number: Option<&str>,
    ) -> Result<Order, RepositoryError> {
        sqlx::query_as::<_, Order>(&format!(
            "UPDATE orders SET status = $2, \
               tracking_number = COALESCE($3, tracking_number), updated_at = now() \
             WHERE id = $1 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(status)
        .bind(tracking_number)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Tracking history of an order, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn tracking(&self, order_id: OrderId) -> Result<Vec<OrderTracking>, RepositoryError> {
        let entries = sqlx::query_as::<_, OrderTracking>(&format!(
            "SELECT {TRACKING_COLUMNS} FROM order_tracking WHERE order_id = $1 \
             ORDER BY created_at, id"
        ))
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        Ok(entries)
    }

    /// Append a tracking entry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn add_tracking(
        &self,
        order_id: OrderId,
        entry: &NewTracking,
    ) -> Result<OrderTracking, RepositoryError> {
        sqlx::query_as::<_, OrderTracking>(&format!(
            "INSERT INTO order_tracking (order_id, status, description, location, \
              estimated_delivery) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {TRACKING_COLUMNS}"
        ))
        .bind(order_id)
        .bind(entry.status)
        .bind(entry.description.as_deref())
        .bind(entry.location.as_deref())
        .bind(entry.estimated_delivery)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            RepositoryError::Database(e)
        })
    }
}
