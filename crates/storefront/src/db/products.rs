//! Catalog repository.
//!
//! Deleting a product only clears `is_active`; order items keep pointing at it.

use sqlx::PgPool;

use edujuegos_core::ProductId;

use super::RepositoryError;
use crate::models::{NewProduct, Product, ProductUpdate};

const RETURNING_PRODUCT: &str = "RETURNING id, name, description, price, image_url, \
     COALESCE(image, image_url) AS image, category, age_range, type, stock, \
     is_active, featured, tags, created_at, updated_at";

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Active products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(&self) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(concat!(
            "SELECT ",
            product_columns!(),
            " FROM products p WHERE p.is_active ORDER BY p.created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// Get a product by ID, including inactive ones.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(concat!(
            "SELECT ",
            product_columns!(),
            " FROM products p WHERE p.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// Number of active products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_active(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active")
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let created = sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO products \
             (name, description, price, image_url, image, category, age_range, type, \
              stock, featured, tags) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) {RETURNING_PRODUCT}"
        ))
        .bind(product.name.trim())
        .bind(product.description.trim())
        .bind(product.price)
        .bind(&product.image_url)
        .bind(product.image.as_deref().filter(|i| !i.is_empty()))
        .bind(product.category.trim())
        .bind(product.age_range.trim())
        .bind(product.product_type)
        .bind(product.stored_stock())
        .bind(product.featured)
        .bind(&product.tags)
        .fetch_one(self.pool)
        .await?;

        Ok(created)
    }

    /// Apply a partial update. Switching a product to digital clears its stock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn update(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, Product>(&format!(
            "UPDATE products SET \
               name = COALESCE($2, name), \
               description = COALESCE($3, description), \
               price = COALESCE($4, price), \
               image_url = COALESCE($5, image_url), \
               image = COALESCE($6, image), \
               category = COALESCE($7, category), \
               age_range = COALESCE($8, age_range), \
               type = COALESCE($9, type), \
               stock = CASE WHEN COALESCE($9, type) = 'digital' THEN NULL \
                            ELSE COALESCE($10, stock) END, \
               is_active = COALESCE($11, is_active), \
               featured = COALESCE($12, featured), \
               tags = COALESCE($13, tags), \
               updated_at = now() \
             WHERE id = $1 {RETURNING_PRODUCT}"
        ))
        .bind(id)
        .bind(update.name.as_deref().map(str::trim))
        .bind(update.description.as_deref().map(str::trim))
        .bind(update.price)
        .bind(update.image_url.as_deref())
        .bind(update.image.as_deref())
        .bind(update.category.as_deref().map(str::trim))
        .bind(update.age_range.as_deref().map(str::trim))
        .bind(update.product_type)
        .bind(update.stock)
        .bind(update.is_active)
        .bind(update.featured)
        .bind(update.tags.clone())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Soft-delete a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn deactivate(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE products SET is_active = FALSE, updated_at = now() WHERE id = $1")
                .bind(id)
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Insert a product unless an active one with the same name exists.
    ///
    /// Returns `None` when skipped. Used by the seed command.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create_if_missing(
        &self,
        product: &NewProduct,
    ) -> Result<Option<Product>, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM products WHERE name = $1 AND is_active)",
        )
        .bind(product.name.trim())
        .fetch_one(self.pool)
        .await?;

        if exists {
            return Ok(None);
        }
        self.create(product).await.map(Some)
    }
}
