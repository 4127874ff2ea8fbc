//! Catalog product types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use edujuegos_core::{Price, ProductId, ProductType};

/// A catalog product.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub image_url: String,
    /// `image` if set, otherwise `image_url`.
    pub image: String,
    pub category: String,
    pub age_range: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub product_type: ProductType,
    /// Units on hand. Always `None` for digital products.
    pub stock: Option<i32>,
    /// `false` once the product has been deleted.
    pub is_active: bool,
    pub featured: bool,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for `POST /api/products`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Price,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub image: Option<String>,
    pub category: String,
    pub age_range: String,
    #[serde(rename = "type")]
    pub product_type: ProductType,
    #[serde(default)]
    pub stock: Option<i32>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NewProduct {
    /// Check required text fields and stock.
    ///
    /// # Errors
    ///
    /// Returns a client-facing message naming the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        require_text("name", &self.name)?;
        require_text("description", &self.description)?;
        require_text("category", &self.category)?;
        require_text("ageRange", &self.age_range)?;
        validate_stock(self.stock)
    }

    /// Stock as stored: digital products never carry stock.
    #[must_use]
    pub const fn stored_stock(&self) -> Option<i32> {
        match self.product_type {
            ProductType::Digital => None,
            ProductType::Physical => self.stock,
        }
    }
}

/// Payload for `PUT /api/products/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub image_url: Option<String>,
    pub image: Option<String>,
    pub category: Option<String>,
    pub age_range: Option<String>,
    #[serde(rename = "type")]
    pub product_type: Option<ProductType>,
    pub stock: Option<i32>,
    pub is_active: Option<bool>,
    pub featured: Option<bool>,
    pub tags: Option<Vec<String>>,
}

impl ProductUpdate {
    /// Reject blank replacements for required fields and negative stock.
    ///
    /// # Errors
    ///
    /// Returns a client-facing message naming the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        for (field, value) in [
            ("name", &self.name),
            ("description", &self.description),
            ("category", &self.category),
            ("ageRange", &self.age_range),
        ] {
            if let Some(value) = value {
                require_text(field, value)?;
            }
        }
        validate_stock(self.stock)
    }
}

fn require_text(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("El campo {field} es requerido"));
    }
    Ok(())
}

fn validate_stock(stock: Option<i32>) -> Result<(), String> {
    match stock {
        Some(n) if n < 0 => Err("El stock no puede ser negativo".to_string()),
        _ => Ok(()),
    }
}
