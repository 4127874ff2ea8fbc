//! Seed the product catalog from YAML.
//!
//! Entries use the same camelCase shape as `POST /api/products`. Products
//! whose name already belongs to an active product are skipped.

use tracing::{error, info};

use edujuegos_storefront::db::ProductRepository;
use edujuegos_storefront::models::NewProduct;

use super::{CommandError, connect};

/// Catalog shipped with the CLI.
const DEFAULT_CATALOG: &str = include_str!("../../seed/products.yaml");

/// Parse a catalog and report every invalid entry.
fn parse_catalog(content: &str) -> Result<Vec<NewProduct>, CommandError> {
    let products: Vec<NewProduct> = serde_yaml::from_str(content)?;

    let errors: Vec<String> = products
        .iter()
        .filter_map(|p| p.validate().err().map(|e| format!("{}: {e}", p.name)))
        .collect();
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(CommandError::InvalidCatalog(errors.len()));
    }

    Ok(products)
}

/// Insert catalog products that are not present yet.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, an entry is
/// invalid, or a database operation fails.
pub async fn catalog(file: Option<&str>) -> Result<(), CommandError> {
    let content = match file {
        Some(path) => {
            info!(path = %path, "Loading catalog from file");
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| CommandError::SeedFile {
                    path: path.to_string(),
                    source,
                })?
        }
        None => DEFAULT_CATALOG.to_string(),
    };

    // Validate before connecting to the database
    let products = parse_catalog(&content)?;
    info!(products = products.len(), "Catalog validated");

    let pool = connect().await?;
    let repo = ProductRepository::new(&pool);

    let mut inserted = 0_usize;
    let mut skipped = 0_usize;
    for product in &products {
        match repo.create_if_missing(product).await? {
            Some(created) => {
                info!(product_id = %created.id, name = %created.name, "Product inserted");
                inserted += 1;
            }
            None => skipped += 1,
        }
    }

    info!("Seeding complete!");
    info!("  Products inserted: {inserted}");
    info!("  Products skipped (already exist): {skipped}");
    Ok(())
}
