//! # Product Repository
//!
//! Database operations for catalogue products.
//!
//! ## Price Storage
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Price Storage Strategy                             │
//! │                                                                         │
//! │  ❌ WRONG: REAL column (floating point drift)                          │
//! │     suggested_price REAL  →  15.499999999                              │
//! │                                                                         │
//! │  ✅ CORRECT: INTEGER cents                                             │
//! │     suggested_price_cents INTEGER  →  1550                             │
//! │                                                                         │
//! │  Display formatting (15.50 / "15.5") happens in stockline-core,        │
//! │  never in SQL.                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use stockline_core::validation::{validate_price_cents, validate_product_name};
use stockline_core::Product;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
/// let all = repo.list().await?;
/// let one = repo.get_by_id(42).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists all products, alphabetically by name.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, weighted, suggested_price_cents
            FROM products
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, weighted, suggested_price_cents
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Inserts a new product, letting SQLite assign the id.
    ///
    /// ## Returns
    /// * `Ok(i64)` - The assigned id
    pub async fn insert(&self, product: &Product) -> DbResult<i64> {
        validate(product)?;

        debug!(name = %product.name, "Inserting product");

        let result = sqlx::query(
            r#"
            INSERT INTO products (name, weighted, suggested_price_cents)
            VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(&product.name)
        .bind(product.weighted)
        .bind(product.suggested_price_cents)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Updates an existing product.
    ///
    /// ## Returns
    /// * `Ok(())` - Update successful
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        validate(product)?;

        debug!(id = product.id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                weighted = ?3,
                suggested_price_cents = ?4
            WHERE id = ?1
            "#,
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(product.weighted)
        .bind(product.suggested_price_cents)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", product.id.to_string()));
        }

        Ok(())
    }

    /// Deletes a product and (via cascade) its branch assignments.
    ///
    /// Idempotent: deleting a missing product is not an error.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id, "Deleting product");

        sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Counts total products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

fn validate(product: &Product) -> DbResult<()> {
    validate_product_name(&product.name)
        .and_then(|()| validate_price_cents(product.suggested_price_cents))
        .map_err(|e| DbError::Internal(e.to_string()))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn sample_product() -> Product {
        Product {
            id: 0,
            name: "Milk 2L".to_string(),
            weighted: false,
            suggested_price_cents: 1550,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let repo = db.products();

        let id = repo.insert(&sample_product()).await.unwrap();

        let fetched = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Milk 2L");
        assert_eq!(fetched.suggested_price_cents, 1550);
        assert!(!fetched.weighted);
    }

    #[tokio::test]
    async fn test_update_round_trip() {
        let db = test_db().await;
        let repo = db.products();

        let id = repo.insert(&sample_product()).await.unwrap();

        let mut updated = sample_product();
        updated.id = id;
        updated.name = "Milk 2L Full Cream".to_string();
        updated.weighted = true;
        updated.suggested_price_cents = 1899;
        repo.update(&updated).await.unwrap();

        let fetched = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(fetched, updated);
    }

    #[tokio::test]
    async fn test_insert_rejects_negative_price() {
        let db = test_db().await;
        let repo = db.products();

        let mut product = sample_product();
        product.suggested_price_cents = -100;

        assert!(repo.insert(&product).await.is_err());
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let db = test_db().await;
        assert!(db.products().get_by_id(404).await.unwrap().is_none());
    }
}
