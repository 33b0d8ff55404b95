//! # Assignment Repository
//!
//! Database operations for branch-to-product ranging.
//!
//! ## Full Replace vs Merge
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   Two Write Shapes For Assignments                      │
//! │                                                                         │
//! │  set_for_branch(branch, [p1, p3])   ← UI "save ranging screen"         │
//! │  ┌───────────────────────────────────────────────┐                     │
//! │  │ current: {p1, p2}   desired: {p1, p3}         │                     │
//! │  │ diff:    insert p3, delete p2, keep p1        │  one transaction    │
//! │  └───────────────────────────────────────────────┘                     │
//! │                                                                         │
//! │  add(branch, product) / remove(branch, product)  ← single toggles      │
//! │  both idempotent: re-adding or re-removing is a no-op                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The diff (rather than delete-all-reinsert) keeps untouched rows
//! untouched, so a concurrent reader never observes an empty ranging.

use std::collections::HashSet;

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use stockline_core::{Assignment, Product};

/// Repository for branch-product assignment operations.
#[derive(Debug, Clone)]
pub struct AssignmentRepository {
    pool: SqlitePool,
}

impl AssignmentRepository {
    /// Creates a new AssignmentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AssignmentRepository { pool }
    }

    /// Lists every assignment pair, ordered by (branch_id, product_id).
    pub async fn list(&self) -> DbResult<Vec<Assignment>> {
        let pairs = sqlx::query_as::<_, Assignment>(
            r#"
            SELECT branch_id, product_id
            FROM branch_products
            ORDER BY branch_id, product_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(pairs)
    }

    /// Lists the products ranged by one branch, alphabetically.
    pub async fn products_for_branch(&self, branch_id: i64) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT p.id, p.name, p.weighted, p.suggested_price_cents
            FROM products p
            INNER JOIN branch_products bp ON bp.product_id = p.id
            WHERE bp.branch_id = ?1
            ORDER BY p.name
            "#,
        )
        .bind(branch_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Replaces one branch's ranging with exactly `product_ids`.
    ///
    /// Diffs against the current set and applies only the changes, inside
    /// one transaction. Duplicate ids in the input are collapsed.
    pub async fn set_for_branch(&self, branch_id: i64, product_ids: &[i64]) -> DbResult<()> {
        let desired: HashSet<i64> = product_ids.iter().copied().collect();

        debug!(branch_id, desired = desired.len(), "Replacing branch ranging");

        let mut tx = self.pool.begin().await?;

        let current: Vec<i64> = sqlx::query_scalar(
            "SELECT product_id FROM branch_products WHERE branch_id = ?1",
        )
        .bind(branch_id)
        .fetch_all(&mut *tx)
        .await?;
        let current: HashSet<i64> = current.into_iter().collect();

        for product_id in desired.difference(&current) {
            sqlx::query("INSERT INTO branch_products (branch_id, product_id) VALUES (?1, ?2)")
                .bind(branch_id)
                .bind(product_id)
                .execute(&mut *tx)
                .await?;
        }

        for product_id in current.difference(&desired) {
            sqlx::query(
                "DELETE FROM branch_products WHERE branch_id = ?1 AND product_id = ?2",
            )
            .bind(branch_id)
            .bind(product_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Assigns one product to one branch. No-op if already assigned.
    pub async fn add(&self, branch_id: i64, product_id: i64) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO branch_products (branch_id, product_id)
            VALUES (?1, ?2)
            ON CONFLICT (branch_id, product_id) DO NOTHING
            "#,
        )
        .bind(branch_id)
        .bind(product_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Removes one product from one branch. No-op if not assigned.
    pub async fn remove(&self, branch_id: i64, product_id: i64) -> DbResult<()> {
        sqlx::query("DELETE FROM branch_products WHERE branch_id = ?1 AND product_id = ?2")
            .bind(branch_id)
            .bind(product_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Counts assignment pairs (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM branch_products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use stockline_core::Branch;

    async fn seeded_db() -> (Database, i64, Vec<i64>) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let branch_id = db
            .branches()
            .insert(&Branch {
                id: 0,
                name: "CBD".to_string(),
                telephone: None,
                open_date: None,
            })
            .await
            .unwrap();

        let mut product_ids = Vec::new();
        for name in ["Bread", "Milk", "Sugar"] {
            let id = db
                .products()
                .insert(&Product {
                    id: 0,
                    name: name.to_string(),
                    weighted: false,
                    suggested_price_cents: 1000,
                })
                .await
                .unwrap();
            product_ids.push(id);
        }

        (db, branch_id, product_ids)
    }

    #[tokio::test]
    async fn test_set_for_branch_diffs() {
        let (db, branch_id, products) = seeded_db().await;
        let repo = db.assignments();

        repo.set_for_branch(branch_id, &[products[0], products[1]])
            .await
            .unwrap();
        assert_eq!(repo.count().await.unwrap(), 2);

        // p0 stays, p1 drops, p2 appears
        repo.set_for_branch(branch_id, &[products[0], products[2]])
            .await
            .unwrap();

        let ranged = repo.products_for_branch(branch_id).await.unwrap();
        let names: Vec<&str> = ranged.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Bread", "Sugar"]);
    }

    #[tokio::test]
    async fn test_add_is_idempotent() {
        let (db, branch_id, products) = seeded_db().await;
        let repo = db.assignments();

        repo.add(branch_id, products[0]).await.unwrap();
        repo.add(branch_id, products[0]).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let (db, branch_id, products) = seeded_db().await;
        let repo = db.assignments();

        repo.add(branch_id, products[0]).await.unwrap();
        repo.remove(branch_id, products[0]).await.unwrap();
        repo.remove(branch_id, products[0]).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_deleting_branch_cascades() {
        let (db, branch_id, products) = seeded_db().await;

        db.assignments().add(branch_id, products[0]).await.unwrap();
        db.branches().delete(branch_id).await.unwrap();

        assert_eq!(db.assignments().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_add_unknown_product_is_fk_error() {
        let (db, branch_id, _) = seeded_db().await;

        let err = db.assignments().add(branch_id, 999).await.unwrap_err();
        assert!(matches!(
            err,
            crate::error::DbError::ForeignKeyViolation { .. }
        ));
    }
}
