//! # Assignment Reconciliation
//!
//! Import strategies for branch-product mapping files.
//!
//! ## Two Strategies
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  Mapping Import Strategies                              │
//! │                                                                         │
//! │  replace_for_branch(branch 2, file)      ← branch-scoped import        │
//! │  ┌────────────────────────────────────────────────┐                    │
//! │  │ The file IS branch 2's ranging. Diff against   │                    │
//! │  │ the current set:                               │                    │
//! │  │   in file, not in store  → INSERT              │                    │
//! │  │   in store, not in file  → DELETE              │                    │
//! │  │ count = insertions + deletions                 │                    │
//! │  │ (re-importing an export counts 0)              │                    │
//! │  └────────────────────────────────────────────────┘                    │
//! │                                                                         │
//! │  merge_pairs(file)                       ← unscoped import             │
//! │  ┌────────────────────────────────────────────────┐                    │
//! │  │ The file is additions across branches. Insert  │                    │
//! │  │ each pair whose endpoints both exist; already- │                    │
//! │  │ present pairs and dangling pairs are skipped.  │                    │
//! │  │ count = pairs actually inserted                │                    │
//! │  └────────────────────────────────────────────────┘                    │
//! │                                                                         │
//! │  Either way: one transaction, deletes never happen in merge mode.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashSet;

use sqlx::SqliteConnection;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::coordinate::ensure_live;
use crate::error::TransferResult;
use stockline_core::MappingRow;
use stockline_db::{Database, DbError};

/// Which of `ids` exist in `table`. Used to drop dangling pairs up front.
///
/// Queried in chunks to stay under the statement's bind-variable limit.
async fn existing_ids(
    conn: &mut SqliteConnection,
    table: &str,
    ids: &HashSet<i64>,
) -> TransferResult<HashSet<i64>> {
    let ids: Vec<i64> = ids.iter().copied().collect();
    let mut found = HashSet::new();

    for chunk in ids.chunks(crate::reconcile::ID_CHUNK) {
        let placeholders = vec!["?"; chunk.len()].join(", ");
        let sql = format!("SELECT id FROM {table} WHERE id IN ({placeholders})");

        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        for id in chunk {
            query = query.bind(*id);
        }

        found.extend(
            query
                .fetch_all(&mut *conn)
                .await
                .map_err(DbError::from)?,
        );
    }

    Ok(found)
}

// =============================================================================
// Branch-Scoped Replace
// =============================================================================

/// Makes one branch's ranging exactly match the file.
///
/// Rows for other branches and rows naming unknown products are skipped
/// with a warning. Returns insertions + deletions, so re-importing a
/// branch's own export reports zero changes.
pub async fn replace_for_branch(
    db: &Database,
    branch_id: i64,
    rows: &[MappingRow],
    cancel: &CancellationToken,
) -> TransferResult<u64> {
    ensure_live(cancel)?;

    let mut tx = db.pool().begin().await.map_err(DbError::from)?;

    let mut desired: HashSet<i64> = HashSet::new();
    for row in rows {
        if row.branch_id == branch_id {
            desired.insert(row.product_id);
        } else {
            warn!(
                row_branch = row.branch_id,
                branch_id, "Skipping mapping row for another branch"
            );
        }
    }

    // Drop products the store doesn't know
    let known = existing_ids(&mut tx, "products", &desired).await?;
    for missing in desired.difference(&known) {
        warn!(product_id = missing, "Skipping mapping for unknown product");
    }
    let desired = known;

    let current: Vec<i64> =
        sqlx::query_scalar("SELECT product_id FROM branch_products WHERE branch_id = ?1")
            .bind(branch_id)
            .fetch_all(&mut *tx)
            .await
            .map_err(DbError::from)?;
    let current: HashSet<i64> = current.into_iter().collect();

    let mut changed: u64 = 0;

    for product_id in desired.difference(&current) {
        ensure_live(cancel)?;
        sqlx::query("INSERT INTO branch_products (branch_id, product_id) VALUES (?1, ?2)")
            .bind(branch_id)
            .bind(product_id)
            .execute(&mut *tx)
            .await
            .map_err(DbError::from)?;
        changed += 1;
    }

    for product_id in current.difference(&desired) {
        ensure_live(cancel)?;
        sqlx::query("DELETE FROM branch_products WHERE branch_id = ?1 AND product_id = ?2")
            .bind(branch_id)
            .bind(product_id)
            .execute(&mut *tx)
            .await
            .map_err(DbError::from)?;
        changed += 1;
    }

    tx.commit().await.map_err(DbError::from)?;

    info!(branch_id, changed, "Branch ranging replaced");
    Ok(changed)
}

// =============================================================================
// Unscoped Merge
// =============================================================================

/// Adds the file's pairs on top of what the store already has.
///
/// Pairs whose branch or product doesn't exist are skipped with a warning;
/// already-present pairs count as nothing. Returns pairs inserted.
pub async fn merge_pairs(
    db: &Database,
    rows: &[MappingRow],
    cancel: &CancellationToken,
) -> TransferResult<u64> {
    ensure_live(cancel)?;

    let mut tx = db.pool().begin().await.map_err(DbError::from)?;

    let branch_ids: HashSet<i64> = rows.iter().map(|r| r.branch_id).collect();
    let product_ids: HashSet<i64> = rows.iter().map(|r| r.product_id).collect();

    let known_branches = existing_ids(&mut tx, "branches", &branch_ids).await?;
    let known_products = existing_ids(&mut tx, "products", &product_ids).await?;

    let mut inserted: u64 = 0;

    for row in rows {
        ensure_live(cancel)?;

        if !known_branches.contains(&row.branch_id) || !known_products.contains(&row.product_id) {
            warn!(
                branch_id = row.branch_id,
                product_id = row.product_id,
                "Skipping mapping with missing endpoint"
            );
            continue;
        }

        let result = sqlx::query(
            r#"
            INSERT INTO branch_products (branch_id, product_id)
            VALUES (?1, ?2)
            ON CONFLICT (branch_id, product_id) DO NOTHING
            "#,
        )
        .bind(row.branch_id)
        .bind(row.product_id)
        .execute(&mut *tx)
        .await
        .map_err(DbError::from)?;

        inserted += result.rows_affected();
    }

    tx.commit().await.map_err(DbError::from)?;

    info!(inserted, "Mapping pairs merged");
    Ok(inserted)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use stockline_core::{Branch, Product};
    use stockline_db::{Database, DbConfig};

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

    fn pair(branch_id: i64, product_id: i64) -> MappingRow {
        MappingRow {
            branch_id,
            product_id,
        }
    }

    #[tokio::test]
    async fn test_replace_counts_insertions_and_deletions() {
        let (db, branch, products) = seeded_db().await;
        let cancel = CancellationToken::new();

        db.assignments().add(branch, products[0]).await.unwrap();
        db.assignments().add(branch, products[1]).await.unwrap();

        // Keep p0, drop p1, add p2 → 2 changes
        let rows = vec![pair(branch, products[0]), pair(branch, products[2])];
        let changed = replace_for_branch(&db, branch, &rows, &cancel).await.unwrap();
        assert_eq!(changed, 2);

        // Same file again → nothing to change
        let changed = replace_for_branch(&db, branch, &rows, &cancel).await.unwrap();
        assert_eq!(changed, 0);
    }

    #[tokio::test]
    async fn test_replace_skips_unknown_products() {
        let (db, branch, products) = seeded_db().await;
        let cancel = CancellationToken::new();

        let rows = vec![pair(branch, products[0]), pair(branch, 999)];
        let changed = replace_for_branch(&db, branch, &rows, &cancel).await.unwrap();

        assert_eq!(changed, 1);
        assert_eq!(db.assignments().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_replace_ignores_other_branches_rows() {
        let (db, branch, products) = seeded_db().await;
        let cancel = CancellationToken::new();

        let rows = vec![pair(branch, products[0]), pair(branch + 1, products[1])];
        let changed = replace_for_branch(&db, branch, &rows, &cancel).await.unwrap();

        assert_eq!(changed, 1);
    }

    #[tokio::test]
    async fn test_merge_is_idempotent_and_skips_dangling() {
        let (db, branch, products) = seeded_db().await;
        let cancel = CancellationToken::new();

        let rows = vec![
            pair(branch, products[0]),
            pair(branch, products[0]), // duplicate in file
            pair(999, products[1]),    // unknown branch
        ];

        let inserted = merge_pairs(&db, &rows, &cancel).await.unwrap();
        assert_eq!(inserted, 1);

        // Re-running the same file adds nothing
        let inserted = merge_pairs(&db, &rows, &cancel).await.unwrap();
        assert_eq!(inserted, 0);
    }

    #[tokio::test]
    async fn test_replace_handles_ranging_above_one_chunk() {
        let (db, branch, _) = seeded_db().await;
        let cancel = CancellationToken::new();

        // A ranging wider than one existence query's chunk
        let mut rows = Vec::new();
        for i in 0..600 {
            let id = db
                .products()
                .insert(&Product {
                    id: 0,
                    name: format!("Bulk {i}"),
                    weighted: false,
                    suggested_price_cents: 100,
                })
                .await
                .unwrap();
            rows.push(pair(branch, id));
        }

        let changed = replace_for_branch(&db, branch, &rows, &cancel).await.unwrap();
        assert_eq!(changed, 600);

        let changed = replace_for_branch(&db, branch, &rows, &cancel).await.unwrap();
        assert_eq!(changed, 0);
    }

    #[tokio::test]
    async fn test_merge_never_deletes() {
        let (db, branch, products) = seeded_db().await;
        let cancel = CancellationToken::new();

        db.assignments().add(branch, products[0]).await.unwrap();

        merge_pairs(&db, &[pair(branch, products[1])], &cancel)
            .await
            .unwrap();

        assert_eq!(db.assignments().count().await.unwrap(), 2);
    }
}
