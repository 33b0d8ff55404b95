//! # Reconciliation Engine
//!
//! Three-pass upsert of file rows against the store, in one transaction.
//!
//! ## The Three Passes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │             reconcile_rows - ONE transaction per file                   │
//! │                                                                         │
//! │  file rows                          store                               │
//! │  ┌──────────────┐                                                      │
//! │  │ id=3  Milk   │── id exists ────► Pass 1: UPDATE ... WHERE id=3      │
//! │  │ id=0  Bread  │── unassigned ───► Pass 2: INSERT (store picks id)    │
//! │  │ id=41 Sugar  │── new explicit ─► Pass 3: INSERT with id=41          │
//! │  │ id=7  ""     │── invalid ──────► skipped + logged, batch continues  │
//! │  └──────────────┘                                                      │
//! │                                                                         │
//! │  Pass 3 runs under the IdentityScope for the entity kind; existence    │
//! │  is re-checked under the scope, so a row whose id appeared while we    │
//! │  waited for the lock routes to UPDATE instead of a dead insert.        │
//! │                                                                         │
//! │  Any error → transaction drops → store unchanged by this file.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The returned count is applied rows (updates + inserts); skipped rows
//! are logged, never counted, and never abort the batch.

use std::collections::HashSet;

use sqlx::SqliteConnection;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::coordinate::ensure_live;
use crate::error::TransferResult;
use crate::identity::{EntityKind, IdentityAllocator, IdentityScope};
use stockline_core::{BranchRow, ProductRow, UNASSIGNED_ID};
use stockline_db::{Database, DbError};

// =============================================================================
// Reconcilable
// =============================================================================

/// An entity row the three-pass engine knows how to upsert.
///
/// `apply_*` return `Ok(false)` for rows that fail field validation: the
/// row is skipped and the batch continues. Store errors are real errors.
#[allow(async_fn_in_trait)]
pub trait Reconcilable: Sized {
    const KIND: EntityKind;

    /// The id carried by the file ([`UNASSIGNED_ID`] means "store assigns").
    fn row_id(&self) -> i64;

    /// Which of the given ids already exist in the store.
    async fn fetch_existing_ids(
        conn: &mut SqliteConnection,
        ids: &[i64],
    ) -> TransferResult<HashSet<i64>>;

    /// Pass 1: overwrite the existing row with this row's fields.
    async fn apply_update(&self, conn: &mut SqliteConnection) -> TransferResult<bool>;

    /// Pass 2: insert with a store-assigned id.
    async fn apply_insert_auto(&self, conn: &mut SqliteConnection) -> TransferResult<bool>;

    /// Pass 3: insert with the file's explicit id. Requires the identity
    /// scope for this entity kind.
    async fn apply_insert_explicit(
        &self,
        conn: &mut SqliteConnection,
        scope: &IdentityScope<'_>,
    ) -> TransferResult<bool>;
}

// =============================================================================
// Engine
// =============================================================================

/// Reconciles a batch of file rows against the store.
///
/// Returns the number of applied rows. See the module docs for the pass
/// structure; cancellation is checked before every store round trip and
/// rolls the whole transaction back.
pub async fn reconcile_rows<T: Reconcilable>(
    db: &Database,
    identity: &IdentityAllocator,
    rows: &[T],
    cancel: &CancellationToken,
) -> TransferResult<u64> {
    ensure_live(cancel)?;

    let mut tx = db.pool().begin().await.map_err(DbError::from)?;

    let file_ids: Vec<i64> = rows
        .iter()
        .map(Reconcilable::row_id)
        .filter(|id| *id != UNASSIGNED_ID)
        .collect();
    let existing = T::fetch_existing_ids(&mut tx, &file_ids).await?;

    let mut applied: u64 = 0;
    let mut skipped: u64 = 0;
    let mut tally = |ok: bool| if ok { applied += 1 } else { skipped += 1 };

    // Pass 1: updates
    for row in rows.iter().filter(|r| existing.contains(&r.row_id())) {
        ensure_live(cancel)?;
        let ok = row.apply_update(&mut tx).await?;
        tally(ok);
    }

    // Pass 2: store-assigned inserts
    for row in rows.iter().filter(|r| r.row_id() == UNASSIGNED_ID) {
        ensure_live(cancel)?;
        let ok = row.apply_insert_auto(&mut tx).await?;
        tally(ok);
    }

    // Pass 3: explicit-id inserts
    let candidates: Vec<&T> = rows
        .iter()
        .filter(|r| r.row_id() != UNASSIGNED_ID && !existing.contains(&r.row_id()))
        .collect();

    if !candidates.is_empty() {
        let scope = identity.acquire(T::KIND).await;

        // Re-check under the scope: ids may have appeared while we waited
        let candidate_ids: Vec<i64> = candidates.iter().map(|r| r.row_id()).collect();
        let appeared = T::fetch_existing_ids(&mut tx, &candidate_ids).await?;

        for row in candidates {
            ensure_live(cancel)?;
            let ok = if appeared.contains(&row.row_id()) {
                row.apply_update(&mut tx).await?
            } else {
                row.apply_insert_explicit(&mut tx, &scope).await?
            };
            tally(ok);
        }
    }

    tx.commit().await.map_err(DbError::from)?;

    info!(kind = %T::KIND, applied, skipped, "Reconciliation committed");
    Ok(applied)
}

/// Upper bound on ids per `IN` query, well under SQLite's bind limit.
pub(crate) const ID_CHUNK: usize = 500;

/// Which of `ids` exist in `table` (id column). Shared by the impls.
///
/// Queried in chunks so a file with tens of thousands of explicit ids
/// never exceeds the statement's bind-variable limit.
async fn fetch_ids(
    conn: &mut SqliteConnection,
    table: &str,
    ids: &[i64],
) -> TransferResult<HashSet<i64>> {
    let mut found = HashSet::new();

    for chunk in ids.chunks(ID_CHUNK) {
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
// Product Rows
// =============================================================================

impl Reconcilable for ProductRow {
    const KIND: EntityKind = EntityKind::Product;

    fn row_id(&self) -> i64 {
        self.id
    }

    async fn fetch_existing_ids(
        conn: &mut SqliteConnection,
        ids: &[i64],
    ) -> TransferResult<HashSet<i64>> {
        fetch_ids(conn, "products", ids).await
    }

    async fn apply_update(&self, conn: &mut SqliteConnection) -> TransferResult<bool> {
        let product = match self.to_product() {
            Ok(product) => product,
            Err(e) => {
                warn!(id = self.id, error = %e, "Skipping invalid product row");
                return Ok(false);
            }
        };

        sqlx::query(
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
        .execute(conn)
        .await
        .map_err(DbError::from)?;

        Ok(true)
    }

    async fn apply_insert_auto(&self, conn: &mut SqliteConnection) -> TransferResult<bool> {
        let product = match self.to_product() {
            Ok(product) => product,
            Err(e) => {
                warn!(error = %e, "Skipping invalid product row");
                return Ok(false);
            }
        };

        sqlx::query(
            r#"
            INSERT INTO products (name, weighted, suggested_price_cents)
            VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(&product.name)
        .bind(product.weighted)
        .bind(product.suggested_price_cents)
        .execute(conn)
        .await
        .map_err(DbError::from)?;

        Ok(true)
    }

    async fn apply_insert_explicit(
        &self,
        conn: &mut SqliteConnection,
        _scope: &IdentityScope<'_>,
    ) -> TransferResult<bool> {
        let product = match self.to_product() {
            Ok(product) => product,
            Err(e) => {
                warn!(id = self.id, error = %e, "Skipping invalid product row");
                return Ok(false);
            }
        };

        sqlx::query(
            r#"
            INSERT INTO products (id, name, weighted, suggested_price_cents)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(product.weighted)
        .bind(product.suggested_price_cents)
        .execute(conn)
        .await
        .map_err(DbError::from)?;

        Ok(true)
    }
}

// =============================================================================
// Branch Rows
// =============================================================================

impl Reconcilable for BranchRow {
    const KIND: EntityKind = EntityKind::Branch;

    fn row_id(&self) -> i64 {
        self.id
    }

    async fn fetch_existing_ids(
        conn: &mut SqliteConnection,
        ids: &[i64],
    ) -> TransferResult<HashSet<i64>> {
        fetch_ids(conn, "branches", ids).await
    }

    async fn apply_update(&self, conn: &mut SqliteConnection) -> TransferResult<bool> {
        let branch = match self.to_branch() {
            Ok(branch) => branch,
            Err(e) => {
                warn!(id = self.id, error = %e, "Skipping invalid branch row");
                return Ok(false);
            }
        };

        sqlx::query(
            r#"
            UPDATE branches SET
                name = ?2,
                telephone = ?3,
                open_date = ?4
            WHERE id = ?1
            "#,
        )
        .bind(branch.id)
        .bind(&branch.name)
        .bind(&branch.telephone)
        .bind(branch.open_date)
        .execute(conn)
        .await
        .map_err(DbError::from)?;

        Ok(true)
    }

    async fn apply_insert_auto(&self, conn: &mut SqliteConnection) -> TransferResult<bool> {
        let branch = match self.to_branch() {
            Ok(branch) => branch,
            Err(e) => {
                warn!(error = %e, "Skipping invalid branch row");
                return Ok(false);
            }
        };

        sqlx::query(
            r#"
            INSERT INTO branches (name, telephone, open_date)
            VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(&branch.name)
        .bind(&branch.telephone)
        .bind(branch.open_date)
        .execute(conn)
        .await
        .map_err(DbError::from)?;

        Ok(true)
    }

    async fn apply_insert_explicit(
        &self,
        conn: &mut SqliteConnection,
        _scope: &IdentityScope<'_>,
    ) -> TransferResult<bool> {
        let branch = match self.to_branch() {
            Ok(branch) => branch,
            Err(e) => {
                warn!(id = self.id, error = %e, "Skipping invalid branch row");
                return Ok(false);
            }
        };

        sqlx::query(
            r#"
            INSERT INTO branches (id, name, telephone, open_date)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(branch.id)
        .bind(&branch.name)
        .bind(&branch.telephone)
        .bind(branch.open_date)
        .execute(conn)
        .await
        .map_err(DbError::from)?;

        Ok(true)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
