//! # Transfer Service
//!
//! The public entry point for bulk import and export.
//!
//! ## Operation Matrix
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      TransferService Operations                         │
//! │                                                                         │
//! │              Import (file → store)      Export (store → file)          │
//! │  Products    import_products            export_products                │
//! │  Branches    import_branches            export_branches                │
//! │  Mappings    import_mappings            export_mappings                │
//! │              branch 0 = merge mode      branch 0 = all branches        │
//! │              branch N = replace N's     branch N = just N's pairs      │
//! │                        ranging                                          │
//! │                                                                         │
//! │  Every operation:                                                       │
//! │  • format picked by file extension (csv / json / xml)                  │
//! │  • store work replayed on transient failure (RetryPolicy)              │
//! │  • cancellation token honored at every store round trip                │
//! │  • returns a row count (applied / changed / exported)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Exports snapshot in id order and write canonical field text, so the
//! same store contents always produce the same bytes.

use std::path::Path;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::assignment;
use crate::coordinate::{ensure_live, run_with_retry, RetryPolicy};
use crate::error::TransferResult;
use crate::format::{read_rows, write_rows};
use crate::identity::IdentityAllocator;
use crate::reconcile::reconcile_rows;
use stockline_core::{
    Assignment, Branch, BranchRow, MappingRow, Product, ProductRow, UNASSIGNED_ID,
};
use stockline_db::{Database, DbError};

/// Bulk import/export facade over one store.
///
/// Holds the identity allocator, so concurrent imports through the same
/// service serialize their explicit-id inserts correctly. Create ONE
/// service per database and share it.
///
/// ## Usage
/// ```rust,ignore
/// let service = TransferService::new(db);
/// let cancel = CancellationToken::new();
///
/// let applied = service.import_products(Path::new("products.csv"), &cancel).await?;
/// let written = service.export_mappings(Path::new("cbd.xml"), 2, &cancel).await?;
/// ```
#[derive(Debug)]
pub struct TransferService {
    db: Database,
    identity: IdentityAllocator,
    retry: RetryPolicy,
}

impl TransferService {
    /// Creates a service with the default retry policy.
    pub fn new(db: Database) -> Self {
        TransferService {
            db,
            identity: IdentityAllocator::new(),
            retry: RetryPolicy::default(),
        }
    }

    /// Overrides the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Imports products from a file. Returns applied rows.
    pub async fn import_products(
        &self,
        path: &Path,
        cancel: &CancellationToken,
    ) -> TransferResult<u64> {
        info!(path = %path.display(), "Importing products");

        let rows: Vec<ProductRow> = read_rows(path)?;
        let applied = run_with_retry(&self.retry, || {
            reconcile_rows(&self.db, &self.identity, &rows, cancel)
        })
        .await?;

        info!(applied, "Product import complete");
        Ok(applied)
    }

    /// Exports all products in id order. Returns rows written.
    pub async fn export_products(
        &self,
        path: &Path,
        cancel: &CancellationToken,
    ) -> TransferResult<u64> {
        info!(path = %path.display(), "Exporting products");

        let products = run_with_retry(&self.retry, || {
            let db = &self.db;
            async move {
                ensure_live(cancel)?;
                let products = sqlx::query_as::<_, Product>(
                    "SELECT id, name, weighted, suggested_price_cents FROM products ORDER BY id",
                )
                .fetch_all(db.pool())
                .await
                .map_err(DbError::from)?;
                Ok(products)
            }
        })
        .await?;

        let rows: Vec<ProductRow> = products.iter().map(ProductRow::from_entity).collect();
        write_rows(path, &rows)?;

        info!(count = rows.len(), "Product export complete");
        Ok(rows.len() as u64)
    }

    // =========================================================================
    // Branches
    // =========================================================================

    /// Imports branches from a file. Returns applied rows.
    pub async fn import_branches(
        &self,
        path: &Path,
        cancel: &CancellationToken,
    ) -> TransferResult<u64> {
        info!(path = %path.display(), "Importing branches");

        let rows: Vec<BranchRow> = read_rows(path)?;
        let applied = run_with_retry(&self.retry, || {
            reconcile_rows(&self.db, &self.identity, &rows, cancel)
        })
        .await?;

        info!(applied, "Branch import complete");
        Ok(applied)
    }

    /// Exports all branches in id order. Returns rows written.
    pub async fn export_branches(
        &self,
        path: &Path,
        cancel: &CancellationToken,
    ) -> TransferResult<u64> {
        info!(path = %path.display(), "Exporting branches");

        let branches = run_with_retry(&self.retry, || {
            let db = &self.db;
            async move {
                ensure_live(cancel)?;
                let branches = sqlx::query_as::<_, Branch>(
                    "SELECT id, name, telephone, open_date FROM branches ORDER BY id",
                )
                .fetch_all(db.pool())
                .await
                .map_err(DbError::from)?;
                Ok(branches)
            }
        })
        .await?;

        let rows: Vec<BranchRow> = branches.iter().map(BranchRow::from_entity).collect();
        write_rows(path, &rows)?;

        info!(count = rows.len(), "Branch export complete");
        Ok(rows.len() as u64)
    }

    // =========================================================================
    // Mappings
    // =========================================================================

    /// Imports branch-product mappings from a file.
    ///
    /// `branch_id == 0` merges pairs across all branches; any other value
    /// replaces that branch's ranging with the file. Returns changed pairs.
    pub async fn import_mappings(
        &self,
        path: &Path,
        branch_id: i64,
        cancel: &CancellationToken,
    ) -> TransferResult<u64> {
        info!(path = %path.display(), branch_id, "Importing mappings");

        let rows: Vec<MappingRow> = read_rows(path)?;

        let changed = if branch_id == UNASSIGNED_ID {
            run_with_retry(&self.retry, || {
                assignment::merge_pairs(&self.db, &rows, cancel)
            })
            .await?
        } else {
            run_with_retry(&self.retry, || {
                assignment::replace_for_branch(&self.db, branch_id, &rows, cancel)
            })
            .await?
        };

        info!(changed, "Mapping import complete");
        Ok(changed)
    }

    /// Exports branch-product mappings in (branch_id, product_id) order.
    ///
    /// `branch_id == 0` exports every pair; any other value exports only
    /// that branch's pairs. Returns rows written.
    pub async fn export_mappings(
        &self,
        path: &Path,
        branch_id: i64,
        cancel: &CancellationToken,
    ) -> TransferResult<u64> {
        info!(path = %path.display(), branch_id, "Exporting mappings");

        let pairs = run_with_retry(&self.retry, || {
            let db = &self.db;
            async move {
                ensure_live(cancel)?;
                let pairs = if branch_id == UNASSIGNED_ID {
                    sqlx::query_as::<_, Assignment>(
                        r#"
                        SELECT branch_id, product_id
                        FROM branch_products
                        ORDER BY branch_id, product_id
                        "#,
                    )
                    .fetch_all(db.pool())
                    .await
                } else {
                    sqlx::query_as::<_, Assignment>(
                        r#"
                        SELECT branch_id, product_id
                        FROM branch_products
                        WHERE branch_id = ?1
                        ORDER BY product_id
                        "#,
                    )
                    .bind(branch_id)
                    .fetch_all(db.pool())
                    .await
                }
                .map_err(DbError::from)?;
                Ok(pairs)
            }
        })
        .await?;

        let rows: Vec<MappingRow> = pairs.iter().map(MappingRow::from_entity).collect();
        write_rows(path, &rows)?;

        info!(count = rows.len(), "Mapping export complete");
        Ok(rows.len() as u64)
    }
}

// =============================================================================
// End-To-End Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransferError;
    use chrono::NaiveDate;
    use std::fs;
    use stockline_db::DbConfig;
    use tempfile::TempDir;

    async fn service() -> (TransferService, TempDir) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        (TransferService::new(db), TempDir::new().unwrap())
    }

    fn cancel() -> CancellationToken {
        CancellationToken::new()
    }

    #[tokio::test]
    async fn test_import_products_csv() {
        let (service, dir) = service().await;

        let path = dir.path().join("products.csv");
        fs::write(
            &path,
            "ID,Name,WeightedItem,SuggestedSellingPrice\n\
             0,Milk 2L,N,15.50\n\
             0,Bananas,Y,22.99\n\
             7,Sugar 1kg,N,25\n",
        )
        .unwrap();

        let applied = service.import_products(&path, &cancel()).await.unwrap();
        assert_eq!(applied, 3);

        let sugar = service.db.products().get_by_id(7).await.unwrap().unwrap();
        assert_eq!(sugar.name, "Sugar 1kg");
        assert_eq!(sugar.suggested_price_cents, 2500);
    }

    #[tokio::test]
    async fn test_import_single_product_csv_stores_price() {
        let (service, dir) = service().await;

        let path = dir.path().join("milk.csv");
        fs::write(
            &path,
            "ID,Name,WeightedItem,SuggestedSellingPrice\n0,Milk,N,15.50\n",
        )
        .unwrap();

        let applied = service.import_products(&path, &cancel()).await.unwrap();
        assert_eq!(applied, 1);

        let products = service.db.products().list().await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "Milk");
        assert!(!products[0].weighted);
        assert_eq!(products[0].suggested_price_cents, 1550);
    }

    #[tokio::test]
    async fn test_product_xml_export_reimports_unchanged() {
        let (service, dir) = service().await;

        service
            .db
            .products()
            .insert(&Product {
                id: 0,
                name: "Milk 2L".to_string(),
                weighted: true,
                suggested_price_cents: 1550,
            })
            .await
            .unwrap();

        let path = dir.path().join("products.xml");
        service.export_products(&path, &cancel()).await.unwrap();

        let applied = service.import_products(&path, &cancel()).await.unwrap();
        assert_eq!(applied, 1);
        assert_eq!(service.db.products().count().await.unwrap(), 1);

        let milk = service.db.products().get_by_id(1).await.unwrap().unwrap();
        assert!(milk.weighted);
        assert_eq!(milk.suggested_price_cents, 1550);
    }

    #[tokio::test]
    async fn test_import_products_json_case_tolerant() {
        let (service, dir) = service().await;

        let path = dir.path().join("products.json");
        fs::write(
            &path,
            r#"[
                {"id": 0, "NAME": "Bread", "weighted": "y", "suggestedPrice": 18.99},
                {"Id": 0, "Name": "Salt", "Weighted": "N"}
            ]"#,
        )
        .unwrap();

        let applied = service.import_products(&path, &cancel()).await.unwrap();
        assert_eq!(applied, 2);

        let products = service.db.products().list().await.unwrap();
        let bread = products.iter().find(|p| p.name == "Bread").unwrap();
        assert!(bread.weighted);
        assert_eq!(bread.suggested_price_cents, 1899);

        // Price cell missing entirely → zero
        let salt = products.iter().find(|p| p.name == "Salt").unwrap();
        assert_eq!(salt.suggested_price_cents, 0);
    }

    #[tokio::test]
    async fn test_import_branches_xml() {
        let (service, dir) = service().await;

        let path = dir.path().join("branches.xml");
        fs::write(
            &path,
            "<Branches>\
               <Branch><ID>1</ID><Name>CBD</Name>\
                 <TelephoneNumber>0111234567</TelephoneNumber>\
                 <OpenDate>2021/01/15</OpenDate></Branch>\
               <Branch><ID>0</ID><Name>Sandton</Name></Branch>\
             </Branches>",
        )
        .unwrap();

        let applied = service.import_branches(&path, &cancel()).await.unwrap();
        assert_eq!(applied, 2);

        let cbd = service.db.branches().get_by_id(1).await.unwrap().unwrap();
        assert_eq!(cbd.telephone.as_deref(), Some("0111234567"));
        assert_eq!(cbd.open_date, NaiveDate::from_ymd_opt(2021, 1, 15));
    }

    #[tokio::test]
    async fn test_export_products_is_canonical() {
        let (service, dir) = service().await;

        for (name, cents) in [("Milk 2L", 1550), ("Sugar 1kg", 2500)] {
            service
                .db
                .products()
                .insert(&Product {
                    id: 0,
                    name: name.to_string(),
                    weighted: false,
                    suggested_price_cents: cents,
                })
                .await
                .unwrap();
        }

        let path = dir.path().join("out.csv");
        let written = service.export_products(&path, &cancel()).await.unwrap();
        assert_eq!(written, 2);

        let text = fs::read_to_string(&path).unwrap();
        // Prices use the trimmed "0.##" wire form, rows in id order
        assert_eq!(
            text,
            "ID,Name,WeightedItem,SuggestedSellingPrice\n\
             1,Milk 2L,N,15.5\n\
             2,Sugar 1kg,N,25\n"
        );

        // Same store, same bytes
        let again = dir.path().join("again.csv");
        service.export_products(&again, &cancel()).await.unwrap();
        assert_eq!(fs::read_to_string(&again).unwrap(), text);
    }

    #[tokio::test]
    async fn test_export_then_import_applies_as_updates() {
        let (service, dir) = service().await;

        service
            .db
            .branches()
            .insert(&Branch {
                id: 0,
                name: "CBD".to_string(),
                telephone: Some("0111234567".to_string()),
                open_date: NaiveDate::from_ymd_opt(2021, 1, 15),
            })
            .await
            .unwrap();

        let path = dir.path().join("branches.json");
        service.export_branches(&path, &cancel()).await.unwrap();

        // Every exported row routes to the update pass; nothing is duplicated
        let applied = service.import_branches(&path, &cancel()).await.unwrap();
        assert_eq!(applied, 1);
        assert_eq!(service.db.branches().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_mappings_replace_and_merge_modes() {
        let (service, dir) = service().await;
        let db = &service.db;

        let branch = db
            .branches()
            .insert(&Branch {
                id: 0,
                name: "CBD".to_string(),
                telephone: None,
                open_date: None,
            })
            .await
            .unwrap();
        let mut products = Vec::new();
        for name in ["Bread", "Milk"] {
            products.push(
                db.products()
                    .insert(&Product {
                        id: 0,
                        name: name.to_string(),
                        weighted: false,
                        suggested_price_cents: 1000,
                    })
                    .await
                    .unwrap(),
            );
        }

        // Scoped replace: file defines the branch's whole ranging
        let path = dir.path().join("pairs.csv");
        fs::write(
            &path,
            format!("BranchID,ProductID\n{branch},{}\n", products[0]),
        )
        .unwrap();
        let changed = service.import_mappings(&path, branch, &cancel()).await.unwrap();
        assert_eq!(changed, 1);

        // Re-importing the ranging we just wrote changes nothing
        let exported = dir.path().join("exported.csv");
        service.export_mappings(&exported, branch, &cancel()).await.unwrap();
        let changed = service
            .import_mappings(&exported, branch, &cancel())
            .await
            .unwrap();
        assert_eq!(changed, 0);

        // Unscoped merge: adds pairs, skips dangling endpoints
        let merge = dir.path().join("merge.csv");
        fs::write(
            &merge,
            format!(
                "BranchID,ProductID\n{branch},{}\n999,{}\n",
                products[1], products[0]
            ),
        )
        .unwrap();
        let merged = service.import_mappings(&merge, 0, &cancel()).await.unwrap();
        assert_eq!(merged, 1);
        assert_eq!(db.assignments().count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_import_leaves_store_unchanged() {
        let (service, dir) = service().await;

        let path = dir.path().join("products.csv");
        fs::write(
            &path,
            "ID,Name,WeightedItem,SuggestedSellingPrice\n0,Milk,N,15.50\n",
        )
        .unwrap();

        let token = CancellationToken::new();
        token.cancel();

        let result = service.import_products(&path, &token).await;
        assert!(matches!(result, Err(TransferError::Cancelled)));
        assert_eq!(service.db.products().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unsupported_extension() {
        let (service, dir) = service().await;

        let path = dir.path().join("products.txt");
        fs::write(&path, "whatever").unwrap();

        assert!(matches!(
            service.import_products(&path, &cancel()).await,
            Err(TransferError::UnsupportedFormat(_))
        ));
    }
}
