//! # Branch Repository
//!
//! Database operations for branches.
//!
//! ## Validation Boundary
//! Writes validate through stockline-core before touching SQL, so a bad
//! name or telephone never reaches a constraint error. Deletes cascade to
//! branch_products via the schema's foreign keys.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use stockline_core::validation::{validate_branch_name, validate_telephone};
use stockline_core::{Branch, ValidationError};

/// Repository for branch database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = BranchRepository::new(pool);
/// let all = repo.list().await?;
/// let one = repo.get_by_id(3).await?;
/// ```
#[derive(Debug, Clone)]
pub struct BranchRepository {
    pool: SqlitePool,
}

impl BranchRepository {
    /// Creates a new BranchRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BranchRepository { pool }
    }

    /// Lists all branches, alphabetically by name.
    pub async fn list(&self) -> DbResult<Vec<Branch>> {
        let branches = sqlx::query_as::<_, Branch>(
            r#"
            SELECT id, name, telephone, open_date
            FROM branches
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(branches)
    }

    /// Gets a branch by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Branch))` - Branch found
    /// * `Ok(None)` - Branch not found
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Branch>> {
        let branch = sqlx::query_as::<_, Branch>(
            r#"
            SELECT id, name, telephone, open_date
            FROM branches
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(branch)
    }

    /// Inserts a new branch, letting SQLite assign the id.
    ///
    /// ## Returns
    /// * `Ok(i64)` - The assigned id
    /// * `Err(DbError::Internal)` - Validation failed
    pub async fn insert(&self, branch: &Branch) -> DbResult<i64> {
        validate(branch)?;

        debug!(name = %branch.name, "Inserting branch");

        let result = sqlx::query(
            r#"
            INSERT INTO branches (name, telephone, open_date)
            VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(&branch.name)
        .bind(&branch.telephone)
        .bind(branch.open_date)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Updates an existing branch.
    ///
    /// ## Returns
    /// * `Ok(())` - Update successful
    /// * `Err(DbError::NotFound)` - Branch doesn't exist
    pub async fn update(&self, branch: &Branch) -> DbResult<()> {
        validate(branch)?;

        debug!(id = branch.id, "Updating branch");

        let result = sqlx::query(
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
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Branch", branch.id.to_string()));
        }

        Ok(())
    }

    /// Deletes a branch and (via cascade) its product assignments.
    ///
    /// Idempotent: deleting a missing branch is not an error.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id, "Deleting branch");

        sqlx::query("DELETE FROM branches WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Counts branches (for diagnostics and seeding checks).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM branches")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

fn validate(branch: &Branch) -> DbResult<()> {
    validate_branch_name(&branch.name).map_err(invalid)?;
    if let Some(telephone) = &branch.telephone {
        validate_telephone(telephone).map_err(invalid)?;
    }
    Ok(())
}

fn invalid(err: ValidationError) -> DbError {
    DbError::Internal(err.to_string())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::NaiveDate;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn sample_branch() -> Branch {
        Branch {
            id: 0,
            name: "CBD".to_string(),
            telephone: Some("0123456789".to_string()),
            open_date: NaiveDate::from_ymd_opt(2015, 6, 1),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let repo = db.branches();

        let id = repo.insert(&sample_branch()).await.unwrap();
        assert!(id > 0);

        let fetched = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "CBD");
        assert_eq!(fetched.telephone.as_deref(), Some("0123456789"));
        assert_eq!(fetched.open_date, NaiveDate::from_ymd_opt(2015, 6, 1));
    }

    #[tokio::test]
    async fn test_list_is_alphabetical() {
        let db = test_db().await;
        let repo = db.branches();

        for name in ["Sunnyside", "CBD", "Hatfield"] {
            let branch = Branch {
                name: name.to_string(),
                telephone: None,
                ..sample_branch()
            };
            repo.insert(&branch).await.unwrap();
        }

        let names: Vec<String> = repo.list().await.unwrap().into_iter().map(|b| b.name).collect();
        assert_eq!(names, vec!["CBD", "Hatfield", "Sunnyside"]);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let db = test_db().await;
        let repo = db.branches();

        let mut branch = sample_branch();
        branch.id = 999;

        assert!(matches!(
            repo.update(&branch).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_insert_rejects_bad_telephone() {
        let db = test_db().await;
        let repo = db.branches();

        let mut branch = sample_branch();
        branch.telephone = Some("12345".to_string());

        assert!(repo.insert(&branch).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let db = test_db().await;
        let repo = db.branches();

        let id = repo.insert(&sample_branch()).await.unwrap();
        repo.delete(id).await.unwrap();
        repo.delete(id).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 0);
    }
}
