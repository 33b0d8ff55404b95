//! # Seed Data
//!
//! First-run provisioning: sample branches for a fresh database.
//!
//! The branch set is only written when the table is empty, so re-running
//! provisioning against an existing database changes nothing.

use chrono::NaiveDate;
use tracing::info;

use crate::error::DbResult;
use crate::pool::Database;
use stockline_core::Branch;

/// Sample branches seeded into an empty database.
const SAMPLE_BRANCHES: &[(&str, &str, (i32, u32, u32))] = &[
    ("CBD", "0111234567", (2021, 1, 15)),
    ("Sandton", "0117654321", (2022, 5, 1)),
    ("Hatfield", "0121112222", (2023, 3, 10)),
    ("Sunnyside", "0123334444", (2023, 9, 1)),
];

/// Seeds sample branches if the branches table is empty.
///
/// ## Returns
/// Number of branches inserted (0 when the table already had rows).
pub async fn seed_sample_branches(db: &Database) -> DbResult<u64> {
    let repo = db.branches();

    if repo.count().await? > 0 {
        info!("Branches already present, skipping seed");
        return Ok(0);
    }

    for (name, telephone, (y, m, d)) in SAMPLE_BRANCHES {
        let branch = Branch {
            id: 0,
            name: (*name).to_string(),
            telephone: Some((*telephone).to_string()),
            open_date: NaiveDate::from_ymd_opt(*y, *m, *d),
        };
        repo.insert(&branch).await?;
    }

    info!(count = SAMPLE_BRANCHES.len(), "Seeded sample branches");
    Ok(SAMPLE_BRANCHES.len() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::DbConfig;

    #[tokio::test]
    async fn test_seed_is_run_once() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        assert_eq!(seed_sample_branches(&db).await.unwrap(), 4);
        assert_eq!(seed_sample_branches(&db).await.unwrap(), 0);
        assert_eq!(db.branches().count().await.unwrap(), 4);
    }
}
