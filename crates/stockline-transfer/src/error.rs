//! # Transfer Error Types
//!
//! Error types for the import/export engine.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  std::io::Error ──┐                                                     │
//! │  csv / serde_json │                                                     │
//! │  / quick-xml ─────┼──► TransferError (this module)                     │
//! │  DbError ─────────┘         │                                          │
//! │                             │ is_transient()? → retry loop replays     │
//! │                             ▼                                          │
//! │  CLI / caller reports one user-facing message per run                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Note the distinction the retry loop relies on: [`TransferError::Cancelled`]
//! is a deliberate stop (never retried, not a failure), while
//! [`TransferError::RetriesExhausted`] means the store stayed contended past
//! the attempt budget.

use thiserror::Error;

use stockline_db::DbError;

/// Errors from import/export operations.
#[derive(Debug, Error)]
pub enum TransferError {
    /// File extension is not one of csv / json / xml.
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// The file could not be parsed as the detected format.
    ///
    /// ## When This Occurs
    /// - Malformed CSV / JSON / XML syntax
    /// - A row field of the wrong shape (e.g. text where a number is required)
    ///
    /// Parse failures abort the whole file: nothing has been written yet.
    #[error("Parse failed: {0}")]
    Parse(String),

    /// Reading or writing the transfer file failed.
    #[error("File I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// A store operation failed.
    #[error("Store operation failed: {0}")]
    Db(#[from] DbError),

    /// The caller's cancellation token fired.
    ///
    /// The in-flight transaction was rolled back; the store is unchanged
    /// by the cancelled batch.
    #[error("Operation cancelled")]
    Cancelled,

    /// A transient store failure persisted past the retry budget.
    #[error("Gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },
}

impl TransferError {
    /// Whether replaying the batch may succeed.
    ///
    /// Delegates to [`DbError::is_transient`]; nothing outside the store
    /// layer is worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, TransferError::Db(e) if e.is_transient())
    }
}

/// Result type for transfer operations.
pub type TransferResult<T> = Result<T, TransferError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(TransferError::Db(DbError::Busy("database is locked".into())).is_transient());
        assert!(TransferError::Db(DbError::PoolExhausted).is_transient());

        assert!(!TransferError::Cancelled.is_transient());
        assert!(!TransferError::Parse("bad json".into()).is_transient());
        assert!(!TransferError::Db(DbError::not_found("Branch", "7")).is_transient());
        assert!(!TransferError::RetriesExhausted {
            attempts: 5,
            last: "busy".into()
        }
        .is_transient());
    }
}
