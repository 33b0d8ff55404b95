//! # stockline-transfer: Bulk Import/Export Engine
//!
//! Moves whole entity sets between transfer files (CSV / JSON / XML) and
//! the SQLite store, reconciling file rows against existing data instead
//! of blindly appending.
//!
//! ## Import Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Import Pipeline                                  │
//! │                                                                         │
//! │  transfer file (.csv / .json / .xml)                                   │
//! │       │                                                                 │
//! │       ▼  format::read_rows (extension-driven)                          │
//! │  Vec<ProductRow>  ← loose, every field tolerated                       │
//! │       │                                                                 │
//! │       ▼  coordinate::run_with_retry (whole batch replays on            │
//! │       │                              transient store failure)          │
//! │  ┌───────────────────────────────────────────────────────┐             │
//! │  │ reconcile::reconcile_rows - ONE transaction           │             │
//! │  │                                                       │             │
//! │  │  Pass 1  UPDATE rows whose id already exists          │             │
//! │  │  Pass 2  INSERT rows with id == 0 (store assigns id)  │             │
//! │  │  Pass 3  INSERT rows with new explicit ids            │             │
//! │  │          (serialized via identity::IdentityAllocator) │             │
//! │  │                                                       │             │
//! │  │  invalid row → skipped + logged, batch continues      │             │
//! │  │  cancel token → whole transaction rolls back          │             │
//! │  └───────────────────────────────────────────────────────┘             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  applied-row count                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Exports run the pipeline backwards: one ordered snapshot query, then
//! canonical rows written through the same format layer, so exporting the
//! same store twice produces byte-identical files.
//!
//! ## Module Organization
//!
//! - [`format`] - File format detection and row (de)serialization
//! - [`reconcile`] - Three-pass upsert engine
//! - [`identity`] - Explicit-id insert serialization
//! - [`assignment`] - Branch-product mapping import strategies
//! - [`coordinate`] - Retry policy and cancellation checks
//! - [`service`] - [`service::TransferService`], the public entry point
//! - [`error`] - Transfer error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockline_transfer::TransferService;
//! use tokio_util::sync::CancellationToken;
//!
//! let service = TransferService::new(db);
//! let cancel = CancellationToken::new();
//! let applied = service.import_products("products.csv".as_ref(), &cancel).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod assignment;
pub mod coordinate;
pub mod error;
pub mod format;
pub mod identity;
pub mod reconcile;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use coordinate::RetryPolicy;
pub use error::{TransferError, TransferResult};
pub use format::FileFormat;
pub use service::TransferService;
