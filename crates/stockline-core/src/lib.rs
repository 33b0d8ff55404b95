//! # stockline-core: Pure Domain Logic for Stockline
//!
//! This crate is the **heart** of Stockline. It contains the persisted entity
//! types, the file-shaped transfer rows, and the tolerant field normalizers
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Stockline Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 stockline-transfer (engine)                     │   │
//! │  │    read file ──► reconcile against store ──► write file         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ stockline-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   price   │  │   rows    │  │ normalize │  │   │
//! │  │   │  Branch   │  │   Price   │  │ ProductRow│  │  flags    │  │   │
//! │  │   │  Product  │  │  (cents)  │  │ BranchRow │  │  dates    │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO FILES • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 stockline-db (Database Layer)                   │   │
//! │  │            SQLite queries, migrations, repositories             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Persisted entities (Branch, Product, Assignment)
//! - [`rows`] - File-shaped transfer rows and their entity conversions
//! - [`price`] - Fixed-point price type with integer arithmetic (no floats!)
//! - [`normalize`] - Tolerant parsers for loosely-typed wire fields
//! - [`error`] - Validation error types
//! - [`validation`] - Field-level validation rules
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Prices**: All monetary values are minor units (i64), never floats
//! 4. **Explicit Errors**: Validation failures are typed values, never panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod normalize;
pub mod price;
pub mod rows;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use stockline_core::Price` instead of
// `use stockline_core::price::Price`

pub use error::ValidationError;
pub use price::Price;
pub use rows::{BranchRow, MappingRow, ProductRow, RawPrice};
pub use types::{Assignment, Branch, Product};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length of a product name.
///
/// ## Business Reason
/// Matches the store column width; longer names are a data-entry mistake
/// and the row carrying one is skipped, not truncated.
pub const MAX_PRODUCT_NAME_LEN: usize = 100;

/// Exact number of digits a branch telephone number must carry when present.
pub const TELEPHONE_DIGITS: usize = 10;

/// Sentinel id meaning "the store assigns a new id on insert".
pub const UNASSIGNED_ID: i64 = 0;
