//! # Domain Types
//!
//! Persisted entities of the Stockline store.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Persisted Entities                              │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────────┐   ┌─────────────────┐  │
//! │  │     Branch      │   │       Product        │   │   Assignment    │  │
//! │  │  ─────────────  │   │  ──────────────────  │   │  ─────────────  │  │
//! │  │  id (i64)       │   │  id (i64)            │   │  branch_id (FK) │  │
//! │  │  name           │   │  name (≤100)         │   │  product_id(FK) │  │
//! │  │  telephone?     │◄──┤  weighted            ├──►│  composite key  │  │
//! │  │  open_date?     │   │  suggested_price ¢   │   │  no own id      │  │
//! │  └─────────────────┘   └──────────────────────┘   └─────────────────┘  │
//! │                                                                         │
//! │  Deleting a branch or product cascades deletion of its assignments.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity Convention
//! `id == 0` means "unassigned - the store generates an id on insert".
//! A positive id on an incoming row is either an update target (the id
//! exists) or an explicit-insert target (it does not) - never both.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::price::Price;

// =============================================================================
// Branch
// =============================================================================

/// A retail branch where products are sold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Branch {
    /// Store-assigned identifier; 0 until first persisted.
    pub id: i64,

    /// Display name (required, non-empty).
    pub name: String,

    /// Contact number; exactly 10 digits when present.
    pub telephone: Option<String>,

    /// The date the branch opened, if known.
    pub open_date: Option<NaiveDate>,
}

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Store-assigned identifier; 0 until first persisted.
    pub id: i64,

    /// Display name (required, at most 100 characters).
    pub name: String,

    /// Whether the product is sold by weight rather than per unit.
    pub weighted: bool,

    /// Suggested selling price in minor units, fixed-point scale 2.
    pub suggested_price_cents: i64,
}

impl Product {
    /// Returns the suggested price as a [`Price`].
    #[inline]
    pub fn suggested_price(&self) -> Price {
        Price::from_cents(self.suggested_price_cents)
    }
}

// =============================================================================
// Assignment
// =============================================================================

/// The many-to-many link "this product is sold at this branch".
///
/// Has no identity of its own: the (branch_id, product_id) pair is the
/// composite key, and re-adding an existing pair is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Assignment {
    pub branch_id: i64,
    pub product_id: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_price_accessor() {
        let product = Product {
            id: 1,
            name: "Milk".to_string(),
            weighted: false,
            suggested_price_cents: 1550,
        };
        assert_eq!(product.suggested_price(), Price::from_cents(1550));
    }

    #[test]
    fn test_assignment_pair_equality() {
        let a = Assignment {
            branch_id: 1,
            product_id: 2,
        };
        let b = Assignment {
            branch_id: 1,
            product_id: 2,
        };
        assert_eq!(a, b);
    }
}
