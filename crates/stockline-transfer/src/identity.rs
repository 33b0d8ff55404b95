//! # Identity Allocator
//!
//! Serializes explicit-id inserts per entity kind.
//!
//! ## Why This Exists
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              Explicit-Id Insert Serialization                           │
//! │                                                                         │
//! │  Normal inserts let SQLite assign ids - safe to run concurrently.      │
//! │  Import pass 3 inserts rows with ids taken verbatim from the file.     │
//! │                                                                         │
//! │  Job A: file says product id 41        Job B: file says product id 41  │
//! │       │                                     │                           │
//! │       ▼                                     ▼                           │
//! │  ┌────────────────────────────────────────────────────────┐            │
//! │  │ IdentityAllocator.acquire(EntityKind::Product)         │            │
//! │  │                                                        │            │
//! │  │  A gets the scope ──► inserts 41 ──► drops scope       │            │
//! │  │  B waits        ────────────────────► gets the scope   │            │
//! │  │                      ──► 41 now exists, B's engine     │            │
//! │  │                          routes the row to UPDATE      │            │
//! │  └────────────────────────────────────────────────────────┘            │
//! │                                                                        │
//! │  One mutex per entity kind: a branch import never waits on a          │
//! │  product import.                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The guard is a capability: the reconciliation functions that insert
//! explicit ids require `&IdentityScope`, so the type system keeps
//! unserialized explicit inserts out of the codebase.

use std::fmt;

use tokio::sync::{Mutex, MutexGuard};

// =============================================================================
// Entity Kinds
// =============================================================================

/// The entity tables whose explicit-id inserts are serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Branch,
    Product,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Branch => write!(f, "branch"),
            EntityKind::Product => write!(f, "product"),
        }
    }
}

// =============================================================================
// Allocator
// =============================================================================

/// Per-entity-kind locks for explicit-id inserts.
///
/// Held by [`crate::service::TransferService`]; one allocator serves all
/// concurrent imports against the same store.
#[derive(Debug, Default)]
pub struct IdentityAllocator {
    branch: Mutex<()>,
    product: Mutex<()>,
}

impl IdentityAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the explicit-insert scope for one entity kind.
    ///
    /// Waits if another import holds it. The scope releases on drop.
    pub async fn acquire(&self, kind: EntityKind) -> IdentityScope<'_> {
        let guard = match kind {
            EntityKind::Branch => self.branch.lock().await,
            EntityKind::Product => self.product.lock().await,
        };

        IdentityScope { kind, _guard: guard }
    }
}

/// Proof that the holder may insert rows with explicit ids for one
/// entity kind. Released on drop.
#[derive(Debug)]
pub struct IdentityScope<'a> {
    kind: EntityKind,
    _guard: MutexGuard<'a, ()>,
}

impl IdentityScope<'_> {
    pub fn kind(&self) -> EntityKind {
        self.kind
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_same_kind_is_exclusive() {
        let allocator = Arc::new(IdentityAllocator::new());

        let scope = allocator.acquire(EntityKind::Product).await;
        assert_eq!(scope.kind(), EntityKind::Product);

        // A second acquire for the same kind must block until released
        let contender = {
            let allocator = allocator.clone();
            tokio::spawn(async move {
                allocator.acquire(EntityKind::Product).await;
            })
        };

        tokio::task::yield_now().await;
        assert!(!contender.is_finished());

        drop(scope);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_different_kinds_do_not_contend() {
        let allocator = IdentityAllocator::new();

        let product_scope = allocator.acquire(EntityKind::Product).await;
        let branch_scope = allocator.acquire(EntityKind::Branch).await;

        assert_eq!(product_scope.kind(), EntityKind::Product);
        assert_eq!(branch_scope.kind(), EntityKind::Branch);
    }
}
