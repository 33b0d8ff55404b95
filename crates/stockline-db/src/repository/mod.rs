//! # Repository Module
//!
//! Database repository implementations for Stockline.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Caller (CLI / transfer engine)                                        │
//! │       │                                                                 │
//! │       │  db.branches().get_by_id(3)                                    │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  BranchRepository                                                      │
//! │  ├── list(&self)                                                       │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── insert(&self, branch)                                             │
//! │  └── update(&self, branch)                                             │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • Clean separation of concerns                                        │
//! │  • SQL is isolated in one place                                        │
//! │  • Easy to test against an in-memory database                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Note: the bulk transfer engine does NOT go through these repositories -
//! it runs multi-statement transactions directly on the pool so an entire
//! file is one atomic batch. Repositories serve single-entity CRUD.
//!
//! ## Available Repositories
//!
//! - [`branch::BranchRepository`] - Branch CRUD
//! - [`product::ProductRepository`] - Product CRUD
//! - [`assignment::AssignmentRepository`] - Branch-product ranging

pub mod assignment;
pub mod branch;
pub mod product;
