//! Domain model for the department registry.
//!
//! # Invariants
//! - Every department is identified by a store-assigned `DepartmentId`.
//! - Deletion is a soft-delete tombstone (`deleted_at`), never a hard delete.

pub mod department;
pub mod field;
