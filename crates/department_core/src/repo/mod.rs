//! Record store contract and its SQLite implementation.
//!
//! # Responsibility
//! - Define the narrow persistence contract the department service consumes.
//! - Keep SQL details behind that contract.
//!
//! # Invariants
//! - Store-generated fields (`id`, `updated_at`, `deleted_at`) are returned
//!   by reading the row back, never assembled by the caller.
//! - Semantic errors (`NotFound`) are distinguished from transport errors.

pub mod department_repo;
