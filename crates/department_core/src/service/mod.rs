//! Use-case services.
//!
//! # Responsibility
//! - Enforce business rules above the record store.
//! - Keep callers (CLI, transports) decoupled from storage details.

pub mod department_service;
