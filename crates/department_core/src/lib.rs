//! Department registry core.
//!
//! Validation, business rules and storage for department records. Callers
//! validate payloads with [`DepartmentValidator`], then drive
//! [`DepartmentService`] over a [`DepartmentRepository`].

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod validation;

pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::department::{Department, DepartmentChanges, DepartmentId, NewDepartment};
pub use model::field::Field;
pub use repo::department_repo::{
    DepartmentQuery, DepartmentRepository, Predicate, RepoError, RepoResult,
    SqliteDepartmentRepository, TextColumn,
};
pub use service::department_service::{
    filter_query, ConflictReason, DepartmentError, DepartmentService, ServiceResult,
};
pub use validation::{
    CreateDepartmentInput, CreateDepartmentPayload, DepartmentFilter, DepartmentFilterPayload,
    DepartmentValidator, UpdateDepartmentInput, UpdateDepartmentPayload, ValidationCode,
    ValidationErrors, ValidationIssue,
};

/// Minimal health-check API for wiring checks.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
