//! Department use-case service.
//!
//! # Responsibility
//! - Look up, list, filter, create, update and soft-delete departments.
//! - Enforce name uniqueness and translate store results into the domain
//!   error taxonomy.
//!
//! # Invariants
//! - Soft-deleted departments are invisible to every operation except the
//!   create-time name check.
//! - Create rejects any name ever used (case-insensitive), including retired
//!   names. Update rejects only names held by other active departments.
//! - Returned records are the store's rows after the write, never locally
//!   merged copies.
//! - Business errors propagate unchanged; store failures are never retried.

use crate::model::department::{Department, DepartmentId};
use crate::model::field::Field;
use crate::repo::department_repo::{
    DepartmentQuery, DepartmentRepository, Predicate, RepoError, TextColumn,
};
use crate::validation::{
    CreateDepartmentInput, DepartmentFilter, UpdateDepartmentInput, ValidationErrors,
};
use log::{debug, error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type ServiceResult<T> = Result<T, DepartmentError>;

/// Business rule that rejected a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    /// Another department already uses the name.
    ExistedName,
}

impl ConflictReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ExistedName => "EXISTED_NAME",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::ExistedName => "Department name already exists!",
        }
    }
}

/// Error taxonomy returned by every department operation.
#[derive(Debug)]
pub enum DepartmentError {
    /// Payload failed validation; carries every violated rule.
    InvalidInput(ValidationErrors),
    /// Id does not resolve to an active department.
    NotFound(DepartmentId),
    /// Uniqueness rule violated.
    Conflict(ConflictReason),
    /// Store unreachable, constraint violation or corrupt row.
    StoreFailure(RepoError),
}

impl DepartmentError {
    /// Stable code for transport mapping.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(reason) => reason.as_str(),
            Self::StoreFailure(_) => "STORE_FAILURE",
        }
    }

    /// HTTP-like status a transport can attach to the error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 400,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::StoreFailure(_) => 500,
        }
    }

    /// Caller-facing messages; one per violated rule for invalid input.
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::InvalidInput(errors) => errors
                .messages()
                .into_iter()
                .map(str::to_string)
                .collect(),
            Self::NotFound(_) => vec!["Department not found!".to_string()],
            Self::Conflict(reason) => vec![reason.message().to_string()],
            Self::StoreFailure(err) => vec![err.to_string()],
        }
    }
}

impl Display for DepartmentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(errors) => write!(f, "invalid input: {errors}"),
            Self::NotFound(id) => write!(f, "department not found: {id}"),
            Self::Conflict(reason) => write!(f, "conflict: {}", reason.message()),
            Self::StoreFailure(err) => write!(f, "store failure: {err}"),
        }
    }
}

impl Error for DepartmentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidInput(errors) => Some(errors),
            Self::StoreFailure(err) => Some(err),
            Self::NotFound(_) | Self::Conflict(_) => None,
        }
    }
}

impl From<ValidationErrors> for DepartmentError {
    fn from(value: ValidationErrors) -> Self {
        Self::InvalidInput(value)
    }
}

impl From<RepoError> for DepartmentError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            other => Self::StoreFailure(other),
        }
    }
}

/// Department service facade over a record store.
pub struct DepartmentService<R: DepartmentRepository> {
    repo: R,
}

impl<R: DepartmentRepository> DepartmentService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Fetches one active department.
    ///
    /// # Errors
    /// `NotFound` when the id never existed or was soft-deleted.
    pub fn get_by_id(&self, id: DepartmentId) -> ServiceResult<Department> {
        let started_at = Instant::now();
        let result = self.find_active(id);
        log_outcome("get", started_at, &result, Some(id));
        result
    }

    /// Lists all active departments, most recently updated first.
    pub fn list(&self) -> ServiceResult<Vec<Department>> {
        let started_at = Instant::now();
        let result = self
            .repo
            .find_all(&DepartmentQuery::active())
            .map_err(DepartmentError::from);
        log_outcome("list", started_at, &result, None);
        result
    }

    /// Lists active departments matching every constraint in `filter`.
    pub fn list_filtered(&self, filter: &DepartmentFilter) -> ServiceResult<Vec<Department>> {
        let started_at = Instant::now();
        let query = filter_query(filter);
        let result = self.repo.find_all(&query).map_err(DepartmentError::from);
        if let Ok(departments) = &result {
            debug!(
                "event=department_filter module=service predicates={} matches={}",
                query.predicates.len(),
                departments.len()
            );
        }
        log_outcome("filter", started_at, &result, None);
        result
    }

    /// Creates a department.
    ///
    /// # Errors
    /// `Conflict(ExistedName)` when any department, active or soft-deleted,
    /// already has the name (case-insensitive).
    pub fn create(&self, input: &CreateDepartmentInput) -> ServiceResult<Department> {
        let started_at = Instant::now();
        let result = self.create_inner(input);
        log_outcome("create", started_at, &result, result.as_ref().ok().map(|d| d.id));
        result
    }

    /// Applies a partial update to an active department.
    ///
    /// # Errors
    /// - `NotFound` when the target is missing or soft-deleted.
    /// - `Conflict(ExistedName)` when another active department has the new
    ///   name (case-insensitive). Retired names may be reclaimed.
    pub fn update(&self, input: &UpdateDepartmentInput) -> ServiceResult<Department> {
        let started_at = Instant::now();
        let result = self.update_inner(input);
        log_outcome("update", started_at, &result, Some(input.id));
        result
    }

    /// Soft-deletes an active department and returns the tombstoned row.
    ///
    /// # Errors
    /// `NotFound` when the target is missing or already deleted.
    pub fn delete(&self, id: DepartmentId) -> ServiceResult<Department> {
        let started_at = Instant::now();
        let result = self
            .find_active(id)
            .and_then(|department| {
                self.repo
                    .soft_delete(department.id)
                    .map_err(DepartmentError::from)
            });
        log_outcome("delete", started_at, &result, Some(id));
        result
    }

    fn find_active(&self, id: DepartmentId) -> ServiceResult<Department> {
        self.repo
            .find_by_id(id, false)?
            .ok_or(DepartmentError::NotFound(id))
    }

    fn create_inner(&self, input: &CreateDepartmentInput) -> ServiceResult<Department> {
        let name_taken = DepartmentQuery::including_deleted().and(Predicate::EqualsIgnoreCase {
            column: TextColumn::Name,
            value: input.name.clone(),
        });
        if self.repo.exists(&name_taken)? {
            return Err(DepartmentError::Conflict(ConflictReason::ExistedName));
        }

        Ok(self.repo.insert(&input.to_new_department())?)
    }

    fn update_inner(&self, input: &UpdateDepartmentInput) -> ServiceResult<Department> {
        let current = self.find_active(input.id)?;

        if let Some(name) = input.name.as_ref() {
            let name_taken = DepartmentQuery::active()
                .and(Predicate::EqualsIgnoreCase {
                    column: TextColumn::Name,
                    value: name.clone(),
                })
                .and(Predicate::IdNot(current.id));
            if self.repo.exists(&name_taken)? {
                return Err(DepartmentError::Conflict(ConflictReason::ExistedName));
            }
        }

        Ok(self
            .repo
            .apply_partial_update(current.id, &input.to_changes())?)
    }
}

/// Builds the predicate conjunction for a validated filter.
///
/// - `name`: substring match when non-empty, otherwise unconstrained.
/// - `email`, `phoneNumber`: absent is unconstrained, non-empty is a
///   substring match, explicit empty or null requires the column to be NULL.
/// - `floor`: exact match.
pub fn filter_query(filter: &DepartmentFilter) -> DepartmentQuery {
    let mut query = DepartmentQuery::active();

    if let Field::Value(name) = &filter.name {
        if !name.is_empty() {
            query = query.and(Predicate::Contains {
                column: TextColumn::Name,
                needle: name.clone(),
            });
        }
    }
    if let Some(predicate) = contact_predicate(TextColumn::Email, &filter.email) {
        query = query.and(predicate);
    }
    if let Some(predicate) = contact_predicate(TextColumn::PhoneNumber, &filter.phone_number) {
        query = query.and(predicate);
    }
    if let Some(floor) = filter.floor {
        query = query.and(Predicate::FloorEquals(floor));
    }

    query
}

fn contact_predicate(column: TextColumn, value: &Field<String>) -> Option<Predicate> {
    match value {
        Field::Absent => None,
        Field::Value(needle) if !needle.is_empty() => Some(Predicate::Contains {
            column,
            needle: needle.clone(),
        }),
        Field::Value(_) | Field::Null => Some(Predicate::IsNull(column)),
    }
}

fn log_outcome<T>(
    operation: &'static str,
    started_at: Instant,
    result: &ServiceResult<T>,
    id: Option<DepartmentId>,
) {
    let duration_ms = started_at.elapsed().as_millis();
    let id = id.map_or_else(|| "-".to_string(), |id| id.to_string());
    match result {
        Ok(_) => info!(
            "event=department_{operation} module=service status=ok id={id} duration_ms={duration_ms}"
        ),
        Err(DepartmentError::StoreFailure(err)) => error!(
            "event=department_{operation} module=service status=error id={id} duration_ms={duration_ms} error_code=STORE_FAILURE error={err}"
        ),
        Err(err) => info!(
            "event=department_{operation} module=service status=rejected id={id} duration_ms={duration_ms} error_code={}",
            err.code()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::{filter_query, DepartmentError};
    use crate::model::field::Field;
    use crate::repo::department_repo::{Predicate, RepoError, TextColumn};
    use crate::validation::DepartmentFilter;
    use uuid::Uuid;

    #[test]
    fn empty_filter_only_hides_deleted_rows() {
        let query = filter_query(&DepartmentFilter::default());
        assert!(query.predicates.is_empty());
        assert!(!query.include_deleted);
    }

    #[test]
    fn blank_name_filter_is_unconstrained() {
        let filter = DepartmentFilter {
            name: Field::Value(String::new()),
            ..DepartmentFilter::default()
        };
        assert!(filter_query(&filter).predicates.is_empty());

        let filter = DepartmentFilter {
            name: Field::Null,
            ..DepartmentFilter::default()
        };
        assert!(filter_query(&filter).predicates.is_empty());
    }

    #[test]
    fn contact_filters_follow_tri_state_rules() {
        let filter = DepartmentFilter {
            email: Field::Value(String::new()),
            phone_number: Field::Value("090".to_string()),
            floor: Some(2),
            ..DepartmentFilter::default()
        };
        assert_eq!(
            filter_query(&filter).predicates,
            vec![
                Predicate::IsNull(TextColumn::Email),
                Predicate::Contains {
                    column: TextColumn::PhoneNumber,
                    needle: "090".to_string(),
                },
                Predicate::FloorEquals(2),
            ]
        );

        let filter = DepartmentFilter {
            phone_number: Field::Null,
            ..DepartmentFilter::default()
        };
        assert_eq!(
            filter_query(&filter).predicates,
            vec![Predicate::IsNull(TextColumn::PhoneNumber)]
        );
    }

    #[test]
    fn repo_not_found_maps_to_not_found_and_others_to_store_failure() {
        let id = Uuid::new_v4();
        let err = DepartmentError::from(RepoError::NotFound(id));
        assert!(matches!(err, DepartmentError::NotFound(found) if found == id));
        assert_eq!(err.status_code(), 404);

        let err = DepartmentError::from(RepoError::InvalidData("bad row".to_string()));
        assert!(matches!(err, DepartmentError::StoreFailure(_)));
        assert_eq!(err.code(), "STORE_FAILURE");
        assert_eq!(err.status_code(), 500);
    }
}
