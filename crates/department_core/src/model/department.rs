//! Department domain model.
//!
//! # Invariants
//! - `id` is assigned by the store and never reused.
//! - `deleted_at` is the source of truth for tombstone state.
//! - `floor` is at least 1 for every persisted row.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a department row.
pub type DepartmentId = Uuid;

/// Canonical department record as persisted by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: DepartmentId,
    /// Trimmed, non-empty display name.
    pub name: String,
    pub floor: i32,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    /// Unix epoch milliseconds of the soft delete, `None` while active.
    pub deleted_at: Option<i64>,
    /// Unix epoch milliseconds of the last insert or update.
    pub updated_at: i64,
}

impl Department {
    /// Returns whether this department is visible to normal reads.
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// Field set for inserting a department. The store assigns `id` and
/// `updated_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDepartment {
    pub name: String,
    pub floor: i32,
    pub email: Option<String>,
    pub phone_number: Option<String>,
}

/// Partial update for an existing department.
///
/// `None` leaves a column untouched. For the nullable contact columns,
/// `Some(None)` clears the column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepartmentChanges {
    pub name: Option<String>,
    pub floor: Option<i32>,
    pub email: Option<Option<String>>,
    pub phone_number: Option<Option<String>>,
}

