//! Department repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Translate predicate conjunctions into parameterized SQL.
//! - Own id and timestamp generation for inserts, updates and soft deletes.
//!
//! # Invariants
//! - Every query excludes soft-deleted rows unless `include_deleted` is set.
//! - Writes never touch soft-deleted rows.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::{fold_case, DbError, CASEFOLD_FN};
use crate::model::department::{Department, DepartmentChanges, DepartmentId, NewDepartment};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const DEPARTMENT_SELECT_SQL: &str = "SELECT
    id,
    name,
    floor,
    email,
    phone_number,
    deleted_at,
    updated_at
FROM departments";

/// Current time in epoch milliseconds, evaluated by SQLite.
const NOW_MS_SQL: &str = "CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER)";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for department persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(DepartmentId),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "department not found: {id}"),
            Self::InvalidData(message) => {
                write!(f, "invalid persisted department data: {message}")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; open it with open_db"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Text columns that predicates can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextColumn {
    Name,
    Email,
    PhoneNumber,
}

impl TextColumn {
    fn sql_name(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::PhoneNumber => "phone_number",
        }
    }
}

/// One constraint of a predicate conjunction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Case-insensitive substring match over Unicode-folded text. LIKE
    /// wildcards in `needle` match literally.
    Contains { column: TextColumn, needle: String },
    /// Case-insensitive whole-value match over Unicode-folded text.
    EqualsIgnoreCase { column: TextColumn, value: String },
    /// Column holds NULL.
    IsNull(TextColumn),
    FloorEquals(i32),
    /// Excludes one row, used by "another row already has this" checks.
    IdNot(DepartmentId),
}

/// Conjunction of predicates plus soft-delete visibility.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepartmentQuery {
    pub predicates: Vec<Predicate>,
    pub include_deleted: bool,
}

impl DepartmentQuery {
    /// Query over active rows with no constraints.
    pub fn active() -> Self {
        Self::default()
    }

    /// Query over active and soft-deleted rows with no constraints.
    pub fn including_deleted() -> Self {
        Self {
            predicates: Vec::new(),
            include_deleted: true,
        }
    }

    pub fn and(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }
}

/// Record store contract consumed by `DepartmentService`.
pub trait DepartmentRepository {
    /// Looks up one row by primary key.
    fn find_by_id(&self, id: DepartmentId, include_deleted: bool)
        -> RepoResult<Option<Department>>;
    /// Returns all rows matching the query, `updated_at DESC, id ASC`.
    fn find_all(&self, query: &DepartmentQuery) -> RepoResult<Vec<Department>>;
    /// Returns whether any row matches the query.
    fn exists(&self, query: &DepartmentQuery) -> RepoResult<bool>;
    /// Inserts a row with a fresh id and returns it as stored.
    fn insert(&self, department: &NewDepartment) -> RepoResult<Department>;
    /// Writes the present columns of `changes`, refreshes `updated_at` and
    /// returns the stored row. `NotFound` for missing or soft-deleted ids.
    fn apply_partial_update(
        &self,
        id: DepartmentId,
        changes: &DepartmentChanges,
    ) -> RepoResult<Department>;
    /// Sets `deleted_at` on an active row and returns it as stored.
    fn soft_delete(&self, id: DepartmentId) -> RepoResult<Department>;
}

/// SQLite-backed department repository.
pub struct SqliteDepartmentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDepartmentRepository<'conn> {
    /// Wraps a connection opened through `open_db`/`open_db_in_memory`.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations were not applied.
    /// - `MissingRequiredTable` when the `departments` table is absent.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let expected_version = latest_version();
        let actual_version = current_user_version(conn)?;
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }

        let has_table: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'departments'
            );",
            [],
            |row| row.get(0),
        )?;
        if has_table == 0 {
            return Err(RepoError::MissingRequiredTable("departments"));
        }

        Ok(Self { conn })
    }
}

impl DepartmentRepository for SqliteDepartmentRepository<'_> {
    fn find_by_id(
        &self,
        id: DepartmentId,
        include_deleted: bool,
    ) -> RepoResult<Option<Department>> {
        let mut stmt = self.conn.prepare(&format!(
            "{DEPARTMENT_SELECT_SQL}
             WHERE id = ?1
               AND (?2 = 1 OR deleted_at IS NULL);"
        ))?;

        let mut rows = stmt.query(params![id.to_string(), include_deleted])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_department_row(row)?));
        }

        Ok(None)
    }

    fn find_all(&self, query: &DepartmentQuery) -> RepoResult<Vec<Department>> {
        let (where_sql, bind_values) = build_where_clause(query);
        let sql = format!("{DEPARTMENT_SELECT_SQL} {where_sql} ORDER BY updated_at DESC, id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut departments = Vec::new();
        while let Some(row) = rows.next()? {
            departments.push(parse_department_row(row)?);
        }

        Ok(departments)
    }

    fn exists(&self, query: &DepartmentQuery) -> RepoResult<bool> {
        let (where_sql, bind_values) = build_where_clause(query);
        let sql = format!("SELECT EXISTS(SELECT 1 FROM departments {where_sql});");
        let found: i64 = self
            .conn
            .query_row(&sql, params_from_iter(bind_values), |row| row.get(0))?;
        Ok(found == 1)
    }

    fn insert(&self, department: &NewDepartment) -> RepoResult<Department> {
        let id = Uuid::new_v4();
        self.conn.execute(
            &format!(
                "INSERT INTO departments (id, name, floor, email, phone_number, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, {NOW_MS_SQL});"
            ),
            params![
                id.to_string(),
                department.name.as_str(),
                department.floor,
                department.email.as_deref(),
                department.phone_number.as_deref(),
            ],
        )?;

        self.read_back(id, true, "inserted")
    }

    fn apply_partial_update(
        &self,
        id: DepartmentId,
        changes: &DepartmentChanges,
    ) -> RepoResult<Department> {
        let touch_updated_at = format!("updated_at = {NOW_MS_SQL}");
        let mut assignments: Vec<&str> = Vec::new();
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(name) = changes.name.as_ref() {
            assignments.push("name = ?");
            bind_values.push(Value::Text(name.clone()));
        }
        if let Some(floor) = changes.floor {
            assignments.push("floor = ?");
            bind_values.push(Value::Integer(i64::from(floor)));
        }
        if let Some(email) = changes.email.as_ref() {
            assignments.push("email = ?");
            bind_values.push(optional_text(email.as_deref()));
        }
        if let Some(phone_number) = changes.phone_number.as_ref() {
            assignments.push("phone_number = ?");
            bind_values.push(optional_text(phone_number.as_deref()));
        }

        assignments.push(touch_updated_at.as_str());
        bind_values.push(Value::Text(id.to_string()));

        let sql = format!(
            "UPDATE departments SET {} WHERE id = ? AND deleted_at IS NULL;",
            assignments.join(", ")
        );
        let changed = self.conn.execute(&sql, params_from_iter(bind_values))?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        self.read_back(id, false, "updated")
    }

    fn soft_delete(&self, id: DepartmentId) -> RepoResult<Department> {
        let changed = self.conn.execute(
            &format!(
                "UPDATE departments
                 SET deleted_at = {NOW_MS_SQL}
                 WHERE id = ?1
                   AND deleted_at IS NULL;"
            ),
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        self.read_back(id, true, "soft-deleted")
    }
}

impl SqliteDepartmentRepository<'_> {
    fn read_back(
        &self,
        id: DepartmentId,
        include_deleted: bool,
        action: &str,
    ) -> RepoResult<Department> {
        self.find_by_id(id, include_deleted)?.ok_or_else(|| {
            RepoError::InvalidData(format!("{action} department {id} missing on read-back"))
        })
    }
}

fn build_where_clause(query: &DepartmentQuery) -> (String, Vec<Value>) {
    let mut sql = String::from("WHERE 1 = 1");
    let mut bind_values: Vec<Value> = Vec::new();

    if !query.include_deleted {
        sql.push_str(" AND deleted_at IS NULL");
    }

    for predicate in &query.predicates {
        match predicate {
            Predicate::Contains { column, needle } => {
                sql.push_str(&format!(
                    " AND {CASEFOLD_FN}({}) LIKE ? ESCAPE '\\'",
                    column.sql_name()
                ));
                bind_values.push(Value::Text(format!(
                    "%{}%",
                    escape_like(&fold_case(needle))
                )));
            }
            Predicate::EqualsIgnoreCase { column, value } => {
                sql.push_str(&format!(" AND {CASEFOLD_FN}({}) = ?", column.sql_name()));
                bind_values.push(Value::Text(fold_case(value)));
            }
            Predicate::IsNull(column) => {
                sql.push_str(&format!(" AND {} IS NULL", column.sql_name()));
            }
            Predicate::FloorEquals(floor) => {
                sql.push_str(" AND floor = ?");
                bind_values.push(Value::Integer(i64::from(*floor)));
            }
            Predicate::IdNot(id) => {
                sql.push_str(" AND id <> ?");
                bind_values.push(Value::Text(id.to_string()));
            }
        }
    }

    (sql, bind_values)
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn optional_text(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |text| Value::Text(text.to_string()))
}

fn parse_department_row(row: &Row<'_>) -> RepoResult<Department> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{id_text}` in departments.id"))
    })?;

    let floor: i32 = row.get("floor")?;
    if floor < 1 {
        return Err(RepoError::InvalidData(format!(
            "invalid floor value `{floor}` for department {id}"
        )));
    }

    Ok(Department {
        id,
        name: row.get("name")?,
        floor,
        email: row.get("email")?,
        phone_number: row.get("phone_number")?,
        deleted_at: row.get("deleted_at")?,
        updated_at: row.get("updated_at")?,
    })
}
