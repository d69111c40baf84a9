//! Department store: SQLite connections and the `departments` schema.
//!
//! # Responsibility
//! - Hand out connections that are configured, carry the `casefold` SQL
//!   function and sit at the latest `departments` schema.
//! - Refuse database files written by a newer schema than this build knows.
//!
//! # Invariants
//! - Schema version lives in `PRAGMA user_version`; repositories check it
//!   before touching `departments`.
//! - Name uniqueness among active rows is enforced by an index over
//!   `casefold(name)`, so a raw connection cannot insert departments.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{fold_case, open_db, open_db_in_memory, CASEFOLD_FN};

pub type DbResult<T> = Result<T, DbError>;

/// Failure while opening or migrating the department store.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
