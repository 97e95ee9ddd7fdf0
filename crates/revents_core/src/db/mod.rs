//! Embedded SQLite file behind `SqliteDocumentStore`.
//!
//! Documents and comment lists share one database file (or one in-memory
//! database in tests). Nothing outside this module opens connections.
//!
//! # Invariants
//! - Connections are migrated to `migrations::latest_version()` before use.
//! - A file written by a newer schema is refused, never rewritten.
//! - A database path whose parent directory is missing is rejected up front
//!   instead of surfacing as an opaque SQLite open failure.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The database file was migrated by a newer build.
    SchemaTooNew { found: u32, supported: u32 },
    /// The directory meant to hold the database file does not exist.
    MissingDirectory(PathBuf),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite: {err}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "document schema v{found} is newer than this build understands (v{supported})"
            ),
            Self::MissingDirectory(dir) => {
                write!(f, "database directory `{}` does not exist", dir.display())
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
