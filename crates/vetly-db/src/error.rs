//! Database errors

use thiserror::Error;

/// Database errors
#[derive(Error, Debug)]
pub enum DbError {
    /// SQLx error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Record not found
    #[error("record not found")]
    NotFound,

    /// A concurrent writer changed the clinic's records between planning
    /// and applying a transition; the caller should re-read and re-plan
    #[error("concurrent modification of subscription records")]
    Conflict,

    /// Deletion blocked because other records reference this row
    #[error("row is referenced by existing records")]
    InUse,

    /// Stored data failed domain validation (e.g. unknown status string)
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// Result type for database operations
pub type DbResult<T> = Result<T, DbError>;
