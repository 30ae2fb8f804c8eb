//! The crate level error type.

use rust_decimal::Decimal;

/// Code SQLite reports when a UNIQUE constraint fails (`SQLITE_CONSTRAINT_UNIQUE`).
const SQLITE_CONSTRAINT_UNIQUE: std::ffi::c_int = 2067;

pub type Result<T> = std::result::Result<T, Error>;

/// The errors that may occur while reading or writing budget data.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A referenced category, parent category or transaction does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// A category with this name already exists.
    #[error("category \"{0}\" already exists")]
    DuplicateName(String),

    /// The caller supplied input that cannot be applied: unknown or missing
    /// update fields, a malformed date or month string, or a parent link that
    /// would form a cycle.
    #[error("invalid input: {0}")]
    Validation(String),

    /// A category delete was refused because other rows still depend on it.
    ///
    /// Pass `force` to reassign the dependents and delete anyway.
    #[error(
        "category \"{name}\" still has {transactions} transaction(s) and {subcategories} subcategory(ies)"
    )]
    HasDependents {
        name: String,
        transactions: i64,
        subcategories: i64,
    },

    /// Summing or netting stored amounts exceeded the decimal range.
    #[error("amount overflow while {0}")]
    Overflow(String),

    /// The location of the database file could not be determined.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    Storage(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        tracing::error!("an unhandled SQL error occurred: {}", value);
        Error::Storage(value)
    }
}

/// `a + b`, or [`Error::Overflow`] naming what was being summed.
pub(crate) fn checked_add(a: Decimal, b: Decimal, what: &str) -> Result<Decimal> {
    a.checked_add(b).ok_or_else(|| {
        tracing::warn!(%a, %b, "amount overflow while {what}");
        Error::Overflow(what.to_string())
    })
}

/// `a - b`, or [`Error::Overflow`] naming what was being netted.
pub(crate) fn checked_sub(a: Decimal, b: Decimal, what: &str) -> Result<Decimal> {
    a.checked_sub(b).ok_or_else(|| {
        tracing::warn!(%a, %b, "amount overflow while {what}");
        Error::Overflow(what.to_string())
    })
}

/// Whether `error` is a UNIQUE constraint failure.
pub(crate) fn is_unique_violation(error: &rusqlite::Error) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(sql_error, _)
            if sql_error.extended_code == SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Convert a failed category write, reporting a UNIQUE failure as a duplicate `name`.
pub(crate) fn map_category_write(error: rusqlite::Error, name: &str) -> Error {
    if is_unique_violation(&error) {
        Error::DuplicateName(name.to_string())
    } else {
        error.into()
    }
}
