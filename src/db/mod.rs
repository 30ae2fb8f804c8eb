mod schema;

use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;

use crate::config::DbTarget;
use crate::dates::DATE_FORMAT;
use crate::error::Result;
use crate::models::*;

pub(crate) use schema::FALLBACK_CATEGORY;

/// Handle to the budget store.
///
/// Owns the SQLite connection for its whole lifetime. Every manager operation
/// borrows it for exactly one [`Database::session`].
#[derive(Debug)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (creating if absent) the database file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        let db = Self { conn };
        db.create_schema()?;
        tracing::info!("opened budget database at {}", path.display());
        Ok(db)
    }

    /// Open the store named by `target`.
    pub fn open_target(target: &DbTarget) -> Result<Self> {
        match target.resolve()? {
            Some(path) => Self::open(&path),
            None => Self::open_in_memory(),
        }
    }

    /// Open a private, empty in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let db = Self { conn };
        db.create_schema()?;
        tracing::debug!("opened in-memory budget database");
        Ok(db)
    }

    /// Close the underlying connection, reporting any error from SQLite.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, error)| error)?;
        tracing::debug!("closed budget database");
        Ok(())
    }

    fn create_schema(&self) -> Result<()> {
        self.conn.execute_batch(schema::SCHEMA)?;
        Ok(())
    }

    /// Begin a scoped session.
    ///
    /// The returned guard must be committed to keep its writes; dropping it on
    /// any other path rolls everything back.
    pub(crate) fn session(&self) -> Result<rusqlite::Transaction<'_>> {
        Ok(self.conn.unchecked_transaction()?)
    }
}

// ── Row mapping ───────────────────────────────────────────────

pub(crate) const CATEGORY_COLUMNS: &str = "id, name, limit_amount, parent_id";

pub(crate) const TRANSACTION_COLUMNS: &str =
    "t.id, t.type, t.amount, t.category_id, t.vendor, t.note, t.date";

pub(crate) fn category_from_row(row: &Row) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        limit_amount: decimal_column(row, 2)?,
        parent_id: row.get(3)?,
    })
}

pub(crate) fn transaction_from_row(row: &Row) -> rusqlite::Result<Transaction> {
    let kind: String = row.get(1)?;
    let kind = TransactionType::parse(&kind)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;
    Ok(Transaction {
        id: row.get(0)?,
        kind,
        amount: decimal_column(row, 2)?,
        category_id: row.get(3)?,
        vendor: row.get(4)?,
        note: row.get(5)?,
        date: date_column(row, 6)?,
    })
}

pub(crate) fn decimal_column(row: &Row, idx: usize) -> rusqlite::Result<Decimal> {
    let text: String = row.get(idx)?;
    Decimal::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn date_column(row: &Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let text: String = row.get(idx)?;
    NaiveDate::parse_from_str(&text, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn date_param(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

// ── Shared lookups ────────────────────────────────────────────

pub(crate) fn category_by_id(conn: &Connection, id: i64) -> Result<Option<Category>> {
    let result = conn.query_row(
        &format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?1"),
        params![id],
        category_from_row,
    );
    match result {
        Ok(c) => Ok(Some(c)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub(crate) fn category_by_name(conn: &Connection, name: &str) -> Result<Option<Category>> {
    let result = conn.query_row(
        &format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE name = ?1"),
        params![name],
        category_from_row,
    );
    match result {
        Ok(c) => Ok(Some(c)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub(crate) fn category_by_ref(conn: &Connection, target: &CategoryRef) -> Result<Option<Category>> {
    target.validate()?;
    match target {
        CategoryRef::Id(id) => category_by_id(conn, *id),
        CategoryRef::Name(name) => category_by_name(conn, name),
    }
}
