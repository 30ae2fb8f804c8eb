//! Transaction persistence and filtered queries.

use chrono::NaiveDate;
use rusqlite::types::ToSql;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;

use crate::dates;
use crate::db::{self, Database, TRANSACTION_COLUMNS};
use crate::error::{checked_add, Error, Result};
use crate::models::*;

/// Records, queries, updates and deletes transactions.
///
/// Every list query is ordered newest first (by date, then by ID).
#[derive(Debug, Clone, Copy)]
pub struct TransactionManager<'db> {
    db: &'db Database,
}

impl<'db> TransactionManager<'db> {
    pub fn new(db: &'db Database) -> Self {
        Self { db }
    }

    /// Record a transaction against the category named in `new`.
    ///
    /// The date defaults to today. The amount is stored as given.
    ///
    /// # Errors
    /// [`Error::NotFound`] if the category does not exist.
    pub fn add(&self, new: &NewTransaction) -> Result<Transaction> {
        let session = self.db.session()?;
        let category = db::category_by_name(&session, &new.category_name)?
            .ok_or_else(|| Error::NotFound(format!("category \"{}\"", new.category_name)))?;
        let date = new.date.unwrap_or_else(dates::today);

        session.execute(
            "INSERT INTO transactions (type, amount, category_id, vendor, note, date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                new.kind.as_str(),
                new.amount.to_string(),
                category.id,
                new.vendor,
                new.note,
                db::date_param(date),
            ],
        )?;
        let id = session.last_insert_rowid();
        session.commit()?;

        tracing::info!(
            id,
            kind = %new.kind,
            amount = %new.amount,
            category = %category.name,
            %date,
            "recorded transaction"
        );
        Ok(Transaction {
            id,
            kind: new.kind,
            amount: new.amount,
            category_id: category.id,
            vendor: new.vendor.clone(),
            note: new.note.clone(),
            date,
        })
    }

    /// All transactions, newest first, capped at `limit` when given.
    pub fn list(&self, limit: Option<u32>) -> Result<Vec<Transaction>> {
        let session = self.db.session()?;
        select(&session, "transactions t", "1=1", params![], limit)
    }

    pub fn get(&self, id: i64) -> Result<Option<Transaction>> {
        let session = self.db.session()?;
        Ok(select(&session, "transactions t", "t.id = ?1", params![id], None)?
            .into_iter()
            .next())
    }

    /// Transactions recorded under the category called `name`.
    pub fn get_by_category(&self, name: &str) -> Result<Vec<Transaction>> {
        let session = self.db.session()?;
        select(
            &session,
            "transactions t JOIN categories c ON t.category_id = c.id",
            "c.name = ?1",
            params![name],
            None,
        )
    }

    /// Transactions dated within `[start, end]`, both ends inclusive.
    ///
    /// A missing bound leaves that side open.
    pub fn get_by_date_range(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Transaction>> {
        let start = start.map(db::date_param);
        let end = end.map(db::date_param);
        let session = self.db.session()?;
        select(
            &session,
            "transactions t",
            "(?1 IS NULL OR t.date >= ?1) AND (?2 IS NULL OR t.date <= ?2)",
            params![start, end],
            None,
        )
    }

    /// Transactions dated in the calendar month `month` of `year`.
    ///
    /// # Errors
    /// [`Error::Validation`] if `month` is not in `1..=12`.
    pub fn get_by_month(&self, year: i32, month: u32) -> Result<Vec<Transaction>> {
        let (first, last) = dates::month_bounds(year, month)?;
        self.get_by_date_range(Some(first), Some(last))
    }

    /// Apply a partial update to transaction `id`.
    ///
    /// # Errors
    /// - [`Error::Validation`] for an empty update.
    /// - [`Error::NotFound`] if the transaction, or a newly referenced
    ///   category, does not exist.
    pub fn update(&self, id: i64, update: &TransactionUpdate) -> Result<Transaction> {
        if update.is_empty() {
            tracing::warn!(id, "rejected empty transaction update");
            return Err(Error::Validation(format!(
                "no valid transaction fields supplied (allowed: {})",
                TransactionUpdate::FIELDS.join(", ")
            )));
        }

        let session = self.db.session()?;
        let mut txn = select(&session, "transactions t", "t.id = ?1", params![id], None)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(format!("transaction #{id}")))?;

        if let Some(amount) = update.amount {
            txn.amount = amount;
        }
        if let Some(vendor) = &update.vendor {
            txn.vendor = vendor.clone();
        }
        if let Some(note) = &update.note {
            txn.note = note.clone();
        }
        if let Some(date) = update.date {
            txn.date = date;
        }
        if let Some(category_id) = update.category_id {
            if db::category_by_id(&session, category_id)?.is_none() {
                return Err(Error::NotFound(format!("category #{category_id}")));
            }
            txn.category_id = category_id;
        }

        session.execute(
            "UPDATE transactions
             SET amount = ?1, vendor = ?2, note = ?3, date = ?4, category_id = ?5
             WHERE id = ?6",
            params![
                txn.amount.to_string(),
                txn.vendor,
                txn.note,
                db::date_param(txn.date),
                txn.category_id,
                id,
            ],
        )?;
        session.commit()?;

        tracing::info!(id, "updated transaction");
        Ok(txn)
    }

    /// Delete transaction `id`, returning whether it existed.
    pub fn delete(&self, id: i64) -> Result<bool> {
        let session = self.db.session()?;
        let removed = session.execute("DELETE FROM transactions WHERE id = ?1", params![id])?;
        session.commit()?;

        if removed > 0 {
            tracing::info!(id, "deleted transaction");
        } else {
            tracing::debug!(id, "no transaction to delete");
        }
        Ok(removed > 0)
    }

    pub fn count(&self) -> Result<i64> {
        let session = self.db.session()?;
        Ok(session.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?)
    }

    /// Expense totals by category name within `[start, end]`, leaving out
    /// categories with nothing spent. Ordered by name.
    pub fn spending_by_category(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<(String, Decimal)>> {
        let start = start.map(db::date_param);
        let end = end.map(db::date_param);
        let session = self.db.session()?;
        let mut stmt = session.prepare(
            "SELECT c.name, t.amount
             FROM transactions t JOIN categories c ON t.category_id = c.id
             WHERE t.type = 'expense'
               AND (?1 IS NULL OR t.date >= ?1)
               AND (?2 IS NULL OR t.date <= ?2)
             ORDER BY c.name",
        )?;
        let rows = stmt.query_map(params![start, end], |row| {
            Ok((row.get::<_, String>(0)?, db::decimal_column(row, 1)?))
        })?;

        let mut totals: Vec<(String, Decimal)> = Vec::new();
        for row in rows {
            let (name, amount) = row?;
            match totals.last_mut() {
                Some((last, total)) if *last == name => {
                    *total = checked_add(*total, amount, "summing category spending")?;
                }
                _ => totals.push((name, amount)),
            }
        }
        totals.retain(|(_, total)| *total > Decimal::ZERO);
        Ok(totals)
    }
}

fn select(
    conn: &Connection,
    from: &str,
    filter: &str,
    params: &[&dyn ToSql],
    limit: Option<u32>,
) -> Result<Vec<Transaction>> {
    let mut sql = format!(
        "SELECT {TRANSACTION_COLUMNS} FROM {from} WHERE {filter} ORDER BY t.date DESC, t.id DESC"
    );
    if let Some(l) = limit {
        sql.push_str(&format!(" LIMIT {l}"));
    }

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params, db::transaction_from_row)?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}
