//! The unified entry point for callers building a CLI or UI on top of the tracker.
//!
//! [`BudgetApi`] owns the store handle and accepts the loosely typed inputs a
//! front end collects: `"income"`/`"expense"` strings, `YYYY-MM-DD` dates,
//! `YYYY-MM` months and `(field, value)` update maps.

use rust_decimal::Decimal;

use crate::categories::CategoryManager;
use crate::config::DbTarget;
use crate::dates;
use crate::db::Database;
use crate::error::Result;
use crate::models::*;
use crate::reports::{BudgetSummary, MonthTrend, Period, QuickStats, Reports};
use crate::transactions::TransactionManager;

/// Filters for [`BudgetApi::get_transactions`].
///
/// Only one filter applies, checked in this order: `month`, `category`,
/// `start_date`/`end_date`, then `limit` on the unfiltered list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionQuery {
    pub limit: Option<u32>,
    pub category: Option<String>,
    /// `YYYY-MM-DD`, inclusive.
    pub start_date: Option<String>,
    /// `YYYY-MM-DD`, inclusive.
    pub end_date: Option<String>,
    /// `YYYY-MM`
    pub month: Option<String>,
}

#[derive(Debug)]
pub struct BudgetApi {
    db: Database,
}

impl BudgetApi {
    /// Open the store named by `target`, creating its schema if needed.
    pub fn open(target: &DbTarget) -> Result<Self> {
        Ok(Self::with_database(Database::open_target(target)?))
    }

    pub fn in_memory() -> Result<Self> {
        Ok(Self::with_database(Database::open_in_memory()?))
    }

    pub fn with_database(db: Database) -> Self {
        Self { db }
    }

    /// Release the store handle.
    pub fn close(self) -> Result<()> {
        self.db.close()
    }

    fn categories(&self) -> CategoryManager<'_> {
        CategoryManager::new(&self.db)
    }

    fn transactions(&self) -> TransactionManager<'_> {
        TransactionManager::new(&self.db)
    }

    fn reports(&self) -> Reports<'_> {
        Reports::new(&self.db)
    }

    // ── Categories ────────────────────────────────────────────

    pub fn create_category(
        &self,
        name: &str,
        limit: Decimal,
        parent: Option<&str>,
    ) -> Result<Category> {
        self.categories().add(name, limit, parent)
    }

    pub fn get_categories(&self) -> Result<Vec<Category>> {
        self.categories().list()
    }

    pub fn get_category(&self, target: &CategoryRef) -> Result<Option<Category>> {
        self.categories().get(target)
    }

    pub fn update_category(&self, target: &CategoryRef, update: &CategoryUpdate) -> Result<Category> {
        self.categories().update(target, update)
    }

    /// Update a category from `(field, value)` pairs; see [`CategoryUpdate::from_fields`].
    pub fn update_category_fields(
        &self,
        target: &CategoryRef,
        fields: &[(&str, &str)],
    ) -> Result<Category> {
        let update = CategoryUpdate::from_fields(fields.iter().copied()).inspect_err(|e| {
            tracing::warn!(%target, "rejected category update: {e}");
        })?;
        self.update_category(target, &update)
    }

    pub fn delete_category(&self, id: i64, force: bool) -> Result<bool> {
        self.categories().delete(id, force)
    }

    pub fn get_category_hierarchy(&self) -> Result<Vec<CategoryNode>> {
        self.categories().hierarchy()
    }

    pub fn validate_category_exists(&self, name: &str) -> Result<bool> {
        Ok(self.categories().get_by_name(name)?.is_some())
    }

    // ── Transactions ──────────────────────────────────────────

    /// Record a transaction.
    ///
    /// `transaction_type` is `"income"` or `"expense"` (any case) and `date`,
    /// when given, is `YYYY-MM-DD`; it defaults to today.
    pub fn add_transaction(
        &self,
        transaction_type: &str,
        amount: Decimal,
        category: &str,
        vendor: Option<&str>,
        note: Option<&str>,
        date: Option<&str>,
    ) -> Result<Transaction> {
        let kind = TransactionType::parse(transaction_type)?;
        let date = date.map(dates::parse_date).transpose()?;
        self.transactions().add(&NewTransaction {
            kind,
            amount,
            category_name: category.to_string(),
            vendor: vendor.map(str::to_string),
            note: note.map(str::to_string),
            date,
        })
    }

    pub fn get_transactions(&self, query: &TransactionQuery) -> Result<Vec<Transaction>> {
        let transactions = self.transactions();

        if let Some(month) = &query.month {
            let (year, month) = dates::parse_month(month)?;
            return transactions.get_by_month(year, month);
        }
        if let Some(category) = &query.category {
            return transactions.get_by_category(category);
        }
        if query.start_date.is_some() || query.end_date.is_some() {
            let start = query.start_date.as_deref().map(dates::parse_date).transpose()?;
            let end = query.end_date.as_deref().map(dates::parse_date).transpose()?;
            return transactions.get_by_date_range(start, end);
        }
        transactions.list(query.limit)
    }

    pub fn update_transaction(&self, id: i64, update: &TransactionUpdate) -> Result<Transaction> {
        self.transactions().update(id, update)
    }

    /// Update a transaction from `(field, value)` pairs; see [`TransactionUpdate::from_fields`].
    pub fn update_transaction_fields(&self, id: i64, fields: &[(&str, &str)]) -> Result<Transaction> {
        let update = TransactionUpdate::from_fields(fields.iter().copied()).inspect_err(|e| {
            tracing::warn!(id, "rejected transaction update: {e}");
        })?;
        self.update_transaction(id, &update)
    }

    pub fn delete_transaction(&self, id: i64) -> Result<bool> {
        self.transactions().delete(id)
    }

    // ── Reports ───────────────────────────────────────────────

    /// Budget summary for the `YYYY-MM` month, or for all time when `None`.
    pub fn get_budget_summary(&self, month: Option<&str>) -> Result<BudgetSummary> {
        let period = match month {
            Some(month) => {
                let (year, month) = dates::parse_month(month)?;
                Period::Month { year, month }
            }
            None => Period::AllTime,
        };
        self.reports().budget_summary(period)
    }

    /// Monthly totals, newest first; `None` covers the last six months.
    pub fn get_spending_trends(&self, months: Option<u32>) -> Result<Vec<MonthTrend>> {
        self.reports().spending_trends(months)
    }

    pub fn get_quick_stats(&self) -> Result<QuickStats> {
        self.reports().quick_stats()
    }

    /// Expense totals per category between two optional `YYYY-MM-DD` dates.
    pub fn get_spending_by_category(
        &self,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<Vec<(String, Decimal)>> {
        let start = start_date.map(dates::parse_date).transpose()?;
        let end = end_date.map(dates::parse_date).transpose()?;
        self.transactions().spending_by_category(start, end)
    }
}
