//! Budget summaries and trends built from the category and transaction managers.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::categories::CategoryManager;
use crate::dates;
use crate::db::Database;
use crate::error::{checked_add, checked_sub, Result};
use crate::models::{CategorySpending, Transaction};
use crate::transactions::TransactionManager;

/// How many of the newest transactions [`Reports::quick_stats`] looks at.
pub const RECENT_WINDOW: u32 = 1000;

/// Months covered by [`Reports::spending_trends`] when the caller names none.
pub const DEFAULT_TREND_MONTHS: u32 = 6;

/// The span of time a budget summary covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    AllTime,
    Month { year: i32, month: u32 },
}

impl Period {
    /// `all_time` or `YYYY-MM`.
    pub fn label(&self) -> String {
        match self {
            Self::AllTime => "all_time".to_string(),
            Self::Month { year, month } => dates::month_label(*year, *month),
        }
    }

    /// Inclusive date bounds; `None` means unbounded.
    fn bounds(&self) -> Result<(Option<NaiveDate>, Option<NaiveDate>)> {
        match self {
            Self::AllTime => Ok((None, None)),
            Self::Month { year, month } => {
                let (first, last) = dates::month_bounds(*year, *month)?;
                Ok((Some(first), Some(last)))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetSummary {
    pub period: String,
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    /// Always `total_income - total_expenses`.
    pub net_amount: Decimal,
    /// Sum of all positive category limits.
    pub total_budget_limits: Decimal,
    /// Expenses as a percentage of `total_budget_limits`; `None` when no
    /// category has a limit.
    pub budget_utilization: Option<Decimal>,
    pub categories_over_budget: Vec<String>,
    pub category_breakdown: Vec<CategorySpending>,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthTrend {
    /// `YYYY-MM`
    pub month: String,
    pub income: Decimal,
    pub expenses: Decimal,
    pub net: Decimal,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuickStats {
    pub total_categories: usize,
    /// Capped at [`RECENT_WINDOW`].
    pub total_transactions: usize,
    pub categories_with_limits: usize,
    /// Transactions among the recent window dated in the current month.
    pub recent_transaction_count: usize,
}

/// Derives reports from manager queries; never touches the store directly.
#[derive(Debug, Clone, Copy)]
pub struct Reports<'db> {
    categories: CategoryManager<'db>,
    transactions: TransactionManager<'db>,
}

impl<'db> Reports<'db> {
    pub fn new(db: &'db Database) -> Self {
        Self {
            categories: CategoryManager::new(db),
            transactions: TransactionManager::new(db),
        }
    }

    pub fn budget_summary(&self, period: Period) -> Result<BudgetSummary> {
        let (start, end) = period.bounds()?;
        let category_breakdown = self.categories.spending_summary(start, end)?;
        let transactions = self.transactions.get_by_date_range(start, end)?;

        let (total_income, total_expenses) = totals(&transactions)?;
        let total_budget_limits = category_breakdown
            .iter()
            .filter(|c| c.limit > Decimal::ZERO)
            .try_fold(Decimal::ZERO, |sum, c| {
                checked_add(sum, c.limit, "summing budget limits")
            })?;
        let budget_utilization = if total_budget_limits > Decimal::ZERO {
            total_expenses
                .checked_div(total_budget_limits)
                .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        } else {
            None
        };
        let categories_over_budget = category_breakdown
            .iter()
            .filter(|c| c.over_budget)
            .map(|c| c.name.clone())
            .collect();

        tracing::debug!(period = %period.label(), count = transactions.len(), "built budget summary");
        Ok(BudgetSummary {
            period: period.label(),
            total_income,
            total_expenses,
            net_amount: checked_sub(total_income, total_expenses, "netting the budget summary")?,
            total_budget_limits,
            budget_utilization,
            categories_over_budget,
            category_breakdown,
            transaction_count: transactions.len(),
        })
    }

    /// Income and expenses for each of the last `months` calendar months,
    /// newest first, starting with the current month.
    ///
    /// `None` covers [`DEFAULT_TREND_MONTHS`] months.
    pub fn spending_trends(&self, months: Option<u32>) -> Result<Vec<MonthTrend>> {
        self.spending_trends_as_of(dates::today(), months.unwrap_or(DEFAULT_TREND_MONTHS))
    }

    /// [`Reports::spending_trends`] with "now" pinned to `today`.
    pub fn spending_trends_as_of(&self, today: NaiveDate, months: u32) -> Result<Vec<MonthTrend>> {
        (0..months)
            .map(|back| {
                let (year, month) = dates::months_back(today.year(), today.month(), back);
                let transactions = self.transactions.get_by_month(year, month)?;
                let (income, expenses) = totals(&transactions)?;
                Ok(MonthTrend {
                    month: dates::month_label(year, month),
                    income,
                    expenses,
                    net: checked_sub(income, expenses, "netting a monthly trend")?,
                    transaction_count: transactions.len(),
                })
            })
            .collect()
    }

    pub fn quick_stats(&self) -> Result<QuickStats> {
        self.quick_stats_as_of(dates::today())
    }

    /// [`Reports::quick_stats`] with "now" pinned to `today`.
    pub fn quick_stats_as_of(&self, today: NaiveDate) -> Result<QuickStats> {
        let categories = self.categories.list()?;
        let recent = self.transactions.list(Some(RECENT_WINDOW))?;
        let month_start = dates::start_of_month(today);
        let (_, month_end) = dates::month_bounds(today.year(), today.month())?;

        Ok(QuickStats {
            total_categories: categories.len(),
            total_transactions: recent.len(),
            categories_with_limits: categories.iter().filter(|c| c.has_limit()).count(),
            recent_transaction_count: recent
                .iter()
                .filter(|t| t.date >= month_start && t.date <= month_end)
                .count(),
        })
    }
}

/// `(income, expenses)` summed by transaction type.
fn totals(transactions: &[Transaction]) -> Result<(Decimal, Decimal)> {
    let mut income = Decimal::ZERO;
    let mut expenses = Decimal::ZERO;
    for t in transactions {
        if t.is_income() {
            income = checked_add(income, t.amount, "summing income")?;
        } else {
            expenses = checked_add(expenses, t.amount, "summing expenses")?;
        }
    }
    Ok((income, expenses))
}
