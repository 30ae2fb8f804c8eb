//! Local personal finance tracking.
//!
//! Income and expense transactions are recorded against hierarchical
//! categories that may carry a spending limit, all kept in a single SQLite
//! file. [`BudgetApi`] is the entry point for front ends; the managers and
//! [`Reports`] underneath it can also be used directly with a [`Database`].
//!
//! ```no_run
//! use budget_tracker::{BudgetApi, DbTarget};
//! use rust_decimal::Decimal;
//!
//! # fn main() -> budget_tracker::Result<()> {
//! budget_tracker::init_tracing();
//! let api = BudgetApi::open(&DbTarget::Main)?;
//! api.create_category("Food", Decimal::new(200, 0), None)?;
//! api.add_transaction("expense", Decimal::new(1250, 2), "Food", Some("Market"), None, None)?;
//! println!("{:?}", api.get_budget_summary(None)?);
//! api.close()
//! # }
//! ```

pub mod api;
pub mod categories;
pub mod config;
pub mod dates;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod reports;
pub mod transactions;


pub use api::{BudgetApi, TransactionQuery};
pub use categories::CategoryManager;
pub use config::DbTarget;
pub use db::Database;
pub use error::{Error, Result};
pub use logging::init_tracing;
pub use models::*;
pub use reports::{BudgetSummary, MonthTrend, Period, QuickStats, Reports};
pub use transactions::TransactionManager;
