mod category;
mod transaction;

pub use category::{Category, CategoryNode, CategoryRef, CategorySpending, CategoryUpdate};
pub use transaction::{NewTransaction, Transaction, TransactionType, TransactionUpdate};
