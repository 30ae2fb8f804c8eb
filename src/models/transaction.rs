use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

use super::category::unknown_fields;
use crate::dates;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// Parse `income` or `expense`, ignoring case.
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(Error::Validation(format!(
                "transaction type \"{s}\" must be \"income\" or \"expense\""
            ))),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub id: i64,
    pub kind: TransactionType,
    /// Recorded as given; the sign is not checked.
    pub amount: Decimal,
    pub category_id: i64,
    pub vendor: Option<String>,
    pub note: Option<String>,
    pub date: NaiveDate,
}

impl Transaction {
    pub fn is_income(&self) -> bool {
        self.kind == TransactionType::Income
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionType::Expense
    }
}

/// A transaction to be recorded against the category called `category_name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub kind: TransactionType,
    pub amount: Decimal,
    pub category_name: String,
    pub vendor: Option<String>,
    pub note: Option<String>,
    /// Defaults to today when `None`.
    pub date: Option<NaiveDate>,
}

impl NewTransaction {
    pub fn new(kind: TransactionType, amount: Decimal, category_name: impl Into<String>) -> Self {
        Self {
            kind,
            amount,
            category_name: category_name.into(),
            vendor: None,
            note: None,
            date: None,
        }
    }

    pub fn vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = Some(vendor.into());
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }
}

/// A partial transaction update. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionUpdate {
    pub amount: Option<Decimal>,
    /// `Some(None)` clears the vendor.
    pub vendor: Option<Option<String>>,
    /// `Some(None)` clears the note.
    pub note: Option<Option<String>>,
    pub date: Option<NaiveDate>,
    pub category_id: Option<i64>,
}

impl TransactionUpdate {
    /// The only fields a transaction update may touch.
    pub const FIELDS: &'static [&'static str] = &["amount", "vendor", "note", "date", "category_id"];

    pub fn is_empty(&self) -> bool {
        self.amount.is_none()
            && self.vendor.is_none()
            && self.note.is_none()
            && self.date.is_none()
            && self.category_id.is_none()
    }

    /// Build an update from `(field, value)` pairs.
    ///
    /// Any field outside [`TransactionUpdate::FIELDS`] rejects the whole update.
    /// An empty `vendor` or `note` value clears it.
    pub fn from_fields<'a, I>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut update = Self::default();
        let mut unknown = Vec::new();

        for (field, value) in fields {
            match field {
                "amount" => {
                    let amount = Decimal::from_str(value.trim()).map_err(|_| {
                        Error::Validation(format!("amount \"{value}\" is not a number"))
                    })?;
                    update.amount = Some(amount);
                }
                "vendor" => update.vendor = Some(optional_text(value)),
                "note" => update.note = Some(optional_text(value)),
                "date" => update.date = Some(dates::parse_date(value.trim())?),
                "category_id" => {
                    let id = value.trim().parse::<i64>().map_err(|_| {
                        Error::Validation(format!("category_id \"{value}\" is not an integer"))
                    })?;
                    update.category_id = Some(id);
                }
                other => unknown.push(other.to_string()),
            }
        }

        if !unknown.is_empty() {
            return Err(unknown_fields("transaction", &unknown, Self::FIELDS));
        }
        if update.is_empty() {
            return Err(Error::Validation(format!(
                "no valid transaction fields supplied (allowed: {})",
                Self::FIELDS.join(", ")
            )));
        }
        Ok(update)
    }
}

fn optional_text(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
