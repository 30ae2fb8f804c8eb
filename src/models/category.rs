use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    /// Spending limit; zero means no limit.
    pub limit_amount: Decimal,
    pub parent_id: Option<i64>,
}

impl Category {
    pub fn has_limit(&self) -> bool {
        self.limit_amount > Decimal::ZERO
    }

}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Identifies a category either by ID or by its unique name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryRef {
    Id(i64),
    Name(String),
}

impl CategoryRef {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// Reject a reference that cannot identify anything.
    pub(crate) fn validate(&self) -> Result<()> {
        match self {
            Self::Name(name) if name.trim().is_empty() => Err(Error::Validation(
                "a category ID or name is required".into(),
            )),
            _ => Ok(()),
        }
    }
}

impl std::fmt::Display for CategoryRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "category #{id}"),
            Self::Name(name) => write!(f, "category \"{name}\""),
        }
    }
}

/// A partial category update. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    /// `Some(None)` detaches the category from its parent.
    pub parent: Option<Option<String>>,
    pub limit_amount: Option<Decimal>,
}

impl CategoryUpdate {
    /// The only fields a category update may touch.
    pub const FIELDS: &'static [&'static str] = &["name", "parent", "limit_amount"];

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.parent.is_none() && self.limit_amount.is_none()
    }

    /// Build an update from `(field, value)` pairs.
    ///
    /// Any field outside [`CategoryUpdate::FIELDS`] rejects the whole update.
    /// Names are kept verbatim. A blank `parent` value clears the parent.
    pub fn from_fields<'a, I>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut update = Self::default();
        let mut unknown = Vec::new();

        for (field, value) in fields {
            match field {
                "name" => {
                    if value.trim().is_empty() {
                        return Err(Error::Validation("category name cannot be empty".into()));
                    }
                    update.name = Some(value.to_string());
                }
                "parent" => {
                    update.parent = Some((!value.trim().is_empty()).then(|| value.to_string()));
                }
                "limit_amount" => {
                    let amount = Decimal::from_str(value.trim()).map_err(|_| {
                        Error::Validation(format!("limit_amount \"{value}\" is not a number"))
                    })?;
                    update.limit_amount = Some(amount);
                }
                other => unknown.push(other.to_string()),
            }
        }

        if !unknown.is_empty() {
            return Err(unknown_fields("category", &unknown, Self::FIELDS));
        }
        if update.is_empty() {
            return Err(Error::Validation(format!(
                "no valid category fields supplied (allowed: {})",
                Self::FIELDS.join(", ")
            )));
        }
        Ok(update)
    }
}

pub(crate) fn unknown_fields(entity: &str, unknown: &[String], allowed: &[&str]) -> Error {
    Error::Validation(format!(
        "unknown {entity} field(s): {} (allowed: {})",
        unknown.join(", "),
        allowed.join(", ")
    ))
}

/// A category together with its subcategories, recursively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryNode {
    pub category: Category,
    pub subcategories: Vec<CategoryNode>,
}

impl CategoryNode {
    /// Find a node by name anywhere in this subtree.
    pub fn find(&self, name: &str) -> Option<&CategoryNode> {
        if self.category.name == name {
            return Some(self);
        }
        self.subcategories.iter().find_map(|child| child.find(name))
    }
}

/// Expense total for one category over a reporting window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySpending {
    pub name: String,
    pub limit: Decimal,
    pub spent: Decimal,
    /// `spent > limit`, only ever true for categories with a positive limit.
    pub over_budget: bool,
}

impl CategorySpending {
    pub fn new(name: String, limit: Decimal, spent: Decimal) -> Self {
        let over_budget = limit > Decimal::ZERO && spent > limit;
        Self {
            name,
            limit,
            spent,
            over_budget,
        }
    }
}
