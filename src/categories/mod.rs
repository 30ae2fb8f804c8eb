//! Category persistence and hierarchy queries.

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};

use crate::db::{self, Database, CATEGORY_COLUMNS, FALLBACK_CATEGORY};
use crate::error::{checked_add, map_category_write, Error, Result};
use crate::models::*;

/// Creates, queries, updates and deletes categories.
#[derive(Debug, Clone, Copy)]
pub struct CategoryManager<'db> {
    db: &'db Database,
}

impl<'db> CategoryManager<'db> {
    pub fn new(db: &'db Database) -> Self {
        Self { db }
    }

    /// Create a category, optionally nested under the existing category `parent_name`.
    ///
    /// The name is stored exactly as given; only a blank name is rejected.
    ///
    /// # Errors
    /// [`Error::DuplicateName`] if `name` is taken, [`Error::NotFound`] if the
    /// parent does not exist.
    pub fn add(
        &self,
        name: &str,
        limit_amount: Decimal,
        parent_name: Option<&str>,
    ) -> Result<Category> {
        if name.trim().is_empty() {
            return Err(Error::Validation("category name cannot be empty".into()));
        }

        let session = self.db.session()?;
        let parent_id = match parent_name {
            Some(parent) => Some(require_by_name(&session, parent, "parent category")?.id),
            None => None,
        };

        session
            .execute(
                "INSERT INTO categories (name, limit_amount, parent_id) VALUES (?1, ?2, ?3)",
                params![name, limit_amount.to_string(), parent_id],
            )
            .map_err(|e| map_category_write(e, name))?;
        let id = session.last_insert_rowid();
        session.commit()?;

        tracing::info!(id, name, %limit_amount, ?parent_id, "created category");
        Ok(Category {
            id,
            name: name.to_string(),
            limit_amount,
            parent_id,
        })
    }

    /// All categories, ordered by name.
    pub fn list(&self) -> Result<Vec<Category>> {
        let session = self.db.session()?;
        list_all(&session)
    }

    pub fn get_by_name(&self, name: &str) -> Result<Option<Category>> {
        let session = self.db.session()?;
        db::category_by_name(&session, name)
    }

    pub fn get_by_id(&self, id: i64) -> Result<Option<Category>> {
        let session = self.db.session()?;
        db::category_by_id(&session, id)
    }

    /// Look a category up by ID or name.
    ///
    /// # Errors
    /// [`Error::Validation`] if `target` is an empty name.
    pub fn get(&self, target: &CategoryRef) -> Result<Option<Category>> {
        let session = self.db.session()?;
        db::category_by_ref(&session, target)
    }

    /// Apply a partial update to the category identified by `target`.
    ///
    /// Nothing is written unless every requested change is valid.
    ///
    /// # Errors
    /// - [`Error::Validation`] for an empty update or reference, an empty
    ///   name, or a parent that would create a cycle.
    /// - [`Error::NotFound`] if the category or the new parent is missing.
    /// - [`Error::DuplicateName`] if renaming onto an existing name.
    pub fn update(&self, target: &CategoryRef, update: &CategoryUpdate) -> Result<Category> {
        target.validate()?;
        if update.is_empty() {
            tracing::warn!(%target, "rejected empty category update");
            return Err(Error::Validation(format!(
                "no valid category fields supplied (allowed: {})",
                CategoryUpdate::FIELDS.join(", ")
            )));
        }

        let session = self.db.session()?;
        let mut category = db::category_by_ref(&session, target)?
            .ok_or_else(|| Error::NotFound(target.to_string()))?;

        if let Some(name) = &update.name {
            if name.trim().is_empty() {
                return Err(Error::Validation("category name cannot be empty".into()));
            }
            category.name = name.clone();
        }
        if let Some(parent) = &update.parent {
            category.parent_id = match parent {
                Some(parent_name) => {
                    let parent = require_by_name(&session, parent_name, "parent category")?;
                    ensure_acyclic(&session, category.id, parent.id)?;
                    Some(parent.id)
                }
                None => None,
            };
        }
        if let Some(limit_amount) = update.limit_amount {
            category.limit_amount = limit_amount;
        }

        session
            .execute(
                "UPDATE categories SET name = ?1, limit_amount = ?2, parent_id = ?3 WHERE id = ?4",
                params![
                    category.name,
                    category.limit_amount.to_string(),
                    category.parent_id,
                    category.id,
                ],
            )
            .map_err(|e| map_category_write(e, &category.name))?;
        session.commit()?;

        tracing::info!(id = category.id, name = %category.name, "updated category");
        Ok(category)
    }

    /// Delete the category `id`.
    ///
    /// Returns `false` if no such category exists. A category that still owns
    /// transactions or subcategories is only deleted when `force` is set, in
    /// which case its subcategories move up to its parent and its transactions
    /// move to its parent, or to the `Uncategorized` category for a root.
    ///
    /// # Errors
    /// [`Error::HasDependents`] when dependents exist and `force` is not set.
    pub fn delete(&self, id: i64, force: bool) -> Result<bool> {
        let session = self.db.session()?;
        let Some(category) = db::category_by_id(&session, id)? else {
            tracing::debug!(id, "no category to delete");
            return Ok(false);
        };

        let transactions: i64 = session.query_row(
            "SELECT COUNT(*) FROM transactions WHERE category_id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        let subcategories: i64 = session.query_row(
            "SELECT COUNT(*) FROM categories WHERE parent_id = ?1",
            params![id],
            |row| row.get(0),
        )?;

        if transactions > 0 || subcategories > 0 {
            if !force {
                tracing::warn!(
                    id,
                    name = %category.name,
                    transactions,
                    subcategories,
                    "refused to delete category with dependents"
                );
                return Err(Error::HasDependents {
                    name: category.name,
                    transactions,
                    subcategories,
                });
            }

            session.execute(
                "UPDATE categories SET parent_id = ?1 WHERE parent_id = ?2",
                params![category.parent_id, id],
            )?;
            if transactions > 0 {
                let target = match category.parent_id {
                    Some(parent_id) => parent_id,
                    None => fallback_category(&session, &category)?,
                };
                session.execute(
                    "UPDATE transactions SET category_id = ?1 WHERE category_id = ?2",
                    params![target, id],
                )?;
                tracing::info!(from = id, to = target, transactions, "reassigned transactions");
            }
        }

        session.execute("DELETE FROM categories WHERE id = ?1", params![id])?;
        session.commit()?;

        tracing::info!(id, name = %category.name, force, "deleted category");
        Ok(true)
    }

    /// Categories arranged as a forest of root categories (no parent), each
    /// carrying its subcategories. Siblings are ordered by name.
    pub fn hierarchy(&self) -> Result<Vec<CategoryNode>> {
        let categories = self.list()?;
        Ok(build_subtree(&categories, None))
    }

    /// Expense totals per category for the inclusive window `[start, end]`.
    ///
    /// A missing bound leaves that side open. Spend is counted only against
    /// the category a transaction is recorded under; it does not roll up into
    /// parent categories.
    pub fn spending_summary(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<CategorySpending>> {
        let session = self.db.session()?;
        let categories = list_all(&session)?;

        let mut stmt = session.prepare(
            "SELECT category_id, amount FROM transactions
             WHERE type = 'expense'
               AND (?1 IS NULL OR date >= ?1)
               AND (?2 IS NULL OR date <= ?2)",
        )?;
        let rows = stmt.query_map(
            params![start.map(db::date_param), end.map(db::date_param)],
            |row| Ok((row.get::<_, i64>(0)?, db::decimal_column(row, 1)?)),
        )?;

        let mut spent: HashMap<i64, Decimal> = HashMap::new();
        for row in rows {
            let (category_id, amount) = row?;
            let total = spent.entry(category_id).or_default();
            *total = checked_add(*total, amount, "summing category spending")?;
        }

        Ok(categories
            .into_iter()
            .map(|c| {
                let total = spent.get(&c.id).copied().unwrap_or_default();
                CategorySpending::new(c.name, c.limit_amount, total)
            })
            .collect())
    }
}

fn list_all(conn: &Connection) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY name"
    ))?;
    let rows = stmt.query_map([], db::category_from_row)?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

fn require_by_name(conn: &Connection, name: &str, what: &str) -> Result<Category> {
    db::category_by_name(conn, name)?.ok_or_else(|| Error::NotFound(format!("{what} \"{name}\"")))
}

/// Walk from `parent_id` to the root and fail if the walk reaches `id` or loops.
fn ensure_acyclic(conn: &Connection, id: i64, parent_id: i64) -> Result<()> {
    let mut visited = HashSet::new();
    let mut current = Some(parent_id);

    while let Some(ancestor) = current {
        if ancestor == id || !visited.insert(ancestor) {
            tracing::warn!(id, parent_id, "rejected parent that would form a cycle");
            return Err(Error::Validation(format!(
                "category #{parent_id} cannot be the parent of category #{id}: it would form a cycle"
            )));
        }
        current = db::category_by_id(conn, ancestor)?.and_then(|c| c.parent_id);
    }
    Ok(())
}

/// ID of the category that takes over transactions from the deleted root `category`.
fn fallback_category(conn: &Connection, category: &Category) -> Result<i64> {
    if category.name == FALLBACK_CATEGORY {
        return Err(Error::Validation(format!(
            "\"{FALLBACK_CATEGORY}\" cannot be force-deleted while it owns transactions"
        )));
    }
    if let Some(existing) = db::category_by_name(conn, FALLBACK_CATEGORY)? {
        return Ok(existing.id);
    }
    conn.execute(
        "INSERT INTO categories (name, limit_amount, parent_id) VALUES (?1, '0', NULL)",
        params![FALLBACK_CATEGORY],
    )?;
    let id = conn.last_insert_rowid();
    tracing::info!(id, "created fallback category {FALLBACK_CATEGORY}");
    Ok(id)
}

fn build_subtree(categories: &[Category], parent_id: Option<i64>) -> Vec<CategoryNode> {
    categories
        .iter()
        .filter(|c| c.parent_id == parent_id)
        .map(|c| CategoryNode {
            category: c.clone(),
            subcategories: build_subtree(categories, Some(c.id)),
        })
        .collect()
}

#[cfg(test)]
mod tests;
