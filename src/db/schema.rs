pub(crate) const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS categories (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    name         TEXT NOT NULL UNIQUE,
    limit_amount TEXT NOT NULL DEFAULT '0',
    parent_id    INTEGER REFERENCES categories(id)
);

CREATE TABLE IF NOT EXISTS transactions (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    type        TEXT NOT NULL CHECK (type IN ('income', 'expense')),
    amount      TEXT NOT NULL,
    category_id INTEGER NOT NULL REFERENCES categories(id),
    vendor      TEXT,
    note        TEXT,
    date        TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_categories_parent ON categories(parent_id);
CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);
CREATE INDEX IF NOT EXISTS idx_transactions_category ON transactions(category_id);
"#;

/// Name of the category that absorbs transactions when a root category is force-deleted.
pub(crate) const FALLBACK_CATEGORY: &str = "Uncategorized";
