use std::path::PathBuf;

use crate::error::{Error, Result};

const MAIN_DB_FILE: &str = "budget.db";
const TEST_DB_FILE: &str = "budget_test.db";

/// Which store a [`crate::Database`] is opened against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbTarget {
    /// `budget.db` in the per-user data directory.
    Main,
    /// `budget_test.db` in the per-user data directory.
    Test,
    /// An explicit database file.
    Path(PathBuf),
    /// A private in-memory database, discarded on close.
    InMemory,
}

impl DbTarget {
    /// Resolve the target to a file path, creating the data directory if needed.
    ///
    /// Returns `None` for [`DbTarget::InMemory`].
    pub fn resolve(&self) -> Result<Option<PathBuf>> {
        match self {
            Self::Main => data_dir().map(|dir| Some(dir.join(MAIN_DB_FILE))),
            Self::Test => data_dir().map(|dir| Some(dir.join(TEST_DB_FILE))),
            Self::Path(path) => Ok(Some(path.clone())),
            Self::InMemory => Ok(None),
        }
    }
}

fn data_dir() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "budget_tracker", "BudgetTracker")
        .ok_or_else(|| Error::Config("could not determine data directory".into()))?;
    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir)?;
    tracing::debug!("using data directory {}", data_dir.display());
    Ok(data_dir.to_path_buf())
}
