//! Storage module for persisting crawl state
//!
//! Two backends implement [`StateStore`]:
//! - [`JsonStore`] writes the snapshot as one JSON document
//! - [`SqliteStore`] keeps markers, pages and extracted values in tables

mod json;
mod schema;
mod sqlite;
mod traits;

pub use json::{write_json_atomic, JsonStore};
pub use sqlite::SqliteStore;
pub use traits::{StateStore, StorageError, StorageResult};

use crate::state::CrawlState;
use std::fs;
use std::path::Path;

/// Opens the backend matching the file extension
///
/// `.json` selects the JSON backend; anything else is a SQLite database.
pub fn open_store(path: &Path) -> StorageResult<Box<dyn StateStore>> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        return Ok(Box::new(JsonStore::new(path)));
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(Box::new(SqliteStore::new(path)?))
}

/// Loads the snapshot stored at `path` without creating anything
///
/// Returns `None` when the file does not exist or holds no state.
pub fn load_existing(path: &Path) -> StorageResult<Option<CrawlState>> {
    if !path.exists() {
        return Ok(None);
    }
    open_store(path)?.load()
}
