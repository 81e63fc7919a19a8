//! Storage traits and error types
//!
//! This module defines the trait interface for crawl state backends and
//! associated error types.

use crate::state::CrawlState;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt stored state: {0}")]
    Corrupt(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for crawl state backends
///
/// A save replaces the stored snapshot as a whole: after a failed save the
/// previous snapshot must still load intact.
pub trait StateStore: Send {
    /// Loads the stored snapshot, or `None` if nothing was saved yet
    fn load(&self) -> StorageResult<Option<CrawlState>>;

    /// Atomically replaces the stored snapshot
    fn save(&mut self, state: &CrawlState) -> StorageResult<()>;

    /// Removes the stored snapshot
    fn clear(&mut self) -> StorageResult<()>;

    /// Human-readable location used in logs
    fn describe(&self) -> String;
}

impl<T: StateStore + ?Sized> StateStore for Box<T> {
    fn load(&self) -> StorageResult<Option<CrawlState>> {
        (**self).load()
    }

    fn save(&mut self, state: &CrawlState) -> StorageResult<()> {
        (**self).save(state)
    }

    fn clear(&mut self) -> StorageResult<()> {
        (**self).clear()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
