//! Style-Census: a resumable wiki style crawler
//!
//! This crate pages through a wiki content API, extracts the styling
//! metadata embedded in each page's source (module CSS, inline styles,
//! includes and classes), checkpoints its progress, and rolls the results
//! into frequency-ranked reports.

pub mod aggregate;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod state;
pub mod storage;

use std::time::Duration;
use thiserror::Error;

/// Main error type for Style-Census operations
#[derive(Debug, Error)]
pub enum CensusError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Giving up after {attempts} attempts: {last_error}")]
    RetryBudgetExhausted { attempts: u32, last_error: FetchError },

    #[error("Invalid phase transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlPhase,
        to: state::CrawlPhase,
    },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors produced while requesting a batch of pages
///
/// Rate limiting is handled inside the pagination client and never reaches
/// the retry budget; every other variant except `Cancelled` is transient.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    #[error("Remote error: {0}")]
    Remote(String),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Rate limited, retry in {wait:?}")]
    RateLimited { wait: Duration },

    #[error("Cancelled")]
    Cancelled,
}

impl FetchError {
    /// Returns true if the failure counts against the retry budget
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Status(_) | Self::Remote(_) | Self::Malformed(_)
        )
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::Malformed(error.to_string())
        } else {
            Self::Transport(error.to_string())
        }
    }
}

// Re-export commonly used types
pub use aggregate::{aggregate, CensusReport};
pub use config::Config;
pub use crawler::{Coordinator, CrawlOutcome, CrawlStatus};
pub use extract::{extract, Extracted};
pub use state::{CrawlPhase, CrawlState, PageRecord};
