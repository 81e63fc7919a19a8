//! Page source abstraction
//!
//! A [`PageSource`] answers one paginated query with one batch of page
//! nodes. The crawl engine only talks to this trait, so the HTTP transport
//! can be swapped for a scripted source in tests.

use crate::FetchError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Parameters of one batch request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    /// Location filter: only pages under one of these base URLs
    pub base_urls: Vec<String>,
    /// Only pages created at or after this instant
    pub created_after: Option<DateTime<Utc>>,
    /// Continuation token of the previous batch
    pub after: Option<String>,
    /// Maximum number of nodes per batch
    pub first: u32,
}

/// One page node as returned by the API, before resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawNode {
    pub url: String,
    pub title: Option<String>,
    pub category: Option<String>,
    pub created_at: Option<String>,
    pub external_id: Option<String>,
    pub source: Option<String>,
}

/// One page of results plus pagination markers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageBatch {
    pub nodes: Vec<RawNode>,
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

/// Trait for anything that can answer a batch query
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Requests one batch
    ///
    /// A remote rate-limit signal is reported as [`FetchError::RateLimited`]
    /// carrying the requested wait.
    async fn fetch_page(&self, query: &PageQuery) -> Result<PageBatch, FetchError>;
}

/// Suspends the crawl for a while
///
/// Abstracted so tests can observe waits without spending real time.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeper backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
