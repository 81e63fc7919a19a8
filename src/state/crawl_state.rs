use super::PageRecord;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// What happened to a page when it was merged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// First time this slug was seen
    Inserted,
    /// The slug existed and its record changed
    Updated,
    /// The slug existed with an identical record
    Unchanged,
}

/// Resumable crawl progress: position markers plus every page seen so far
///
/// `pages` keeps first-seen order. A later record for the same slug replaces
/// the earlier one in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlState {
    /// Opaque cursor returned by the API; `None` before the first batch
    pub continuation_token: Option<String>,
    /// Largest page creation time merged so far
    pub high_water_mark: Option<DateTime<Utc>>,
    /// Fingerprint of the site list the state was crawled with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sites_fingerprint: Option<String>,
    #[serde(default)]
    pub pages: IndexMap<String, PageRecord>,
}

impl CrawlState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct pages
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Inserts or replaces a page, raising the high-water mark if it is newer
    ///
    /// Merging the same record twice leaves the state unchanged.
    pub fn merge(&mut self, record: PageRecord) -> MergeOutcome {
        if let Some(at) = record.created_at {
            self.raise_high_water_mark(at);
        }

        match self.pages.get_mut(&record.slug) {
            Some(existing) if *existing == record => MergeOutcome::Unchanged,
            Some(existing) => {
                *existing = record;
                MergeOutcome::Updated
            }
            None => {
                self.pages.insert(record.slug.clone(), record);
                MergeOutcome::Inserted
            }
        }
    }

    /// Merges a resolved batch and then advances the continuation token
    ///
    /// Returns the number of records merged.
    pub fn merge_batch(&mut self, records: Vec<PageRecord>, next_token: Option<String>) -> usize {
        let merged = records.len();
        for record in records {
            self.merge(record);
        }
        self.advance_token(next_token);
        merged
    }

    /// Moves the continuation token forward; `None` keeps the current one
    pub fn advance_token(&mut self, next_token: Option<String>) {
        if next_token.is_some() {
            self.continuation_token = next_token;
        }
    }

    /// Folds another snapshot into this one
    ///
    /// Pages from `other` win on slug collisions. The high-water mark becomes
    /// the later of the two, and the continuation token follows whichever
    /// snapshot reached further.
    pub fn absorb(&mut self, other: CrawlState) {
        if other.high_water_mark >= self.high_water_mark && other.continuation_token.is_some() {
            self.continuation_token = other.continuation_token;
        }
        if let Some(at) = other.high_water_mark {
            self.raise_high_water_mark(at);
        }
        if self.sites_fingerprint.is_none() {
            self.sites_fingerprint = other.sites_fingerprint;
        }
        for (_, record) in other.pages {
            self.merge(record);
        }
    }

    /// Number of pages whose source was withheld
    pub fn pages_without_source(&self) -> usize {
        self.pages.values().filter(|page| !page.has_source()).count()
    }

    fn raise_high_water_mark(&mut self, at: DateTime<Utc>) {
        if self.high_water_mark.map_or(true, |mark| at > mark) {
            self.high_water_mark = Some(at);
        }
    }
}
