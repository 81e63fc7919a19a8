//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl state machine:
//! - Requesting batches through the pagination client
//! - Retrying transient failures within a bounded budget
//! - Merging resolved pages into the crawl state
//! - Checkpointing on a page-count threshold and on every exit

use crate::config::Config;
use crate::crawler::paginator::Paginator;
use crate::crawler::source::{PageBatch, PageQuery, PageSource, Sleeper};
use crate::state::{CrawlPhase, CrawlState, PageRecord};
use crate::storage::StateStore;
use crate::{CensusError, FetchError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Tunables of the crawl loop
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    pub base_urls: Vec<String>,
    pub page_size: u32,
    /// Consecutive failed attempts tolerated per request
    pub max_attempts: u32,
    pub retry_delay: Duration,
    /// Merged pages between checkpoints
    pub checkpoint_every: usize,
}

impl CrawlSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_urls: config.base_urls(),
            page_size: config.crawler.page_size,
            max_attempts: config.crawler.max_attempts,
            retry_delay: Duration::from_millis(config.crawler.retry_delay_ms),
            checkpoint_every: config.crawler.checkpoint_every,
        }
    }
}

/// How a crawl run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlStatus {
    /// The remote reported no further pages
    Done,
    /// Interrupted through the cancellation token
    Cancelled,
}

/// Summary of a crawl run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlOutcome {
    pub status: CrawlStatus,
    /// Batches merged during this run
    pub batches: usize,
    /// Page records merged during this run
    pub pages_merged: usize,
    /// Checkpoints written during this run, including the final one
    pub checkpoints: usize,
}

/// Why a request could not produce a batch
enum RequestFailure {
    Cancelled,
    Exhausted { attempts: u32, last_error: FetchError },
}

/// A batch whose nodes all resolved to page records
struct ResolvedBatch {
    records: Vec<PageRecord>,
    has_next_page: bool,
    end_cursor: Option<String>,
}

/// Main crawler coordinator structure
pub struct Coordinator<S, Z, T> {
    paginator: Paginator<S, Z>,
    store: T,
    settings: CrawlSettings,
    cancel: CancellationToken,
    phase: CrawlPhase,
    since_checkpoint: usize,
    batches: usize,
    pages_merged: usize,
    checkpoints: usize,
}

impl<S: PageSource, Z: Sleeper, T: StateStore> Coordinator<S, Z, T> {
    pub fn new(
        source: S,
        sleeper: Z,
        store: T,
        settings: CrawlSettings,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            paginator: Paginator::new(source, sleeper),
            store,
            settings,
            cancel,
            phase: CrawlPhase::Idle,
            since_checkpoint: 0,
            batches: 0,
            pages_merged: 0,
            checkpoints: 0,
        }
    }

    /// Current phase of the state machine
    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    /// Runs the crawl loop until the remote is exhausted, the retry budget
    /// runs out, or the run is cancelled
    ///
    /// A checkpoint is written before returning in every case. Exhausting the
    /// retry budget is reported as [`CensusError::RetryBudgetExhausted`].
    pub async fn run(&mut self, state: &mut CrawlState) -> Result<CrawlOutcome, CensusError> {
        self.transition(CrawlPhase::Requesting)?;
        tracing::info!(
            "Starting crawl with {} known pages, saving to {}",
            state.len(),
            self.store.describe()
        );

        loop {
            let batch = match self.request_with_retry(state).await {
                Ok(batch) => batch,
                Err(RequestFailure::Cancelled) => {
                    tracing::warn!("Crawl cancelled, writing checkpoint before stopping");
                    self.stop(state, CrawlPhase::Failed)?;
                    return Ok(self.outcome(CrawlStatus::Cancelled));
                }
                Err(RequestFailure::Exhausted {
                    attempts,
                    last_error,
                }) => {
                    tracing::error!(
                        "Giving up after {} attempts ({}), writing checkpoint before stopping",
                        attempts,
                        last_error
                    );
                    self.stop(state, CrawlPhase::Failed)?;
                    return Err(CensusError::RetryBudgetExhausted {
                        attempts,
                        last_error,
                    });
                }
            };

            self.transition(CrawlPhase::Merging)?;
            let merged = state.merge_batch(batch.records, batch.end_cursor);
            self.batches += 1;
            self.pages_merged += merged;
            self.since_checkpoint += merged;
            tracing::debug!("Merged {} pages, {} known", merged, state.len());

            self.transition(CrawlPhase::Checkpointing)?;
            if !batch.has_next_page {
                tracing::info!("No more pages, crawl complete with {} pages", state.len());
                self.stop(state, CrawlPhase::Done)?;
                return Ok(self.outcome(CrawlStatus::Done));
            }

            if self.since_checkpoint >= self.settings.checkpoint_every {
                if let Err(e) = self.checkpoint(state) {
                    tracing::error!("Checkpoint failed, stopping crawl: {}", e);
                    self.phase = CrawlPhase::Failed;
                    return Err(e);
                }
            }

            if self.cancel.is_cancelled() {
                tracing::warn!("Crawl cancelled, writing checkpoint before stopping");
                self.stop(state, CrawlPhase::Failed)?;
                return Ok(self.outcome(CrawlStatus::Cancelled));
            }

            self.transition(CrawlPhase::Requesting)?;
        }
    }

    fn query_for(&self, state: &CrawlState) -> PageQuery {
        PageQuery {
            base_urls: self.settings.base_urls.clone(),
            created_after: state.high_water_mark,
            after: state.continuation_token.clone(),
            first: self.settings.page_size,
        }
    }

    async fn request_with_retry(
        &self,
        state: &CrawlState,
    ) -> Result<ResolvedBatch, RequestFailure> {
        let query = self.query_for(state);
        let last_slug = state.pages.keys().last().map(String::as_str).unwrap_or("-");
        tracing::info!(
            "Requesting next batch (last page '{}', created {})",
            last_slug,
            state
                .high_water_mark
                .map(|at| at.to_rfc3339())
                .unwrap_or_else(|| "-".to_string())
        );

        let max_attempts = self.settings.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let result = self
                .paginator
                .fetch_page(&query, &self.cancel)
                .await
                .and_then(resolve_batch);

            let error = match result {
                Ok(batch) => return Ok(batch),
                Err(FetchError::Cancelled) => return Err(RequestFailure::Cancelled),
                Err(e) => e,
            };

            tracing::warn!(
                "Batch request failed (attempt {}/{}): {}",
                attempt,
                max_attempts,
                error
            );

            if !error.is_transient() || attempt >= max_attempts {
                return Err(RequestFailure::Exhausted {
                    attempts: attempt,
                    last_error: error,
                });
            }

            if !self
                .paginator
                .pause(self.settings.retry_delay, &self.cancel)
                .await
            {
                return Err(RequestFailure::Cancelled);
            }
        }
    }

    fn transition(&mut self, next: CrawlPhase) -> Result<(), CensusError> {
        if !self.phase.can_transition_to(next) {
            return Err(CensusError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        tracing::trace!("Phase {} -> {}", self.phase, next);
        self.phase = next;
        Ok(())
    }

    fn checkpoint(&mut self, state: &CrawlState) -> Result<(), CensusError> {
        self.store.save(state)?;
        self.checkpoints += 1;
        self.since_checkpoint = 0;
        tracing::info!(
            "Checkpoint written: {} pages to {}",
            state.len(),
            self.store.describe()
        );
        Ok(())
    }

    /// Writes the final checkpoint and enters a terminal phase
    fn stop(&mut self, state: &CrawlState, terminal: CrawlPhase) -> Result<(), CensusError> {
        let saved = self.checkpoint(state);
        self.phase = if saved.is_ok() {
            terminal
        } else {
            CrawlPhase::Failed
        };
        saved
    }

    fn outcome(&self, status: CrawlStatus) -> CrawlOutcome {
        CrawlOutcome {
            status,
            batches: self.batches,
            pages_merged: self.pages_merged,
            checkpoints: self.checkpoints,
        }
    }
}

/// Resolves every node of a batch, or rejects the whole batch
///
/// A batch announcing more pages without a cursor cannot advance pagination
/// and is rejected as malformed.
fn resolve_batch(batch: PageBatch) -> Result<ResolvedBatch, FetchError> {
    if batch.has_next_page && batch.end_cursor.is_none() {
        return Err(FetchError::Malformed(
            "hasNextPage without endCursor".to_string(),
        ));
    }

    let records = batch
        .nodes
        .into_iter()
        .map(PageRecord::from_node)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ResolvedBatch {
        records,
        has_next_page: batch.has_next_page,
        end_cursor: batch.end_cursor,
    })
}
