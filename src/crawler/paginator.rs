//! Rate-limit aware pagination client
//!
//! Wraps a [`PageSource`] so that remote rate-limit signals are absorbed:
//! the client waits exactly as long as the remote asked and re-issues the
//! identical query. Waiting never counts against a retry budget. Every
//! request and every wait can be interrupted by the cancellation token.

use crate::crawler::source::{PageBatch, PageQuery, PageSource, Sleeper};
use crate::FetchError;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Pagination client over a page source
pub struct Paginator<S, Z> {
    source: S,
    sleeper: Z,
}

impl<S: PageSource, Z: Sleeper> Paginator<S, Z> {
    pub fn new(source: S, sleeper: Z) -> Self {
        Self { source, sleeper }
    }

    /// Fetches one batch, waiting out any rate limiting
    ///
    /// Returns `Err(FetchError::Cancelled)` as soon as `cancel` fires.
    pub async fn fetch_page(
        &self,
        query: &PageQuery,
        cancel: &CancellationToken,
    ) -> Result<PageBatch, FetchError> {
        loop {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                result = self.source.fetch_page(query) => result,
            };

            match result {
                Err(FetchError::RateLimited { wait }) => {
                    tracing::info!(
                        "Rate limited by remote, waiting {}s before retrying the same request",
                        wait.as_secs_f64()
                    );
                    if !self.pause(wait, cancel).await {
                        return Err(FetchError::Cancelled);
                    }
                }
                other => return other,
            }
        }
    }

    /// Sleeps for `duration`; returns false if cancelled first
    pub async fn pause(&self, duration: Duration, cancel: &CancellationToken) -> bool {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            _ = self.sleeper.sleep(duration) => true,
        }
    }
}
