//! Crawler module for paging through the wiki content API
//!
//! This module contains the core crawling logic, including:
//! - The page source abstraction and its GraphQL implementation
//! - Rate-limit aware pagination
//! - The checkpointing crawl state machine

mod coordinator;
mod fetcher;
mod paginator;
mod source;

#[cfg(test)]
pub(crate) mod testing;

pub use coordinator::{Coordinator, CrawlOutcome, CrawlSettings, CrawlStatus};
pub use fetcher::{build_http_client, decode_response, parse_rate_limit, render_query, CromSource};
pub use paginator::Paginator;
pub use source::{PageBatch, PageQuery, PageSource, RawNode, Sleeper, TokioSleeper};

use crate::config::Config;
use crate::state::CrawlState;
use crate::storage::{open_store, StateStore};
use crate::CensusError;
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Open the configured state store
/// 2. Resume from the stored snapshot unless `fresh` is set
/// 3. Page through the API until it is exhausted or `cancel` fires
///
/// Returns the final crawl state together with the run summary.
pub async fn crawl(
    config: &Config,
    fresh: bool,
    cancel: CancellationToken,
) -> Result<(CrawlState, CrawlOutcome), CensusError> {
    let mut store = open_store(Path::new(&config.output.state_path))?;

    if fresh {
        tracing::info!("Fresh crawl requested, clearing {}", store.describe());
        store.clear()?;
    }

    let mut state = prepare_state(store.as_ref(), config)?;
    let source = CromSource::new(&config.api)?;
    let mut coordinator = Coordinator::new(
        source,
        TokioSleeper,
        store,
        CrawlSettings::from_config(config),
        cancel,
    );

    let outcome = coordinator.run(&mut state).await?;
    Ok((state, outcome))
}

/// Loads the stored snapshot, or starts empty
///
/// Warns when the snapshot was crawled with a different site list; its
/// markers are still used.
pub fn prepare_state(store: &dyn StateStore, config: &Config) -> Result<CrawlState, CensusError> {
    let fingerprint = config.sites_fingerprint();

    let mut state = match store.load()? {
        Some(state) => {
            tracing::info!(
                "Resuming from {} with {} pages",
                store.describe(),
                state.len()
            );
            if state
                .sites_fingerprint
                .as_deref()
                .is_some_and(|stored| stored != fingerprint)
            {
                tracing::warn!(
                    "Stored state was crawled with a different site list; resuming anyway"
                );
            }
            state
        }
        None => {
            tracing::info!("No stored state found, starting from the beginning");
            CrawlState::new()
        }
    };

    state.sites_fingerprint = Some(fingerprint);
    Ok(state)
}
