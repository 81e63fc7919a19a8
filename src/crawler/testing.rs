//! Test doubles for the crawl engine

use crate::crawler::source::{PageBatch, PageQuery, PageSource, RawNode, Sleeper};
use crate::FetchError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Page source that replays a fixed script of responses
#[derive(Clone, Default)]
pub struct ScriptedSource {
    script: Arc<Mutex<VecDeque<Result<PageBatch, FetchError>>>>,
    queries: Arc<Mutex<Vec<PageQuery>>>,
}

impl ScriptedSource {
    pub fn new(script: Vec<Result<PageBatch, FetchError>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            queries: Arc::default(),
        }
    }

    /// Every query received so far, in order
    pub fn queries(&self) -> Vec<PageQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageSource for ScriptedSource {
    async fn fetch_page(&self, query: &PageQuery) -> Result<PageBatch, FetchError> {
        self.queries.lock().unwrap().push(query.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(FetchError::Transport("script exhausted".to_string())))
    }
}

/// Sleeper that records durations instead of waiting
#[derive(Clone, Default)]
pub struct RecordingSleeper {
    sleeps: Arc<Mutex<Vec<Duration>>>,
    cancel_on_sleep: Option<CancellationToken>,
}

impl RecordingSleeper {
    /// A sleeper that fires `cancel` and then never wakes up
    pub fn cancelling(cancel: CancellationToken) -> Self {
        Self {
            sleeps: Arc::default(),
            cancel_on_sleep: Some(cancel),
        }
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
        if let Some(cancel) = &self.cancel_on_sleep {
            cancel.cancel();
            std::future::pending::<()>().await;
        }
    }
}

/// A node for `slug` created on the given day of January 2020
pub fn node_on(slug: &str, day: u32) -> RawNode {
    RawNode {
        url: format!("http://scp-wiki.wikidot.com/{}", slug),
        title: Some(slug.to_uppercase()),
        category: Some("_default".to_string()),
        created_at: Some(format!("2020-01-{:02}T00:00:00+00:00", day)),
        external_id: None,
        source: Some(format!(r#"[[div class="{}"]]x[[/div]]"#, slug)),
    }
}

/// A batch of nodes created on consecutive days
pub fn batch(slugs: &[&str], has_next_page: bool, end_cursor: Option<&str>) -> PageBatch {
    PageBatch {
        nodes: slugs
            .iter()
            .enumerate()
            .map(|(i, slug)| node_on(slug, i as u32 + 1))
            .collect(),
        has_next_page,
        end_cursor: end_cursor.map(str::to_string),
    }
}
