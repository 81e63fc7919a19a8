//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the GraphQL endpoint and run
//! the full crawl cycle end-to-end against on-disk stores.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use style_census::config::{ApiConfig, Config, CrawlerConfig, OrderingConfig, OutputConfig};
use style_census::crawler::{crawl, Coordinator, CrawlSettings, CrawlStatus, CromSource, Sleeper};
use style_census::state::CrawlState;
use style_census::storage::{JsonStore, StateStore};
use style_census::{aggregate, CensusError};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(endpoint: &str, state_path: &str) -> Config {
    Config {
        sites: vec!["scp-wiki".to_string()],
        crawler: CrawlerConfig {
            checkpoint_every: 100,
            max_attempts: 2,
            retry_delay_ms: 10,
            page_size: 2,
        },
        api: ApiConfig {
            endpoint: endpoint.to_string(),
            timeout_secs: 5,
            user_agent: Some("style-census-tests".to_string()),
        },
        output: OutputConfig {
            state_path: state_path.to_string(),
            report_path: "unused.json".to_string(),
        },
        ordering: OrderingConfig::default(),
    }
}

fn node(slug: &str, created_at: &str, source: &str) -> Value {
    json!({
        "node": {
            "url": format!("http://scp-wiki.wikidot.com/{}", slug),
            "wikidotInfo": {
                "title": slug.to_uppercase(),
                "category": "_default",
                "createdAt": created_at,
                "wikidotId": 1000,
                "source": source,
            }
        }
    })
}

fn pages_body(edges: Vec<Value>, has_next_page: bool, end_cursor: &str) -> Value {
    json!({
        "data": {
            "pages": {
                "edges": edges,
                "pageInfo": {"hasNextPage": has_next_page, "endCursor": end_cursor}
            }
        }
    })
}

fn first_page() -> Value {
    pages_body(
        vec![
            node(
                "scp-173",
                "2008-07-25T20:49:00Z",
                "[[module css]]\n.sculpture { color: grey; }\n[[/module]]\n[[div class=\"blockquote\"]]\nMoved\n[[/div]]",
            ),
            node(
                "scp-002",
                "2008-07-26T10:00:00Z",
                "[[include :scp-wiki:component:license-box]]\n[[div class=\"blockquote wide\"]]",
            ),
        ],
        true,
        "cursor-1",
    )
}

fn last_page() -> Value {
    pages_body(
        vec![node(
            "adult:scp-002",
            "2008-07-27T10:00:00Z",
            "[[span style=\"color: red\"]]text[[/span]]",
        )],
        false,
        "cursor-2",
    )
}

async fn mount_page(server: &MockServer, marker: &str, body: Value) {
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains(marker))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Sleeper that records waits instead of sleeping
#[derive(Clone, Default)]
struct RecordingSleeper {
    sleeps: Arc<Mutex<Vec<Duration>>>,
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

#[tokio::test]
async fn test_full_crawl_into_json_store() {
    let server = MockServer::start().await;
    mount_page(&server, "after: null", first_page()).await;
    mount_page(&server, "cursor-1", last_page()).await;

    let dir = TempDir::new().unwrap();
    let state_path = dir.path().join("state.json");
    let config = create_test_config(
        &format!("{}/graphql", server.uri()),
        state_path.to_str().unwrap(),
    );

    let (state, outcome) = crawl(&config, false, CancellationToken::new())
        .await
        .expect("crawl should complete");

    assert_eq!(outcome.status, CrawlStatus::Done);
    assert_eq!(outcome.batches, 2);

    let slugs: Vec<_> = state.pages.keys().cloned().collect();
    assert_eq!(slugs, vec!["scp-173", "scp-002", "adult:scp-002"]);
    assert_eq!(state.continuation_token.as_deref(), Some("cursor-2"));
    assert_eq!(
        state.high_water_mark.map(|at| at.to_rfc3339()),
        Some("2008-07-27T10:00:00+00:00".to_string())
    );

    // The final checkpoint on disk matches the returned state
    let stored = JsonStore::new(&state_path).load().unwrap().unwrap();
    assert_eq!(stored, state);

    let result = aggregate(&state.pages, config.default_site());
    let blockquote = result
        .classes
        .iter()
        .find(|entry| entry.key == "blockquote")
        .unwrap();
    assert_eq!(blockquote.total_count, 2);
    assert_eq!(result.module_styles[0].contributors[0].slug, "scp-173");
    assert_eq!(result.site_includes[0].site, "scp-wiki");
    assert_eq!(
        result.site_includes[0].includes[0].target,
        "component:license-box"
    );
}

#[tokio::test]
async fn test_rate_limit_waits_then_reissues() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [{"message": "Rate limit reached. Try again in 5 seconds."}]
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(&server, "after: null", last_page()).await;

    let dir = TempDir::new().unwrap();
    let state_path = dir.path().join("state.json");
    let config = create_test_config(
        &format!("{}/graphql", server.uri()),
        state_path.to_str().unwrap(),
    );

    let sleeper = RecordingSleeper::default();
    let source = CromSource::new(&config.api).unwrap();
    let mut coordinator = Coordinator::new(
        source,
        sleeper.clone(),
        JsonStore::new(&state_path),
        CrawlSettings::from_config(&config),
        CancellationToken::new(),
    );

    let mut state = CrawlState::new();
    let outcome = coordinator.run(&mut state).await.unwrap();

    assert_eq!(outcome.status, CrawlStatus::Done);
    assert_eq!(*sleeper.sleeps.lock().unwrap(), vec![Duration::from_secs(5)]);
    assert_eq!(state.len(), 1);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].body, requests[1].body);
}

#[tokio::test]
async fn test_resume_after_exhausted_retries() {
    let server = MockServer::start().await;
    mount_page(&server, "after: null", first_page()).await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("cursor-1"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let state_path = dir.path().join("state.json");
    let config = create_test_config(
        &format!("{}/graphql", server.uri()),
        state_path.to_str().unwrap(),
    );

    let result = crawl(&config, false, CancellationToken::new()).await;
    match result {
        Err(CensusError::RetryBudgetExhausted { attempts, .. }) => assert_eq!(attempts, 2),
        other => panic!("expected exhausted retries, got {:?}", other.map(|(_, o)| o)),
    }

    // Pages merged before the failure were checkpointed
    let checkpoint = JsonStore::new(&state_path).load().unwrap().unwrap();
    assert_eq!(checkpoint.len(), 2);
    assert_eq!(checkpoint.continuation_token.as_deref(), Some("cursor-1"));

    // The endpoint recovers; a second run picks up where the first stopped
    server.reset().await;
    mount_page(&server, "cursor-1", last_page()).await;

    let (state, outcome) = crawl(&config, false, CancellationToken::new())
        .await
        .expect("resumed crawl should complete");

    assert_eq!(outcome.status, CrawlStatus::Done);
    assert_eq!(outcome.batches, 1);
    assert_eq!(state.len(), 3);

    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("2008-07-26T10:00:00Z"));
}

#[tokio::test]
async fn test_fresh_crawl_discards_stored_state() {
    let server = MockServer::start().await;
    mount_page(&server, "after: null", last_page()).await;

    let dir = TempDir::new().unwrap();
    let state_path = dir.path().join("state.sqlite");

    let mut stale = CrawlState::new();
    stale.continuation_token = Some("stale".to_string());
    let mut store = style_census::storage::open_store(&state_path).unwrap();
    store.save(&stale).unwrap();
    drop(store);

    let config = create_test_config(
        &format!("{}/graphql", server.uri()),
        state_path.to_str().unwrap(),
    );

    let (state, _) = crawl(&config, true, CancellationToken::new())
        .await
        .expect("fresh crawl should complete");

    let slugs: Vec<_> = state.pages.keys().cloned().collect();
    assert_eq!(slugs, vec!["adult:scp-002"]);
    assert_eq!(state.continuation_token.as_deref(), Some("cursor-2"));
}
