//! HTTP page source for the Crom GraphQL API
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with the configured user agent and timeout
//! - Rendering the paginated pages query
//! - Decoding responses into page batches
//! - Classifying remote errors (rate limiting vs. transient failures)

use crate::config::ApiConfig;
use crate::crawler::source::{PageBatch, PageQuery, PageSource, RawNode};
use crate::FetchError;
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::LazyLock;
use std::time::Duration;

/// Paginated pages query; `$name` placeholders are replaced by JSON literals
const PAGES_QUERY: &str = r#"
{
  pages(
    filter: {
      anyBaseUrl: $anyBaseUrl,
      wikidotInfo: { createdAt: { gte: $createdAfter } },
    },
    sort: { order: ASC, key: CREATED_AT },
    first: $first,
    after: $cursor,
  ) {
    edges {
      node {
        url,
        wikidotInfo {
          title,
          category,
          createdAt,
          wikidotId,
          source,
        }
      }
    },
    pageInfo {
      hasNextPage,
      endCursor,
    }
  }
}
"#;

static RE_RATE_LIMIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:in|for) (\d+) seconds?").expect("rate limit pattern is valid")
});

const DEFAULT_USER_AGENT: &str = concat!("style-census/", env!("CARGO_PKG_VERSION"));

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use style_census::config::ApiConfig;
/// use style_census::crawler::build_http_client;
///
/// let client = build_http_client(&ApiConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &ApiConfig) -> Result<Client, reqwest::Error> {
    let user_agent = config
        .user_agent
        .clone()
        .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Page source backed by the Crom GraphQL endpoint
pub struct CromSource {
    client: Client,
    endpoint: String,
}

impl CromSource {
    /// Creates a source from the API configuration
    pub fn new(config: &ApiConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(build_http_client(config)?, &config.endpoint))
    }

    pub fn with_client(client: Client, endpoint: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
        }
    }
}

#[async_trait]
impl PageSource for CromSource {
    async fn fetch_page(&self, query: &PageQuery) -> Result<PageBatch, FetchError> {
        let body = json!({ "query": render_query(query) });

        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        decode_response(status, &text)
    }
}

/// Renders the pages query with the given variables inlined
pub fn render_query(query: &PageQuery) -> String {
    let created_after = query
        .created_after
        .map(|at| at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true));

    PAGES_QUERY
        .replace("$anyBaseUrl", &json!(query.base_urls).to_string())
        .replace("$createdAfter", &json!(created_after).to_string())
        .replace("$first", &query.first.to_string())
        .replace("$cursor", &json!(query.after).to_string())
}

#[derive(Debug, Deserialize)]
struct CromResponse {
    data: Option<CromData>,
    errors: Option<Vec<CromErrorEntry>>,
}

#[derive(Debug, Deserialize)]
struct CromErrorEntry {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct CromData {
    pages: Option<CromPages>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CromPages {
    edges: Vec<CromEdge>,
    page_info: CromPageInfo,
}

#[derive(Debug, Deserialize)]
struct CromEdge {
    node: CromNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CromNode {
    url: String,
    wikidot_info: Option<WikidotInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WikidotInfo {
    title: Option<String>,
    category: Option<String>,
    created_at: Option<String>,
    wikidot_id: Option<serde_json::Value>,
    source: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CromPageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

/// Decodes a response body into a batch or a classified error
///
/// GraphQL errors take precedence over the HTTP status so that a rate-limit
/// message is recognised whatever status it arrives with.
pub fn decode_response(status: u16, body: &str) -> Result<PageBatch, FetchError> {
    let success = (200..300).contains(&status);

    let response: CromResponse = match serde_json::from_str(body) {
        Ok(response) => response,
        Err(_) if !success => return Err(FetchError::Status(status)),
        Err(e) => return Err(FetchError::Malformed(e.to_string())),
    };

    if let Some(errors) = response.errors.filter(|errors| !errors.is_empty()) {
        return Err(classify_errors(&errors));
    }
    if !success {
        return Err(FetchError::Status(status));
    }

    let pages = response
        .data
        .and_then(|data| data.pages)
        .ok_or_else(|| FetchError::Malformed("response has no data.pages".to_string()))?;

    let nodes = pages
        .edges
        .into_iter()
        .map(|edge| {
            let info = edge.node.wikidot_info;
            match info {
                Some(info) => RawNode {
                    url: edge.node.url,
                    title: info.title,
                    category: info.category,
                    created_at: info.created_at,
                    external_id: info.wikidot_id.and_then(id_to_string),
                    source: info.source,
                },
                None => RawNode {
                    url: edge.node.url,
                    title: None,
                    category: None,
                    created_at: None,
                    external_id: None,
                    source: None,
                },
            }
        })
        .collect();

    Ok(PageBatch {
        nodes,
        has_next_page: pages.page_info.has_next_page,
        end_cursor: pages.page_info.end_cursor,
    })
}

fn classify_errors(errors: &[CromErrorEntry]) -> FetchError {
    for error in errors {
        if let Some(wait) = parse_rate_limit(&error.message) {
            return FetchError::RateLimited { wait };
        }
    }

    let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
    FetchError::Remote(messages.join("; "))
}

/// Extracts the requested wait from a rate-limit message
///
/// Recognises phrasings such as "try again in 5 seconds".
pub fn parse_rate_limit(message: &str) -> Option<Duration> {
    let captures = RE_RATE_LIMIT.captures(message)?;
    let seconds = captures.get(1)?.as_str().parse().ok()?;
    Some(Duration::from_secs(seconds))
}

fn id_to_string(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
