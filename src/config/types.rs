use serde::Deserialize;
use sha2::{Digest, Sha256};

/// Main configuration structure for Style-Census
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Wiki sites to crawl; the first one is the default include site
    pub sites: Vec<String>,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub ordering: OrderingConfig,
}

impl Config {
    /// Returns the site that bare include identifiers resolve to
    pub fn default_site(&self) -> &str {
        self.sites.first().map(String::as_str).unwrap_or_default()
    }

    /// Returns the base URLs sent to the API as the location filter
    pub fn base_urls(&self) -> Vec<String> {
        self.sites
            .iter()
            .map(|site| format!("http://{}.wikidot.com/", site))
            .collect()
    }

    /// Returns a SHA-256 fingerprint of the crawled location set
    ///
    /// Stored alongside the crawl state so a resume against a different site
    /// list can be detected.
    pub fn sites_fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for url in self.base_urls() {
            hasher.update(url.as_bytes());
            hasher.update(b"\n");
        }
        hex::encode(hasher.finalize())
    }
}

/// Crawl loop behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of merged pages between checkpoints
    #[serde(rename = "checkpoint-every", default = "default_checkpoint_every")]
    pub checkpoint_every: usize,

    /// Attempts per request before the run fails
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Pause between attempts after a transient failure (milliseconds)
    #[serde(rename = "retry-delay-ms", default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Number of pages requested per batch
    #[serde(rename = "page-size", default = "default_page_size")]
    pub page_size: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            checkpoint_every: default_checkpoint_every(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            page_size: default_page_size(),
        }
    }
}

/// Remote API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// GraphQL endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User agent sent with every request
    #[serde(rename = "user-agent", default)]
    pub user_agent: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
            user_agent: None,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path of the persisted crawl state (`.json` or SQLite)
    #[serde(rename = "state-path")]
    pub state_path: String,

    /// Path of the exported JSON report
    #[serde(rename = "report-path")]
    pub report_path: String,
}

/// Canonical page ordering configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OrderingConfig {
    /// Prefix of numbered entries (e.g. "scp-")
    #[serde(rename = "numbered-prefix", default = "default_numbered_prefix")]
    pub numbered_prefix: String,

    /// Width the numeric part is zero-padded to
    #[serde(rename = "pad-width", default = "default_pad_width")]
    pub pad_width: usize,

    /// Prefixes marking a variant view of another page (e.g. "adult:")
    #[serde(rename = "alias-prefixes", default = "default_alias_prefixes")]
    pub alias_prefixes: Vec<String>,
}

impl Default for OrderingConfig {
    fn default() -> Self {
        Self {
            numbered_prefix: default_numbered_prefix(),
            pad_width: default_pad_width(),
            alias_prefixes: default_alias_prefixes(),
        }
    }
}

fn default_checkpoint_every() -> usize {
    100
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    5000
}

fn default_page_size() -> u32 {
    100
}

fn default_endpoint() -> String {
    "https://api.crom.avn.sh/graphql".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_numbered_prefix() -> String {
    "scp-".to_string()
}

fn default_pad_width() -> usize {
    10
}

fn default_alias_prefixes() -> Vec<String> {
    vec!["adult:".to_string()]
}
