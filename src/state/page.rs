use crate::crawler::RawNode;
use crate::extract::{extract, Extracted};
use crate::FetchError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// One crawled page with the metadata extracted from its source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    pub url: String,
    /// Path of the URL without the leading '/', unique within a crawl
    pub slug: String,
    pub title: Option<String>,
    pub category: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub external_id: Option<String>,
    /// Raw wikitext; absent when the API withheld it
    pub source: Option<String>,
    #[serde(flatten)]
    pub extracted: Extracted,
}

impl PageRecord {
    /// Resolves a node received from the API into a record
    ///
    /// Extraction runs only when the node carries a source. A node whose URL
    /// yields no slug is rejected as malformed.
    pub fn from_node(node: RawNode) -> Result<Self, FetchError> {
        let slug = slug_from_url(&node.url).ok_or_else(|| {
            FetchError::Malformed(format!("cannot derive a page slug from '{}'", node.url))
        })?;

        let created_at = node
            .created_at
            .as_deref()
            .and_then(|raw| match DateTime::parse_from_rfc3339(raw) {
                Ok(at) => Some(at.with_timezone(&Utc)),
                Err(e) => {
                    tracing::warn!("Ignoring unparseable creation time '{}' on {}: {}", raw, slug, e);
                    None
                }
            });

        let extracted = node.source.as_deref().map(extract).unwrap_or_default();

        Ok(Self {
            url: node.url,
            slug,
            title: node.title,
            category: node.category,
            created_at,
            external_id: node.external_id,
            source: node.source,
            extracted,
        })
    }

    /// Returns true if the page source was available
    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }
}

/// Derives a page slug from its URL
///
/// The slug is the path with its leading and trailing '/' removed. Returns
/// `None` for unparseable URLs and for site roots.
pub fn slug_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let slug = parsed.path().trim_matches('/');

    if slug.is_empty() {
        None
    } else {
        Some(slug.to_string())
    }
}
