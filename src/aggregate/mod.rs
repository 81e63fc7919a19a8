//! Aggregation of extracted metadata across all crawled pages
//!
//! Produces, for each metadata field, a frequency-ranked list of values
//! with the pages contributing to each, plus a hierarchical view of
//! includes grouped by source site and target page.

mod counter;
mod ordering;
mod sites;

pub use counter::{AggregationEntry, Contribution, ContributorRun, Tally};
pub use ordering::SlugOrdering;
pub use sites::{IncludeGroup, SiteGroup, SiteTally};

use crate::extract::Field;
use crate::state::{CrawlState, PageRecord};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

/// Ranked results for every metadata field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Aggregation {
    pub module_styles: Vec<AggregationEntry>,
    pub inline_styles: Vec<AggregationEntry>,
    pub classes: Vec<AggregationEntry>,
    pub includes: Vec<AggregationEntry>,
    pub site_includes: Vec<SiteGroup>,
}

impl Aggregation {
    /// Ranked entries of one field
    pub fn field(&self, field: Field) -> &[AggregationEntry] {
        match field {
            Field::ModuleStyles => &self.module_styles,
            Field::InlineStyles => &self.inline_styles,
            Field::Includes => &self.includes,
            Field::Classes => &self.classes,
        }
    }
}

/// Aggregates the extracted metadata of every page
///
/// Pages are visited in map order, so contributors appear in crawl order
/// until ranking reorders them. Bare include identifiers are attributed to
/// `default_site`. The result depends only on `pages`.
pub fn aggregate(pages: &IndexMap<String, PageRecord>, default_site: &str) -> Aggregation {
    let mut module_styles = Tally::new();
    let mut inline_styles = Tally::new();
    let mut classes = Tally::new();
    let mut includes = Tally::new();
    let mut site_includes = SiteTally::new(default_site);

    for (slug, page) in pages {
        let extracted = &page.extracted;
        module_styles.record_page(slug, &extracted.module_styles);
        inline_styles.record_page(slug, &extracted.inline_styles);
        classes.record_page(slug, &extracted.classes);
        includes.record_page(slug, &extracted.includes);
        site_includes.record_page(slug, &extracted.includes);
    }

    tracing::debug!(
        "Aggregated {} pages: {} classes, {} includes, {} module styles, {} inline styles",
        pages.len(),
        classes.len(),
        includes.len(),
        module_styles.len(),
        inline_styles.len()
    );

    Aggregation {
        module_styles: module_styles.into_ranked(),
        inline_styles: inline_styles.into_ranked(),
        classes: classes.into_ranked(),
        includes: includes.into_ranked(),
        site_includes: site_includes.into_ranked(),
    }
}

/// One row of the canonical page listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageSummary {
    pub slug: String,
    pub url: String,
    pub title: Option<String>,
    pub category: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub has_source: bool,
    pub module_styles: usize,
    pub inline_styles: usize,
    pub includes: usize,
    pub classes: usize,
}

impl PageSummary {
    fn from_record(page: &PageRecord) -> Self {
        Self {
            slug: page.slug.clone(),
            url: page.url.clone(),
            title: page.title.clone(),
            category: page.category.clone(),
            created_at: page.created_at,
            has_source: page.has_source(),
            module_styles: page.extracted.module_styles.len(),
            inline_styles: page.extracted.inline_styles.len(),
            includes: page.extracted.includes.len(),
            classes: page.extracted.classes.len(),
        }
    }
}

/// Full report: aggregation results plus the canonical page listing
#[derive(Debug, Clone, Serialize)]
pub struct CensusReport {
    pub generated_at: DateTime<Utc>,
    pub default_site: String,
    pub page_count: usize,
    pub pages: Vec<PageSummary>,
    #[serde(flatten)]
    pub aggregation: Aggregation,
}

impl CensusReport {
    /// Builds the report for a crawl state
    pub fn build(state: &CrawlState, default_site: &str, ordering: &SlugOrdering) -> Self {
        let mut pages: Vec<&PageRecord> = state.pages.values().collect();
        pages.sort_by(|a, b| ordering.compare(&a.slug, &b.slug));

        Self {
            generated_at: Utc::now(),
            default_site: default_site.to_string(),
            page_count: state.len(),
            pages: pages.into_iter().map(PageSummary::from_record).collect(),
            aggregation: aggregate(&state.pages, default_site),
        }
    }
}
