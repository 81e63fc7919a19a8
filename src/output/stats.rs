//! Statistics over a stored crawl
//!
//! This module provides functionality for summarizing a crawl state and
//! displaying the summary.

use crate::aggregate::{AggregationEntry, CensusReport};
use crate::state::CrawlState;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;

/// Number of top entries shown per field
const TOP_ENTRIES: usize = 10;

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CensusStatistics {
    /// Total number of pages crawled
    pub total_pages: usize,

    /// Pages whose source was withheld by the API
    pub pages_without_source: usize,

    /// Count of pages by category, most common first
    pub pages_by_category: Vec<(String, usize)>,

    /// Resume markers
    pub continuation_token: Option<String>,
    pub high_water_mark: Option<DateTime<Utc>>,

    /// Distinct values per field
    pub distinct_classes: usize,
    pub distinct_includes: usize,
    pub distinct_module_styles: usize,
    pub distinct_inline_styles: usize,

    /// Sites that pages include from
    pub included_sites: usize,

    /// Most used classes and includes
    pub top_classes: Vec<(String, usize)>,
    pub top_includes: Vec<(String, usize)>,
}

/// Computes statistics for a crawl state and its report
pub fn compute_statistics(state: &CrawlState, report: &CensusReport) -> CensusStatistics {
    let mut categories: IndexMap<String, usize> = IndexMap::new();
    for page in state.pages.values() {
        let category = page.category.as_deref().unwrap_or("(none)");
        *categories.entry(category.to_string()).or_default() += 1;
    }
    let mut pages_by_category: Vec<(String, usize)> = categories.into_iter().collect();
    pages_by_category.sort_by(|a, b| b.1.cmp(&a.1));

    let aggregation = &report.aggregation;

    CensusStatistics {
        total_pages: state.len(),
        pages_without_source: state.pages_without_source(),
        pages_by_category,
        continuation_token: state.continuation_token.clone(),
        high_water_mark: state.high_water_mark,
        distinct_classes: aggregation.classes.len(),
        distinct_includes: aggregation.includes.len(),
        distinct_module_styles: aggregation.module_styles.len(),
        distinct_inline_styles: aggregation.inline_styles.len(),
        included_sites: aggregation.site_includes.len(),
        top_classes: top(&aggregation.classes),
        top_includes: top(&aggregation.includes),
    }
}

fn top(entries: &[AggregationEntry]) -> Vec<(String, usize)> {
    entries
        .iter()
        .take(TOP_ENTRIES)
        .map(|entry| (entry.key.clone(), entry.total_count))
        .collect()
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CensusStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Total pages crawled: {}", stats.total_pages);
    println!("  Pages without source: {}", stats.pages_without_source);
    println!(
        "  Last creation time: {}",
        stats
            .high_water_mark
            .map(|at| at.to_rfc3339())
            .unwrap_or_else(|| "-".to_string())
    );
    println!(
        "  Continuation token: {}",
        stats.continuation_token.as_deref().unwrap_or("-")
    );
    println!();

    if !stats.pages_by_category.is_empty() {
        println!("Pages by Category:");
        for (category, count) in &stats.pages_by_category {
            let percentage = if stats.total_pages > 0 {
                (*count as f64 / stats.total_pages as f64) * 100.0
            } else {
                0.0
            };
            println!("  {}: {} ({:.1}%)", category, count, percentage);
        }
        println!();
    }

    println!("Distinct Values:");
    println!("  Classes: {}", stats.distinct_classes);
    println!("  Includes: {}", stats.distinct_includes);
    println!("  Module styles: {}", stats.distinct_module_styles);
    println!("  Inline styles: {}", stats.distinct_inline_styles);
    println!("  Included sites: {}", stats.included_sites);
    println!();

    print_top("Top Classes", &stats.top_classes);
    print_top("Top Includes", &stats.top_includes);
}

fn print_top(title: &str, entries: &[(String, usize)]) {
    if entries.is_empty() {
        return;
    }
    println!("{}:", title);
    for (key, count) in entries {
        println!("  {:>6}  {}", count, key);
    }
    println!();
}
