//! Output module for reports and statistics
//!
//! This module handles:
//! - Exporting the aggregated report as JSON
//! - Computing and printing crawl statistics

mod report;
pub mod stats;

pub use report::export_report;
pub use stats::{compute_statistics, print_statistics, CensusStatistics};
