//! Crawl state: pages seen so far, position markers and the phase machine

mod crawl_state;
mod page;
mod phase;

pub use crawl_state::{CrawlState, MergeOutcome};
pub use page::{slug_from_url, PageRecord};
pub use phase::CrawlPhase;
