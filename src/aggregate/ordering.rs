//! Canonical page ordering
//!
//! Numbered entries (`scp-002`, `scp-1000`) sort first by their zero-padded
//! number. Alias views such as `adult:scp-002` sort right after the page
//! they alias. Every other slug follows in lexicographic order.

use crate::config::OrderingConfig;
use std::cmp::Ordering;

/// Sort key of one slug
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum SlugKey {
    Numbered {
        number: String,
        rest: String,
        alias: usize,
        raw: String,
    },
    Other {
        base: String,
        alias: usize,
        raw: String,
    },
}

/// Slug ordering rules
#[derive(Debug, Clone)]
pub struct SlugOrdering {
    numbered_prefix: String,
    pad_width: usize,
    alias_prefixes: Vec<String>,
}

impl Default for SlugOrdering {
    fn default() -> Self {
        Self::from_config(&OrderingConfig::default())
    }
}

impl SlugOrdering {
    pub fn new(numbered_prefix: &str, pad_width: usize, alias_prefixes: &[String]) -> Self {
        Self {
            numbered_prefix: numbered_prefix.to_lowercase(),
            pad_width,
            alias_prefixes: alias_prefixes.iter().map(|p| p.to_lowercase()).collect(),
        }
    }

    pub fn from_config(config: &OrderingConfig) -> Self {
        Self::new(&config.numbered_prefix, config.pad_width, &config.alias_prefixes)
    }

    /// Compares two slugs in canonical order
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        self.key(a).cmp(&self.key(b))
    }

    /// Sorts slugs in place
    pub fn sort<T: AsRef<str>>(&self, slugs: &mut [T]) {
        slugs.sort_by_cached_key(|slug| self.key(slug.as_ref()));
    }

    fn key(&self, slug: &str) -> SlugKey {
        let raw = slug.to_lowercase();

        let (base, alias) = self
            .alias_prefixes
            .iter()
            .enumerate()
            .find_map(|(i, prefix)| raw.strip_prefix(prefix.as_str()).map(|rest| (rest, i + 1)))
            .unwrap_or((raw.as_str(), 0));

        if let Some(after_prefix) = base.strip_prefix(self.numbered_prefix.as_str()) {
            let digits_end = after_prefix
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(after_prefix.len());

            if digits_end > 0 {
                let (digits, rest) = after_prefix.split_at(digits_end);
                return SlugKey::Numbered {
                    number: format!("{:0>width$}", digits, width = self.pad_width),
                    rest: rest.to_string(),
                    alias,
                    raw: slug.to_string(),
                };
            }
        }

        SlugKey::Other {
            base: base.to_string(),
            alias,
            raw: slug.to_string(),
        }
    }
}
