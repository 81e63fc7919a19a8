//! Frequency tallies with per-page contributor runs

use indexmap::IndexMap;
use serde::Serialize;

/// One page's share of a value's occurrences
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contribution {
    pub slug: String,
    pub count: usize,
}

/// Contributors of one value, with consecutive appends of the same page
/// collapsed into a single entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContributorRun(Vec<Contribution>);

impl ContributorRun {
    /// Records one occurrence for `slug`
    ///
    /// Extends the last entry if it belongs to the same page, otherwise
    /// starts a new one.
    pub fn append(&mut self, slug: &str) {
        if let Some(last) = self.0.last_mut() {
            if last.slug == slug {
                last.count += 1;
                return;
            }
        }
        self.0.push(Contribution {
            slug: slug.to_string(),
            count: 1,
        });
    }

    /// Sum of all contributions
    pub fn total(&self) -> usize {
        self.0.iter().map(|c| c.count).sum()
    }

    pub fn as_slice(&self) -> &[Contribution] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<Contribution> {
        self.0
    }
}

/// One ranked value with its contributing pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregationEntry {
    pub key: String,
    pub total_count: usize,
    pub contributors: Vec<Contribution>,
}

/// Occurrence counter keyed by extracted value, in first-seen order
#[derive(Debug, Default)]
pub struct Tally {
    entries: IndexMap<String, ContributorRun>,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one occurrence of `key` on page `slug`
    pub fn record(&mut self, key: &str, slug: &str) {
        match self.entries.get_mut(key) {
            Some(run) => run.append(slug),
            None => {
                let mut run = ContributorRun::default();
                run.append(slug);
                self.entries.insert(key.to_string(), run);
            }
        }
    }

    /// Records every value of one page
    pub fn record_page(&mut self, slug: &str, values: &[String]) {
        for value in values {
            self.record(value, slug);
        }
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ranks keys by descending total; ties keep first-seen order
    pub fn into_ranked(self) -> Vec<AggregationEntry> {
        let mut entries: Vec<AggregationEntry> = self
            .entries
            .into_iter()
            .map(|(key, run)| AggregationEntry {
                key,
                total_count: run.total(),
                contributors: run.into_vec(),
            })
            .collect();

        rank_by_total(&mut entries, |entry| entry.total_count);
        entries
    }
}

/// Stable sort by descending total
pub fn rank_by_total<T>(items: &mut [T], total: impl Fn(&T) -> usize) {
    items.sort_by(|a, b| total(b).cmp(&total(a)));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(run: &ContributorRun) -> Vec<(&str, usize)> {
        run.as_slice()
            .iter()
            .map(|c| (c.slug.as_str(), c.count))
            .collect()
    }

    #[test]
    fn test_run_collapses_consecutive_appends() {
        let mut run = ContributorRun::default();
        for slug in ["a", "a", "b", "a"] {
            run.append(slug);
        }

        assert_eq!(pairs(&run), vec![("a", 2), ("b", 1), ("a", 1)]);
        assert_eq!(run.total(), 4);
    }

    #[test]
    fn test_tally_counts_across_pages() {
        let mut tally = Tally::new();
        tally.record_page("scp-001", &["x".into(), "y".into(), "x".into()]);
        tally.record_page("scp-002", &["y".into()]);

        let ranked = tally.into_ranked();
        assert_eq!(ranked.len(), 2);

        let x = &ranked[0];
        assert_eq!(x.key, "x");
        assert_eq!(x.total_count, 2);
        assert_eq!(
            x.contributors,
            vec![Contribution {
                slug: "scp-001".into(),
                count: 2
            }]
        );

        let y = &ranked[1];
        assert_eq!(y.total_count, 2);
        assert_eq!(y.contributors.len(), 2);
    }

    #[test]
    fn test_ranking_is_stable_on_ties() {
        let mut tally = Tally::new();
        tally.record("first", "a");
        tally.record("second", "a");
        tally.record("third", "a");
        tally.record("third", "b");

        let keys: Vec<_> = tally.into_ranked().into_iter().map(|e| e.key).collect();
        assert_eq!(keys, vec!["third", "first", "second"]);
    }

    #[test]
    fn test_total_is_sum_of_contributors() {
        let mut tally = Tally::new();
        for (key, slug) in [("k", "a"), ("k", "a"), ("k", "b"), ("k", "c"), ("k", "c")] {
            tally.record(key, slug);
        }

        let entry = &tally.into_ranked()[0];
        let sum: usize = entry.contributors.iter().map(|c| c.count).sum();
        assert_eq!(entry.total_count, sum);
        assert_eq!(entry.total_count, 5);
    }
}
