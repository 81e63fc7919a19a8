//! Include counts grouped by source site and target page

use super::counter::{rank_by_total, Contribution, ContributorRun};
use crate::extract::IncludeRef;
use indexmap::IndexMap;
use serde::Serialize;

/// Pages including one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncludeGroup {
    pub target: String,
    pub total_count: usize,
    pub pages: Vec<Contribution>,
}

/// Every target included from one site
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteGroup {
    pub site: String,
    pub total_count: usize,
    pub includes: Vec<IncludeGroup>,
}

/// Builds the site → target → page hierarchy
#[derive(Debug)]
pub struct SiteTally {
    default_site: String,
    sites: IndexMap<String, IndexMap<String, ContributorRun>>,
}

impl SiteTally {
    pub fn new(default_site: &str) -> Self {
        Self {
            default_site: default_site.to_string(),
            sites: IndexMap::new(),
        }
    }

    /// Records the includes of one page
    pub fn record_page(&mut self, slug: &str, includes: &[String]) {
        for identifier in includes {
            let Some(include) = IncludeRef::parse(identifier, &self.default_site) else {
                tracing::debug!("Skipping include without a target on {}: '{}'", slug, identifier);
                continue;
            };
            self.sites
                .entry(include.site)
                .or_default()
                .entry(include.target)
                .or_default()
                .append(slug);
        }
    }

    /// Ranks every level by descending total; ties keep first-seen order
    pub fn into_ranked(self) -> Vec<SiteGroup> {
        let mut sites: Vec<SiteGroup> = self
            .sites
            .into_iter()
            .map(|(site, targets)| {
                let mut includes: Vec<IncludeGroup> = targets
                    .into_iter()
                    .map(|(target, run)| {
                        let mut pages = run.into_vec();
                        rank_by_total(&mut pages, |page| page.count);
                        IncludeGroup {
                            target,
                            total_count: pages.iter().map(|page| page.count).sum(),
                            pages,
                        }
                    })
                    .collect();
                rank_by_total(&mut includes, |group| group.total_count);

                SiteGroup {
                    site,
                    total_count: includes.iter().map(|group| group.total_count).sum(),
                    includes,
                }
            })
            .collect();

        rank_by_total(&mut sites, |group| group.total_count);
        sites
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn includes(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_groups_by_site_and_target() {
        let mut tally = SiteTally::new("scp-wiki");
        tally.record_page(
            "scp-001",
            &includes(&[":other:theme", "component:license-box", ":other:theme"]),
        );
        tally.record_page("scp-002", &includes(&[":other:theme"]));

        let sites = tally.into_ranked();
        assert_eq!(sites.len(), 2);

        assert_eq!(sites[0].site, "other");
        assert_eq!(sites[0].total_count, 3);
        assert_eq!(sites[0].includes[0].target, "theme");
        let pages: Vec<_> = sites[0].includes[0]
            .pages
            .iter()
            .map(|p| (p.slug.as_str(), p.count))
            .collect();
        assert_eq!(pages, vec![("scp-001", 2), ("scp-002", 1)]);

        assert_eq!(sites[1].site, "scp-wiki");
        assert_eq!(sites[1].includes[0].target, "component:license-box");
    }

    #[test]
    fn test_prefixed_and_bare_forms_share_a_target() {
        let mut tally = SiteTally::new("scp-wiki");
        tally.record_page("a", &includes(&["info-ruv", ":scp-wiki:info-ruv"]));

        let sites = tally.into_ranked();
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].includes.len(), 1);
        assert_eq!(sites[0].includes[0].pages[0].count, 2);
    }

    #[test]
    fn test_pages_ranked_by_count() {
        let mut tally = SiteTally::new("scp-wiki");
        tally.record_page("light", &includes(&["t"]));
        tally.record_page("heavy", &includes(&["t", "t", "t"]));

        let group = &tally.into_ranked()[0].includes[0];
        assert_eq!(group.pages[0].slug, "heavy");
        assert_eq!(group.total_count, 4);
    }

    #[test]
    fn test_includes_without_target_are_skipped() {
        let mut tally = SiteTally::new("scp-wiki");
        tally.record_page("a", &includes(&[":", ":other:", "theme"]));

        let sites = tally.into_ranked();
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].site, "scp-wiki");
        assert_eq!(sites[0].total_count, 1);
        assert!(sites
            .iter()
            .flat_map(|site| &site.includes)
            .all(|group| !group.target.is_empty()));
    }

    #[test]
    fn test_empty() {
        assert!(SiteTally::new("scp-wiki").into_ranked().is_empty());
    }
}
