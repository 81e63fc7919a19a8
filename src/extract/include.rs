//! Include identifier parsing
//!
//! An include identifier is either a bare page name (`component:image-block`),
//! resolved against the default site, or carries a site prefix in the form
//! `:site:page`.

use serde::Serialize;

/// An include split into the site it comes from and the included page
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct IncludeRef {
    pub site: String,
    pub target: String,
}

impl IncludeRef {
    /// Parses an include identifier, falling back to `default_site`
    ///
    /// Matching is case-insensitive, so both parts are lowercased. Returns
    /// `None` when no target page remains, as in `:site:` or `:`.
    ///
    /// # Example
    ///
    /// ```
    /// use style_census::extract::IncludeRef;
    ///
    /// let include = IncludeRef::parse(":other-site:some-page", "scp-wiki").unwrap();
    /// assert_eq!(include.site, "other-site");
    /// assert_eq!(include.target, "some-page");
    /// ```
    pub fn parse(identifier: &str, default_site: &str) -> Option<Self> {
        let identifier = identifier.trim().to_lowercase();

        if let Some(rest) = identifier.strip_prefix(':') {
            if let Some((site, target)) = rest.split_once(':') {
                if !site.is_empty() {
                    let target = target.trim_matches(':');
                    return (!target.is_empty()).then(|| Self {
                        site: site.to_string(),
                        target: target.to_string(),
                    });
                }
            }
        }

        let target = identifier.trim_matches(':');
        (!target.is_empty()).then(|| Self {
            site: default_site.to_string(),
            target: target.to_string(),
        })
    }
}
