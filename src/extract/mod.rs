//! Extraction of styling metadata from page source
//!
//! This module applies the pattern rules to a page's raw wikitext and
//! collects:
//! - Module CSS blocks
//! - Inline `style="..."` values
//! - Include directives
//! - Class names

mod include;
mod rules;

pub use include::IncludeRef;
pub use rules::{rule_for, Field, Rule, RULES};

use serde::{Deserialize, Serialize};

/// Metadata extracted from one page source
///
/// Every list keeps match order and duplicates; no entry is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extracted {
    #[serde(default)]
    pub module_styles: Vec<String>,
    #[serde(default)]
    pub inline_styles: Vec<String>,
    #[serde(default)]
    pub includes: Vec<String>,
    #[serde(default)]
    pub classes: Vec<String>,
}

impl Extracted {
    /// Returns the values recorded for a field
    pub fn field(&self, field: Field) -> &[String] {
        match field {
            Field::ModuleStyles => &self.module_styles,
            Field::InlineStyles => &self.inline_styles,
            Field::Includes => &self.includes,
            Field::Classes => &self.classes,
        }
    }

    /// Returns a mutable handle on the values recorded for a field
    pub fn field_mut(&mut self, field: Field) -> &mut Vec<String> {
        match field {
            Field::ModuleStyles => &mut self.module_styles,
            Field::InlineStyles => &mut self.inline_styles,
            Field::Includes => &mut self.includes,
            Field::Classes => &mut self.classes,
        }
    }

    /// Returns true if nothing was extracted
    pub fn is_empty(&self) -> bool {
        RULES.iter().all(|rule| self.field(rule.field).is_empty())
    }
}

/// Runs every rule over a page source
///
/// # Example
///
/// ```
/// use style_census::extract::extract;
///
/// let extracted = extract(r#"[[div class="blockquote wide"]]hi[[/div]]"#);
/// assert_eq!(extracted.classes, vec!["blockquote", "wide"]);
/// assert!(extracted.module_styles.is_empty());
/// ```
pub fn extract(source: &str) -> Extracted {
    let mut extracted = Extracted::default();
    for rule in RULES.iter() {
        *extracted.field_mut(rule.field) = rule.apply(source);
    }
    extracted
}
