//! Pattern rules applied to raw page source
//!
//! Each rule pairs a regex with the way its capture is turned into entries.
//! Rules never fail: a source with no matches yields an empty list.

use regex::Regex;
use std::sync::LazyLock;

static RE_MODULE_CSS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)\[\[module +css\]\]\n(.+?)\n\[\[/module\]\]")
        .expect("module css pattern is valid")
});
static RE_INLINE_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)style="([^"]*)""#).expect("inline style pattern is valid")
});
static RE_INCLUDE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[\[include +([a-z0-9:\-_]*[a-z0-9][a-z0-9:\-_]*)(?:\s|\||\]\])")
        .expect("include pattern is valid")
});
static RE_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)class="([^"\]]*)""#).expect("class pattern is valid")
});

/// Metadata field a rule populates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    ModuleStyles,
    InlineStyles,
    Includes,
    Classes,
}

impl Field {
    /// Name used for this field in storage and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ModuleStyles => "module_style",
            Self::InlineStyles => "inline_style",
            Self::Includes => "include",
            Self::Classes => "class",
        }
    }

    /// Parses a field from its storage name
    pub fn from_str_name(s: &str) -> Option<Self> {
        match s {
            "module_style" => Some(Self::ModuleStyles),
            "inline_style" => Some(Self::InlineStyles),
            "include" => Some(Self::Includes),
            "class" => Some(Self::Classes),
            _ => None,
        }
    }
}

/// How a rule's capture group becomes entries
#[derive(Debug, Clone, Copy)]
enum Capture {
    /// The whole capture is one entry
    Whole,
    /// The capture is one entry, lowercased
    Lowercased,
    /// The capture is split on whitespace, one entry per token
    Tokens,
}

/// A single declarative extraction rule
pub struct Rule {
    pub field: Field,
    pattern: &'static LazyLock<Regex>,
    capture: Capture,
}

impl Rule {
    /// Applies the rule to a page source, preserving match order
    pub fn apply(&self, source: &str) -> Vec<String> {
        let mut values = Vec::new();

        for captures in self.pattern.captures_iter(source) {
            let Some(matched) = captures.get(1) else {
                continue;
            };
            let text = matched.as_str();

            match self.capture {
                Capture::Whole => {
                    if !text.trim().is_empty() {
                        values.push(text.to_string());
                    }
                }
                Capture::Lowercased => {
                    if !text.is_empty() {
                        values.push(text.to_lowercase());
                    }
                }
                Capture::Tokens => {
                    values.extend(text.split_whitespace().map(str::to_string));
                }
            }
        }

        values
    }
}

/// The four rules, one per metadata field
pub static RULES: [Rule; 4] = [
    Rule {
        field: Field::ModuleStyles,
        pattern: &RE_MODULE_CSS,
        capture: Capture::Whole,
    },
    Rule {
        field: Field::InlineStyles,
        pattern: &RE_INLINE_STYLE,
        capture: Capture::Whole,
    },
    Rule {
        field: Field::Includes,
        pattern: &RE_INCLUDE,
        capture: Capture::Lowercased,
    },
    Rule {
        field: Field::Classes,
        pattern: &RE_CLASS,
        capture: Capture::Tokens,
    },
];

/// Returns the rule for a field
pub fn rule_for(field: Field) -> &'static Rule {
    match field {
        Field::ModuleStyles => &RULES[0],
        Field::InlineStyles => &RULES[1],
        Field::Includes => &RULES[2],
        Field::Classes => &RULES[3],
    }
}
