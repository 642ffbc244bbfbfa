//! First-party source classification: include prefixes and exclude substrings.

#![allow(missing_docs)]

use serde::Serialize;

/// Exclude substrings that are always applied, whatever the caller configures.
///
/// Covers vendored packages, the forge standard library, dependency checkouts,
/// non-deployable helper directories under `src/`, and test/script sources.
pub const BUILTIN_EXCLUDES: &[&str] = &[
    "node_modules",
    "forge-std",
    "lib/",
    "src/interfaces/",
    "src/libraries/",
    "src/dependencies/",
    "test/",
    "script/",
];

/// Default first-party source root.
pub const DEFAULT_INCLUDE: &str = "src/";

/// Outcome of evaluating one resolved source path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum FilterDecision {
    /// Matched an include prefix and no exclude pattern.
    Accepted { prefix: String },
    /// Contained an exclude pattern (checked first).
    Excluded { pattern: String },
    /// Matched no include prefix.
    NotIncluded,
}

impl FilterDecision {
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

/// Ordered include/exclude rule set.
///
/// Invariant: exclude always wins over include. The exclude list always starts
/// with [`BUILTIN_EXCLUDES`]; extra patterns can only add to it.
#[derive(Debug, Clone)]
pub struct PathFilter {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl Default for PathFilter {
    fn default() -> Self {
        Self::new(vec![DEFAULT_INCLUDE.to_string()], Vec::new())
    }
}

impl PathFilter {
    #[must_use]
    pub fn new(include: Vec<String>, extra_exclude: Vec<String>) -> Self {
        let exclude = BUILTIN_EXCLUDES
            .iter()
            .map(|pattern| (*pattern).to_string())
            .chain(extra_exclude)
            .collect();
        Self { include, exclude }
    }

    /// Classify a resolved source path. Short-circuits on the first exclude hit.
    #[must_use]
    pub fn evaluate(&self, source_path: &str) -> FilterDecision {
        if let Some(pattern) = self
            .exclude
            .iter()
            .find(|pattern| source_path.contains(pattern.as_str()))
        {
            return FilterDecision::Excluded {
                pattern: pattern.clone(),
            };
        }

        self.include
            .iter()
            .find(|prefix| source_path.starts_with(prefix.as_str()))
            .map_or(FilterDecision::NotIncluded, |prefix| {
                FilterDecision::Accepted {
                    prefix: prefix.clone(),
                }
            })
    }

    #[must_use]
    pub fn accepts(&self, source_path: &str) -> bool {
        self.evaluate(source_path).is_accepted()
    }
}
