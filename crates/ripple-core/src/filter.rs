// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Qualified-name exclusion filters.
//!
//! Three independent matchers — types, aspects, properties — decide whether a
//! name is repository-internal noise. They are built once from configuration,
//! shared read-only across all transactions, and never mutated at runtime.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

use crate::constants::{RENDITION_PREFIX, SYS_PREFIX};
use crate::ident::{QName, QNameParseError};

/// Answers whether a qualified name is excluded from outbound events.
pub trait NameFilter: Send + Sync {
    /// Returns `true` when `name` must not appear in any event.
    fn is_excluded(&self, name: &QName) -> bool;
}

/// Error produced when compiling filter patterns from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// A pattern was not a qualified name or `prefix:*` wildcard.
    #[error("invalid filter pattern {pattern:?}: {source}")]
    InvalidPattern {
        /// The offending pattern string.
        pattern: String,
        /// The underlying parse failure.
        source: QNameParseError,
    },
}

/// One compiled exclusion pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Pattern {
    /// Matches one exact qualified name.
    Exact(QName),
    /// Matches every name in a namespace prefix (`sys:*`).
    Namespace(String),
}

/// Pattern-list matcher over qualified names.
///
/// Patterns are either an exact `prefix:local` name or a whole-namespace
/// wildcard `prefix:*`. Matching is exact-first but the result is the same
/// either way: any hit excludes.
#[derive(Debug, Clone, Default)]
pub struct PatternFilter {
    exact: BTreeSet<QName>,
    namespaces: BTreeSet<String>,
}

impl PatternFilter {
    /// Compiles a pattern list.
    ///
    /// # Errors
    /// Returns [`FilterError::InvalidPattern`] for any entry that is neither
    /// a parseable qualified name nor a `prefix:*` wildcard.
    pub fn compile<S: AsRef<str>>(patterns: &[S]) -> Result<Self, FilterError> {
        let mut exact = BTreeSet::new();
        let mut namespaces = BTreeSet::new();
        for raw in patterns {
            let raw = raw.as_ref();
            match parse_pattern(raw) {
                Ok(Pattern::Exact(q)) => {
                    exact.insert(q);
                }
                Ok(Pattern::Namespace(ns)) => {
                    namespaces.insert(ns);
                }
                Err(source) => {
                    return Err(FilterError::InvalidPattern {
                        pattern: raw.to_owned(),
                        source,
                    })
                }
            }
        }
        Ok(Self { exact, namespaces })
    }

    /// A filter that excludes nothing.
    #[must_use]
    pub fn pass_all() -> Self {
        Self::default()
    }
}

fn parse_pattern(raw: &str) -> Result<Pattern, QNameParseError> {
    if let Some(ns) = raw.strip_suffix(":*") {
        if ns.is_empty() {
            return Err(QNameParseError::EmptyPart(raw.to_owned()));
        }
        return Ok(Pattern::Namespace(ns.to_owned()));
    }
    QName::parse(raw).map(Pattern::Exact)
}

impl NameFilter for PatternFilter {
    fn is_excluded(&self, name: &QName) -> bool {
        self.exact.contains(name) || self.namespaces.contains(name.prefix())
    }
}

/// Filter configuration: raw pattern lists per name category.
///
/// The defaults exclude the system and rendition namespaces everywhere, which
/// is what a stock repository wants; hosts extend or replace the lists as
/// their models require.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FilterConfig {
    /// Entity/association type exclusion patterns.
    pub excluded_types: Vec<String>,
    /// Aspect exclusion patterns.
    pub excluded_aspects: Vec<String>,
    /// Property exclusion patterns.
    pub excluded_properties: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        let internal = vec![
            format!("{SYS_PREFIX}:*"),
            format!("{RENDITION_PREFIX}:*"),
        ];
        Self {
            excluded_types: internal.clone(),
            excluded_aspects: internal.clone(),
            excluded_properties: internal,
        }
    }
}

/// The three compiled filters consulted during consolidation.
#[derive(Debug, Clone)]
pub struct Filters {
    /// Entity and association type filter.
    pub types: PatternFilter,
    /// Aspect name filter.
    pub aspects: PatternFilter,
    /// Property name filter.
    pub properties: PatternFilter,
}

impl Filters {
    /// Compiles all three filters from `config`.
    ///
    /// # Errors
    /// Returns the first [`FilterError`] encountered in any list.
    pub fn from_config(config: &FilterConfig) -> Result<Self, FilterError> {
        Ok(Self {
            types: PatternFilter::compile(&config.excluded_types)?,
            aspects: PatternFilter::compile(&config.excluded_aspects)?,
            properties: PatternFilter::compile(&config.excluded_properties)?,
        })
    }

    /// Filters excluding nothing; useful in tests and permissive hosts.
    #[must_use]
    pub fn pass_all() -> Self {
        Self {
            types: PatternFilter::pass_all(),
            aspects: PatternFilter::pass_all(),
            properties: PatternFilter::pass_all(),
        }
    }
}

impl Default for Filters {
    fn default() -> Self {
        // The default config only contains well-formed built-in patterns.
        Self::from_config(&FilterConfig::default()).unwrap_or_else(|_| Self::pass_all())
    }
}
