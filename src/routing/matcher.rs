//! Path pattern matching for interceptors.
//!
//! # Responsibilities
//! - Compile interceptor pattern source text into a regular expression
//! - Match against the full request target (path plus query string)
//! - Expose positional and named capture groups to the callback
//!
//! # Design Decisions
//! - Patterns are unanchored, exactly as written by the caller
//! - The source text is the identity of a pattern (used for replace/remove)
//! - Case-sensitive, like the path itself

use axum::http::Uri;
use regex::Regex;
use std::collections::HashMap;

use crate::error::ProxyError;

/// A compiled interceptor pattern.
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    regex: Regex,
}

impl PathPattern {
    /// Compile a pattern from its source text.
    pub fn new(source: impl Into<String>) -> Result<Self, ProxyError> {
        let source = source.into();
        let regex = Regex::new(&source).map_err(|e| ProxyError::InvalidPattern {
            pattern: source.clone(),
            source: e,
        })?;
        Ok(Self { source, regex })
    }

    /// The pattern text this matcher was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Match the request target, returning captures on success.
    pub fn matches(&self, target: &str) -> Option<PatternMatch> {
        let captures = self.regex.captures(target)?;
        let groups = captures
            .iter()
            .skip(1)
            .map(|group| group.map(|m| m.as_str().to_string()))
            .collect();
        let named = self
            .regex
            .capture_names()
            .flatten()
            .filter_map(|name| {
                captures
                    .name(name)
                    .map(|m| (name.to_string(), m.as_str().to_string()))
            })
            .collect();

        Some(PatternMatch {
            pattern: self.source.clone(),
            matched: captures
                .get(0)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
            groups,
            named,
        })
    }
}

/// The text interceptors are matched against: path plus query as received.
pub fn match_target(uri: &Uri) -> &str {
    uri.path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path())
}

/// Result of a successful pattern match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    /// Source text of the pattern that matched.
    pub pattern: String,
    /// The whole matched text.
    pub matched: String,
    /// Positional capture groups; `None` for groups that did not participate.
    pub groups: Vec<Option<String>>,
    /// Named capture groups that participated in the match.
    pub named: HashMap<String, String>,
}

impl PatternMatch {
    /// Positional group by 1-based index, like `$1`.
    pub fn group(&self, index: usize) -> Option<&str> {
        index
            .checked_sub(1)
            .and_then(|i| self.groups.get(i))
            .and_then(|g| g.as_deref())
    }

    /// Named group.
    pub fn name(&self, name: &str) -> Option<&str> {
        self.named.get(name).map(String::as_str)
    }
}
