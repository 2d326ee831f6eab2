//! Alias and replacement tables for module specifiers
//!
//! The two tables deliberately behave differently:
//!
//! - [`AliasTable`]: the first matching entry in declaration order rewrites
//!   the specifier and no further entries are tried. A key ending in `$`
//!   matches only the whole specifier; any other key matches its first
//!   occurrence as a plain substring (not path-segment aware), so alias
//!   `a -> b` turns `bba` into `bbb`.
//! - [`ReplacementTable`]: every entry is tried in order and each successful
//!   match feeds its result into the next entry (chained substitution).
//!
//! This asymmetry is kept as historically observed. It may be accidental
//! rather than intended and is worth revisiting before anyone relies on one
//! table behaving like the other.

use indexmap::IndexMap;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Suffix marking an alias key that matches whole specifiers only.
pub const EXACT_MATCH_MARKER: char = '$';

/// Ordered alias table: pattern → substitution
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AliasTable(IndexMap<String, String>);

impl AliasTable {
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    /// Apply the first matching alias to `specifier`.
    pub fn apply(&self, specifier: &str) -> String {
        for (key, substitution) in &self.0 {
            if let Some(exact) = key.strip_suffix(EXACT_MATCH_MARKER) {
                if specifier == exact {
                    return substitution.clone();
                }
            } else if !key.is_empty() && specifier.contains(key.as_str()) {
                return specifier.replacen(key.as_str(), substitution, 1);
            }
        }
        specifier.to_string()
    }

    /// `true` if any entry would rewrite `specifier`.
    pub fn matches(&self, specifier: &str) -> bool {
        self.0.keys().any(|key| match key.strip_suffix(EXACT_MATCH_MARKER) {
            Some(exact) => specifier == exact,
            None => !key.is_empty() && specifier.contains(key.as_str()),
        })
    }
}

/// Substitution applied by a replacement table entry
#[derive(Clone)]
pub enum Replacement {
    /// Replacement string; `$1`, `${name}` expand capture groups
    Template(String),
    /// Computed replacement for programmatic callers
    Function(Arc<dyn Fn(&Captures<'_>) -> String + Send + Sync>),
}

impl fmt::Debug for Replacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Replacement::Template(template) => f.debug_tuple("Template").field(template).finish(),
            Replacement::Function(_) => f.write_str("Function(..)"),
        }
    }
}

#[derive(Debug, Clone)]
struct ReplacementRule {
    pattern: Regex,
    replacement: Replacement,
}

/// Ordered regex replacement table, applied as a chain
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(
    try_from = "IndexMap<String, String>",
    into = "IndexMap<String, String>"
)]
pub struct ReplacementTable {
    rules: Vec<ReplacementRule>,
}

impl ReplacementTable {
    /// Append a rule; the pattern is compiled immediately.
    pub fn push(&mut self, pattern: &str, replacement: Replacement) -> Result<(), regex::Error> {
        self.rules.push(ReplacementRule {
            pattern: Regex::new(pattern)?,
            replacement,
        });
        Ok(())
    }

    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut table = Self::default();
        for (pattern, template) in pairs {
            table.push(pattern, Replacement::Template(template.to_string()))?;
        }
        Ok(table)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run `specifier` through every rule in order, feeding each result into
    /// the next rule. Each rule rewrites at most its first match.
    pub fn apply(&self, specifier: &str) -> String {
        let mut current = specifier.to_string();
        for rule in &self.rules {
            if !rule.pattern.is_match(&current) {
                continue;
            }
            current = match &rule.replacement {
                Replacement::Template(template) => rule
                    .pattern
                    .replace(&current, template.as_str())
                    .into_owned(),
                Replacement::Function(function) => rule
                    .pattern
                    .replace(&current, |captures: &Captures<'_>| function(captures))
                    .into_owned(),
            };
        }
        current
    }
}

impl TryFrom<IndexMap<String, String>> for ReplacementTable {
    type Error = regex::Error;

    fn try_from(pairs: IndexMap<String, String>) -> Result<Self, Self::Error> {
        Self::from_pairs(pairs.iter().map(|(key, value)| (key.as_str(), value.as_str())))
    }
}

impl From<ReplacementTable> for IndexMap<String, String> {
    fn from(table: ReplacementTable) -> Self {
        table
            .rules
            .into_iter()
            .map(|rule| {
                let replacement = match rule.replacement {
                    Replacement::Template(template) => template,
                    Replacement::Function(_) => "[function]".to_string(),
                };
                (rule.pattern.as_str().to_string(), replacement)
            })
            .collect()
    }
}

/// A request pattern used by implicit-external rules.
///
/// Written as `/regex/` (optionally `/regex/i`) it is a regular expression;
/// any other string matches by equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RequestPattern {
    Exact(String),
    Expression { source: String, regex: Regex },
}

impl RequestPattern {
    pub fn parse(source: &str) -> Result<Self, regex::Error> {
        if let Some(body) = source.strip_prefix('/') {
            if let Some(end) = body.rfind('/') {
                let (expression, flags) = (&body[..end], &body[end + 1..]);
                if flags.chars().all(|flag| flag == 'i') {
                    let expression = if flags.is_empty() {
                        expression.to_string()
                    } else {
                        format!("(?i){}", expression)
                    };
                    return Ok(RequestPattern::Expression {
                        source: source.to_string(),
                        regex: Regex::new(&expression)?,
                    });
                }
            }
        }
        Ok(RequestPattern::Exact(source.to_string()))
    }

    pub fn is_match(&self, request: &str) -> bool {
        match self {
            RequestPattern::Exact(exact) => exact == request,
            RequestPattern::Expression { regex, .. } => regex.is_match(request),
        }
    }
}

impl TryFrom<String> for RequestPattern {
    type Error = regex::Error;

    fn try_from(source: String) -> Result<Self, Self::Error> {
        Self::parse(&source)
    }
}

impl From<RequestPattern> for String {
    fn from(pattern: RequestPattern) -> Self {
        match pattern {
            RequestPattern::Exact(exact) => exact,
            RequestPattern::Expression { source, .. } => source,
        }
    }
}

/// `true` if any pattern matches `request`.
pub fn is_any_matching(request: &str, patterns: &[RequestPattern]) -> bool {
    patterns.iter().any(|pattern| pattern.is_match(request))
}
