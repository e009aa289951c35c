//! Cache-control rules
//!
//! A rule line has the form `<directive>: ["pattern", ...]`. Rules keep their
//! declaration order and resolution is first-match-wins: the directive of the
//! earliest rule with a matching pattern is applied.

use std::fmt;

use crate::error::{Error, Result, RuleError};
use crate::pattern::GlobPattern;

/// A cache-control directive and the globs it applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheControlRule {
    /// Literal `Cache-Control` header value, passed through unvalidated
    pub directive: String,
    pub patterns: Vec<GlobPattern>,
}

impl CacheControlRule {
    /// Build a rule from a directive and pattern strings
    pub fn new<S: AsRef<str>>(
        directive: impl Into<String>,
        patterns: &[S],
    ) -> std::result::Result<Self, RuleError> {
        let patterns = patterns
            .iter()
            .map(|p| {
                GlobPattern::new(p.as_ref()).map_err(|e| RuleError::InvalidPattern {
                    pattern: p.as_ref().to_string(),
                    reason: e.kind().to_string(),
                })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self {
            directive: directive.into(),
            patterns,
        })
    }

    /// Pattern source strings in declaration order
    pub fn pattern_strs(&self) -> Vec<&str> {
        self.patterns.iter().map(GlobPattern::as_str).collect()
    }

    /// Whether any pattern matches `key`
    pub fn matches(&self, key: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(key))
    }
}

impl fmt::Display for CacheControlRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let patterns = serde_json::to_string(&self.pattern_strs()).map_err(|_| fmt::Error)?;
        write!(f, "{}: {}", self.directive, patterns)
    }
}

/// Parse a single non-blank rule line
fn parse_line(line: &str) -> std::result::Result<CacheControlRule, RuleError> {
    let (directive, patterns) = line.split_once(':').ok_or(RuleError::MissingSeparator)?;
    let directive = directive.trim();
    let patterns = patterns.trim();

    let list: Vec<String> = serde_json::from_str(patterns)
        .map_err(|_| RuleError::InvalidPatternList(patterns.to_string()))?;

    let rule = CacheControlRule::new(directive, &list)?;
    if rule.patterns.is_empty() {
        tracing::warn!("Cache-control rule '{directive}' has no patterns and will never match");
    }
    Ok(rule)
}

/// Parse rule lines in order
///
/// Blank lines are skipped. The first malformed line aborts the parse with
/// [`Error::Parse`] naming its 1-based position.
pub fn parse_rules<S: AsRef<str>>(lines: &[S]) -> Result<Vec<CacheControlRule>> {
    let mut rules = Vec::new();

    for (idx, raw) in lines.iter().enumerate() {
        let line = raw.as_ref().trim();
        if line.is_empty() {
            continue;
        }

        let rule = parse_line(line).map_err(|kind| Error::Parse {
            line: idx + 1,
            text: raw.as_ref().to_string(),
            kind,
        })?;
        rules.push(rule);
    }

    Ok(rules)
}

/// Parse rule lines, returning `default` when every line is blank
pub fn parse_rules_or<S: AsRef<str>>(
    lines: &[S],
    default: Vec<CacheControlRule>,
) -> Result<Vec<CacheControlRule>> {
    if lines.iter().all(|l| l.as_ref().trim().is_empty()) {
        return Ok(default);
    }
    parse_rules(lines)
}

/// Resolve the directive for `key`, first matching rule wins
pub fn resolve<'a>(key: &str, rules: &'a [CacheControlRule]) -> Option<&'a str> {
    rules
        .iter()
        .find(|rule| rule.matches(key))
        .map(|rule| rule.directive.as_str())
}
