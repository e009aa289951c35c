//! Glob matching shared by file discovery and cache-control resolution
//!
//! Keys are paths relative to the working directory, always `/`-separated.
//! `*` and `?` stay within one path segment, `**` spans any number of
//! directories (including none) and `{a,b}` matches either alternative.
//! A pattern without a `/` also matches the key's base name, so `*.css`
//! matches `assets/site.css`. Wildcards match names starting with `.`.

use std::fmt;
use std::path::Path;

use globset::{GlobBuilder, GlobMatcher};

use crate::error::{Error, Result};

/// A compiled glob that remembers the text it was built from
#[derive(Debug, Clone)]
pub struct GlobPattern {
    source: String,
    matcher: GlobMatcher,
    match_base: bool,
}

impl GlobPattern {
    /// Compile a glob pattern
    pub fn new(source: impl Into<String>) -> std::result::Result<Self, globset::Error> {
        let source = source.into();
        let matcher = GlobBuilder::new(&source)
            .literal_separator(true)
            .build()?
            .compile_matcher();
        let match_base = !source.contains('/');
        Ok(Self {
            source,
            matcher,
            match_base,
        })
    }

    /// The pattern text as written
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Match a `/`-separated key
    pub fn matches(&self, key: &str) -> bool {
        if self.matcher.is_match(key) {
            return true;
        }
        if self.match_base
            && let Some((_, base)) = key.rsplit_once('/')
        {
            return self.matcher.is_match(base);
        }
        false
    }
}

impl PartialEq for GlobPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for GlobPattern {}

impl fmt::Display for GlobPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// An ordered list of globs; a key matches the set if it matches any member
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternSet {
    patterns: Vec<GlobPattern>,
}

impl PatternSet {
    /// Compile include/exclude patterns, skipping blank entries
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| p.as_ref().trim())
            .filter(|p| !p.is_empty())
            .map(|p| {
                GlobPattern::new(p).map_err(|e| Error::Pattern {
                    pattern: p.to_string(),
                    reason: e.kind().to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn matches_any(&self, key: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(key))
    }
}

/// Build the `/`-separated key of `path` relative to `base`
///
/// Returns `None` when `path` is not under `base`.
pub fn to_key(base: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(base).ok()?;
    let segments: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    if segments.is_empty() {
        return None;
    }
    Some(segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn glob(p: &str) -> GlobPattern {
        GlobPattern::new(p).unwrap()
    }

    #[test]
    fn test_recursive_wildcard() {
        let any = glob("**");
        assert!(any.matches("index.html"));
        assert!(any.matches("assets/js/app.js"));

        let nested = glob("**/index.html");
        assert!(nested.matches("index.html"));
        assert!(nested.matches("docs/index.html"));
        assert!(nested.matches("docs/guide/index.html"));
        assert!(!nested.matches("docs/index.htm"));
    }

    #[test]
    fn test_single_star_stays_in_segment() {
        let p = glob("assets/*.js");
        assert!(p.matches("assets/app.js"));
        assert!(!p.matches("assets/vendor/lib.js"));
    }

    #[test]
    fn test_base_name_fallback() {
        let p = glob("*.css");
        assert!(p.matches("site.css"));
        assert!(p.matches("assets/css/site.css"));
        assert!(!p.matches("assets/site.css.map"));

        let exact = glob("index.html");
        assert!(exact.matches("index.html"));
        assert!(exact.matches("blog/index.html"));
    }

    #[test]
    fn test_patterns_with_separator_match_full_key() {
        let p = glob("blog/*.html");
        assert!(p.matches("blog/post.html"));
        assert!(!p.matches("archive/blog/post.html"));
    }

    #[test]
    fn test_dotfiles_match_wildcards() {
        assert!(glob("**").matches(".well-known/security.txt"));
        assert!(glob("*").matches(".nojekyll"));
    }

    #[test]
    fn test_brace_alternation() {
        let ext = glob("*.{js,css}");
        assert!(ext.matches("app.js"));
        assert!(ext.matches("assets/site.css"));
        assert!(!ext.matches("index.html"));

        let nested = glob("**/*.{html,xml}");
        assert!(nested.matches("index.html"));
        assert!(nested.matches("blog/feed.xml"));
        assert!(!nested.matches("assets/app.js"));

        let dirs = glob("{css,js}/**");
        assert!(dirs.matches("css/site.css"));
        assert!(dirs.matches("js/vendor/lib.js"));
        assert!(!dirs.matches("img/logo.png"));
    }

    #[test]
    fn test_double_star_inside_segment() {
        let p = glob("**.js");
        assert!(p.matches("app.js"));
        assert!(p.matches("assets/app.js"));
        assert!(!p.matches("app.css"));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(GlobPattern::new("[abc").is_err());
        let err = PatternSet::new(&["**/*.js", "[abc"]).unwrap_err();
        assert!(matches!(err, Error::Pattern { ref pattern, .. } if pattern == "[abc"));
    }

    #[test]
    fn test_pattern_set_skips_blank_entries() {
        let set = PatternSet::new(&["", "  ", "*.html"]).unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.matches_any("index.html"));
        assert!(!set.matches_any("app.js"));
    }

    #[test]
    fn test_to_key() {
        let base = PathBuf::from("/srv/site");
        assert_eq!(
            to_key(&base, &base.join("assets").join("app.js")),
            Some("assets/app.js".to_string())
        );
        assert_eq!(to_key(&base, &base), None);
        assert_eq!(to_key(&base, Path::new("/etc/passwd")), None);
    }
}
