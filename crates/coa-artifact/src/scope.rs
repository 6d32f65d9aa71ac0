//! Glob-style ownership patterns
//!
//! Patterns and paths are split on `/` and compared segment by segment:
//!
//! - a literal segment must be equal (case-sensitive)
//! - `*` as a whole segment matches exactly one segment
//! - `*` inside a segment matches zero or more characters of that segment
//! - `**` as a whole segment matches zero or more whole segments
//!
//! A match requires both pattern and path to be fully consumed.

use crate::path::WorkspacePath;
use serde::{Deserialize, Serialize};

/// Does `path` fall under `pattern`?
///
/// Both are expected to be forward-slash normalized already.
#[must_use]
pub fn matches(pattern: &str, path: &str) -> bool {
    let pattern: Vec<&str> = pattern.split('/').collect();
    let path: Vec<&str> = path.split('/').collect();
    match_segments(&pattern, &path)
}

/// Logical OR of [`matches`] over several patterns
#[must_use]
pub fn matches_any<I, S>(patterns: I, path: &str) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    patterns.into_iter().any(|p| matches(p.as_ref(), path))
}

fn match_segments(pattern: &[&str], path: &[&str]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((&"**", rest)) => (0..=path.len()).any(|q| match_segments(rest, &path[q..])),
        Some((seg, rest)) => match path.split_first() {
            Some((head, tail)) => segment_matches(seg, head) && match_segments(rest, tail),
            None => false,
        },
    }
}

/// Single-segment match where `*` stands for any run of characters
fn segment_matches(pattern: &str, segment: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    if !pattern.contains('*') {
        return pattern == segment;
    }

    let pat: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = segment.chars().collect();
    let (mut p, mut t) = (0, 0);
    // Position of the last `*` seen and the text index it was tried at
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pat.len() && pat[p] == '*' {
            backtrack = Some((p, t));
            p += 1;
        } else if p < pat.len() && pat[p] == text[t] {
            p += 1;
            t += 1;
        } else if let Some((star, tried)) = backtrack {
            p = star + 1;
            t = tried + 1;
            backtrack = Some((star, tried + 1));
        } else {
            return false;
        }
    }

    pat[p..].iter().all(|&c| c == '*')
}

/// Owned scope of an intent
///
/// An empty scope places no restriction on paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnedScope {
    patterns: Vec<String>,
}

impl OwnedScope {
    /// Build from raw patterns, normalizing separators and a leading `./`
    #[must_use]
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| {
                let p: String = p.into();
                p.trim().replace('\\', "/").trim_start_matches("./").to_string()
            })
            .filter(|p| !p.is_empty())
            .collect();
        Self { patterns }
    }

    /// Patterns in declaration order
    #[inline]
    #[must_use]
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// True when no patterns are declared
    #[inline]
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Is `path` inside this scope?
    #[must_use]
    pub fn permits(&self, path: &WorkspacePath) -> bool {
        self.is_unrestricted() || matches_any(&self.patterns, &path.as_slash_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn recursive_descent() {
        assert!(matches("src/**", "src/a/b.ts"));
        assert!(matches("src/**", "src/a.ts"));
        assert!(matches("src/**/b.ts", "src/b.ts"));
        assert!(matches("src/**/b.ts", "src/x/y/b.ts"));
        assert!(!matches("src/**/b.ts", "src/x/y/c.ts"));
        assert!(!matches("src/**", "lib/a.ts"));
    }

    #[test]
    fn single_star_is_one_segment() {
        assert!(matches("src/*.ts", "src/b.ts"));
        assert!(!matches("src/*.ts", "src/a/b.ts"));
        assert!(matches("src/*/b.ts", "src/a/b.ts"));
        assert!(!matches("src/*/b.ts", "src/b.ts"));
    }

    #[test]
    fn in_segment_wildcards() {
        assert!(matches("src/*.test.*", "src/app.test.ts"));
        assert!(matches("src/a*b", "src/ab"));
        assert!(matches("src/a*b", "src/axxb"));
        assert!(!matches("src/a*b", "src/axxc"));
        assert!(matches("src/*auth*", "src/oauth_client"));
    }

    #[test]
    fn literal_is_exact_and_case_sensitive() {
        assert!(matches("src/main.ts", "src/main.ts"));
        assert!(!matches("src/main.ts", "src/Main.ts"));
        assert!(!matches("src", "src/main.ts"));
        assert!(!matches("src/main.ts", "src"));
    }

    #[test]
    fn double_star_matches_everything() {
        assert!(matches("**", "a"));
        assert!(matches("**", "a/b/c/d.rs"));
        assert!(matches("**/*.rs", "deep/tree/mod.rs"));
    }

    #[test]
    fn any_pattern_wins() {
        let patterns = ["lib/**", "src/auth/**"];
        assert!(matches_any(patterns, "src/auth/jwt.ts"));
        assert!(!matches_any(patterns, "src/db/pool.ts"));
        assert!(!matches_any(Vec::<String>::new(), "x"));
    }

    #[test]
    fn owned_scope_permits() {
        let scope = OwnedScope::new(["./src/auth/**", "src\\middleware\\jwt.ts"]);
        assert_eq!(scope.patterns(), &["src/auth/**", "src/middleware/jwt.ts"]);

        let inside = WorkspacePath::parse("src/auth/login.ts").unwrap();
        let jwt = WorkspacePath::parse("src/middleware/jwt.ts").unwrap();
        let outside = WorkspacePath::parse("src/db/pool.ts").unwrap();
        assert!(scope.permits(&inside));
        assert!(scope.permits(&jwt));
        assert!(!scope.permits(&outside));
    }

    #[test]
    fn empty_scope_is_unrestricted() {
        let scope = OwnedScope::default();
        assert!(scope.is_unrestricted());
        assert!(scope.permits(&WorkspacePath::parse("anything/at/all").unwrap()));
    }

    fn segment() -> impl Strategy<Value = String> {
        "[a-z]{1,4}"
    }

    proptest! {
        #[test]
        fn double_star_accepts_any_path(segs in prop::collection::vec(segment(), 1..6)) {
            prop_assert!(matches("**", &segs.join("/")));
        }

        #[test]
        fn without_double_star_segment_counts_must_agree(
            pat in prop::collection::vec(prop_oneof![segment(), Just("*".to_string())], 1..5),
            path in prop::collection::vec(segment(), 1..5),
        ) {
            if matches(&pat.join("/"), &path.join("/")) {
                prop_assert_eq!(pat.len(), path.len());
            }
        }

        #[test]
        fn path_matches_itself(segs in prop::collection::vec(segment(), 1..6)) {
            let p = segs.join("/");
            prop_assert!(matches(&p, &p));
        }
    }
}
