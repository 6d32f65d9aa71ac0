//! Mutation classification
//!
//! Decides whether a file mutation is a structural refactor (form changed,
//! behavior did not) or a behavioral change, from line-set heuristics over
//! the previous and new content. Ambiguous edits are classified as behavioral
//! so they are never under-tracked.

use once_cell::sync::Lazy;
use regex::RegexSet;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Kind of change a mutation represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MutationClass {
    /// Formatting, rename or reorder; behavior unchanged
    #[serde(alias = "AST_REFACTOR")]
    StructuralRefactor,
    /// New or changed functionality
    #[serde(alias = "INTENT_EVOLUTION")]
    BehavioralChange,
}

impl MutationClass {
    /// Wire name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StructuralRefactor => "STRUCTURAL_REFACTOR",
            Self::BehavioralChange => "BEHAVIORAL_CHANGE",
        }
    }
}

impl fmt::Display for MutationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MutationClass {
    type Err = UnknownMutationClass;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "STRUCTURAL_REFACTOR" | "AST_REFACTOR" => Ok(Self::StructuralRefactor),
            "BEHAVIORAL_CHANGE" | "INTENT_EVOLUTION" => Ok(Self::BehavioralChange),
            _ => Err(UnknownMutationClass(s.to_string())),
        }
    }
}

/// Unrecognized mutation class name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown mutation class: '{0}'")]
pub struct UnknownMutationClass(pub String);

/// Strategy for classifying a mutation
///
/// `previous` is `None` when the file did not exist before.
pub trait MutationClassifier: Send + Sync + fmt::Debug {
    /// Classify the change from `previous` to `next`
    fn classify(&self, previous: Option<&str>, next: &str) -> MutationClass;

    /// Classify the change to the file at `path`
    ///
    /// Defaults to [`Self::classify`]; strategies that know file types
    /// override it.
    fn classify_path(&self, path: &str, previous: Option<&str>, next: &str) -> MutationClass {
        let _ = path;
        self.classify(previous, next)
    }

    /// Strategy name for logs
    fn name(&self) -> &'static str {
        "custom"
    }
}

/// Languages with known top-level declaration syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    /// TypeScript
    TypeScript,
    /// JavaScript
    JavaScript,
    /// Rust
    Rust,
    /// Python
    Python,
    /// Go
    Go,
}

impl Language {
    /// All supported languages
    pub const ALL: [Language; 5] = [
        Language::TypeScript,
        Language::JavaScript,
        Language::Rust,
        Language::Python,
        Language::Go,
    ];

    /// File extensions for this language
    #[inline]
    #[must_use]
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Language::TypeScript => &["ts", "tsx", "mts", "cts"],
            Language::JavaScript => &["js", "jsx", "mjs", "cjs"],
            Language::Rust => &["rs"],
            Language::Python => &["py"],
            Language::Go => &["go"],
        }
    }

    /// Language for a file extension
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        Self::ALL.into_iter().find(|l| l.extensions().contains(&ext.as_str()))
    }

    /// Language of the file at `path`, by extension
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    fn declarations(self) -> &'static RegexSet {
        match self {
            // JS shares the TS set; the TS-only forms never match plain JS
            Language::TypeScript | Language::JavaScript => &*ECMASCRIPT_DECLARATIONS,
            Language::Rust => &*RUST_DECLARATIONS,
            Language::Python => &*PYTHON_DECLARATIONS,
            Language::Go => &*GO_DECLARATIONS,
        }
    }
}

static ECMASCRIPT_DECLARATIONS: Lazy<RegexSet> = Lazy::new(|| {
    declaration_set(&[
        r"^(export\s+)?(default\s+)?(async\s+)?function\*?\s+[A-Za-z_$][\w$]*",
        r"^(export\s+)?(default\s+)?(abstract\s+)?class\s+[A-Za-z_$]",
        r"^(export\s+)?(declare\s+)?interface\s+[A-Za-z_$]",
        r"^(export\s+)?(declare\s+)?type\s+[A-Za-z_$][\w$]*\s*(<[^>]*>)?\s*=",
        r"^(export\s+)?(declare\s+)?(const\s+)?enum\s+[A-Za-z_$]",
        r"^export\s+(const|let|var)\s+[A-Za-z_$]",
        r"^export\s+(default\b|\{|\*)",
        r"^(const|let|var)\s+[A-Za-z_$][\w$]*\s*=\s*(async\s+)?(\([^)]*\)|[A-Za-z_$][\w$]*)\s*=>",
    ])
});

static RUST_DECLARATIONS: Lazy<RegexSet> = Lazy::new(|| {
    declaration_set(&[
        r#"^(pub(\([^)]*\))?\s+)?(const\s+)?(async\s+)?(unsafe\s+)?(extern\s+"[^"]*"\s+)?fn\s+\w+"#,
        r"^(pub(\([^)]*\))?\s+)?(struct|enum|trait|type|union|mod)\s+\w+",
        r"^impl\b",
        r"^macro_rules!\s*\w+",
    ])
});

static PYTHON_DECLARATIONS: Lazy<RegexSet> =
    Lazy::new(|| declaration_set(&[r"^(async\s+)?def\s+\w+", r"^class\s+\w+"]));

static GO_DECLARATIONS: Lazy<RegexSet> = Lazy::new(|| {
    declaration_set(&[
        r"^func\s+(\([^)]*\)\s*)?\w+",
        r"^type\s+\w+\s+(struct|interface)\b",
    ])
});

fn declaration_set(patterns: &[&str]) -> RegexSet {
    RegexSet::new(patterns).expect("declaration patterns are valid regexes")
}

/// Line-level comparison of two normalized texts
#[derive(Debug, Clone, PartialEq)]
pub struct DiffSummary {
    /// Lines in the previous text
    pub previous_len: usize,
    /// Lines in the new text
    pub next_len: usize,
    /// New lines absent from the previous line set (duplicates counted)
    pub added: Vec<String>,
    /// Previous lines absent from the new line set (duplicates counted)
    pub removed: Vec<String>,
    /// Share of new lines already present in the previous text
    pub overlap_ratio: f64,
}

impl DiffSummary {
    /// Compare two texts after normalization
    #[must_use]
    pub fn compute(previous: &str, next: &str) -> Self {
        let previous = normalize(previous);
        let next = normalize(next);
        let prev_lines: Vec<&str> = previous.lines().collect();
        let next_lines: Vec<&str> = next.lines().collect();
        let prev_set: HashSet<&str> = prev_lines.iter().copied().collect();
        let next_set: HashSet<&str> = next_lines.iter().copied().collect();

        let added: Vec<String> = next_lines
            .iter()
            .filter(|l| !prev_set.contains(*l))
            .map(|l| (*l).to_string())
            .collect();
        let removed: Vec<String> = prev_lines
            .iter()
            .filter(|l| !next_set.contains(*l))
            .map(|l| (*l).to_string())
            .collect();

        let overlap_ratio = if next_lines.is_empty() {
            if prev_lines.is_empty() { 1.0 } else { 0.0 }
        } else {
            let shared = next_lines.len() - added.len();
            shared as f64 / next_lines.len() as f64
        };

        Self {
            previous_len: prev_lines.len(),
            next_len: next_lines.len(),
            added,
            removed,
            overlap_ratio,
        }
    }

    /// `|added| - |removed|`
    #[inline]
    #[must_use]
    pub fn net_additions(&self) -> i64 {
        self.added.len() as i64 - self.removed.len() as i64
    }
}

/// Unify line endings and strip trailing whitespace per line
#[must_use]
pub fn normalize(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Default classifier: normalized line-set heuristics plus declaration
/// detection
#[derive(Debug, Clone)]
pub struct HeuristicClassifier {
    languages: Vec<Language>,
}

impl HeuristicClassifier {
    /// Minimum overlap for a same-size edit to count as a reshuffle
    pub const REORDER_OVERLAP: f64 = 0.85;
    /// Maximum line-count drift for a reshuffle
    pub const REORDER_MAX_DRIFT: usize = 2;
    /// Net added lines that always count as growth
    pub const GROWTH_LINES: i64 = 5;
    /// Net growth relative to the previous length that counts as growth
    pub const GROWTH_RATIO: f64 = 0.2;
    /// Upper bound on net additions and removals for a small edit
    pub const SMALL_EDIT_LINES: i64 = 2;

    /// Classifier recognizing declarations of every supported language
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            languages: Language::ALL.to_vec(),
        }
    }

    /// Classifier recognizing declarations of one language only
    #[inline]
    #[must_use]
    pub fn for_language(language: Language) -> Self {
        Self {
            languages: vec![language],
        }
    }

    /// Does any added line open a top-level declaration?
    #[must_use]
    pub fn declares_new_symbol(&self, added: &[String]) -> bool {
        declares_in(&self.languages, added)
    }

    /// Rules 1-8 with declaration detection limited to `languages`
    fn classify_with(&self, languages: &[Language], previous: Option<&str>, next: &str) -> MutationClass {
        let Some(previous) = previous else {
            return MutationClass::BehavioralChange;
        };

        if normalize(previous) == normalize(next) {
            return MutationClass::StructuralRefactor;
        }

        let diff = DiffSummary::compute(previous, next);
        let net = diff.net_additions();

        if diff.next_len.abs_diff(diff.previous_len) <= Self::REORDER_MAX_DRIFT
            && diff.overlap_ratio >= Self::REORDER_OVERLAP
        {
            return MutationClass::StructuralRefactor;
        }

        if declares_in(languages, &diff.added) {
            return MutationClass::BehavioralChange;
        }

        if net >= Self::GROWTH_LINES || net as f64 >= Self::GROWTH_RATIO * diff.previous_len as f64 {
            return MutationClass::BehavioralChange;
        }

        if net <= Self::SMALL_EDIT_LINES && diff.removed.len() as i64 <= Self::SMALL_EDIT_LINES {
            return MutationClass::StructuralRefactor;
        }

        MutationClass::BehavioralChange
    }
}

fn declares_in(languages: &[Language], added: &[String]) -> bool {
    added
        .iter()
        .any(|line| languages.iter().any(|lang| lang.declarations().is_match(line)))
}

impl Default for HeuristicClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl MutationClassifier for HeuristicClassifier {
    fn classify(&self, previous: Option<&str>, next: &str) -> MutationClass {
        self.classify_with(&self.languages, previous, next)
    }

    /// Only the declarations of the file's own language count; files of
    /// other or unknown types skip declaration detection
    fn classify_path(&self, path: &str, previous: Option<&str>, next: &str) -> MutationClass {
        match Language::from_path(path).filter(|l| self.languages.contains(l)) {
            Some(language) => self.classify_with(&[language], previous, next),
            None => self.classify_with(&[], previous, next),
        }
    }

    fn name(&self) -> &'static str {
        "heuristic"
    }
}
