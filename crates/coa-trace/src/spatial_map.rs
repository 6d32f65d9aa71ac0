//! Spatial map: which files each intent has behaviorally changed
//!
//! A human-readable markdown table keyed by intent id:
//!
//! ```markdown
//! # Intent Map
//!
//! | Intent | Name | Key Paths |
//! |--------|------|-----------|
//! | INT-001 | JWT auth | `src/auth/jwt.ts`, `src/auth/session.ts` |
//! ```
//!
//! Columns are located by header text ("intent"/"id", "name", "path"), so a
//! hand-edited table with extra columns keeps working. Updates are idempotent.

use crate::error::TraceError;
use coa_intent::IntentId;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const TITLE: &str = "# Intent Map";
const HEADER: &str = "| Intent | Name | Key Paths |";
const SEPARATOR: &str = "|--------|------|-----------|";

/// Result of a map update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapUpdate {
    /// File rewritten with the new path
    Updated,
    /// Path already listed for the intent
    Unchanged,
    /// Map directory missing; governance is disabled
    Skipped,
}

/// File-backed spatial map
#[derive(Debug, Clone)]
pub struct SpatialMap {
    path: PathBuf,
}

impl SpatialMap {
    /// Create a map backed by `path`
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record that `intent` behaviorally changed `file`
    ///
    /// # Errors
    /// `TraceError::Io` if the map cannot be read or written
    pub async fn record(
        &self,
        intent: &IntentId,
        name: Option<&str>,
        file: &str,
    ) -> Result<MapUpdate, TraceError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !tokio::fs::try_exists(parent).await.unwrap_or(false) {
                return Ok(MapUpdate::Skipped);
            }
        }

        let current = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
            Err(e) => return Err(TraceError::io(&self.path, e)),
        };

        let Some(updated) = upsert_path(&current, intent, name, file) else {
            return Ok(MapUpdate::Unchanged);
        };
        tokio::fs::write(&self.path, updated)
            .await
            .map_err(|e| TraceError::io(&self.path, e))?;

        tracing::info!(intent = %intent, path = file, "spatial map updated");
        Ok(MapUpdate::Updated)
    }
}

/// Column layout of an existing table
struct Layout {
    header_line: usize,
    width: usize,
    intent_col: usize,
    name_col: Option<usize>,
    path_col: usize,
}

impl Layout {
    fn detect(lines: &[&str]) -> Option<Self> {
        lines.windows(2).enumerate().find_map(|(i, pair)| {
            if !is_row(pair[0]) || !is_separator(pair[1]) {
                return None;
            }
            let headers: Vec<String> = split_cells(pair[0])
                .into_iter()
                .map(|h| h.to_ascii_lowercase())
                .collect();
            let width = headers.len();
            let find = |needle: &str| headers.iter().position(|h| h.contains(needle));
            Some(Self {
                header_line: i,
                width,
                intent_col: find("intent").or_else(|| find("id")).unwrap_or(0),
                name_col: find("name"),
                path_col: find("path").unwrap_or(width.saturating_sub(1)),
            })
        })
    }

    fn new_row(&self, intent: &IntentId, name: Option<&str>, file: &str) -> String {
        let mut cells = vec![String::new(); self.width.max(1)];
        cells[self.intent_col] = escape(intent.as_str());
        if let (Some(col), Some(name)) = (self.name_col, name) {
            cells[col] = escape(name);
        }
        cells[self.path_col] = render_paths(&[file.to_string()]);
        render_row(&cells)
    }
}

/// Insert `file` into `intent`'s key-path cell
///
/// Returns `None` when the path is already listed (nothing to write), else the
/// full new document. A missing row is appended to the table; a document with
/// no table gets one.
#[must_use]
pub fn upsert_path(markdown: &str, intent: &IntentId, name: Option<&str>, file: &str) -> Option<String> {
    let lines: Vec<&str> = markdown.lines().collect();

    let Some(layout) = Layout::detect(&lines) else {
        let mut out = if markdown.trim().is_empty() {
            format!("{TITLE}\n\n")
        } else {
            format!("{}\n\n", markdown.trim_end())
        };
        let layout = Layout {
            header_line: 0,
            width: 3,
            intent_col: 0,
            name_col: Some(1),
            path_col: 2,
        };
        out.push_str(HEADER);
        out.push('\n');
        out.push_str(SEPARATOR);
        out.push('\n');
        out.push_str(&layout.new_row(intent, name, file));
        out.push('\n');
        return Some(out);
    };

    let body_start = layout.header_line + 2;
    let body_end = lines[body_start..]
        .iter()
        .position(|l| !is_row(l))
        .map_or(lines.len(), |off| body_start + off);

    let mut out: Vec<String> = lines.iter().map(|l| (*l).to_string()).collect();

    let existing = (body_start..body_end).find(|&i| {
        split_cells(lines[i])
            .get(layout.intent_col)
            .is_some_and(|c| strip_ticks(c) == intent.as_str())
    });

    match existing {
        Some(i) => {
            let mut cells = split_cells(lines[i]);
            cells.resize(layout.width.max(cells.len()), String::new());
            let mut paths = parse_paths(&cells[layout.path_col]);
            if paths.iter().any(|p| p == file) {
                return None;
            }
            paths.push(file.to_string());
            cells[layout.path_col] = render_paths(&paths);
            out[i] = render_row(&cells);
        }
        None => out.insert(body_end, layout.new_row(intent, name, file)),
    }

    let mut text = out.join("\n");
    text.push('\n');
    Some(text)
}

fn is_row(line: &str) -> bool {
    line.trim_start().starts_with('|')
}

fn is_separator(line: &str) -> bool {
    let cells = split_cells(line);
    !cells.is_empty()
        && cells
            .iter()
            .all(|c| !c.is_empty() && c.chars().all(|ch| matches!(ch, '-' | ':' | ' ')))
}

/// Split a table row into trimmed raw cells; `\|` does not split
fn split_cells(line: &str) -> Vec<String> {
    let inner = line.trim();
    let inner = inner.strip_prefix('|').unwrap_or(inner);
    let inner = match inner.strip_suffix('|') {
        Some(rest) if !rest.ends_with('\\') => rest,
        _ => inner,
    };

    let mut cells = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    for ch in inner.chars() {
        match ch {
            '|' if !escaped => cells.push(std::mem::take(&mut current).trim().to_string()),
            _ => current.push(ch),
        }
        escaped = ch == '\\' && !escaped;
    }
    cells.push(current.trim().to_string());
    cells
}

fn render_row(cells: &[String]) -> String {
    format!("| {} |", cells.join(" | "))
}

fn escape(value: &str) -> String {
    value.replace('|', "\\|")
}

fn strip_ticks(cell: &str) -> &str {
    cell.trim().trim_matches('`')
}

fn parse_paths(cell: &str) -> Vec<String> {
    cell.split(',')
        .map(|p| strip_ticks(p).replace("\\|", "|"))
        .filter(|p| !p.is_empty())
        .collect()
}

fn render_paths(paths: &[String]) -> String {
    paths
        .iter()
        .map(|p| format!("`{}`", escape(p)))
        .collect::<Vec<_>>()
        .join(", ")
}
