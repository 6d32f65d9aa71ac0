//! Tolerant parser for the intent specification file
//!
//! The file is YAML-shaped but only a narrow, line-oriented subset is read:
//!
//! ```text
//! active_intents:
//!   - id: "INT-001"                 # item line with `id:` starts an intent
//!     name: "JWT Authentication"    # scalar
//!     status: IN_PROGRESS           # scalar
//!     owned_scope:                  # list key, consumes `- item` lines
//!       - "src/auth/**"
//!     constraints: ["No new deps"]  # inline flow list
//!     acceptance_criteria:
//!       - "Login tests pass"
//! ```
//!
//! Anything else (other keys, comments, malformed lines) is skipped one line
//! at a time. An intent opened by a `- id:` item ends at the next line
//! indented at or left of its `-`, so sibling top-level blocks are not read
//! into it. Parsing never fails.

use crate::intent::{Intent, IntentId, IntentSpec, IntentStatus};
use coa_artifact::OwnedScope;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListField {
    OwnedScope,
    Constraints,
    AcceptanceCriteria,
}

impl ListField {
    fn from_key(key: &str) -> Option<Self> {
        match key {
            "owned_scope" => Some(Self::OwnedScope),
            "constraints" => Some(Self::Constraints),
            "acceptance_criteria" => Some(Self::AcceptanceCriteria),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct Draft {
    id: String,
    name: Option<String>,
    status: Option<IntentStatus>,
    owned_scope: Vec<String>,
    constraints: Vec<String>,
    acceptance_criteria: Vec<String>,
}

impl Draft {
    fn push(&mut self, field: ListField, value: String) {
        if value.is_empty() {
            return;
        }
        match field {
            ListField::OwnedScope => self.owned_scope.push(value),
            ListField::Constraints => self.constraints.push(value),
            ListField::AcceptanceCriteria => self.acceptance_criteria.push(value),
        }
    }

    fn finish(self) -> Option<Intent> {
        if self.id.is_empty() {
            return None;
        }
        Some(Intent {
            id: IntentId::new(self.id),
            name: self.name,
            status: self.status,
            owned_scope: OwnedScope::new(self.owned_scope),
            constraints: self.constraints,
            acceptance_criteria: self.acceptance_criteria,
        })
    }
}

/// Parse specification text into intents, in file order
#[must_use]
pub fn parse(text: &str) -> IntentSpec {
    let mut intents = Vec::new();
    let mut current: Option<Draft> = None;
    let mut list: Option<ListField> = None;
    // indent of the `-` that opened the current intent
    let mut item_indent: Option<usize> = None;

    for (index, raw) in text.lines().enumerate() {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let indent = raw.len() - raw.trim_start().len();
        let (is_item, body) = split_item(trimmed);

        if let Some(id) = value_for(body, "id") {
            if let Some(intent) = current.take().and_then(Draft::finish) {
                intents.push(intent);
            }
            current = Some(Draft {
                id: unquote(id),
                ..Draft::default()
            });
            item_indent = is_item.then_some(indent);
            list = None;
            continue;
        }

        if item_indent.is_some_and(|open| indent <= open) {
            if let Some(intent) = current.take().and_then(Draft::finish) {
                intents.push(intent);
            }
            item_indent = None;
            list = None;
            tracing::debug!(line = index + 1, "intent closed by outdented line");
            continue;
        }

        let Some(draft) = current.as_mut() else {
            continue;
        };

        if is_item {
            match list {
                Some(field) => draft.push(field, unquote(body)),
                None => tracing::debug!(line = index + 1, "list item outside a list, skipped"),
            }
            continue;
        }

        let Some((key, value)) = body.split_once(':') else {
            tracing::debug!(line = index + 1, "unrecognized line skipped");
            continue;
        };
        let key = key.trim();
        let value = value.trim();

        list = None;
        match key {
            "name" => {
                let name = unquote(value);
                if !name.is_empty() {
                    draft.name = Some(name);
                }
            }
            "status" => {
                let raw_status = unquote(value);
                match raw_status.parse::<IntentStatus>() {
                    Ok(status) => draft.status = Some(status),
                    Err(e) => tracing::debug!(line = index + 1, "{e}"),
                }
            }
            other => {
                if let Some(field) = ListField::from_key(other) {
                    if value.starts_with('[') {
                        for item in flow_items(value) {
                            draft.push(field, item);
                        }
                    } else {
                        list = Some(field);
                    }
                }
            }
        }
    }

    if let Some(intent) = current.and_then(Draft::finish) {
        intents.push(intent);
    }

    IntentSpec::new(intents)
}

/// Parse and return the first intent with `id`
#[must_use]
pub fn lookup(text: &str, id: &IntentId) -> Option<Intent> {
    parse(text).into_intents().into_iter().find(|i| &i.id == id)
}

/// Split a leading `- ` item marker off a trimmed line
fn split_item(line: &str) -> (bool, &str) {
    match line.strip_prefix('-') {
        Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => {
            (true, rest.trim_start())
        }
        _ => (false, line),
    }
}

/// `key: value` → `value` when the key matches exactly
fn value_for<'a>(body: &'a str, key: &str) -> Option<&'a str> {
    let (k, v) = body.split_once(':')?;
    (k.trim() == key).then(|| v.trim())
}

/// Strip surrounding quotes, or a trailing ` # comment` on unquoted values
fn unquote(value: &str) -> String {
    let value = value.trim();
    let quoted = value.starts_with('"') || value.starts_with('\'');
    let value = if quoted {
        value
    } else {
        value.split_once(" #").map_or(value, |(v, _)| v).trim_end()
    };
    value
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .to_string()
}

/// Items of an inline `[a, "b", 'c']` list
fn flow_items(value: &str) -> Vec<String> {
    let inner = value.trim_start_matches('[');
    let inner = inner.split_once(']').map_or(inner, |(i, _)| i);
    inner
        .split(',')
        .map(unquote)
        .filter(|s| !s.is_empty())
        .collect()
}
