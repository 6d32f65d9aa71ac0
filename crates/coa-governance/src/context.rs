//! Intent context bundle
//!
//! What an agent receives when it selects an intent: the declared scope,
//! constraints and acceptance criteria, plus recent ledger history for the
//! intent, rendered as an `<intent_context>` block for the model prompt.

use coa_intent::{Intent, IntentId, SpecStore};
use coa_trace::{LedgerReader, TraceRecord};
use serde::Serialize;

/// Intent plus its recent trace history
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntentContext {
    pub intent: Intent,
    /// Newest first
    pub recent: Vec<TraceRecord>,
}

impl IntentContext {
    /// Look up `id` and gather up to `limit` recent related records
    ///
    /// Returns `None` when the intent is not declared. An unreadable ledger
    /// contributes no history.
    pub async fn load(
        spec: &SpecStore,
        ledger: &LedgerReader,
        id: &IntentId,
        limit: usize,
    ) -> Option<Self> {
        let intent = spec.lookup(id).await?;
        let recent = match ledger.recent_for_intent(id, limit).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(intent = %id, "ledger unreadable, omitting history: {e}");
                Vec::new()
            }
        };
        Some(Self { intent, recent })
    }

    /// Prompt-ready block
    #[must_use]
    pub fn render(&self) -> String {
        let intent = &self.intent;
        let mut out = String::from("<intent_context>\n");
        out.push_str(&format!("  <id>{}</id>\n", escape(intent.id.as_str())));
        if let Some(name) = &intent.name {
            out.push_str(&format!("  <name>{}</name>\n", escape(name)));
        }
        if let Some(status) = intent.status {
            out.push_str(&format!("  <status>{}</status>\n", status.as_str()));
        }

        render_list(&mut out, "owned_scope", "pattern", intent.owned_scope.patterns());
        render_list(&mut out, "constraints", "constraint", &intent.constraints);
        render_list(
            &mut out,
            "acceptance_criteria",
            "criterion",
            &intent.acceptance_criteria,
        );

        if !self.recent.is_empty() {
            out.push_str("  <recent_history>\n");
            for record in &self.recent {
                for file in record.files.iter().filter(|f| f.related_intent.as_ref() == Some(&intent.id)) {
                    let span = file
                        .ranges
                        .iter()
                        .map(|r| format!("{}-{}", r.start_line, r.end_line))
                        .collect::<Vec<_>>()
                        .join(",");
                    out.push_str(&format!(
                        "    <entry timestamp=\"{}\" class=\"{}\">{}:{}</entry>\n",
                        record.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
                        file.mutation_class,
                        escape(&file.relative_path.to_string()),
                        span,
                    ));
                }
            }
            out.push_str("  </recent_history>\n");
        }

        out.push_str("</intent_context>");
        out
    }
}

fn render_list(out: &mut String, tag: &str, item: &str, values: &[String]) {
    if values.is_empty() {
        return;
    }
    out.push_str(&format!("  <{tag}>\n"));
    for value in values {
        out.push_str(&format!("    <{item}>{}</{item}>\n", escape(value)));
    }
    out.push_str(&format!("  </{tag}>\n"));
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use coa_intent::IntentStatus;

    #[test]
    fn render_includes_declared_fields() {
        let mut intent = Intent::new("INT-001")
            .with_name("JWT <auth>")
            .with_status(IntentStatus::InProgress)
            .with_scope(["src/auth/**"]);
        intent.constraints.push("No new dependencies".to_string());

        let rendered = IntentContext {
            intent,
            recent: Vec::new(),
        }
        .render();

        assert!(rendered.starts_with("<intent_context>\n  <id>INT-001</id>"));
        assert!(rendered.contains("<name>JWT &lt;auth&gt;</name>"));
        assert!(rendered.contains("<status>IN_PROGRESS</status>"));
        assert!(rendered.contains("<pattern>src/auth/**</pattern>"));
        assert!(rendered.contains("<constraint>No new dependencies</constraint>"));
        assert!(!rendered.contains("acceptance_criteria"));
        assert!(!rendered.contains("recent_history"));
        assert!(rendered.ends_with("</intent_context>"));
    }

    #[tokio::test]
    async fn load_unknown_intent_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let spec = SpecStore::new(dir.path().join("active_intents.yaml"));
        let ledger = LedgerReader::new(dir.path().join("agent_trace.jsonl"));
        assert!(IntentContext::load(&spec, &ledger, &IntentId::new("INT-404"), 5)
            .await
            .is_none());
    }
}
