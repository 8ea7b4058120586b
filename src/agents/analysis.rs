//! Local analysis resolution.
//!
//! Analysis requests never leave the process: the board snapshot is counted
//! locally, the request is stripped from the outgoing operation list, and a
//! short narrative is produced with one follow-up completion call. When that
//! call fails the counts themselves become the summary.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use log::warn;

use crate::llm::{CompletionClient, CompletionRequest, Message};
use crate::types::board::BoardState;
use crate::types::colors::resolve_color;

/// Counts gathered from the board for a set of object ids.
#[derive(Debug, Clone, Default)]
pub struct AnalysisReport {
    pub total: usize,
    pub by_type: BTreeMap<String, usize>,
    pub by_color: BTreeMap<String, usize>,
    /// Texts of the matched objects, for summarization.
    pub texts: Vec<String>,
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} object(s)", self.total)?;
        if !self.by_type.is_empty() {
            let types: Vec<String> = self
                .by_type
                .iter()
                .map(|(t, n)| format!("{n} {t}"))
                .collect();
            write!(f, ": {}", types.join(", "))?;
        }
        Ok(())
    }
}

/// Count the referenced objects. Unknown ids are skipped.
pub fn resolve_analysis(object_ids: &[String], board: &BoardState) -> AnalysisReport {
    let mut report = AnalysisReport::default();
    for id in object_ids {
        let Some(obj) = board.find(id) else { continue };
        report.total += 1;
        *report.by_type.entry(obj.object_type.clone()).or_default() += 1;
        if let Some(color) = obj.display_color() {
            let key = resolve_color(color).unwrap_or_else(|| color.to_lowercase());
            *report.by_color.entry(key).or_default() += 1;
        }
        if let Some(text) = &obj.text {
            if !text.trim().is_empty() {
                report.texts.push(text.clone());
            }
        }
    }
    report
}

/// Turn a report into a short narrative answer to the user's question.
///
/// Falls back to the raw counts if the completion call fails; analysis is
/// never allowed to fail the whole command.
pub async fn narrate_analysis(
    client: &Arc<dyn CompletionClient>,
    command: &str,
    report: &AnalysisReport,
) -> String {
    let facts = serde_json::json!({
        "total": report.total,
        "byType": report.by_type,
        "byColor": report.by_color,
        "texts": report.texts,
    });
    let request = CompletionRequest::text(
        vec![
            Message::system(
                "You summarize whiteboard contents. Answer the user's question \
                 in one or two sentences using only the provided counts. Do not \
                 invent objects that are not in the counts.",
            ),
            Message::user(format!("Question: {command}\nCounts: {facts}")),
        ],
        0.3,
    );
    match client.complete(request).await {
        Ok(response) if !response.narrative().is_empty() => response.narrative().to_string(),
        Ok(_) => report.to_string(),
        Err(err) => {
            warn!("analysis narration failed, using raw counts: {err}");
            report.to_string()
        }
    }
}
