//! Agent registries and tier executors.
//!
//! Three execution shapes live here: pattern-bound mini agents with a
//! narrow tool set, a single agent with the full tool vocabulary, and a
//! complex supervisor that reasons over connected structures in one call.
//! All of them produce the same [`TierOutcome`].

pub mod analysis;
pub mod complex;
pub mod mini;
pub mod schemas;
pub mod single;
pub mod workers;

use std::sync::Arc;

use log::debug;
use serde_json::Value;

use crate::error::{CompletionError, PipelineError};
use crate::llm::{CompletionClient, CompletionRequest, Message};
use crate::agents::schemas::schemas_for;
use crate::types::board::BoardState;
use crate::types::tool_call::{ToolCall, ToolName};

pub use analysis::{narrate_analysis, resolve_analysis, AnalysisReport};
pub use complex::{execute_complex_supervisor, needs_complex_supervisor};
pub use mini::{detect_mini_agent, execute_mini_agent, MiniAgent};
pub use single::{execute_single_agent, is_single_agent_command};
pub use workers::{find_worker, WorkerAgent, WORKER_AGENTS};

/// What a tier hands back to the dispatcher.
#[derive(Debug, Clone)]
pub struct TierOutcome {
    pub tool_calls: Vec<ToolCall>,
    pub summary: String,
}

impl TierOutcome {
    pub fn new(tool_calls: Vec<ToolCall>, summary: impl Into<String>) -> Self {
        TierOutcome {
            tool_calls,
            summary: summary.into(),
        }
    }
}

/// Shared runner for the mini and single tiers: one completion call against
/// a tool subset, with analysis requests resolved locally.
///
/// Analysis requests never reach the output list. Their counts come from the
/// real board snapshot and one follow-up call turns them into narrative, so
/// the model cannot fabricate statistics.
pub(crate) async fn run_tool_agent(
    client: &Arc<dyn CompletionClient>,
    system_prompt: &str,
    message: &str,
    board: &BoardState,
    tools: &[ToolName],
) -> Result<TierOutcome, PipelineError> {
    let board_context = serde_json::to_value(board).unwrap_or(Value::Null);
    let request = CompletionRequest::with_tools(
        vec![
            Message::system(system_prompt),
            Message::user(format!(
                "Command: {message}\n\nBoard state: {board_context}"
            )),
        ],
        schemas_for(tools),
        0.0,
    );
    let response = client.complete(request).await?;
    if response.is_empty() {
        return Err(PipelineError::Completion(CompletionError::Empty));
    }
    let narrative = response.narrative().to_string();

    let mut tool_calls = Vec::new();
    let mut analysis_summary: Option<String> = None;
    for invocation in response.tool_invocations {
        let Some(name) = ToolName::parse(&invocation.name) else {
            debug!("dropping unknown tool {}", invocation.name);
            continue;
        };
        if !tools.contains(&name) {
            debug!("dropping out-of-scope tool {}", invocation.name);
            continue;
        }
        if name.is_analysis() {
            let ids = invocation.arguments["objectIds"]
                .as_array()
                .map(|a| {
                    a.iter()
                        .filter_map(|v| v.as_str().map(String::from))
                        .collect::<Vec<_>>()
                })
                .unwrap_or_else(|| board.all_ids());
            let report = analysis::resolve_analysis(&ids, board);
            analysis_summary = Some(analysis::narrate_analysis(client, message, &report).await);
            continue;
        }
        tool_calls.push(ToolCall::new(name, invocation.arguments));
    }

    let summary = match analysis_summary {
        Some(analysis) => analysis,
        None if narrative.is_empty() => format!("Issued {} operation(s)", tool_calls.len()),
        None => narrative,
    };
    Ok(TierOutcome::new(tool_calls, summary))
}
