//! Complex-structure supervisor.
//!
//! Commands naming connected arrangements (cycles, hierarchies, timelines)
//! need relational reasoning but not task decomposition. One JSON-mode
//! completion call produces an action list; creation actions become creation
//! requests and connector actions resolve by index against the freshly
//! created objects, or by id against the existing board.

use std::sync::Arc;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::agents::TierOutcome;
use crate::error::{CompletionError, PipelineError};
use crate::llm::{CompletionClient, CompletionRequest, Message};
use crate::types::board::BoardState;
use crate::types::colors::resolve_color;
use crate::types::tool_call::{ToolCall, ToolName};

static STRUCTURE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\b(cycle|cyclic|circular\s+(?:flow|process)|loop\s+of)\b",
        r"(?i)\b(hierarch\w*|org\s*chart|organization\s+chart|tree\s+(?:of|with)|\d+\s+levels?)\b",
        r"(?i)\btimeline\b",
        r"(?i)\b\d+\s+connected\b",
        r"(?i)\blinear\s+(?:layout|chain|sequence)\s+of\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Whether the command names a connected domain or spatial structure.
pub fn needs_complex_supervisor(message: &str) -> bool {
    STRUCTURE_PATTERNS.iter().any(|re| re.is_match(message))
}

const SUPERVISOR_PROMPT: &str = "You plan connected whiteboard structures. \
    Respond with JSON only: {\"plan\": [{\"action\": ..., \"params\": ...}], \
    \"summary\": \"...\"}. Actions: create_sticky, create_shape, create_text, \
    create_frame (params: text/type/color/x/y/width/height), and connect \
    (params: from/to, each either the 0-based index of an earlier create \
    action in this plan, or an existing board object id; optional label). \
    Lay out positions yourself so the structure reads clearly.";

#[derive(Debug, Deserialize)]
struct SupervisorPlan {
    #[serde(default)]
    plan: Vec<SupervisorAction>,
    #[serde(default)]
    summary: String,
}

#[derive(Debug, Deserialize)]
struct SupervisorAction {
    action: String,
    #[serde(default)]
    params: Value,
}

fn creation_tool(action: &str) -> Option<ToolName> {
    match action {
        "create_sticky" | "create_sticky_note" => Some(ToolName::CreateStickyNote),
        "create_shape" => Some(ToolName::CreateShape),
        "create_text" => Some(ToolName::CreateText),
        "create_text_bubble" => Some(ToolName::CreateTextBubble),
        "create_frame" => Some(ToolName::CreateFrame),
        _ => None,
    }
}

/// An endpoint is either an index into this plan's creations or a board id.
#[derive(Debug)]
enum Endpoint {
    Index(usize),
    Id(String),
}

fn connector_endpoint(value: &Value, board: &BoardState) -> Option<Endpoint> {
    match value {
        Value::Number(n) => Some(Endpoint::Index(n.as_u64()? as usize)),
        Value::String(s) => {
            if board.find(s).is_some() {
                Some(Endpoint::Id(s.clone()))
            } else {
                s.parse::<usize>().ok().map(Endpoint::Index)
            }
        }
        _ => None,
    }
}

/// One full-reasoning call, no task decomposition.
pub async fn execute_complex_supervisor(
    client: &Arc<dyn CompletionClient>,
    message: &str,
    board: &BoardState,
) -> Result<TierOutcome, PipelineError> {
    let board_context = serde_json::to_value(board).unwrap_or(Value::Null);
    let request = CompletionRequest::json(
        vec![
            Message::system(SUPERVISOR_PROMPT),
            Message::user(format!(
                "Command: {message}\n\nBoard state: {board_context}"
            )),
        ],
        0.2,
    );
    let response = client.complete(request).await?;
    let plan: SupervisorPlan = serde_json::from_str(response.narrative()).map_err(|e| {
        PipelineError::Completion(CompletionError::Malformed(format!(
            "supervisor plan: {e}"
        )))
    })?;
    if plan.plan.is_empty() {
        return Err(PipelineError::Completion(CompletionError::Empty));
    }

    let mut tool_calls: Vec<ToolCall> = Vec::new();
    // Maps a plan-level creation index to its position in the output list.
    let mut creation_positions: Vec<usize> = Vec::new();

    for action in &plan.plan {
        if let Some(tool) = creation_tool(&action.action) {
            let mut params = action.params.clone();
            if let Some(obj) = params.as_object_mut() {
                if let Some(color) = obj.get("color").and_then(Value::as_str) {
                    if let Some(hex) = resolve_color(color) {
                        obj.insert("color".into(), json!(hex));
                    }
                }
            }
            creation_positions.push(tool_calls.len());
            tool_calls.push(ToolCall::new(tool, params));
        } else if action.action == "connect" {
            let from = connector_endpoint(&action.params["from"], board);
            let to = connector_endpoint(&action.params["to"], board);
            let (Some(from), Some(to)) = (from, to) else {
                debug!("skipping connector with unresolvable endpoints");
                continue;
            };
            let mut args = serde_json::Map::new();
            let mut resolvable = true;
            for (endpoint, id_key, index_key) in
                [(from, "fromId", "fromIndex"), (to, "toId", "toIndex")]
            {
                match endpoint {
                    Endpoint::Id(id) => {
                        args.insert(id_key.into(), json!(id));
                    }
                    // Indexes address creations in plan order; remap to the
                    // request's position in the output list.
                    Endpoint::Index(plan_index) => {
                        let Some(&position) = creation_positions.get(plan_index) else {
                            debug!("skipping connector to out-of-range index {plan_index}");
                            resolvable = false;
                            break;
                        };
                        args.insert(index_key.into(), json!(position));
                    }
                }
            }
            if !resolvable {
                continue;
            }
            if let Some(label) = action.params.get("label") {
                if !label.is_null() {
                    args.insert("label".into(), label.clone());
                }
            }
            tool_calls.push(ToolCall::new(ToolName::CreateConnector, Value::Object(args)));
        } else {
            debug!("skipping unknown supervisor action {}", action.action);
        }
    }

    let summary = if plan.summary.is_empty() {
        format!("Built a connected structure with {} operation(s)", tool_calls.len())
    } else {
        plan.summary
    };
    Ok(TierOutcome::new(tool_calls, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{CompletionResponse, ScriptedCompletion};

    #[test]
    fn test_structure_detection() {
        assert!(needs_complex_supervisor("create a cycle of 4 connected nodes"));
        assert!(needs_complex_supervisor("draw an org chart with 3 levels"));
        assert!(needs_complex_supervisor("make a timeline of the project"));
        assert!(!needs_complex_supervisor("create 5 red circles"));
        assert!(!needs_complex_supervisor("delete all stickies"));
    }

    #[tokio::test]
    async fn test_connectors_resolve_by_index_into_creations() {
        let scripted = ScriptedCompletion::new();
        scripted.enqueue(CompletionResponse::from_text(
            r#"{
                "plan": [
                    {"action": "create_shape", "params": {"type": "circle", "text": "A", "x": 0, "y": 0}},
                    {"action": "create_shape", "params": {"type": "circle", "text": "B", "x": 200, "y": 0}},
                    {"action": "connect", "params": {"from": 0, "to": 1}},
                    {"action": "connect", "params": {"from": 1, "to": 0}}
                ],
                "summary": "A two-node cycle"
            }"#,
        ));
        let client: Arc<dyn CompletionClient> = Arc::new(scripted);
        let outcome =
            execute_complex_supervisor(&client, "cycle of 2 connected nodes", &BoardState::empty())
                .await
                .unwrap();
        assert_eq!(outcome.tool_calls.len(), 4);
        assert_eq!(outcome.tool_calls[2].num_arg("fromIndex"), Some(0.0));
        assert_eq!(outcome.tool_calls[2].num_arg("toIndex"), Some(1.0));
        assert_eq!(outcome.summary, "A two-node cycle");
    }

    #[tokio::test]
    async fn test_connectors_resolve_board_ids() {
        use crate::types::board::BoardObject;
        let mut board = BoardState::empty();
        board.objects.push(BoardObject::new("n1", "circle", 0.0, 0.0));
        board.objects.push(BoardObject::new("n2", "circle", 200.0, 0.0));

        let scripted = ScriptedCompletion::new();
        scripted.enqueue(CompletionResponse::from_text(
            r#"{"plan": [{"action": "connect", "params": {"from": "n1", "to": "n2"}}], "summary": "linked"}"#,
        ));
        let client: Arc<dyn CompletionClient> = Arc::new(scripted);
        let outcome = execute_complex_supervisor(&client, "connect them in a cycle", &board)
            .await
            .unwrap();
        assert_eq!(outcome.tool_calls.len(), 1);
        assert_eq!(outcome.tool_calls[0].str_arg("fromId"), Some("n1"));
        assert_eq!(outcome.tool_calls[0].str_arg("toId"), Some("n2"));
    }

    #[tokio::test]
    async fn test_malformed_plan_is_recoverable() {
        let scripted = ScriptedCompletion::new();
        scripted.enqueue(CompletionResponse::from_text("not json at all"));
        let client: Arc<dyn CompletionClient> = Arc::new(scripted);
        let result =
            execute_complex_supervisor(&client, "a cycle of things", &BoardState::empty()).await;
        match result {
            Err(err) => assert!(err.is_recoverable()),
            Ok(_) => panic!("expected a malformed-plan error"),
        }
    }
}
