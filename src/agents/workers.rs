//! The worker-agent registry.
//!
//! Workers are narrow prompt+tool bundles the orchestrator delegates tasks
//! to. Each worker sees only its own tool subset, which keeps the model from
//! reaching for unrelated operations mid-task.

use std::sync::Arc;

use log::debug;
use serde_json::Value;

use crate::agents::schemas::schemas_for;
use crate::error::{CompletionError, PipelineError};
use crate::llm::{CompletionClient, CompletionRequest, Message};
use crate::types::tool_call::{ToolCall, ToolName};

/// One registered worker.
#[derive(Debug, Clone)]
pub struct WorkerAgent {
    pub name: &'static str,
    pub role: &'static str,
    pub goal: &'static str,
    pub tools: &'static [ToolName],
}

/// Every worker the orchestrator may name in a plan.
pub const WORKER_AGENTS: &[WorkerAgent] = &[
    WorkerAgent {
        name: "CreateAgent",
        role: "Board object creator",
        goal: "Create sticky notes, shapes, text, and frames exactly as \
               described, one creation call per object kind.",
        tools: &[
            ToolName::CreateStickyNote,
            ToolName::CreateShape,
            ToolName::CreateText,
            ToolName::CreateTextBubble,
            ToolName::CreateFrame,
        ],
    },
    WorkerAgent {
        name: "ConnectAgent",
        role: "Connector specialist",
        goal: "Draw connectors between the objects named in the task, using \
               the supplied object ids.",
        tools: &[ToolName::CreateConnector],
    },
    WorkerAgent {
        name: "ColorAgent",
        role: "Color editor",
        goal: "Change object colors to the requested hex values.",
        tools: &[ToolName::ChangeColor],
    },
    WorkerAgent {
        name: "MoveAgent",
        role: "Position editor",
        goal: "Move objects to the requested absolute positions.",
        tools: &[ToolName::MoveObject],
    },
    WorkerAgent {
        name: "ResizeAgent",
        role: "Size editor",
        goal: "Resize objects to the requested dimensions.",
        tools: &[ToolName::ResizeObject, ToolName::RotateObject],
    },
    WorkerAgent {
        name: "TextAgent",
        role: "Text editor",
        goal: "Replace object text with the requested content.",
        tools: &[ToolName::UpdateText],
    },
    WorkerAgent {
        name: "DeleteAgent",
        role: "Board cleaner",
        goal: "Delete exactly the objects the task names, batched into one \
               call.",
        tools: &[ToolName::DeleteObject],
    },
    WorkerAgent {
        name: "ArrangeAgent",
        role: "Layout tidier",
        goal: "Arrange the named objects into grids.",
        tools: &[ToolName::ArrangeInGrid, ToolName::ArrangeInGridAndResize],
    },
    WorkerAgent {
        name: "FrameAgent",
        role: "Frame manager",
        goal: "Create frames and fit them to their contents.",
        tools: &[ToolName::CreateFrame, ToolName::FitFrameToContents],
    },
    WorkerAgent {
        name: "AnalyzeAgent",
        role: "Board analyst",
        goal: "Report on what is on the board by requesting analysis over \
               the relevant object ids.",
        tools: &[ToolName::AnalyzeObjects],
    },
];

/// Look up a worker by the name a plan uses.
pub fn find_worker(name: &str) -> Option<&'static WorkerAgent> {
    WORKER_AGENTS.iter().find(|w| w.name == name)
}

impl WorkerAgent {
    /// Whether this worker's tools create board objects.
    pub fn is_creator(&self) -> bool {
        self.tools.iter().any(|t| t.is_creation())
    }

    fn system_prompt(&self) -> String {
        format!(
            "You are {role}. {goal} Use only the provided tools. Emit one \
             tool call per requested action and nothing else.",
            role = self.role,
            goal = self.goal,
        )
    }

    /// One completion call against this worker's tool subset.
    ///
    /// `board_context` is a serialized board snapshot; `known_ids` carries
    /// ids surfaced by earlier tasks so the model never guesses them.
    pub async fn run(
        &self,
        client: &Arc<dyn CompletionClient>,
        description: &str,
        board_context: &Value,
        known_ids: &[String],
    ) -> Result<Vec<ToolCall>, PipelineError> {
        let mut user = format!("Task: {description}\n\nBoard state: {board_context}");
        if !known_ids.is_empty() {
            user.push_str(&format!(
                "\n\nObject ids created by earlier steps, in creation order: {}",
                known_ids.join(", ")
            ));
        }
        let request = CompletionRequest::with_tools(
            vec![Message::system(self.system_prompt()), Message::user(user)],
            schemas_for(self.tools),
            0.0,
        );
        let response = client.complete(request).await?;
        if response.tool_invocations.is_empty() {
            return Err(PipelineError::Completion(CompletionError::Empty));
        }
        let mut calls = Vec::with_capacity(response.tool_invocations.len());
        for invocation in response.tool_invocations {
            let Some(name) = ToolName::parse(&invocation.name) else {
                debug!("{}: dropping unknown tool {}", self.name, invocation.name);
                continue;
            };
            // A worker may only use its own tools.
            if !self.tools.contains(&name) {
                debug!("{}: dropping out-of-scope tool {}", self.name, invocation.name);
                continue;
            }
            calls.push(ToolCall::new(name, invocation.arguments));
        }
        Ok(calls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{CompletionResponse, ScriptedCompletion, ToolInvocation};
    use serde_json::json;

    #[test]
    fn test_registry_lookup() {
        assert!(find_worker("CreateAgent").is_some());
        assert!(find_worker("ConnectAgent").is_some());
        assert!(find_worker("PaintAgent").is_none());
    }

    #[test]
    fn test_create_agent_is_creator() {
        assert!(find_worker("CreateAgent").is_some_and(|w| w.is_creator()));
        assert!(find_worker("DeleteAgent").is_some_and(|w| !w.is_creator()));
    }

    #[tokio::test]
    async fn test_out_of_scope_tools_are_dropped() {
        let scripted = ScriptedCompletion::new();
        scripted.enqueue(CompletionResponse::from_invocations(vec![
            ToolInvocation::new("changeColor", json!({"objectId": "a", "color": "#ef4444"})),
            ToolInvocation::new("deleteObject", json!({"objectIds": ["a"]})),
        ]));
        let client: Arc<dyn CompletionClient> = Arc::new(scripted);
        let worker = find_worker("ColorAgent").unwrap();
        let calls = worker
            .run(&client, "recolor a", &json!({"objects": []}), &[])
            .await
            .unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, ToolName::ChangeColor);
    }
}
