//! Completion-service abstraction.
//!
//! The whole pipeline suspends only at one point: an opaque async
//! request/response against a language-model completion service. This
//! module defines that seam — message and tool-schema contracts, the
//! [`CompletionClient`] trait, an OpenAI-compatible HTTP provider, and a
//! deterministic scripted client for tests. Provider-agnostic as long as
//! structured tool invocation is supported.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CompletionError;

pub mod openai;
pub mod scripted;

pub use openai::OpenAiCompletion;
pub use scripted::ScriptedCompletion;

// ---------------------------------------------------------------------------
// Messages and tool schemas
// ---------------------------------------------------------------------------

/// One chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".into(),
            content: content.into(),
        }
    }
}

/// JSON-schema description of one tool the model may invoke.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    /// JSON Schema object for the tool's arguments.
    pub parameters: Value,
}

impl ToolSchema {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// How the model must choose among the offered tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolChoice {
    /// The model decides whether to invoke a tool.
    Auto,
    /// The model must invoke some tool.
    Required,
    /// The model must invoke the named tool.
    Forced(String),
}

impl Default for ToolChoice {
    fn default() -> Self {
        ToolChoice::Auto
    }
}

// ---------------------------------------------------------------------------
// Request / response
// ---------------------------------------------------------------------------

/// One completion request. No streaming — the pipeline resumes only once
/// the full structured result returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    #[serde(default)]
    pub tools: Vec<ToolSchema>,
    #[serde(default)]
    pub tool_choice: ToolChoice,
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Ask the provider for a raw JSON object response (no tool schemas).
    #[serde(default)]
    pub json_mode: bool,
}

impl CompletionRequest {
    /// A plain text request with no tools.
    pub fn text(messages: Vec<Message>, temperature: f64) -> Self {
        Self {
            messages,
            tools: Vec::new(),
            tool_choice: ToolChoice::Auto,
            temperature: Some(temperature),
            json_mode: false,
        }
    }

    /// A structured-extraction request forced onto one tool.
    pub fn forced_tool(messages: Vec<Message>, tool: ToolSchema, temperature: f64) -> Self {
        let name = tool.name.clone();
        Self {
            messages,
            tools: vec![tool],
            tool_choice: ToolChoice::Forced(name),
            temperature: Some(temperature),
            json_mode: false,
        }
    }

    /// A request over a narrow tool set. The model picks which tools to
    /// invoke but must invoke at least one; agents built on this treat a
    /// tool-less reply as a failed run.
    pub fn with_tools(messages: Vec<Message>, tools: Vec<ToolSchema>, temperature: f64) -> Self {
        Self {
            messages,
            tools,
            tool_choice: ToolChoice::Required,
            temperature: Some(temperature),
            json_mode: false,
        }
    }

    /// A JSON-object-mode request (structured text, no tools).
    pub fn json(messages: Vec<Message>, temperature: f64) -> Self {
        Self {
            messages,
            tools: Vec::new(),
            tool_choice: ToolChoice::Auto,
            temperature: Some(temperature),
            json_mode: true,
        }
    }

    /// The concatenated user-visible text of this request. Used by the
    /// scripted client to key canned responses.
    pub fn flattened_text(&self) -> String {
        self.messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// One structured tool invocation returned by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub name: String,
    pub arguments: Value,
}

impl ToolInvocation {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// A full completion result: optional narrative text plus zero or more
/// structured tool invocations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub tool_invocations: Vec<ToolInvocation>,
}

impl CompletionResponse {
    /// A text-only response.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            tool_invocations: Vec::new(),
        }
    }

    /// A response carrying only tool invocations.
    pub fn from_invocations(tool_invocations: Vec<ToolInvocation>) -> Self {
        Self {
            text: None,
            tool_invocations,
        }
    }

    /// The first tool invocation, for forced-tool extraction calls.
    pub fn first_invocation(&self) -> Option<&ToolInvocation> {
        self.tool_invocations.first()
    }

    /// Whether the response contains nothing usable.
    pub fn is_empty(&self) -> bool {
        self.tool_invocations.is_empty() && self.narrative().is_empty()
    }

    /// The trimmed narrative text, empty when absent.
    pub fn narrative(&self) -> &str {
        self.text.as_deref().map_or("", str::trim)
    }
}

// ---------------------------------------------------------------------------
// CompletionClient trait
// ---------------------------------------------------------------------------

/// The one external suspension point of the pipeline.
///
/// Implementations must be cheap to share behind an `Arc` — the
/// orchestrator clones the handle into every spawned batch task.
#[async_trait]
pub trait CompletionClient: Send + Sync + fmt::Debug {
    /// Issue one completion call and wait for the full structured result.
    async fn complete(&self, request: CompletionRequest)
        -> Result<CompletionResponse, CompletionError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_forced_tool_request_carries_choice() {
        let schema = ToolSchema::new("classify", "Classify", json!({"type": "object"}));
        let req = CompletionRequest::forced_tool(vec![Message::user("hi")], schema, 0.0);
        assert_eq!(req.tool_choice, ToolChoice::Forced("classify".into()));
        assert_eq!(req.tools.len(), 1);
    }

    #[test]
    fn test_with_tools_requires_a_tool_invocation() {
        let schema = ToolSchema::new("createShape", "Create", json!({"type": "object"}));
        let req = CompletionRequest::with_tools(vec![Message::user("add a circle")], vec![schema], 0.2);
        assert_eq!(req.tool_choice, ToolChoice::Required);
        assert!(!req.json_mode);
    }

    #[test]
    fn test_empty_response_detection() {
        assert!(CompletionResponse::default().is_empty());
        assert!(CompletionResponse::from_text("   ").is_empty());
        assert!(!CompletionResponse::from_text("ok").is_empty());
        let resp = CompletionResponse::from_invocations(vec![ToolInvocation::new(
            "createShape",
            json!({}),
        )]);
        assert!(!resp.is_empty());
    }
}
