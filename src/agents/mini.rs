//! The mini-agent registry.
//!
//! Mini agents are single-purpose handlers bound to command patterns. The
//! matcher is ordered (templates before generic creation) and excludes
//! multi-object creations, which need grid placement a mini agent cannot do.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::agents::{run_tool_agent, TierOutcome};
use crate::error::PipelineError;
use crate::llm::CompletionClient;
use crate::types::board::BoardState;
use crate::types::tool_call::ToolName;

/// One registered mini agent.
#[derive(Debug)]
pub struct MiniAgent {
    pub name: &'static str,
    /// Command pattern; first match in registry order wins.
    pattern: &'static str,
    /// Creation agents are skipped for quantity > 1.
    creates: bool,
    prompt: &'static str,
    tools: &'static [ToolName],
}

// Order matters: templates first, generic creation last among creators.
static MINI_AGENTS: &[MiniAgent] = &[
    MiniAgent {
        name: "swot_template",
        pattern: r"(?i)\bswot\b",
        creates: true,
        prompt: "Build a SWOT template: four frames titled Strengths, \
                 Weaknesses, Opportunities, Threats in a 2x2 arrangement, \
                 each with one starter sticky note inside.",
        tools: &[ToolName::CreateFrame, ToolName::CreateStickyNote],
    },
    MiniAgent {
        name: "sticky_create",
        pattern: r"(?i)\b(create|add|make|draw|place|put)\b.*\b(sticky|note)\b",
        creates: true,
        prompt: "Create exactly one sticky note matching the command. Use \
                 the requested color and text when given.",
        tools: &[ToolName::CreateStickyNote],
    },
    MiniAgent {
        name: "shape_create",
        pattern: r"(?i)\b(create|add|make|draw|place|put)\b.*\b(rectangle|circle|ellipse|triangle|diamond|star|hexagon|arrow|shape)\b",
        creates: true,
        prompt: "Create exactly one shape matching the command. Use the \
                 requested shape type and color.",
        tools: &[ToolName::CreateShape],
    },
    MiniAgent {
        name: "color_change",
        pattern: r"(?i)\b(recolor|change\s+(?:the\s+)?colou?r|make\s+(?:it|them|this|these)\s+\w+)\b",
        creates: false,
        prompt: "Change the color of the objects the command refers to, \
                 using their ids from the board state.",
        tools: &[ToolName::ChangeColor],
    },
    MiniAgent {
        name: "move",
        pattern: r"(?i)\b(move|shift|nudge)\b",
        creates: false,
        prompt: "Move the objects the command refers to, using their ids \
                 and current positions from the board state.",
        tools: &[ToolName::MoveObject],
    },
    MiniAgent {
        name: "delete",
        pattern: r"(?i)\b(delete|remove|clear)\b",
        creates: false,
        prompt: "Delete the objects the command refers to, batching all ids \
                 into one call.",
        tools: &[ToolName::DeleteObject],
    },
    MiniAgent {
        name: "resize",
        pattern: r"(?i)\b(resize|bigger|smaller|larger|shrink|grow|enlarge)\b",
        creates: false,
        prompt: "Resize the objects the command refers to.",
        tools: &[ToolName::ResizeObject],
    },
    MiniAgent {
        name: "rotate",
        pattern: r"(?i)\b(rotate|turn|tilt)\b",
        creates: false,
        prompt: "Rotate the objects the command refers to by the requested \
                 degrees (90 if unspecified).",
        tools: &[ToolName::RotateObject],
    },
    MiniAgent {
        name: "text_update",
        pattern: r"(?i)\b(rename|relabel|change\s+(?:the\s+)?text|update\s+(?:the\s+)?text|say)\b",
        creates: false,
        prompt: "Replace the text of the objects the command refers to.",
        tools: &[ToolName::UpdateText],
    },
    MiniAgent {
        name: "fit_frame",
        pattern: r"(?i)\bfit\s+(?:the\s+)?frame\b",
        creates: false,
        prompt: "Fit the referenced frame to its contents.",
        tools: &[ToolName::FitFrameToContents],
    },
    MiniAgent {
        name: "organize",
        pattern: r"(?i)\b(organize|tidy|arrange|align|grid)\b",
        creates: false,
        prompt: "Arrange the objects the command refers to into a grid.",
        tools: &[ToolName::ArrangeInGrid, ToolName::ArrangeInGridAndResize],
    },
    MiniAgent {
        name: "analyze",
        pattern: r"(?i)\b(analyze|count|how many|what(?:'s| is) on|summarize|describe)\b",
        creates: false,
        prompt: "Request analysis over the object ids the command refers \
                 to, or all ids when the command is about the whole board.",
        tools: &[ToolName::AnalyzeObjects],
    },
];

static COMPILED: Lazy<Vec<(Regex, &'static MiniAgent)>> = Lazy::new(|| {
    MINI_AGENTS
        .iter()
        .map(|agent| (Regex::new(agent.pattern).unwrap(), agent))
        .collect()
});

static MULTI_QUANTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([2-9]|[1-9]\d+)\b").unwrap());

/// Match a command against the registry, in order.
///
/// Creation agents are skipped when the command asks for more than one
/// object. Modification agents without an explicit target still need a
/// selection to act on.
pub fn detect_mini_agent(message: &str, has_selection: bool) -> Option<&'static str> {
    for (re, agent) in COMPILED.iter() {
        if !re.is_match(message) {
            continue;
        }
        if agent.creates && MULTI_QUANTITY.is_match(message) {
            continue;
        }
        if !agent.creates && agent.name != "analyze" && !has_selection && !mentions_target(message)
        {
            continue;
        }
        return Some(agent.name);
    }
    None
}

/// Whether the command names its own target ("the red circle", "all notes").
fn mentions_target(message: &str) -> bool {
    static TARGET: Lazy<Regex> = Lazy::new(|| {
        Regex::new(
            r"(?i)\b(all|every|the\s+\w+|circles?|rectangles?|sticki?e?s?|notes?|shapes?|frames?|text)\b",
        )
        .unwrap()
    });
    TARGET.is_match(message)
}

/// Run one mini agent: a single completion call against its tool subset.
pub async fn execute_mini_agent(
    client: &Arc<dyn CompletionClient>,
    agent_name: &str,
    message: &str,
    board: &BoardState,
) -> Result<TierOutcome, PipelineError> {
    let agent = MINI_AGENTS
        .iter()
        .find(|a| a.name == agent_name)
        .ok_or_else(|| PipelineError::UnknownAgent(agent_name.to_string()))?;
    run_tool_agent(client, agent.prompt, message, board, agent.tools).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{CompletionResponse, ScriptedCompletion, ToolInvocation};
    use serde_json::json;

    #[test]
    fn test_swot_outranks_generic_create() {
        assert_eq!(
            detect_mini_agent("make a swot analysis with sticky notes", false),
            Some("swot_template")
        );
    }

    #[test]
    fn test_multi_quantity_creation_is_excluded() {
        assert_eq!(detect_mini_agent("add a sticky note", false), Some("sticky_create"));
        assert_eq!(detect_mini_agent("add 5 sticky notes", false), None);
    }

    #[test]
    fn test_modification_needs_selection_or_target() {
        assert_eq!(detect_mini_agent("rotate this", false), None);
        assert_eq!(detect_mini_agent("rotate this", true), Some("rotate"));
        assert_eq!(detect_mini_agent("rotate the star", false), Some("rotate"));
    }

    #[tokio::test]
    async fn test_unknown_agent_is_an_error() {
        let client: Arc<dyn CompletionClient> = Arc::new(ScriptedCompletion::new());
        let result =
            execute_mini_agent(&client, "nonexistent", "do things", &BoardState::empty()).await;
        assert!(matches!(result, Err(PipelineError::UnknownAgent(_))));
    }

    #[tokio::test]
    async fn test_execute_filters_to_agent_tools() {
        let scripted = ScriptedCompletion::new();
        scripted.enqueue(CompletionResponse::from_invocations(vec![
            ToolInvocation::new("rotateObject", json!({"objectId": "a", "rotation": 90})),
            ToolInvocation::new("deleteObject", json!({"objectIds": ["a"]})),
        ]));
        let client: Arc<dyn CompletionClient> = Arc::new(scripted);
        let outcome = execute_mini_agent(&client, "rotate", "rotate the star", &BoardState::empty())
            .await
            .unwrap();
        assert_eq!(outcome.tool_calls.len(), 1);
        assert_eq!(outcome.tool_calls[0].name, crate::types::tool_call::ToolName::RotateObject);
    }
}
