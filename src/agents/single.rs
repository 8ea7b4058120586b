//! The single-agent tier.
//!
//! One agent with the full operation vocabulary, for commands that fit a
//! single worker's scope but match no registered pattern.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::agents::{run_tool_agent, TierOutcome};
use crate::error::PipelineError;
use crate::llm::CompletionClient;
use crate::types::board::BoardState;
use crate::types::tool_call::ToolName;

const SINGLE_AGENT_PROMPT: &str =
    "You operate a shared whiteboard. Complete the user's command with tool \
     calls, using object ids from the provided board state. Batch deletions \
     into one call. Do not invent object ids.";

static ONE_AGENT_SCOPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(create|add|make|draw|place|put|delete|remove|clear|move|shift|resize|rotate|recolor|color|change|update|rename|organize|arrange|align|tidy|analyze|count|summarize|connect)\b",
    )
    .unwrap()
});

static SEQUENCING_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(then|after that|afterwards|next,|followed by|first|finally)\b").unwrap()
});

/// Whether one agent with the full vocabulary can plausibly complete this.
pub fn is_single_agent_command(message: &str) -> bool {
    ONE_AGENT_SCOPE.is_match(message) && !SEQUENCING_WORDS.is_match(message)
}

/// One completion call over the full operation vocabulary.
pub async fn execute_single_agent(
    client: &Arc<dyn CompletionClient>,
    message: &str,
    board: &BoardState,
) -> Result<TierOutcome, PipelineError> {
    run_tool_agent(client, SINGLE_AGENT_PROMPT, message, board, ToolName::ALL).await
}
