//! Single-shot intent classifier.
//!
//! One structured-extraction call with a forced tool choice and zero
//! temperature, followed by the deterministic correction passes. Low
//! variability by design — everything downstream of the call is pure.

use std::sync::Arc;

use serde_json::json;

use crate::error::PipelineError;
use crate::intent::corrections::{default_passes, CorrectionPass};
use crate::intent::Intent;
use crate::llm::{CompletionClient, CompletionRequest, Message, ToolSchema};

const CLASSIFY_TOOL: &str = "classify_intent";

const CLASSIFIER_PROMPT: &str = "\
You classify whiteboard commands into a structured intent. Extract the \
operation, the object kind and shape, quantities and grid dimensions, \
colors, text, coordinates, and the target filter for commands that modify \
existing objects. Set isMultiStep only when the command truly requires \
sequential steps with dependencies between them. Use the literal color \
'random' when the user asks for random or varied colors.";

/// JSON schema for the classification tool.
fn classify_schema() -> ToolSchema {
    ToolSchema::new(
        CLASSIFY_TOOL,
        "Record the structured intent extracted from the user's command.",
        json!({
            "type": "object",
            "properties": {
                "operation": {
                    "type": "string",
                    "enum": [
                        "CREATE", "UPDATE", "DELETE", "MOVE", "RESIZE", "ROTATE",
                        "CHANGE_COLOR", "ARRANGE", "ANALYZE", "CONNECT",
                        "FIT_FRAME_TO_CONTENTS", "MULTI_STEP", "UNKNOWN"
                    ]
                },
                "objectType": {"type": "string"},
                "shapeType": {"type": "string"},
                "quantity": {"type": "integer", "minimum": 1},
                "rows": {"type": "integer"},
                "columns": {"type": "integer"},
                "color": {"type": "string"},
                "colors": {"type": "array", "items": {"type": "string"}},
                "text": {"type": "string"},
                "x": {"type": "number"},
                "y": {"type": "number"},
                "width": {"type": "number"},
                "height": {"type": "number"},
                "rotation": {"type": "number"},
                "direction": {"type": "string", "enum": ["left", "right", "up", "down"]},
                "targetFilter": {
                    "type": "object",
                    "properties": {
                        "type": {"type": "string"},
                        "shapeType": {"type": "string"},
                        "color": {"type": "string"},
                        "useSelection": {"type": "boolean"}
                    }
                },
                "isMultiStep": {"type": "boolean"},
                "steps": {"type": "array", "items": {"type": "string"}}
            },
            "required": ["operation"]
        }),
    )
}

/// Classifies a command into an [`Intent`] and repairs it deterministically.
#[derive(Debug)]
pub struct IntentClassifier {
    client: Arc<dyn CompletionClient>,
    passes: Vec<Box<dyn CorrectionPass>>,
}

impl IntentClassifier {
    /// A classifier with the default correction passes.
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            client,
            passes: default_passes(),
        }
    }

    /// Append a correction pass after the defaults.
    pub fn with_pass(mut self, pass: Box<dyn CorrectionPass>) -> Self {
        self.passes.push(pass);
        self
    }

    /// Classify one command. A malformed or missing extraction is a
    /// recoverable failure — the dispatcher downgrades the tier.
    pub async fn classify(&self, command: &str) -> Result<Intent, PipelineError> {
        let request = CompletionRequest::forced_tool(
            vec![
                Message::system(CLASSIFIER_PROMPT),
                Message::user(command.to_string()),
            ],
            classify_schema(),
            0.0,
        );
        let response = self.client.complete(request).await?;

        let invocation = response.first_invocation().ok_or_else(|| {
            PipelineError::Classification("no structured extraction in response".into())
        })?;
        if invocation.name != CLASSIFY_TOOL {
            return Err(PipelineError::Classification(format!(
                "unexpected tool '{}'",
                invocation.name
            )));
        }

        let mut intent: Intent =
            serde_json::from_value(invocation.arguments.clone()).map_err(|e| {
                PipelineError::Classification(format!("unparseable intent: {e}"))
            })?;

        for pass in &self.passes {
            pass.apply(command, &mut intent);
            log::trace!("after {}: {:?}", pass.name(), intent.operation);
        }

        Ok(intent)
    }
}
