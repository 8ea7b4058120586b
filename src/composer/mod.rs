//! Creative composition: one planning call, then deterministic layout.
//!
//! The planner is constrained to emit exactly one composition plan through a
//! forced tool call; the layout engine turns that plan into operation
//! requests with no further model involvement.

pub mod plan;

use std::sync::Arc;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};

use crate::agents::TierOutcome;
use crate::error::{CompletionError, PipelineError};
use crate::layout::context::LayoutContext;
use crate::layout::engine::{plan_to_tool_calls, FrameInfo};
use crate::layout::geometry::Point;
use crate::llm::{CompletionClient, CompletionRequest, Message, ToolSchema};
use crate::types::board::BoardState;

pub use plan::{Aspect, Branch, BranchDirection, CompositionPlan, LayoutKind, PlanNode};

/// Where a composition lands on an empty board.
const DEFAULT_ANCHOR: Point = Point { x: 120.0, y: 120.0 };

/// Clearance between existing content and a new composition.
const ANCHOR_CLEARANCE: f64 = 160.0;

static COMPOSITION_VOCABULARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(flow\s*chart|diagram|mind\s*map|journey|process\s+map|funnel|pipeline\s+diagram|workflow|swimlane|quadrant|matrix|venn)\b",
    )
    .unwrap()
});

/// Whether the command asks for a named multi-object composition.
pub fn is_composition_command(message: &str) -> bool {
    COMPOSITION_VOCABULARY.is_match(message)
}

const COMPOSE_TOOL: &str = "compose";

const COMPOSER_PROMPT: &str = "You design whiteboard compositions. Emit \
    exactly one compose call describing the structure as a tree. Prefer \
    coordinate-free layouts; use layout \"freeform\" only when every child \
    carries explicit x/y offsets. Use connectTo: true on a node to chain it \
    to its next sibling, and branch for alternate sub-flows.";

fn compose_schema() -> ToolSchema {
    // The node schema is recursive; children accept the same shape.
    let node = json!({
        "type": "object",
        "properties": {
            "type": {
                "type": "string",
                "enum": ["sticky", "shape", "text", "textBubble", "frame", "column", "group"],
            },
            "text": {"type": "string"},
            "title": {"type": "string"},
            "shape": {"type": "string"},
            "color": {"type": "string"},
            "aspect": {
                "type": "string",
                "enum": ["square", "wide", "tall", "tall_narrow", "small", "large"],
            },
            "x": {"type": "number"},
            "y": {"type": "number"},
            "connectTo": {"type": "boolean"},
            "layout": {"type": "string"},
            "branch": {
                "type": "object",
                "properties": {
                    "direction": {"type": "string", "enum": ["up", "down", "left", "right"]},
                    "steps": {"type": "array"},
                },
            },
            "children": {"type": "array"},
        },
    });
    ToolSchema {
        name: COMPOSE_TOOL.to_string(),
        description: "Describe one complete composition as a layout tree".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "title": {"type": "string"},
                "layout": {
                    "type": "string",
                    "enum": [
                        "columns", "stack_horizontal", "stack_vertical",
                        "flow_horizontal", "flow_vertical", "grid", "radial",
                        "freeform",
                    ],
                },
                "wrapInFrame": {"type": "boolean"},
                "children": {"type": "array", "items": node},
            },
            "required": ["layout", "children"],
        }),
    }
}

/// Anchor right of existing content, or the default on an empty board.
fn anchor_for(board: &BoardState) -> Point {
    let mut right_edge: Option<f64> = None;
    let mut top: Option<f64> = None;
    for obj in &board.objects {
        let extent = obj
            .width
            .or(obj.radius.map(|r| r * 2.0))
            .unwrap_or(0.0);
        let right = obj.x + extent;
        right_edge = Some(right_edge.map_or(right, |e: f64| e.max(right)));
        top = Some(top.map_or(obj.y, |t: f64| t.min(obj.y)));
    }
    match (right_edge, top) {
        (Some(right), Some(top)) => Point::new(right + ANCHOR_CLEARANCE, top.max(DEFAULT_ANCHOR.y)),
        _ => DEFAULT_ANCHOR,
    }
}

#[derive(Debug)]
pub struct Composer {
    client: Arc<dyn CompletionClient>,
}

impl Composer {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Composer { client }
    }

    /// One planning call, then deterministic layout.
    pub async fn compose(
        &self,
        message: &str,
        board: &BoardState,
    ) -> Result<TierOutcome, PipelineError> {
        let board_context = serde_json::to_value(board).unwrap_or(Value::Null);
        let request = CompletionRequest::forced_tool(
            vec![
                Message::system(COMPOSER_PROMPT),
                Message::user(format!(
                    "Command: {message}\n\nBoard state: {board_context}"
                )),
            ],
            compose_schema(),
            0.4,
        );
        let response = self.client.complete(request).await?;
        let invocation = response.first_invocation().ok_or(PipelineError::Completion(
            CompletionError::Empty,
        ))?;
        let plan = CompositionPlan::from_value(&invocation.arguments);
        if plan.children.is_empty() {
            return Err(PipelineError::Composition("plan has no children".into()));
        }
        debug!(
            "composition plan: {:?} layout, {} top-level node(s)",
            plan.layout,
            plan.children.len()
        );

        let frame = board.selected_frame().and_then(FrameInfo::from_board_object);
        let use_explicit = plan.layout == LayoutKind::Freeform;
        let mut ctx = LayoutContext::new();
        let tool_calls = plan_to_tool_calls(
            &plan,
            anchor_for(board),
            frame.as_ref(),
            use_explicit,
            &mut ctx,
        );
        let title = plan.title.as_deref().unwrap_or("composition");
        Ok(TierOutcome::new(
            tool_calls,
            format!("Composed {title} with {} element(s)", plan.children.len()),
        ))
    }
}
