//! Deterministic intent execution.
//!
//! Maps a validated [`Intent`] to zero or more operation requests with no
//! further model calls. Returns `None` for intents that need richer context
//! than a single extraction can carry — CONNECT, FIT_FRAME_TO_CONTENTS,
//! anything multi-step, and UPDATE with nothing to write — signaling the
//! dispatcher to escalate to a higher tier.

use serde_json::{json, Map, Value};

use crate::intent::target::resolve_targets;
use crate::intent::{Intent, Operation, TargetFilter};
use crate::types::board::BoardState;
use crate::types::colors::resolve_color;
use crate::types::tool_call::{ToolCall, ToolName};

/// Default relative movement distance in pixels.
const MOVE_STEP: f64 = 100.0;

/// Default rotation when the command names none.
const DEFAULT_ROTATION: f64 = 90.0;

/// The executor's output for one intent.
#[derive(Debug, Clone)]
pub struct IntentExecution {
    pub tool_calls: Vec<ToolCall>,
    pub summary: String,
}

/// Execute an intent against a board snapshot.
///
/// `None` means "escalate": the intent is valid but cannot be completed at
/// this tier.
pub fn execute_from_intent(intent: &Intent, board: &BoardState) -> Option<IntentExecution> {
    if intent.is_multi_step {
        return None;
    }
    match intent.operation {
        Operation::Create => Some(execute_create(intent, board)),
        Operation::Delete => Some(execute_delete(intent, board)),
        Operation::ChangeColor => execute_change_color(intent, board),
        Operation::Move => execute_move(intent, board),
        Operation::Resize => execute_resize(intent, board),
        Operation::Rotate => Some(execute_rotate(intent, board)),
        Operation::Update => execute_update(intent, board),
        Operation::Analyze => Some(execute_analyze(intent, board)),
        Operation::Arrange => Some(execute_arrange(intent, board)),
        // These need richer context than one extraction carries.
        Operation::Connect
        | Operation::FitFrameToContents
        | Operation::MultiStep
        | Operation::Unknown => None,
    }
}

fn targets(intent: &Intent, board: &BoardState) -> Vec<String> {
    match &intent.target_filter {
        Some(filter) => resolve_targets(filter, board),
        // No filter: fall back to the current selection.
        None => resolve_targets(
            &TargetFilter {
                use_selection: true,
                ..Default::default()
            },
            board,
        ),
    }
}

fn creation_tool(intent: &Intent) -> (ToolName, Option<String>) {
    let kind = intent.object_type.as_deref().unwrap_or("sticky");
    match kind {
        "sticky" | "stickyNote" | "note" => (ToolName::CreateStickyNote, None),
        "text" => (ToolName::CreateText, None),
        "textBubble" => (ToolName::CreateTextBubble, None),
        "frame" => (ToolName::CreateFrame, None),
        "shape" => (
            ToolName::CreateShape,
            Some(
                intent
                    .shape_type
                    .clone()
                    .unwrap_or_else(|| "rectangle".into()),
            ),
        ),
        // A bare shape name ("circle") as the object type.
        other => (ToolName::CreateShape, Some(other.to_string())),
    }
}

fn execute_create(intent: &Intent, board: &BoardState) -> IntentExecution {
    let (tool, shape) = creation_tool(intent);
    let quantity = intent.quantity.unwrap_or(1);

    let mut args = Map::new();
    if let Some(shape) = &shape {
        args.insert("type".into(), json!(shape));
    }
    args.insert("quantity".into(), json!(quantity));
    if let Some(rows) = intent.rows {
        args.insert("rows".into(), json!(rows));
    }
    if let Some(columns) = intent.columns {
        args.insert("columns".into(), json!(columns));
    }
    // "random" resolves to None: the color key is omitted entirely, which
    // tells the consumer to cycle the palette itself.
    if let Some(color) = intent.color.as_deref().and_then(resolve_color) {
        args.insert("color".into(), json!(color));
    }
    if !intent.colors.is_empty() {
        let resolved: Vec<String> = intent
            .colors
            .iter()
            .map(|c| resolve_color(c).unwrap_or_else(|| c.clone()))
            .collect();
        args.insert("colors".into(), json!(resolved));
    }
    if let Some(text) = &intent.text {
        args.insert("text".into(), json!(text));
    }
    if let (Some(x), Some(y)) = (intent.x, intent.y) {
        args.insert("x".into(), json!(x));
        args.insert("y".into(), json!(y));
    }
    if let Some(width) = intent.width {
        args.insert("width".into(), json!(width));
    }
    if let Some(height) = intent.height {
        args.insert("height".into(), json!(height));
    }
    // Scope into the selected frame, when the selection is one frame.
    if let Some(frame) = board.selected_frame() {
        args.insert("frameId".into(), json!(frame.id));
    }

    let label = shape.as_deref().unwrap_or(match tool {
        ToolName::CreateStickyNote => "sticky note",
        ToolName::CreateText => "text",
        ToolName::CreateTextBubble => "text bubble",
        ToolName::CreateFrame => "frame",
        _ => "object",
    });
    IntentExecution {
        tool_calls: vec![ToolCall::new(tool, Value::Object(args))],
        summary: format!("Creating {quantity} {label}(s)"),
    }
}

fn execute_delete(intent: &Intent, board: &BoardState) -> IntentExecution {
    let ids = targets(intent, board);
    if ids.is_empty() {
        return IntentExecution {
            tool_calls: Vec::new(),
            summary: "No objects matched; nothing deleted".into(),
        };
    }
    let count = ids.len();
    // A single batched request, never one request per object.
    IntentExecution {
        tool_calls: vec![ToolCall::new(
            ToolName::DeleteObject,
            json!({"objectIds": ids}),
        )],
        summary: format!("Deleting {count} object(s)"),
    }
}

fn execute_change_color(intent: &Intent, board: &BoardState) -> Option<IntentExecution> {
    let color = resolve_color(intent.color.as_deref()?)?;
    let ids = targets(intent, board);
    let count = ids.len();
    let tool_calls = ids
        .into_iter()
        .map(|id| {
            ToolCall::new(
                ToolName::ChangeColor,
                json!({"objectId": id, "color": color}),
            )
        })
        .collect();
    Some(IntentExecution {
        tool_calls,
        summary: format!("Recoloring {count} object(s) to {color}"),
    })
}

fn direction_offset(direction: &str) -> Option<(f64, f64)> {
    match direction {
        "left" => Some((-MOVE_STEP, 0.0)),
        "right" => Some((MOVE_STEP, 0.0)),
        "up" => Some((0.0, -MOVE_STEP)),
        "down" => Some((0.0, MOVE_STEP)),
        _ => None,
    }
}

fn execute_move(intent: &Intent, board: &BoardState) -> Option<IntentExecution> {
    let ids = targets(intent, board);
    let mut tool_calls = Vec::new();
    match (intent.x, intent.y) {
        (Some(x), Some(y)) => {
            for id in &ids {
                tool_calls.push(ToolCall::new(
                    ToolName::MoveObject,
                    json!({"objectId": id, "x": x, "y": y}),
                ));
            }
        }
        _ => {
            let (dx, dy) = direction_offset(intent.direction.as_deref()?)?;
            for id in &ids {
                let obj = board.find(id)?;
                tool_calls.push(ToolCall::new(
                    ToolName::MoveObject,
                    json!({"objectId": id, "x": obj.x + dx, "y": obj.y + dy}),
                ));
            }
        }
    }
    Some(IntentExecution {
        summary: format!("Moving {} object(s)", ids.len()),
        tool_calls,
    })
}

fn execute_resize(intent: &Intent, board: &BoardState) -> Option<IntentExecution> {
    let width = intent.width?;
    let height = intent.height.unwrap_or(width);
    let ids = targets(intent, board);
    let count = ids.len();
    let tool_calls = ids
        .into_iter()
        .map(|id| {
            ToolCall::new(
                ToolName::ResizeObject,
                json!({"objectId": id, "width": width, "height": height}),
            )
        })
        .collect();
    Some(IntentExecution {
        tool_calls,
        summary: format!("Resizing {count} object(s)"),
    })
}

fn execute_rotate(intent: &Intent, board: &BoardState) -> IntentExecution {
    let rotation = intent.rotation.unwrap_or(DEFAULT_ROTATION);
    let ids = targets(intent, board);
    let count = ids.len();
    let tool_calls = ids
        .into_iter()
        .map(|id| {
            ToolCall::new(
                ToolName::RotateObject,
                json!({"objectId": id, "rotation": rotation}),
            )
        })
        .collect();
    IntentExecution {
        tool_calls,
        summary: format!("Rotating {count} object(s) by {rotation} degrees"),
    }
}

fn execute_update(intent: &Intent, board: &BoardState) -> Option<IntentExecution> {
    // Nothing to write is an explicit, not silent, failure.
    let text = intent.text.as_deref().filter(|t| !t.trim().is_empty())?;
    let ids = targets(intent, board);
    let count = ids.len();
    let tool_calls = ids
        .into_iter()
        .map(|id| {
            ToolCall::new(
                ToolName::UpdateText,
                json!({"objectId": id, "text": text}),
            )
        })
        .collect();
    Some(IntentExecution {
        tool_calls,
        summary: format!("Updating text on {count} object(s)"),
    })
}

fn execute_analyze(intent: &Intent, board: &BoardState) -> IntentExecution {
    let matched = match &intent.target_filter {
        Some(filter) => resolve_targets(filter, board),
        None => Vec::new(),
    };
    // Fall back to the whole board when nothing narrows the analysis.
    let ids = if matched.is_empty() {
        board.all_ids()
    } else {
        matched
    };
    let count = ids.len();
    IntentExecution {
        tool_calls: vec![ToolCall::new(
            ToolName::AnalyzeObjects,
            json!({"objectIds": ids}),
        )],
        summary: format!("Analyzing {count} object(s)"),
    }
}

fn execute_arrange(intent: &Intent, board: &BoardState) -> IntentExecution {
    let matched = targets(intent, board);
    let ids = if matched.is_empty() {
        board.all_ids()
    } else {
        matched
    };
    let count = ids.len();
    let mut args = Map::new();
    args.insert("objectIds".into(), json!(ids));
    if let Some(rows) = intent.rows {
        args.insert("rows".into(), json!(rows));
    }
    if let Some(columns) = intent.columns {
        args.insert("columns".into(), json!(columns));
    }
    IntentExecution {
        tool_calls: vec![ToolCall::new(
            ToolName::ArrangeInGrid,
            Value::Object(args),
        )],
        summary: format!("Arranging {count} object(s) in a grid"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::board::BoardObject;

    fn circle_board() -> BoardState {
        let mut board = BoardState::empty();
        for id in ["c1", "c2", "c3"] {
            board.objects.push(BoardObject::new(id, "circle", 0.0, 0.0));
        }
        board.objects.push(BoardObject::new("s1", "star", 0.0, 0.0));
        board
    }

    #[test]
    fn test_create_five_red_circles_is_one_request() {
        let intent = Intent {
            operation: Operation::Create,
            object_type: Some("shape".into()),
            shape_type: Some("circle".into()),
            quantity: Some(5),
            color: Some("red".into()),
            ..Default::default()
        };
        let execution = execute_from_intent(&intent, &BoardState::empty()).unwrap();
        assert_eq!(execution.tool_calls.len(), 1);
        let call = &execution.tool_calls[0];
        assert_eq!(call.name, ToolName::CreateShape);
        assert_eq!(call.str_arg("type"), Some("circle"));
        assert_eq!(call.num_arg("quantity"), Some(5.0));
        assert_eq!(call.str_arg("color"), Some("#EF4444"));
    }

    #[test]
    fn test_create_random_omits_color_entirely() {
        let intent = Intent {
            operation: Operation::Create,
            object_type: Some("sticky".into()),
            quantity: Some(10),
            color: Some("random".into()),
            ..Default::default()
        };
        let execution = execute_from_intent(&intent, &BoardState::empty()).unwrap();
        let call = &execution.tool_calls[0];
        assert_eq!(call.name, ToolName::CreateStickyNote);
        assert!(call.arguments.get("color").is_none());
    }

    #[test]
    fn test_create_scopes_into_selected_frame() {
        let mut board = BoardState::empty();
        let mut frame = BoardObject::new("f1", "frame", 0.0, 0.0);
        frame.width = Some(400.0);
        frame.height = Some(300.0);
        board.objects.push(frame);
        board.selected_ids = vec!["f1".into()];

        let intent = Intent {
            operation: Operation::Create,
            object_type: Some("sticky".into()),
            ..Default::default()
        };
        let execution = execute_from_intent(&intent, &board).unwrap();
        assert_eq!(execution.tool_calls[0].str_arg("frameId"), Some("f1"));
    }

    #[test]
    fn test_delete_all_circles_batches_one_request() {
        let intent = Intent {
            operation: Operation::Delete,
            target_filter: Some(TargetFilter {
                object_type: Some("shape".into()),
                shape_type: Some("circle".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let execution = execute_from_intent(&intent, &circle_board()).unwrap();
        assert_eq!(execution.tool_calls.len(), 1);
        let call = &execution.tool_calls[0];
        assert_eq!(call.name, ToolName::DeleteObject);
        assert_eq!(
            call.arguments["objectIds"],
            json!(["c1", "c2", "c3"])
        );
    }

    #[test]
    fn test_zero_matches_emits_zero_requests() {
        let intent = Intent {
            operation: Operation::Delete,
            target_filter: Some(TargetFilter {
                object_type: Some("frame".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let execution = execute_from_intent(&intent, &circle_board()).unwrap();
        assert!(execution.tool_calls.is_empty());
        assert!(execution.summary.contains("No objects matched"));
    }

    #[test]
    fn test_update_without_text_escalates() {
        let intent = Intent {
            operation: Operation::Update,
            ..Default::default()
        };
        assert!(execute_from_intent(&intent, &circle_board()).is_none());
    }

    #[test]
    fn test_escalation_signals() {
        for operation in [
            Operation::Connect,
            Operation::FitFrameToContents,
            Operation::MultiStep,
            Operation::Unknown,
        ] {
            let intent = Intent {
                operation,
                ..Default::default()
            };
            assert!(execute_from_intent(&intent, &BoardState::empty()).is_none());
        }

        let multi = Intent {
            operation: Operation::Create,
            is_multi_step: true,
            ..Default::default()
        };
        assert!(execute_from_intent(&multi, &BoardState::empty()).is_none());
    }

    #[test]
    fn test_move_by_direction_offsets_current_position() {
        let mut board = circle_board();
        board.selected_ids = vec!["c1".into()];
        let intent = Intent {
            operation: Operation::Move,
            direction: Some("right".into()),
            ..Default::default()
        };
        let execution = execute_from_intent(&intent, &board).unwrap();
        assert_eq!(execution.tool_calls[0].num_arg("x"), Some(MOVE_STEP));
        assert_eq!(execution.tool_calls[0].num_arg("y"), Some(0.0));
    }

    #[test]
    fn test_analyze_defaults_to_whole_board() {
        let intent = Intent {
            operation: Operation::Analyze,
            ..Default::default()
        };
        let execution = execute_from_intent(&intent, &circle_board()).unwrap();
        let ids = execution.tool_calls[0].arguments["objectIds"]
            .as_array()
            .unwrap()
            .len();
        assert_eq!(ids, 4);
    }
}
