//! Function schemas for the operation vocabulary.
//!
//! Each [`ToolName`] gets one JSON schema describing its arguments, in the
//! shape completion providers expect for function calling.

use serde_json::{json, Value};

use crate::llm::ToolSchema;
use crate::types::tool_call::ToolName;

fn object_schema(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// Build the function schema for one operation.
pub fn tool_schema(name: ToolName) -> ToolSchema {
    let (description, parameters) = match name {
        ToolName::CreateStickyNote => (
            "Create one or more sticky notes",
            object_schema(
                json!({
                    "text": {"type": "string"},
                    "x": {"type": "number"},
                    "y": {"type": "number"},
                    "color": {"type": "string", "description": "Hex color"},
                    "quantity": {"type": "integer", "minimum": 1},
                    "rows": {"type": "integer"},
                    "columns": {"type": "integer"},
                    "frameId": {"type": "string"},
                }),
                &[],
            ),
        ),
        ToolName::CreateShape => (
            "Create one or more shapes",
            object_schema(
                json!({
                    "type": {
                        "type": "string",
                        "enum": ["rectangle", "circle", "ellipse", "triangle", "diamond", "star", "hexagon", "arrow"],
                    },
                    "text": {"type": "string"},
                    "x": {"type": "number"},
                    "y": {"type": "number"},
                    "width": {"type": "number"},
                    "height": {"type": "number"},
                    "radius": {"type": "number", "description": "Circles only; x/y is the center"},
                    "color": {"type": "string"},
                    "quantity": {"type": "integer", "minimum": 1},
                    "rows": {"type": "integer"},
                    "columns": {"type": "integer"},
                    "frameId": {"type": "string"},
                }),
                &["type"],
            ),
        ),
        ToolName::CreateText => (
            "Create a text element",
            object_schema(
                json!({
                    "text": {"type": "string"},
                    "x": {"type": "number"},
                    "y": {"type": "number"},
                    "color": {"type": "string"},
                    "frameId": {"type": "string"},
                }),
                &["text"],
            ),
        ),
        ToolName::CreateTextBubble => (
            "Create a text bubble (callout)",
            object_schema(
                json!({
                    "text": {"type": "string"},
                    "x": {"type": "number"},
                    "y": {"type": "number"},
                    "color": {"type": "string"},
                    "frameId": {"type": "string"},
                }),
                &["text"],
            ),
        ),
        ToolName::CreateFrame => (
            "Create a frame (titled container region)",
            object_schema(
                json!({
                    "title": {"type": "string"},
                    "x": {"type": "number"},
                    "y": {"type": "number"},
                    "width": {"type": "number"},
                    "height": {"type": "number"},
                }),
                &[],
            ),
        ),
        ToolName::CreateConnector => (
            "Connect two objects with an arrow. Reference existing objects \
             by id, or objects created earlier in this plan by their index.",
            object_schema(
                json!({
                    "fromId": {"type": "string"},
                    "toId": {"type": "string"},
                    "fromIndex": {"type": "integer", "minimum": 0},
                    "toIndex": {"type": "integer", "minimum": 0},
                    "label": {"type": "string"},
                }),
                &[],
            ),
        ),
        ToolName::MoveObject => (
            "Move an object to an absolute position",
            object_schema(
                json!({
                    "objectId": {"type": "string"},
                    "x": {"type": "number"},
                    "y": {"type": "number"},
                }),
                &["objectId", "x", "y"],
            ),
        ),
        ToolName::ResizeObject => (
            "Resize an object",
            object_schema(
                json!({
                    "objectId": {"type": "string"},
                    "width": {"type": "number"},
                    "height": {"type": "number"},
                }),
                &["objectId", "width", "height"],
            ),
        ),
        ToolName::RotateObject => (
            "Rotate an object by degrees",
            object_schema(
                json!({
                    "objectId": {"type": "string"},
                    "rotation": {"type": "number"},
                }),
                &["objectId", "rotation"],
            ),
        ),
        ToolName::ChangeColor => (
            "Change an object's color",
            object_schema(
                json!({
                    "objectId": {"type": "string"},
                    "color": {"type": "string", "description": "Hex color"},
                }),
                &["objectId", "color"],
            ),
        ),
        ToolName::UpdateText => (
            "Replace the text of an object",
            object_schema(
                json!({
                    "objectId": {"type": "string"},
                    "text": {"type": "string"},
                }),
                &["objectId", "text"],
            ),
        ),
        ToolName::DeleteObject => (
            "Delete objects by id",
            object_schema(
                json!({
                    "objectIds": {"type": "array", "items": {"type": "string"}},
                }),
                &["objectIds"],
            ),
        ),
        ToolName::AnalyzeObjects => (
            "Inspect objects and report what is on the board",
            object_schema(
                json!({
                    "objectIds": {"type": "array", "items": {"type": "string"}},
                }),
                &["objectIds"],
            ),
        ),
        ToolName::ArrangeInGrid => (
            "Arrange objects into a grid",
            object_schema(
                json!({
                    "objectIds": {"type": "array", "items": {"type": "string"}},
                    "rows": {"type": "integer"},
                    "columns": {"type": "integer"},
                }),
                &["objectIds"],
            ),
        ),
        ToolName::ArrangeInGridAndResize => (
            "Arrange objects into a uniform grid, resizing them to match",
            object_schema(
                json!({
                    "objectIds": {"type": "array", "items": {"type": "string"}},
                    "rows": {"type": "integer"},
                    "columns": {"type": "integer"},
                    "width": {"type": "number"},
                    "height": {"type": "number"},
                }),
                &["objectIds"],
            ),
        ),
        ToolName::FitFrameToContents => (
            "Resize a frame to wrap its contents",
            object_schema(
                json!({
                    "frameId": {"type": "string"},
                }),
                &["frameId"],
            ),
        ),
    };
    ToolSchema {
        name: name.as_str().to_string(),
        description: description.to_string(),
        parameters,
    }
}

/// Schemas for a subset of the vocabulary, preserving order.
pub fn schemas_for(names: &[ToolName]) -> Vec<ToolSchema> {
    names.iter().map(|n| tool_schema(*n)).collect()
}

/// The complete vocabulary as schemas.
pub fn all_schemas() -> Vec<ToolSchema> {
    schemas_for(ToolName::ALL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_tool_has_a_schema() {
        let schemas = all_schemas();
        assert_eq!(schemas.len(), ToolName::ALL.len());
        for schema in &schemas {
            assert!(!schema.description.is_empty());
            assert_eq!(schema.parameters["type"], "object");
        }
    }

    #[test]
    fn test_schema_names_match_wire_names() {
        assert_eq!(tool_schema(ToolName::CreateStickyNote).name, "createStickyNote");
        assert_eq!(tool_schema(ToolName::FitFrameToContents).name, "fitFrameToContents");
    }
}
