//! Operation requests — the terminal output unit of the pipeline.
//!
//! A [`ToolCall`] names one mutation from the fixed vocabulary and carries
//! its arguments as a JSON object. The pipeline emits an ordered list of
//! these; it never applies them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// The closed vocabulary of operation names.
///
/// Serialized in camelCase to match the external operation contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ToolName {
    CreateStickyNote,
    CreateShape,
    CreateFrame,
    CreateText,
    CreateTextBubble,
    CreateConnector,
    MoveObject,
    ResizeObject,
    RotateObject,
    UpdateText,
    ChangeColor,
    DeleteObject,
    ArrangeInGrid,
    ArrangeInGridAndResize,
    AnalyzeObjects,
    FitFrameToContents,
}

impl ToolName {
    /// All operation names, in declaration order.
    pub const ALL: &'static [ToolName] = &[
        ToolName::CreateStickyNote,
        ToolName::CreateShape,
        ToolName::CreateFrame,
        ToolName::CreateText,
        ToolName::CreateTextBubble,
        ToolName::CreateConnector,
        ToolName::MoveObject,
        ToolName::ResizeObject,
        ToolName::RotateObject,
        ToolName::UpdateText,
        ToolName::ChangeColor,
        ToolName::DeleteObject,
        ToolName::ArrangeInGrid,
        ToolName::ArrangeInGridAndResize,
        ToolName::AnalyzeObjects,
        ToolName::FitFrameToContents,
    ];

    /// The wire name of this operation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::CreateStickyNote => "createStickyNote",
            ToolName::CreateShape => "createShape",
            ToolName::CreateFrame => "createFrame",
            ToolName::CreateText => "createText",
            ToolName::CreateTextBubble => "createTextBubble",
            ToolName::CreateConnector => "createConnector",
            ToolName::MoveObject => "moveObject",
            ToolName::ResizeObject => "resizeObject",
            ToolName::RotateObject => "rotateObject",
            ToolName::UpdateText => "updateText",
            ToolName::ChangeColor => "changeColor",
            ToolName::DeleteObject => "deleteObject",
            ToolName::ArrangeInGrid => "arrangeInGrid",
            ToolName::ArrangeInGridAndResize => "arrangeInGridAndResize",
            ToolName::AnalyzeObjects => "analyzeObjects",
            ToolName::FitFrameToContents => "fitFrameToContents",
        }
    }

    /// Parse a wire name back into a `ToolName`.
    pub fn parse(name: &str) -> Option<ToolName> {
        Self::ALL.iter().copied().find(|t| t.as_str() == name)
    }

    /// Whether this operation creates a new object.
    pub fn is_creation(&self) -> bool {
        matches!(
            self,
            ToolName::CreateStickyNote
                | ToolName::CreateShape
                | ToolName::CreateFrame
                | ToolName::CreateText
                | ToolName::CreateTextBubble
                | ToolName::CreateConnector
        )
    }

    /// Whether this operation is a connector.
    pub fn is_connector(&self) -> bool {
        matches!(self, ToolName::CreateConnector)
    }

    /// Whether this operation is an analysis request.
    ///
    /// Analysis requests are resolved locally and stripped from final
    /// output; only their narrative survives.
    pub fn is_analysis(&self) -> bool {
        matches!(self, ToolName::AnalyzeObjects)
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One operation request: id, name from the fixed vocabulary, arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique request id.
    pub id: String,
    /// Operation name.
    pub name: ToolName,
    /// JSON-object arguments for the operation.
    pub arguments: Value,
}

impl ToolCall {
    /// Create a request with a fresh id.
    pub fn new(name: ToolName, arguments: Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            arguments,
        }
    }

    /// Read a string argument.
    pub fn str_arg(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(Value::as_str)
    }

    /// Read a numeric argument.
    pub fn num_arg(&self, key: &str) -> Option<f64> {
        self.arguments.get(key).and_then(Value::as_f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_names_round_trip() {
        for name in ToolName::ALL {
            assert_eq!(ToolName::parse(name.as_str()), Some(*name));
            let as_json = serde_json::to_value(name).unwrap();
            assert_eq!(as_json, json!(name.as_str()));
        }
    }

    #[test]
    fn test_classification_helpers() {
        assert!(ToolName::CreateShape.is_creation());
        assert!(ToolName::CreateConnector.is_connector());
        assert!(ToolName::AnalyzeObjects.is_analysis());
        assert!(!ToolName::DeleteObject.is_creation());
    }

    #[test]
    fn test_tool_call_ids_are_unique() {
        let a = ToolCall::new(ToolName::MoveObject, json!({"objectId": "x"}));
        let b = ToolCall::new(ToolName::MoveObject, json!({"objectId": "x"}));
        assert_ne!(a.id, b.id);
        assert_eq!(a.str_arg("objectId"), Some("x"));
    }
}
