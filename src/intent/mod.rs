//! Single-shot intent classification and deterministic execution.
//!
//! The fastest tier: one structured-extraction call produces an [`Intent`],
//! deterministic correction passes repair known model failure modes, and
//! [`executor::execute_from_intent`] maps the result to operation requests
//! with no further model calls.

use serde::{Deserialize, Serialize};

pub mod classifier;
pub mod corrections;
pub mod executor;
pub mod target;

pub use classifier::IntentClassifier;
pub use executor::{execute_from_intent, IntentExecution};
pub use target::resolve_targets;

/// The fixed operation enum extracted from a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    Create,
    Update,
    Delete,
    Move,
    Resize,
    Rotate,
    ChangeColor,
    Arrange,
    Analyze,
    Connect,
    FitFrameToContents,
    MultiStep,
    Unknown,
}

impl Default for Operation {
    fn default() -> Self {
        Operation::Unknown
    }
}

/// Filter describing which board objects an operation targets.
///
/// Resolved against external board state; never mutates it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TargetFilter {
    /// Object kind: `sticky`, `shape`, `text`, `frame`, or a shape name.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,
    /// Specific shape kind, when `object_type` is `shape`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape_type: Option<String>,
    /// Color to match, hex or named.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Target the current selection instead of filtering.
    pub use_selection: bool,
}

/// Structured extraction of one command.
///
/// Produced per-request by the classifier, consumed once by the executor,
/// then discarded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Intent {
    pub operation: Operation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<u32>,
    /// Single requested color; the literal string `random` asks the
    /// consumer to cycle the palette.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Per-object color list for mixed-color creations.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub colors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    /// Relative movement direction: `left`, `right`, `up`, `down`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_filter: Option<TargetFilter>,
    pub is_multi_step: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_deserializes_classifier_output() {
        let json = r#"{
            "operation": "CREATE",
            "objectType": "shape",
            "shapeType": "circle",
            "quantity": 5,
            "color": "red"
        }"#;
        let intent: Intent = serde_json::from_str(json).unwrap();
        assert_eq!(intent.operation, Operation::Create);
        assert_eq!(intent.shape_type.as_deref(), Some("circle"));
        assert_eq!(intent.quantity, Some(5));
        assert!(!intent.is_multi_step);
    }

    #[test]
    fn test_target_filter_wire_names() {
        let json = r#"{"type": "shape", "shapeType": "circle", "useSelection": false}"#;
        let filter: TargetFilter = serde_json::from_str(json).unwrap();
        assert_eq!(filter.object_type.as_deref(), Some("shape"));
        assert_eq!(filter.shape_type.as_deref(), Some("circle"));
    }
}
