//! Read-only board state consumed by the pipeline.
//!
//! The replication layer owns the live document; this module only models the
//! snapshot handed to a single command. Nothing here mutates board state —
//! the pipeline's output is a list of operation requests, applied elsewhere.

use serde::{Deserialize, Serialize};

/// Shape type names a board object may carry in its `type` field.
///
/// Used when a target filter says "shape" without naming a specific kind.
pub const SHAPE_TYPES: &[&str] = &[
    "rectangle",
    "square",
    "circle",
    "ellipse",
    "triangle",
    "diamond",
    "star",
    "hexagon",
    "arrow",
    "line",
];

/// A single object on the shared whiteboard.
///
/// Mirrors the external board-state contract. Width/height are absent for
/// circles, which carry `radius` instead; `color` and `fill` are both
/// consulted when matching colors because different object kinds use
/// different keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardObject {
    /// Stable object id assigned by the document layer.
    pub id: String,
    /// Object kind: `sticky`, `frame`, `text`, `connector`, or a shape name.
    #[serde(rename = "type")]
    pub object_type: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl BoardObject {
    /// Minimal constructor used throughout tests and fixtures.
    pub fn new(id: impl Into<String>, object_type: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            object_type: object_type.into(),
            x,
            y,
            ..Default::default()
        }
    }

    /// The color to use when matching against a filter (`color` wins
    /// over `fill`).
    pub fn display_color(&self) -> Option<&str> {
        self.color.as_deref().or(self.fill.as_deref())
    }

    /// Whether this object's type names a shape.
    pub fn is_shape(&self) -> bool {
        SHAPE_TYPES.contains(&self.object_type.as_str())
    }

    /// Whether this object is a frame.
    pub fn is_frame(&self) -> bool {
        self.object_type == "frame"
    }
}

/// Immutable snapshot of the board for one command.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardState {
    #[serde(default)]
    pub objects: Vec<BoardObject>,
    #[serde(default)]
    pub selected_ids: Vec<String>,
}

impl BoardState {
    /// An empty board with nothing selected.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Look up an object by id.
    pub fn find(&self, id: &str) -> Option<&BoardObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    /// Objects in the current selection, in selection order.
    pub fn selected_objects(&self) -> Vec<&BoardObject> {
        self.selected_ids
            .iter()
            .filter_map(|id| self.find(id))
            .collect()
    }

    /// The selected frame, when the selection is exactly one frame.
    ///
    /// Creation requests scope into this frame when present.
    pub fn selected_frame(&self) -> Option<&BoardObject> {
        match self.selected_objects().as_slice() {
            [only] if only.is_frame() => Some(only),
            _ => None,
        }
    }

    /// All object ids on the board, in document order.
    pub fn all_ids(&self) -> Vec<String> {
        self.objects.iter().map(|o| o.id.clone()).collect()
    }

    /// Whether anything is selected.
    pub fn has_selection(&self) -> bool {
        !self.selected_ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selected_frame_requires_single_frame_selection() {
        let mut board = BoardState::empty();
        board.objects.push(BoardObject::new("f1", "frame", 0.0, 0.0));
        board.objects.push(BoardObject::new("s1", "sticky", 10.0, 10.0));

        board.selected_ids = vec!["f1".into()];
        assert_eq!(board.selected_frame().map(|f| f.id.as_str()), Some("f1"));

        board.selected_ids = vec!["f1".into(), "s1".into()];
        assert!(board.selected_frame().is_none());

        board.selected_ids = vec!["s1".into()];
        assert!(board.selected_frame().is_none());
    }

    #[test]
    fn test_display_color_prefers_color_over_fill() {
        let mut obj = BoardObject::new("a", "circle", 0.0, 0.0);
        obj.fill = Some("#00ff00".into());
        assert_eq!(obj.display_color(), Some("#00ff00"));
        obj.color = Some("#ff0000".into());
        assert_eq!(obj.display_color(), Some("#ff0000"));
    }

    #[test]
    fn test_board_state_deserializes_external_contract() {
        let json = r##"{
            "objects": [
                {"id": "c1", "type": "circle", "x": 5, "y": 6, "radius": 40, "fill": "#EF4444"}
            ],
            "selectedIds": ["c1"]
        }"##;
        let board: BoardState = serde_json::from_str(json).unwrap();
        assert_eq!(board.objects.len(), 1);
        assert_eq!(board.objects[0].radius, Some(40.0));
        assert!(board.has_selection());
    }
}
