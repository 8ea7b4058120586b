//! Composition Plan schema.
//!
//! A declarative, largely coordinate-free tree describing a multi-object
//! layout. The planner emits exactly one [`CompositionPlan`]; the layout
//! engine converts it to operation requests. Parsing is deliberately
//! infallible: layout computation never raises, so unknown node kinds and
//! unknown layout names degrade to defaults at parse time instead of
//! aborting the composition.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Layout kinds
// ---------------------------------------------------------------------------

/// Layout algorithm for a plan level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutKind {
    Columns,
    StackHorizontal,
    StackVertical,
    FlowHorizontal,
    FlowVertical,
    Grid,
    Radial,
    /// The planner supplies absolute per-child coordinates.
    Freeform,
}

impl LayoutKind {
    /// Parse a layout name. Unknown names return `None`; callers fall back
    /// to [`LayoutKind::default`].
    pub fn parse(name: &str) -> Option<LayoutKind> {
        match name.trim() {
            "columns" => Some(LayoutKind::Columns),
            "stack_horizontal" => Some(LayoutKind::StackHorizontal),
            "stack_vertical" => Some(LayoutKind::StackVertical),
            "flow_horizontal" => Some(LayoutKind::FlowHorizontal),
            "flow_vertical" => Some(LayoutKind::FlowVertical),
            "grid" => Some(LayoutKind::Grid),
            "radial" => Some(LayoutKind::Radial),
            "freeform" => Some(LayoutKind::Freeform),
            _ => None,
        }
    }

    /// Whether the main axis runs left-to-right.
    pub fn is_horizontal(&self) -> bool {
        matches!(
            self,
            LayoutKind::Columns
                | LayoutKind::StackHorizontal
                | LayoutKind::FlowHorizontal
                | LayoutKind::Grid
                | LayoutKind::Radial
                | LayoutKind::Freeform
        )
    }

    /// Whether this is a flow layout (wider gaps so connector lines stay
    /// legible).
    pub fn is_flow(&self) -> bool {
        matches!(self, LayoutKind::FlowHorizontal | LayoutKind::FlowVertical)
    }
}

impl Default for LayoutKind {
    fn default() -> Self {
        LayoutKind::StackHorizontal
    }
}

impl<'de> Deserialize<'de> for LayoutKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(LayoutKind::parse(&name).unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Aspect
// ---------------------------------------------------------------------------

/// Size multiplier applied to a leaf's base size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Aspect {
    Square,
    Wide,
    Tall,
    TallNarrow,
    Small,
    Large,
}

impl Aspect {
    /// Width and height multipliers.
    pub fn factors(&self) -> (f64, f64) {
        match self {
            Aspect::Square => (1.0, 1.0),
            Aspect::Wide => (1.6, 1.0),
            Aspect::Tall => (1.0, 1.6),
            Aspect::TallNarrow => (0.7, 1.5),
            Aspect::Small => (0.6, 0.6),
            Aspect::Large => (1.5, 1.5),
        }
    }

    /// Parse an aspect name, `None` for unknown.
    pub fn parse(name: &str) -> Option<Aspect> {
        match name.trim() {
            "square" => Some(Aspect::Square),
            "wide" => Some(Aspect::Wide),
            "tall" => Some(Aspect::Tall),
            "tall_narrow" => Some(Aspect::TallNarrow),
            "small" => Some(Aspect::Small),
            "large" => Some(Aspect::Large),
            _ => None,
        }
    }
}

impl Default for Aspect {
    fn default() -> Self {
        Aspect::Square
    }
}

impl<'de> Deserialize<'de> for Aspect {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Aspect::parse(&name).unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Branches
// ---------------------------------------------------------------------------

/// Direction a branch extends from its source node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchDirection {
    Up,
    Down,
    Left,
    Right,
}

/// An alternate sub-flow hanging off a node, connector-chained from the
/// source through each step in order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Branch {
    /// Offset direction; defaults perpendicular to the main flow axis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<BranchDirection>,
    /// Ordered branch steps.
    #[serde(default)]
    pub steps: Vec<PlanNode>,
}

// ---------------------------------------------------------------------------
// Plan nodes
// ---------------------------------------------------------------------------

/// Fields shared by all leaf node kinds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LeafNode {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Required under `freeform` layout; ignored elsewhere unless explicit
    /// positions are requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect: Option<Aspect>,
    /// Connect this node to its next sibling (chain semantics).
    pub connect_to: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<Branch>,
}

/// A shape leaf: a [`LeafNode`] plus the shape kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeNode {
    #[serde(default = "default_shape")]
    pub shape: String,
    #[serde(flatten)]
    pub leaf: LeafNode,
}

fn default_shape() -> String {
    "rectangle".into()
}

impl Default for ShapeNode {
    fn default() -> Self {
        Self {
            shape: default_shape(),
            leaf: LeafNode::default(),
        }
    }
}

/// A container node whose children are laid out by its own layout
/// algorithm.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContainerNode {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    pub connect_to: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<Branch>,
    pub children: Vec<PlanNode>,
}

/// One node of a composition tree.
///
/// Tagged union over the node kinds; container kinds nest further nodes.
/// Deserialization cannot fail: an unknown `type` tag degrades to a default
/// rectangle shape carrying whatever text the node had.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PlanNode {
    Sticky(LeafNode),
    Shape(ShapeNode),
    Text(LeafNode),
    TextBubble(LeafNode),
    Frame(ContainerNode),
    Column(ContainerNode),
    Group(ContainerNode),
}

impl PlanNode {
    /// Build a node from raw JSON; never fails.
    pub fn from_value(value: &Value) -> PlanNode {
        let kind = value.get("type").and_then(Value::as_str).unwrap_or("shape");
        match kind {
            "sticky" => PlanNode::Sticky(leaf_from(value)),
            "shape" => PlanNode::Shape(ShapeNode {
                shape: value
                    .get("shape")
                    .and_then(Value::as_str)
                    .unwrap_or("rectangle")
                    .to_string(),
                leaf: leaf_from(value),
            }),
            "text" => PlanNode::Text(leaf_from(value)),
            "textBubble" => PlanNode::TextBubble(leaf_from(value)),
            "frame" => PlanNode::Frame(container_from(value)),
            "column" => PlanNode::Column(container_from(value)),
            "group" => PlanNode::Group(container_from(value)),
            other => {
                log::debug!("unknown plan node kind '{other}', emitting default rectangle");
                PlanNode::Shape(ShapeNode {
                    shape: "rectangle".into(),
                    leaf: leaf_from(value),
                })
            }
        }
    }

    /// Whether this node chains a connector to its next sibling.
    pub fn connect_to(&self) -> bool {
        match self {
            PlanNode::Sticky(l) | PlanNode::Text(l) | PlanNode::TextBubble(l) => l.connect_to,
            PlanNode::Shape(s) => s.leaf.connect_to,
            PlanNode::Frame(c) | PlanNode::Column(c) | PlanNode::Group(c) => c.connect_to,
        }
    }

    /// The node's branch, if any.
    pub fn branch(&self) -> Option<&Branch> {
        match self {
            PlanNode::Sticky(l) | PlanNode::Text(l) | PlanNode::TextBubble(l) => l.branch.as_ref(),
            PlanNode::Shape(s) => s.leaf.branch.as_ref(),
            PlanNode::Frame(c) | PlanNode::Column(c) | PlanNode::Group(c) => c.branch.as_ref(),
        }
    }

    /// Explicit coordinates, when the planner supplied them.
    pub fn position(&self) -> Option<(f64, f64)> {
        let (x, y) = match self {
            PlanNode::Sticky(l) | PlanNode::Text(l) | PlanNode::TextBubble(l) => (l.x, l.y),
            PlanNode::Shape(s) => (s.leaf.x, s.leaf.y),
            PlanNode::Frame(c) | PlanNode::Column(c) | PlanNode::Group(c) => (c.x, c.y),
        };
        match (x, y) {
            (Some(x), Some(y)) => Some((x, y)),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for PlanNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(PlanNode::from_value(&value))
    }
}

fn leaf_from(value: &Value) -> LeafNode {
    LeafNode {
        text: value
            .get("text")
            .or_else(|| value.get("label"))
            .and_then(Value::as_str)
            .map(String::from),
        x: value.get("x").and_then(Value::as_f64),
        y: value.get("y").and_then(Value::as_f64),
        color: value.get("color").and_then(Value::as_str).map(String::from),
        aspect: value
            .get("aspect")
            .and_then(Value::as_str)
            .and_then(Aspect::parse),
        connect_to: value
            .get("connectTo")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        branch: value
            .get("branch")
            .cloned()
            .and_then(|b| serde_json::from_value(b).ok()),
    }
}

fn container_from(value: &Value) -> ContainerNode {
    ContainerNode {
        title: value
            .get("title")
            .or_else(|| value.get("text"))
            .and_then(Value::as_str)
            .map(String::from),
        layout: value
            .get("layout")
            .and_then(Value::as_str)
            .and_then(LayoutKind::parse),
        color: value.get("color").and_then(Value::as_str).map(String::from),
        x: value.get("x").and_then(Value::as_f64),
        y: value.get("y").and_then(Value::as_f64),
        connect_to: value
            .get("connectTo")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        branch: value
            .get("branch")
            .cloned()
            .and_then(|b| serde_json::from_value(b).ok()),
        children: value
            .get("children")
            .and_then(Value::as_array)
            .map(|kids| kids.iter().map(PlanNode::from_value).collect())
            .unwrap_or_default(),
    }
}

// ---------------------------------------------------------------------------
// CompositionPlan
// ---------------------------------------------------------------------------

/// The planner's declarative output for one composition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositionPlan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub layout: LayoutKind,
    #[serde(default = "default_true")]
    pub wrap_in_frame: bool,
    #[serde(default)]
    pub children: Vec<PlanNode>,
}

fn default_true() -> bool {
    true
}

impl CompositionPlan {
    /// Build a plan from raw JSON; never fails.
    pub fn from_value(value: &Value) -> CompositionPlan {
        CompositionPlan {
            title: value.get("title").and_then(Value::as_str).map(String::from),
            layout: value
                .get("layout")
                .and_then(Value::as_str)
                .and_then(LayoutKind::parse)
                .unwrap_or_default(),
            wrap_in_frame: value
                .get("wrapInFrame")
                .and_then(Value::as_bool)
                .unwrap_or(true),
            children: value
                .get("children")
                .and_then(Value::as_array)
                .map(|kids| kids.iter().map(PlanNode::from_value).collect())
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_node_kind_degrades_to_rectangle() {
        let node = PlanNode::from_value(&json!({"type": "hologram", "text": "hi"}));
        match node {
            PlanNode::Shape(s) => {
                assert_eq!(s.shape, "rectangle");
                assert_eq!(s.leaf.text.as_deref(), Some("hi"));
            }
            other => panic!("expected shape fallback, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_layout_falls_back_to_horizontal() {
        let plan = CompositionPlan::from_value(&json!({"layout": "spiral", "children": []}));
        assert_eq!(plan.layout, LayoutKind::StackHorizontal);
        assert!(plan.wrap_in_frame);
    }

    #[test]
    fn test_nested_tree_parses_recursively() {
        let plan = CompositionPlan::from_value(&json!({
            "title": "Retro",
            "layout": "columns",
            "children": [
                {"type": "column", "title": "Went well", "children": [
                    {"type": "sticky", "text": "shipped", "color": "green"},
                    {"type": "sticky", "text": "tests"}
                ]},
                {"type": "column", "title": "Improve", "children": [
                    {"type": "sticky", "text": "reviews"},
                    {"type": "sticky", "text": "standups"}
                ]}
            ]
        }));
        assert_eq!(plan.layout, LayoutKind::Columns);
        assert_eq!(plan.children.len(), 2);
        match &plan.children[0] {
            PlanNode::Column(c) => {
                assert_eq!(c.title.as_deref(), Some("Went well"));
                assert_eq!(c.children.len(), 2);
            }
            other => panic!("expected column, got {other:?}"),
        }
    }

    #[test]
    fn test_connect_to_and_branch_roundtrip() {
        let node = PlanNode::from_value(&json!({
            "type": "shape",
            "shape": "circle",
            "text": "Start",
            "connectTo": true,
            "branch": {"direction": "down", "steps": [{"type": "sticky", "text": "alt"}]}
        }));
        assert!(node.connect_to());
        let branch = node.branch().unwrap();
        assert_eq!(branch.direction, Some(BranchDirection::Down));
        assert_eq!(branch.steps.len(), 1);
    }

    #[test]
    fn test_freeform_positions_read_back() {
        let node = PlanNode::from_value(&json!({"type": "sticky", "x": 10.0, "y": 20.0}));
        assert_eq!(node.position(), Some((10.0, 20.0)));
        let missing = PlanNode::from_value(&json!({"type": "sticky", "x": 10.0}));
        assert_eq!(missing.position(), None);
    }
}
