//! Deterministic composition engine.
//!
//! Converts a [`CompositionPlan`] into pixel-exact creation and connector
//! requests. Pure with respect to its inputs: the same plan, anchor, and a
//! fresh [`LayoutContext`] always yield the same output. Never fails —
//! malformed trees degrade at parse time, and every geometric edge case has
//! a deterministic fallback.
//!
//! Coordinate convention: circular shapes are emitted with center-based
//! coordinates while every other kind uses top-left. The asymmetry keeps a
//! circle's visual center on the shared centerline of its rectangular
//! neighbors; all bounding-box arithmetic here accounts for it.

use serde_json::{json, Value};

use crate::composer::plan::{Branch, BranchDirection, CompositionPlan, LayoutKind, PlanNode};
use crate::layout::context::LayoutContext;
use crate::layout::geometry::{
    column_extent, column_positions, grid_extent, grid_positions, radial_extent, radial_positions,
    row_extent, row_positions, union_all, Point, Rect, Size, FLOW_GAP, FRAME_PADDING, GAP,
    OUTER_FRAME_PADDING,
};
use crate::types::board::BoardObject;
use crate::types::colors::resolve_color;
use crate::types::tool_call::{ToolCall, ToolName};

// ---------------------------------------------------------------------------
// Base sizes
// ---------------------------------------------------------------------------

/// Base size of a sticky note.
pub const STICKY_SIZE: Size = Size {
    width: 180.0,
    height: 180.0,
};

/// Base size of a non-circular shape.
pub const SHAPE_SIZE: Size = Size {
    width: 160.0,
    height: 100.0,
};

/// Base diameter of a circle.
pub const CIRCLE_SIZE: Size = Size {
    width: 120.0,
    height: 120.0,
};

/// Base size of a text element.
pub const TEXT_SIZE: Size = Size {
    width: 220.0,
    height: 40.0,
};

/// Base size of a text bubble.
pub const TEXT_BUBBLE_SIZE: Size = Size {
    width: 220.0,
    height: 100.0,
};

/// Fallback frame size for a container with no children.
const EMPTY_FRAME_SIZE: Size = Size {
    width: 240.0,
    height: 160.0,
};

/// An existing frame the composition must fit inside.
#[derive(Debug, Clone)]
pub struct FrameInfo {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl FrameInfo {
    /// Build from a board object, when it is a frame with a known size.
    pub fn from_board_object(obj: &BoardObject) -> Option<FrameInfo> {
        if !obj.is_frame() {
            return None;
        }
        Some(FrameInfo {
            id: obj.id.clone(),
            x: obj.x,
            y: obj.y,
            width: obj.width?,
            height: obj.height?,
        })
    }
}

/// Result of emitting one node: the index of its primary request (connector
/// target) and its bounds.
#[derive(Debug, Clone, Copy)]
struct NodeEmission {
    primary: Option<usize>,
    bounds: Rect,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Convert a composition plan into an ordered list of operation requests.
///
/// `anchor` translates the whole composition; `frame` constrains it to an
/// existing frame's padded interior (overflow uniformly scales the entire
/// batch down, preserving relative layout). `use_explicit_positions` honors
/// per-child coordinates even under a non-freeform layout, when every child
/// carries them.
pub fn plan_to_tool_calls(
    plan: &CompositionPlan,
    anchor: Point,
    frame: Option<&FrameInfo>,
    use_explicit_positions: bool,
    ctx: &mut LayoutContext,
) -> Vec<ToolCall> {
    let mut out = Vec::new();

    let origin = match frame {
        Some(f) => Point::new(f.x + FRAME_PADDING, f.y + FRAME_PADDING),
        None => anchor,
    };

    let all_positioned =
        !plan.children.is_empty() && plan.children.iter().all(|c| c.position().is_some());
    let kind = if use_explicit_positions && all_positioned {
        LayoutKind::Freeform
    } else {
        plan.layout
    };

    emit_level(kind, &plan.children, origin, &mut out, ctx);

    if let Some(f) = frame {
        let interior = Rect::new(f.x, f.y, f.width, f.height).inset(FRAME_PADDING);
        if let Some(bounds) = emitted_bounds(&out) {
            if bounds.width > interior.width || bounds.height > interior.height {
                let scale = (interior.width / bounds.width)
                    .min(interior.height / bounds.height)
                    .min(1.0);
                log::debug!("composition overflows frame {}, scaling by {scale:.3}", f.id);
                scale_about(&mut out, Point::new(interior.x, interior.y), scale);
            }
        }
    } else if plan.wrap_in_frame {
        if let Some(bounds) = emitted_bounds(&out) {
            let outer = bounds.outset(OUTER_FRAME_PADDING);
            out.push(ToolCall::new(
                ToolName::CreateFrame,
                json!({
                    "title": plan.title.clone().unwrap_or_else(|| "Composition".into()),
                    "x": outer.x,
                    "y": outer.y,
                    "width": outer.width,
                    "height": outer.height,
                }),
            ));
        }
    }

    out
}

// ---------------------------------------------------------------------------
// Measurement
// ---------------------------------------------------------------------------

fn leaf_size(base: Size, aspect: Option<crate::composer::plan::Aspect>) -> Size {
    let (fw, fh) = aspect.unwrap_or_default().factors();
    Size::new(base.width * fw, base.height * fh)
}

fn measure(node: &PlanNode) -> Size {
    match node {
        PlanNode::Sticky(l) => leaf_size(STICKY_SIZE, l.aspect),
        PlanNode::Shape(s) => {
            let base = if s.shape == "circle" {
                CIRCLE_SIZE
            } else {
                SHAPE_SIZE
            };
            leaf_size(base, s.leaf.aspect)
        }
        PlanNode::Text(l) => leaf_size(TEXT_SIZE, l.aspect),
        PlanNode::TextBubble(l) => leaf_size(TEXT_BUBBLE_SIZE, l.aspect),
        PlanNode::Frame(c) | PlanNode::Column(c) => {
            if c.children.is_empty() {
                return EMPTY_FRAME_SIZE;
            }
            let kind = c.layout.unwrap_or(default_container_layout(node));
            let inner = extent_for(kind, &c.children);
            Size::new(
                inner.width + 2.0 * FRAME_PADDING,
                inner.height + 2.0 * FRAME_PADDING,
            )
        }
        PlanNode::Group(c) => {
            let kind = c.layout.unwrap_or(default_container_layout(node));
            extent_for(kind, &c.children)
        }
    }
}

fn default_container_layout(node: &PlanNode) -> LayoutKind {
    match node {
        PlanNode::Column(_) => LayoutKind::StackVertical,
        PlanNode::Frame(_) => LayoutKind::Grid,
        _ => LayoutKind::StackHorizontal,
    }
}

fn gap_for(kind: LayoutKind) -> f64 {
    if kind.is_flow() {
        FLOW_GAP
    } else {
        GAP
    }
}

fn extent_for(kind: LayoutKind, children: &[PlanNode]) -> Size {
    let sizes: Vec<Size> = children.iter().map(measure).collect();
    match kind {
        LayoutKind::Columns | LayoutKind::StackHorizontal => row_extent(&sizes, GAP),
        LayoutKind::FlowHorizontal => row_extent(&sizes, FLOW_GAP),
        LayoutKind::StackVertical => column_extent(&sizes, GAP),
        LayoutKind::FlowVertical => column_extent(&sizes, FLOW_GAP),
        LayoutKind::Grid => grid_extent(&sizes, GAP),
        LayoutKind::Radial => radial_extent(&sizes, GAP),
        LayoutKind::Freeform => {
            if children.iter().all(|c| c.position().is_some()) && !children.is_empty() {
                let rects: Vec<Rect> = children
                    .iter()
                    .zip(&sizes)
                    .map(|(c, s)| {
                        let (x, y) = c.position().unwrap_or((0.0, 0.0));
                        Rect::new(x, y, s.width, s.height)
                    })
                    .collect();
                union_all(&rects)
                    .map(|r| Size::new(r.width, r.height))
                    .unwrap_or_default()
            } else {
                row_extent(&sizes, GAP)
            }
        }
    }
}

fn positions_for(
    kind: LayoutKind,
    children: &[PlanNode],
    sizes: &[Size],
    origin: Point,
) -> Vec<Point> {
    match kind {
        LayoutKind::Columns | LayoutKind::StackHorizontal => row_positions(sizes, origin, GAP),
        LayoutKind::FlowHorizontal => row_positions(sizes, origin, FLOW_GAP),
        LayoutKind::StackVertical => column_positions(sizes, origin, GAP),
        LayoutKind::FlowVertical => column_positions(sizes, origin, FLOW_GAP),
        LayoutKind::Grid => grid_positions(sizes, origin, GAP),
        LayoutKind::Radial => radial_positions(sizes, origin, GAP),
        LayoutKind::Freeform => {
            if children.iter().all(|c| c.position().is_some()) && !children.is_empty() {
                // Caller-supplied offsets, translated by the anchor only.
                children
                    .iter()
                    .map(|c| {
                        let (x, y) = c.position().unwrap_or((0.0, 0.0));
                        Point::new(origin.x + x, origin.y + y)
                    })
                    .collect()
            } else {
                // Deterministic horizontal fallback for missing coordinates.
                row_positions(sizes, origin, GAP)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Emission
// ---------------------------------------------------------------------------

fn emit_level(
    kind: LayoutKind,
    children: &[PlanNode],
    origin: Point,
    out: &mut Vec<ToolCall>,
    ctx: &mut LayoutContext,
) -> Option<Rect> {
    let sizes: Vec<Size> = children.iter().map(measure).collect();
    let positions = positions_for(kind, children, &sizes, origin);

    let emissions: Vec<NodeEmission> = children
        .iter()
        .zip(&positions)
        .map(|(child, pos)| emit_node(child, *pos, out, ctx))
        .collect();

    // Chain connectors: a node with connect_to links to its next sibling
    // only, resolved by positional index into already-emitted requests.
    for i in 0..emissions.len().saturating_sub(1) {
        if children[i].connect_to() {
            if let (Some(from), Some(to)) = (emissions[i].primary, emissions[i + 1].primary) {
                push_connector(out, from, to);
            }
        }
    }

    let mut bounds: Vec<Rect> = emissions.iter().map(|e| e.bounds).collect();

    for (child, emission) in children.iter().zip(&emissions) {
        if let Some(branch) = child.branch() {
            if let Some(branch_bounds) =
                emit_branch(emission, branch, kind.is_horizontal(), out, ctx)
            {
                bounds.push(branch_bounds);
            }
        }
    }

    union_all(&bounds)
}

fn emit_node(
    node: &PlanNode,
    pos: Point,
    out: &mut Vec<ToolCall>,
    ctx: &mut LayoutContext,
) -> NodeEmission {
    let size = measure(node);
    match node {
        PlanNode::Sticky(l) => {
            let color = leaf_color(&l.color, ctx);
            push_leaf(
                out,
                ToolName::CreateStickyNote,
                json!({
                    "text": l.text.clone().unwrap_or_default(),
                    "x": pos.x,
                    "y": pos.y,
                    "width": size.width,
                    "height": size.height,
                    "color": color,
                }),
                pos,
                size,
            )
        }
        PlanNode::Shape(s) => {
            let color = leaf_color(&s.leaf.color, ctx);
            if s.shape == "circle" {
                // Center-based coordinates; see module docs.
                let radius = size.width.min(size.height) / 2.0;
                let center = Point::new(pos.x + size.width / 2.0, pos.y + size.height / 2.0);
                let index = out.len();
                out.push(ToolCall::new(
                    ToolName::CreateShape,
                    json!({
                        "shapeType": "circle",
                        "text": s.leaf.text.clone().unwrap_or_default(),
                        "x": center.x,
                        "y": center.y,
                        "radius": radius,
                        "color": color,
                    }),
                ));
                NodeEmission {
                    primary: Some(index),
                    bounds: Rect::new(center.x - radius, center.y - radius, 2.0 * radius, 2.0 * radius),
                }
            } else {
                push_leaf(
                    out,
                    ToolName::CreateShape,
                    json!({
                        "shapeType": s.shape,
                        "text": s.leaf.text.clone().unwrap_or_default(),
                        "x": pos.x,
                        "y": pos.y,
                        "width": size.width,
                        "height": size.height,
                        "color": color,
                    }),
                    pos,
                    size,
                )
            }
        }
        PlanNode::Text(l) => push_leaf(
            out,
            ToolName::CreateText,
            json!({
                "text": l.text.clone().unwrap_or_default(),
                "x": pos.x,
                "y": pos.y,
                "width": size.width,
                "height": size.height,
            }),
            pos,
            size,
        ),
        PlanNode::TextBubble(l) => {
            let color = leaf_color(&l.color, ctx);
            push_leaf(
                out,
                ToolName::CreateTextBubble,
                json!({
                    "text": l.text.clone().unwrap_or_default(),
                    "x": pos.x,
                    "y": pos.y,
                    "width": size.width,
                    "height": size.height,
                    "color": color,
                }),
                pos,
                size,
            )
        }
        PlanNode::Frame(c) | PlanNode::Column(c) => {
            let kind = c.layout.unwrap_or(default_container_layout(node));
            let interior_origin = Point::new(pos.x + FRAME_PADDING, pos.y + FRAME_PADDING);
            let child_union = emit_level(kind, &c.children, interior_origin, out, ctx);
            // The frame is sized to the union of its children's bounds,
            // then emitted after them so connector indices stay valid.
            let frame_rect = match child_union {
                Some(u) => u.outset(FRAME_PADDING),
                None => Rect::from_point_size(pos, EMPTY_FRAME_SIZE),
            };
            let index = out.len();
            out.push(ToolCall::new(
                ToolName::CreateFrame,
                json!({
                    "title": c.title.clone().unwrap_or_default(),
                    "x": frame_rect.x,
                    "y": frame_rect.y,
                    "width": frame_rect.width,
                    "height": frame_rect.height,
                }),
            ));
            NodeEmission {
                primary: Some(index),
                bounds: frame_rect,
            }
        }
        PlanNode::Group(c) => {
            let kind = c.layout.unwrap_or(default_container_layout(node));
            let before = out.len();
            let child_union = emit_level(kind, &c.children, pos, out, ctx);
            let primary = if out.len() > before { Some(before) } else { None };
            NodeEmission {
                primary,
                bounds: child_union.unwrap_or_else(|| Rect::from_point_size(pos, size)),
            }
        }
    }
}

fn push_leaf(
    out: &mut Vec<ToolCall>,
    name: ToolName,
    arguments: Value,
    pos: Point,
    size: Size,
) -> NodeEmission {
    let index = out.len();
    out.push(ToolCall::new(name, arguments));
    NodeEmission {
        primary: Some(index),
        bounds: Rect::from_point_size(pos, size),
    }
}

fn push_connector(out: &mut Vec<ToolCall>, from: usize, to: usize) {
    out.push(ToolCall::new(
        ToolName::CreateConnector,
        json!({"fromIndex": from, "toIndex": to}),
    ));
}

fn leaf_color(color: &Option<String>, ctx: &mut LayoutContext) -> String {
    match color.as_deref() {
        None => ctx.next_color().to_string(),
        Some(c) if c.eq_ignore_ascii_case("random") => ctx.next_color().to_string(),
        Some(c) => resolve_color(c).unwrap_or_else(|| c.to_string()),
    }
}

fn emit_branch(
    source: &NodeEmission,
    branch: &Branch,
    horizontal_flow: bool,
    out: &mut Vec<ToolCall>,
    ctx: &mut LayoutContext,
) -> Option<Rect> {
    // Branches extend perpendicular to the main flow axis by default.
    let direction = branch.direction.unwrap_or(if horizontal_flow {
        BranchDirection::Down
    } else {
        BranchDirection::Right
    });

    let mut prev_rect = source.bounds;
    let mut prev_primary = source.primary;
    let mut bounds: Vec<Rect> = Vec::new();

    for step in &branch.steps {
        let size = measure(step);
        let pos = match direction {
            BranchDirection::Down => Point::new(
                source.bounds.center_x() - size.width / 2.0,
                prev_rect.bottom() + FLOW_GAP,
            ),
            BranchDirection::Up => Point::new(
                source.bounds.center_x() - size.width / 2.0,
                prev_rect.y - FLOW_GAP - size.height,
            ),
            BranchDirection::Right => Point::new(
                prev_rect.right() + FLOW_GAP,
                source.bounds.center_y() - size.height / 2.0,
            ),
            BranchDirection::Left => Point::new(
                prev_rect.x - FLOW_GAP - size.width,
                source.bounds.center_y() - size.height / 2.0,
            ),
        };
        let emission = emit_node(step, pos, out, ctx);
        if let (Some(from), Some(to)) = (prev_primary, emission.primary) {
            push_connector(out, from, to);
        }
        bounds.push(emission.bounds);
        prev_rect = emission.bounds;
        prev_primary = emission.primary;
    }

    union_all(&bounds)
}

// ---------------------------------------------------------------------------
// Bounds and scaling
// ---------------------------------------------------------------------------

/// Bounds of one emitted request; `None` for connectors and requests
/// without geometry.
pub fn bounds_of(call: &ToolCall) -> Option<Rect> {
    if call.name.is_connector() || call.name.is_analysis() {
        return None;
    }
    let x = call.num_arg("x")?;
    let y = call.num_arg("y")?;
    if let Some(radius) = call.num_arg("radius") {
        // Center-based circle.
        return Some(Rect::new(x - radius, y - radius, 2.0 * radius, 2.0 * radius));
    }
    let width = call.num_arg("width")?;
    let height = call.num_arg("height")?;
    Some(Rect::new(x, y, width, height))
}

/// Axis-aligned bounding box over all non-connector requests.
pub fn emitted_bounds(calls: &[ToolCall]) -> Option<Rect> {
    let rects: Vec<Rect> = calls.iter().filter_map(bounds_of).collect();
    union_all(&rects)
}

/// Uniformly scale every request's geometry about `origin`.
fn scale_about(calls: &mut [ToolCall], origin: Point, scale: f64) {
    for call in calls.iter_mut() {
        let args = match call.arguments.as_object_mut() {
            Some(map) => map,
            None => continue,
        };
        let scale_key = |map: &mut serde_json::Map<String, Value>, key: &str, base: f64| {
            if let Some(v) = map.get(key).and_then(Value::as_f64) {
                map.insert(key.into(), json!(base + (v - base) * scale));
            }
        };
        scale_key(args, "x", origin.x);
        scale_key(args, "y", origin.y);
        for key in ["width", "height", "radius"] {
            if let Some(v) = args.get(key).and_then(Value::as_f64) {
                args.insert(key.into(), json!(v * scale));
            }
        }
    }
}
