//! Deterministic layout engine.
//!
//! Pure geometry: a declarative composition tree goes in, pixel-exact
//! creation and connector requests come out. No completion calls, no I/O,
//! and no module-level state — the color round-robin lives in a
//! per-composition [`LayoutContext`].

pub mod context;
pub mod engine;
pub mod geometry;

pub use context::LayoutContext;
pub use engine::{bounds_of, emitted_bounds, plan_to_tool_calls, FrameInfo};
pub use geometry::{Point, Rect, Size};
