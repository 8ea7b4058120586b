//! Shared data contracts for the command pipeline.
//!
//! Everything wire-visible lives here: the read-only board snapshot the
//! pipeline consumes, the operation-request vocabulary it produces, and the
//! color tables shared by the classifier and the layout engine.

pub mod board;
pub mod colors;
pub mod tool_call;

pub use board::{BoardObject, BoardState};
pub use tool_call::{ToolCall, ToolName};
