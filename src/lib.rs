//! boardflow: turns natural-language whiteboard commands into ordered
//! operation requests.
//!
//! The pipeline never mutates a board. Given a command and a read-only
//! board snapshot it produces a list of operation requests for the document
//! layer to apply, choosing the cheapest execution tier that can complete
//! the command and escalating when a tier comes up short.
//!
//! Entry points:
//! - [`Dispatcher::dispatch`] for one command,
//! - [`Dispatcher::continue_command`] to resume a paused orchestration,
//! - [`composer::Composer`] and [`layout`] for direct composition use.

pub mod agents;
pub mod composer;
pub mod dispatcher;
pub mod error;
pub mod intent;
pub mod layout;
pub mod llm;
pub mod orchestrator;
pub mod router;
pub mod types;

pub use dispatcher::{CommandOutcome, Dispatcher};
pub use error::{CompletionError, PipelineError};
pub use llm::{CompletionClient, OpenAiCompletion, ScriptedCompletion};
pub use orchestrator::{ExecutionPlan, Orchestrator, Task};
pub use router::{route_command, Route, Tier};
pub use types::{BoardObject, BoardState, ToolCall, ToolName};
