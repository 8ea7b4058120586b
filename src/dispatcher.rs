//! Top-level command dispatch.
//!
//! Composes the router, the tier executors, the orchestrator, and the
//! composer into one entry point. Tier failures that are locally
//! recoverable fall through a fixed chain (intent → mini → orchestrate);
//! only the terminal orchestration tier surfaces errors to the caller.

use std::sync::Arc;

use log::{debug, warn};

use crate::agents::complex::execute_complex_supervisor;
use crate::agents::mini::{detect_mini_agent, execute_mini_agent};
use crate::agents::single::execute_single_agent;
use crate::agents::TierOutcome;
use crate::composer::{is_composition_command, Composer};
use crate::error::PipelineError;
use crate::intent::classifier::IntentClassifier;
use crate::intent::executor::execute_from_intent;
use crate::llm::CompletionClient;
use crate::orchestrator::{Orchestrator, Task};
use crate::router::{route_command, Tier};
use crate::types::board::BoardState;
use crate::types::tool_call::ToolCall;

/// The command-level contract: operations to apply plus continuation state.
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub tool_calls: Vec<ToolCall>,
    pub summary: String,
    /// Paused awaiting applied results; resume via `continue_command`.
    pub needs_follow_up: bool,
    pub remaining_tasks: Vec<Task>,
}

impl CommandOutcome {
    fn finished(outcome: TierOutcome) -> Self {
        CommandOutcome {
            tool_calls: outcome.tool_calls,
            summary: outcome.summary,
            needs_follow_up: false,
            remaining_tasks: Vec::new(),
        }
    }
}

pub struct Dispatcher {
    client: Arc<dyn CompletionClient>,
    classifier: IntentClassifier,
    orchestrator: Orchestrator,
    composer: Composer,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("client", &self.client)
            .finish()
    }
}

impl Dispatcher {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Dispatcher {
            classifier: IntentClassifier::new(Arc::clone(&client)),
            orchestrator: Orchestrator::new(Arc::clone(&client)),
            composer: Composer::new(Arc::clone(&client)),
            client,
        }
    }

    /// Register a progress callback for long orchestration runs.
    pub fn with_progress(mut self, progress: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.orchestrator = Orchestrator::new(Arc::clone(&self.client)).with_progress(progress);
        self
    }

    /// Execute one command against a board snapshot.
    pub async fn dispatch(
        &self,
        message: &str,
        board: &BoardState,
    ) -> Result<CommandOutcome, PipelineError> {
        // Named compositions go straight to the planner+layout path; the
        // tier chain would decompose them into disconnected pieces.
        if is_composition_command(message) {
            match self.composer.compose(message, board).await {
                Ok(outcome) => return Ok(CommandOutcome::finished(outcome)),
                Err(err) if err.is_recoverable() => {
                    warn!("composer failed, falling back to orchestration: {err}");
                    return self.orchestrate(message, board).await;
                }
                Err(err) => return Err(err),
            }
        }

        let route = route_command(message, board.has_selection());
        debug!("routed to {:?} tier: {}", route.tier, route.reason);
        match route.tier {
            Tier::Intent => self.run_intent(message, board).await,
            Tier::Mini => {
                let agent = route.agent.as_deref().unwrap_or_default();
                self.run_mini(agent, message, board).await
            }
            Tier::Complex => match execute_complex_supervisor(&self.client, message, board).await {
                Ok(outcome) => Ok(CommandOutcome::finished(outcome)),
                Err(err) if err.is_recoverable() => {
                    warn!("complex supervisor failed, orchestrating: {err}");
                    self.orchestrate(message, board).await
                }
                Err(err) => Err(err),
            },
            Tier::Single => match execute_single_agent(&self.client, message, board).await {
                Ok(outcome) => Ok(CommandOutcome::finished(outcome)),
                Err(err) if err.is_recoverable() => {
                    warn!("single agent failed, orchestrating: {err}");
                    self.orchestrate(message, board).await
                }
                Err(err) => Err(err),
            },
            Tier::Orchestrate => self.orchestrate(message, board).await,
        }
    }

    /// Resume a paused orchestration with the ids the applied operations
    /// produced.
    pub async fn continue_command(
        &self,
        remaining_tasks: Vec<Task>,
        board: &BoardState,
        known_ids: &[String],
    ) -> Result<CommandOutcome, PipelineError> {
        let outcome = self
            .orchestrator
            .continue_orchestration(remaining_tasks, board, known_ids)
            .await?;
        Ok(CommandOutcome {
            tool_calls: outcome.tool_calls,
            summary: outcome.summary,
            needs_follow_up: outcome.needs_follow_up,
            remaining_tasks: outcome.remaining_tasks,
        })
    }

    /// Intent tier: classify, execute deterministically, escalate on a null
    /// result or a recoverable classification failure.
    async fn run_intent(
        &self,
        message: &str,
        board: &BoardState,
    ) -> Result<CommandOutcome, PipelineError> {
        match self.classifier.classify(message).await {
            Ok(intent) => {
                if let Some(execution) = execute_from_intent(&intent, board) {
                    return Ok(CommandOutcome {
                        tool_calls: execution.tool_calls,
                        summary: execution.summary,
                        needs_follow_up: false,
                        remaining_tasks: Vec::new(),
                    });
                }
                debug!("intent needs richer context, escalating");
            }
            Err(err) if err.is_recoverable() => {
                warn!("classification failed, escalating: {err}");
            }
            Err(err) => return Err(err),
        }
        match detect_mini_agent(message, board.has_selection()) {
            Some(agent) => self.run_mini(agent, message, board).await,
            None => self.orchestrate(message, board).await,
        }
    }

    /// Mini tier with its own fallback to orchestration.
    async fn run_mini(
        &self,
        agent: &str,
        message: &str,
        board: &BoardState,
    ) -> Result<CommandOutcome, PipelineError> {
        match execute_mini_agent(&self.client, agent, message, board).await {
            Ok(outcome) => Ok(CommandOutcome::finished(outcome)),
            Err(err) if err.is_recoverable() => {
                warn!("mini agent {agent} failed, orchestrating: {err}");
                self.orchestrate(message, board).await
            }
            Err(err) => Err(err),
        }
    }

    /// The terminal tier: orchestration errors surface to the caller.
    async fn orchestrate(
        &self,
        message: &str,
        board: &BoardState,
    ) -> Result<CommandOutcome, PipelineError> {
        let outcome = self.orchestrator.orchestrate(message, board).await?;
        Ok(CommandOutcome {
            tool_calls: outcome.tool_calls,
            summary: outcome.summary,
            needs_follow_up: outcome.needs_follow_up,
            remaining_tasks: outcome.remaining_tasks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{CompletionResponse, ScriptedCompletion, ToolInvocation};
    use crate::types::board::BoardObject;
    use crate::types::tool_call::ToolName;
    use serde_json::json;

    fn classified(arguments: serde_json::Value) -> CompletionResponse {
        CompletionResponse::from_invocations(vec![ToolInvocation::new(
            "classify_intent",
            arguments,
        )])
    }

    #[tokio::test]
    async fn test_create_five_red_circles_end_to_end() {
        let scripted = ScriptedCompletion::new();
        scripted.enqueue(classified(json!({
            "operation": "CREATE",
            "objectType": "shape",
            "shapeType": "circle",
            "quantity": 5,
            "color": "red",
        })));
        let dispatcher = Dispatcher::new(Arc::new(scripted));
        let outcome = dispatcher
            .dispatch("create 5 red circles", &BoardState::empty())
            .await
            .unwrap();
        assert_eq!(outcome.tool_calls.len(), 1);
        let call = &outcome.tool_calls[0];
        assert_eq!(call.name, ToolName::CreateShape);
        assert_eq!(call.str_arg("type"), Some("circle"));
        assert_eq!(call.num_arg("quantity"), Some(5.0));
        assert_eq!(call.str_arg("color"), Some("#EF4444"));
        assert!(!outcome.needs_follow_up);
    }

    #[tokio::test]
    async fn test_delete_all_circles_end_to_end() {
        let mut board = BoardState::empty();
        board.objects.push(BoardObject::new("c1", "circle", 0.0, 0.0));
        board.objects.push(BoardObject::new("c2", "circle", 100.0, 0.0));
        board.objects.push(BoardObject::new("s1", "sticky", 200.0, 0.0));

        let scripted = ScriptedCompletion::new();
        scripted.enqueue(classified(json!({
            "operation": "DELETE",
            "targetFilter": {"type": "shape", "shapeType": "circle"},
        })));
        let dispatcher = Dispatcher::new(Arc::new(scripted));
        let outcome = dispatcher
            .dispatch("delete all circles", &board)
            .await
            .unwrap();
        assert_eq!(outcome.tool_calls.len(), 1);
        assert_eq!(outcome.tool_calls[0].name, ToolName::DeleteObject);
        assert_eq!(
            outcome.tool_calls[0].arguments["objectIds"],
            json!(["c1", "c2"])
        );
    }

    #[tokio::test]
    async fn test_null_intent_escalates_to_mini() {
        let mut board = BoardState::empty();
        board.objects.push(BoardObject::new("a", "star", 0.0, 0.0));
        board.selected_ids = vec!["a".into()];

        let scripted = ScriptedCompletion::new();
        // Classifier says CONNECT, which the intent tier cannot execute;
        // "rotate the star" then matches the rotate mini agent.
        scripted.enqueue(classified(json!({"operation": "CONNECT"})));
        scripted.enqueue(CompletionResponse::from_invocations(vec![
            ToolInvocation::new("rotateObject", json!({"objectId": "a", "rotation": 90})),
        ]));
        let dispatcher = Dispatcher::new(Arc::new(scripted));
        let outcome = dispatcher.dispatch("rotate the star", &board).await.unwrap();
        assert_eq!(outcome.tool_calls.len(), 1);
        assert_eq!(outcome.tool_calls[0].name, ToolName::RotateObject);
    }

    #[tokio::test]
    async fn test_composition_bypasses_routing() {
        let scripted = ScriptedCompletion::new();
        scripted.enqueue(CompletionResponse::from_invocations(vec![
            ToolInvocation::new(
                "compose",
                json!({
                    "layout": "flow_horizontal",
                    "children": [
                        {"type": "shape", "text": "A", "connectTo": true},
                        {"type": "shape", "text": "B"}
                    ]
                }),
            ),
        ]));
        let dispatcher = Dispatcher::new(Arc::new(scripted));
        let outcome = dispatcher
            .dispatch("draw a flowchart from A to B", &BoardState::empty())
            .await
            .unwrap();
        assert!(outcome
            .tool_calls
            .iter()
            .any(|c| c.name == ToolName::CreateConnector));
    }

    #[tokio::test]
    async fn test_classifier_failure_downgrades_to_orchestration() {
        let scripted = ScriptedCompletion::new();
        // Classification returns no invocation; the command matches no mini
        // agent, so the dispatcher lands on orchestration.
        scripted.enqueue(CompletionResponse::from_text("sorry, no"));
        scripted.enqueue(CompletionResponse::from_text(
            &json!({
                "plan": [{"agent": "CreateAgent", "description": "one sticky per idea"}],
                "summary": "three idea stickies",
            })
            .to_string(),
        ));
        scripted.enqueue(CompletionResponse::from_invocations(vec![
            ToolInvocation::new("createStickyNote", json!({"text": "idea", "quantity": 3})),
        ]));
        let dispatcher = Dispatcher::new(Arc::new(scripted));
        let outcome = dispatcher
            .dispatch("put up three idea stickies", &BoardState::empty())
            .await
            .unwrap();
        assert_eq!(outcome.tool_calls.len(), 1);
        assert_eq!(outcome.summary, "three idea stickies");
    }

    #[tokio::test]
    async fn test_hard_failures_propagate() {
        let scripted = ScriptedCompletion::new();
        // An orchestrate-tier command whose plan is unparseable.
        scripted.enqueue(CompletionResponse::from_text("not a plan"));
        let dispatcher = Dispatcher::new(Arc::new(scripted));
        let result = dispatcher
            .dispatch(
                "first reorganize the board, then connect everything",
                &BoardState::empty(),
            )
            .await;
        match result {
            Err(err) => assert!(!err.is_recoverable()),
            Ok(_) => panic!("expected a hard failure"),
        }
    }
}
