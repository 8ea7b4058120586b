//! Supervisor/worker orchestration.
//!
//! One planning call decomposes a command into worker tasks. Tasks are
//! partitioned into ordered batches; batches run strictly in sequence while
//! tasks inside a batch fan out concurrently. A batch that needs the applied
//! results of earlier batches pauses the run instead of letting the planner
//! guess object ids: the caller applies the operations produced so far and
//! resumes with the real ids.

pub mod plan;

use std::sync::Arc;

use futures::future;
use log::debug;
use serde_json::Value;

use crate::agents::analysis::{narrate_analysis, resolve_analysis};
use crate::agents::workers::{find_worker, WORKER_AGENTS};
use crate::error::PipelineError;
use crate::llm::{CompletionClient, CompletionRequest, Message};
use crate::types::board::BoardState;
use crate::types::tool_call::ToolCall;

pub use plan::{partition_batches, Batch, ExecutionPlan, Task};

type ProgressFn = Box<dyn Fn(&str) + Send + Sync>;

/// What one orchestration pass hands back.
#[derive(Debug, Clone)]
pub struct OrchestrationOutcome {
    pub tool_calls: Vec<ToolCall>,
    pub summary: String,
    /// The run paused at a batch that needs applied prior results.
    pub needs_follow_up: bool,
    /// Tasks not yet executed, in order; empty unless paused.
    pub remaining_tasks: Vec<Task>,
}

/// One worker's output for one task.
#[derive(Debug, Clone)]
struct TaskResult {
    tool_calls: Vec<ToolCall>,
    /// Narrative produced by locally resolved analysis, if any.
    narrative: Option<String>,
}

pub struct Orchestrator {
    client: Arc<dyn CompletionClient>,
    progress: Option<ProgressFn>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("client", &self.client)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

fn planner_prompt() -> String {
    let roster: Vec<String> = WORKER_AGENTS
        .iter()
        .map(|w| format!("- {}: {}", w.name, w.role))
        .collect();
    format!(
        "You decompose whiteboard commands into tasks for worker agents.\n\
         Agents:\n{roster}\n\
         Respond with JSON only: {{\"plan\": [{{\"agent\": ..., \
         \"description\": ..., \"reasoning\": ..., \"waitForPrevious\": \
         bool, \"canRunInParallel\": bool}}], \"summary\": \"...\"}}.\n\
         Rules:\n\
         - Split bulk creations into parallel tasks of about 5 objects \
         each, giving every task a distinct position offset so batches do \
         not overlap.\n\
         - Any task that references objects created by earlier tasks must \
         set waitForPrevious: true; it will receive the real ids.\n\
         - Keep descriptions self-contained: a worker sees only its own \
         description and the board state.",
        roster = roster.join("\n"),
    )
}

/// Run one task through its worker. Analysis requests are stripped from the
/// output and resolved against real board data.
async fn execute_task(
    client: Arc<dyn CompletionClient>,
    task: Task,
    board: BoardState,
    known_ids: Vec<String>,
) -> Result<TaskResult, PipelineError> {
    let worker = find_worker(&task.agent)
        .ok_or_else(|| PipelineError::UnknownAgent(task.agent.clone()))?;
    let board_context = serde_json::to_value(&board).unwrap_or(Value::Null);
    let calls = worker
        .run(&client, &task.description, &board_context, &known_ids)
        .await
        .map_err(|e| match e {
            PipelineError::Completion(err) => PipelineError::TaskFailed {
                agent: task.agent.clone(),
                detail: err.to_string(),
            },
            other => other,
        })?;

    let mut tool_calls = Vec::with_capacity(calls.len());
    let mut narrative = None;
    for call in calls {
        if call.name.is_analysis() {
            let ids = call.arguments["objectIds"]
                .as_array()
                .map(|a| {
                    a.iter()
                        .filter_map(|v| v.as_str().map(String::from))
                        .collect::<Vec<_>>()
                })
                .unwrap_or_else(|| board.all_ids());
            let report = resolve_analysis(&ids, &board);
            narrative = Some(narrate_analysis(&client, &task.description, &report).await);
            continue;
        }
        tool_calls.push(call);
    }
    Ok(TaskResult {
        tool_calls,
        narrative,
    })
}

impl Orchestrator {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Orchestrator {
            client,
            progress: None,
        }
    }

    /// Register a callback for batch progress notifications.
    pub fn with_progress(mut self, progress: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    /// One planning call. A malformed plan is a hard failure: an
    /// unparseable decomposition cannot be safely reinterpreted, so there
    /// is no retry and no downgrade.
    pub async fn create_execution_plan(
        &self,
        message: &str,
        board: &BoardState,
    ) -> Result<ExecutionPlan, PipelineError> {
        let board_context = serde_json::to_value(board).unwrap_or(Value::Null);
        let request = CompletionRequest::json(
            vec![
                Message::system(planner_prompt()),
                Message::user(format!(
                    "Command: {message}\n\nBoard state: {board_context}"
                )),
            ],
            0.2,
        );
        let response = self.client.complete(request).await?;
        let plan: ExecutionPlan = serde_json::from_str(response.narrative())
            .map_err(|e| PipelineError::MalformedPlan(e.to_string()))?;
        if plan.plan.is_empty() {
            return Err(PipelineError::MalformedPlan("empty task list".into()));
        }
        for task in &plan.plan {
            if find_worker(&task.agent).is_none() {
                return Err(PipelineError::UnknownAgent(task.agent.clone()));
            }
        }
        debug!("execution plan: {} task(s)", plan.plan.len());
        Ok(plan)
    }

    /// Plan and execute a command from scratch.
    pub async fn orchestrate(
        &self,
        message: &str,
        board: &BoardState,
    ) -> Result<OrchestrationOutcome, PipelineError> {
        let plan = self.create_execution_plan(message, board).await?;
        let batches = partition_batches(&plan.plan);
        self.run_batches(batches, board, &[], plan.summary).await
    }

    /// Resume a paused run with the object ids the applied operations
    /// produced. The first remaining batch runs even though it declared a
    /// wait: the wait is what this call satisfies. A later wait boundary
    /// pauses again, so the protocol is resumable indefinitely.
    pub async fn continue_orchestration(
        &self,
        remaining: Vec<Task>,
        board: &BoardState,
        known_ids: &[String],
    ) -> Result<OrchestrationOutcome, PipelineError> {
        let batches = partition_batches(&remaining);
        self.run_batches(batches, board, known_ids, String::new())
            .await
    }

    async fn run_batches(
        &self,
        batches: Vec<Batch>,
        board: &BoardState,
        known_ids: &[String],
        plan_summary: String,
    ) -> Result<OrchestrationOutcome, PipelineError> {
        let mut tool_calls: Vec<ToolCall> = Vec::new();
        let mut narratives: Vec<String> = Vec::new();

        for (index, batch) in batches.iter().enumerate() {
            // A wait past the first batch means the ids its tasks need do
            // not exist yet. The first batch always runs: either nothing
            // precedes it, or a resume call just supplied the ids it was
            // waiting for.
            if index > 0 && batch.wait_for_previous {
                let remaining: Vec<Task> = batches[index..]
                    .iter()
                    .flat_map(|b| b.tasks.clone())
                    .collect();
                debug!(
                    "pausing before batch {index}: {} task(s) remain",
                    remaining.len()
                );
                return Ok(OrchestrationOutcome {
                    tool_calls,
                    summary: pause_summary(&plan_summary, remaining.len()),
                    needs_follow_up: true,
                    remaining_tasks: remaining,
                });
            }

            self.notify_progress(batch);

            let results = if batch.parallel && batch.tasks.len() > 1 {
                let handles: Vec<_> = batch
                    .tasks
                    .iter()
                    .map(|task| {
                        tokio::spawn(execute_task(
                            Arc::clone(&self.client),
                            task.clone(),
                            board.clone(),
                            known_ids.to_vec(),
                        ))
                    })
                    .collect();
                // Join preserves task-index order regardless of completion
                // order; any failure aborts the whole batch.
                let joined = future::join_all(handles).await;
                let mut results = Vec::with_capacity(joined.len());
                for joined_result in joined {
                    let task_result =
                        joined_result.map_err(|e| PipelineError::Join(e.to_string()))??;
                    results.push(task_result);
                }
                results
            } else {
                let mut results = Vec::with_capacity(batch.tasks.len());
                for task in &batch.tasks {
                    results.push(
                        execute_task(
                            Arc::clone(&self.client),
                            task.clone(),
                            board.clone(),
                            known_ids.to_vec(),
                        )
                        .await?,
                    );
                }
                results
            };

            for result in results {
                tool_calls.extend(result.tool_calls);
                if let Some(narrative) = result.narrative {
                    narratives.push(narrative);
                }
            }
        }

        let summary = if narratives.is_empty() {
            if plan_summary.is_empty() {
                format!("Completed {} operation(s)", tool_calls.len())
            } else {
                plan_summary
            }
        } else {
            narratives.join(" ")
        };
        Ok(OrchestrationOutcome {
            tool_calls,
            summary,
            needs_follow_up: false,
            remaining_tasks: Vec::new(),
        })
    }

    /// Progress fires once per multi-task creation batch only; single-task
    /// and non-create batches complete silently.
    fn notify_progress(&self, batch: &Batch) {
        let Some(progress) = &self.progress else { return };
        if batch.tasks.len() <= 1 {
            return;
        }
        let creators = batch
            .tasks
            .iter()
            .filter(|t| find_worker(&t.agent).is_some_and(|w| w.is_creator()))
            .count();
        if creators == batch.tasks.len() {
            progress(&format!(
                "Creating objects across {} parallel task(s)",
                batch.tasks.len()
            ));
        }
    }
}

fn pause_summary(plan_summary: &str, remaining: usize) -> String {
    if plan_summary.is_empty() {
        format!(
            "Partial result applied; {remaining} task(s) await the new object ids"
        )
    } else {
        format!("{plan_summary} (paused; {remaining} task(s) await the new object ids)")
    }
}
