//! Execution plans and batch partitioning.

use serde::{Deserialize, Serialize};

/// One delegated unit of work.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Name of a registered worker agent.
    pub agent: String,
    pub description: String,
    #[serde(default)]
    pub reasoning: String,
    /// This task needs the applied results of everything before it.
    #[serde(default)]
    pub wait_for_previous: bool,
    #[serde(default = "default_true")]
    pub can_run_in_parallel: bool,
}

fn default_true() -> bool {
    true
}

/// The supervisor's decomposition of one command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub plan: Vec<Task>,
    #[serde(default)]
    pub summary: String,
}

/// A run of tasks safe to execute together.
#[derive(Debug, Clone)]
pub struct Batch {
    pub tasks: Vec<Task>,
    /// Tasks in this batch fan out concurrently.
    pub parallel: bool,
    /// The batch's first task asked for applied prior results.
    pub wait_for_previous: bool,
}

/// Partition tasks into ordered batches.
///
/// A new batch starts whenever a task declares `wait_for_previous`, or when
/// its parallelism flag differs from the flag accumulated in the current
/// batch. Batch order preserves task order.
pub fn partition_batches(tasks: &[Task]) -> Vec<Batch> {
    let mut batches: Vec<Batch> = Vec::new();
    for task in tasks {
        let start_new = match batches.last() {
            None => true,
            Some(batch) => task.wait_for_previous || batch.parallel != task.can_run_in_parallel,
        };
        if start_new {
            batches.push(Batch {
                tasks: Vec::new(),
                parallel: task.can_run_in_parallel,
                wait_for_previous: task.wait_for_previous,
            });
        }
        // A batch always exists here.
        if let Some(batch) = batches.last_mut() {
            batch.tasks.push(task.clone());
        }
    }
    batches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(agent: &str, wait: bool, parallel: bool) -> Task {
        Task {
            agent: agent.into(),
            description: format!("{agent} does a thing"),
            reasoning: String::new(),
            wait_for_previous: wait,
            can_run_in_parallel: parallel,
        }
    }

    #[test]
    fn test_uniform_parallel_tasks_form_one_batch() {
        let tasks = vec![
            task("CreateAgent", false, true),
            task("CreateAgent", false, true),
            task("CreateAgent", false, true),
        ];
        let batches = partition_batches(&tasks);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].tasks.len(), 3);
        assert!(batches[0].parallel);
    }

    #[test]
    fn test_wait_for_previous_starts_a_batch() {
        let tasks = vec![
            task("CreateAgent", false, true),
            task("CreateAgent", false, true),
            task("ConnectAgent", true, false),
        ];
        let batches = partition_batches(&tasks);
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].tasks.len(), 2);
        assert!(batches[1].wait_for_previous);
    }

    #[test]
    fn test_parallel_flag_flip_starts_a_batch() {
        let tasks = vec![
            task("CreateAgent", false, true),
            task("MoveAgent", false, false),
            task("MoveAgent", false, false),
            task("CreateAgent", false, true),
        ];
        let batches = partition_batches(&tasks);
        assert_eq!(batches.len(), 3);
        assert!(!batches[1].parallel);
        assert_eq!(batches[1].tasks.len(), 2);
    }

    #[test]
    fn test_plan_defaults() {
        let json = r#"{"plan": [{"agent": "CreateAgent", "description": "make circles"}], "summary": "s"}"#;
        let plan: ExecutionPlan = serde_json::from_str(json).unwrap();
        let t = &plan.plan[0];
        assert!(!t.wait_for_previous);
        assert!(t.can_run_in_parallel);
    }
}
