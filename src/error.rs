//! Error types for the command pipeline.

use thiserror::Error;

/// Errors from the completion service seam.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// Transport-level failure talking to the provider.
    #[error("completion request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider returned a non-retryable error status.
    #[error("completion provider error ({status}): {detail}")]
    Provider { status: u16, detail: String },

    /// The response body could not be interpreted.
    #[error("malformed completion response: {0}")]
    Malformed(String),

    /// The model returned neither text nor tool invocations.
    #[error("completion response was empty")]
    Empty,

    /// No API key configured for the provider.
    #[error("completion API key is not configured")]
    MissingApiKey,

    /// All retry attempts were exhausted.
    #[error("completion call failed after {attempts} attempts: {detail}")]
    RetriesExhausted { attempts: u32, detail: String },
}

/// Errors surfaced by the pipeline.
///
/// Most tier failures are recoverable — the dispatcher downgrades to the
/// next tier. [`PipelineError::MalformedPlan`] is the one hard failure: an
/// unparseable execution plan cannot be safely reinterpreted, so it is
/// never retried or downgraded.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Completion(#[from] CompletionError),

    /// The classifier could not produce a usable intent.
    #[error("intent classification failed: {0}")]
    Classification(String),

    /// The supervisor produced an execution plan that cannot be interpreted.
    #[error("execution plan is malformed: {0}")]
    MalformedPlan(String),

    /// A planned task names an agent missing from the worker registry.
    #[error("unknown worker agent: {0}")]
    UnknownAgent(String),

    /// A worker task failed; the whole batch aborts.
    #[error("task '{agent}' failed: {detail}")]
    TaskFailed { agent: String, detail: String },

    /// The creative planner produced no usable composition.
    #[error("composition planning failed: {0}")]
    Composition(String),

    /// A spawned batch task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Join(String),
}

impl PipelineError {
    /// Whether the dispatcher may downgrade to a lower tier after this
    /// error. Malformed execution plans are final.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            PipelineError::MalformedPlan(_) | PipelineError::UnknownAgent(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_plan_is_not_recoverable() {
        assert!(!PipelineError::MalformedPlan("bad".into()).is_recoverable());
        assert!(!PipelineError::UnknownAgent("GhostAgent".into()).is_recoverable());
        assert!(PipelineError::Completion(CompletionError::Empty).is_recoverable());
        assert!(PipelineError::Classification("no intent".into()).is_recoverable());
    }
}
