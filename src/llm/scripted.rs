//! Deterministic scripted completion client.
//!
//! The test double for every tier: responses are either queued FIFO or
//! keyed on a substring of the request text. Keyed responses let tests
//! drive concurrently spawned batch tasks deterministically — each task's
//! prompt contains its own task description, so pop order does not matter.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::CompletionError;
use crate::llm::{CompletionClient, CompletionRequest, CompletionResponse};

/// A canned response (or error) for one expected call.
type Scripted = Result<CompletionResponse, CompletionError>;

/// Scripted completion client.
#[derive(Debug, Default)]
pub struct ScriptedCompletion {
    queue: Mutex<VecDeque<Scripted>>,
    keyed: Mutex<Vec<(String, Scripted)>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCompletion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next FIFO response.
    pub fn enqueue(&self, response: CompletionResponse) {
        self.queue.lock().unwrap().push_back(Ok(response));
    }

    /// Queue the next FIFO failure.
    pub fn enqueue_error(&self, error: CompletionError) {
        self.queue.lock().unwrap().push_back(Err(error));
    }

    /// Register a response keyed on a substring of the request text. Keyed
    /// responses are checked before the FIFO queue and each fires once.
    pub fn stub(&self, key_substring: impl Into<String>, response: CompletionResponse) {
        self.keyed
            .lock()
            .unwrap()
            .push((key_substring.into(), Ok(response)));
    }

    /// All requests received so far, in arrival order.
    pub fn received(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of calls made against this client.
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletion {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        let text = request.flattened_text();
        self.requests.lock().unwrap().push(request);

        let mut keyed = self.keyed.lock().unwrap();
        if let Some(pos) = keyed.iter().position(|(k, _)| text.contains(k.as_str())) {
            return keyed.remove(pos).1;
        }
        drop(keyed);

        match self.queue.lock().unwrap().pop_front() {
            Some(scripted) => scripted,
            None => Err(CompletionError::Empty),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Message;

    #[tokio::test]
    async fn test_fifo_and_keyed_responses() {
        let client = ScriptedCompletion::new();
        client.enqueue(CompletionResponse::from_text("first"));
        client.stub("special", CompletionResponse::from_text("keyed"));

        let special = client
            .complete(CompletionRequest::text(
                vec![Message::user("a special request")],
                0.0,
            ))
            .await
            .unwrap();
        assert_eq!(special.text.as_deref(), Some("keyed"));

        let fifo = client
            .complete(CompletionRequest::text(vec![Message::user("plain")], 0.0))
            .await
            .unwrap();
        assert_eq!(fifo.text.as_deref(), Some("first"));

        let exhausted = client
            .complete(CompletionRequest::text(vec![Message::user("plain")], 0.0))
            .await;
        assert!(matches!(exhausted, Err(CompletionError::Empty)));
        assert_eq!(client.call_count(), 3);
    }
}
