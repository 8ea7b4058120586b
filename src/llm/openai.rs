//! OpenAI-compatible completion provider.
//!
//! Direct integration with a Chat Completions endpoint via `reqwest`,
//! supporting function/tool calling, forced tool choice, and JSON-object
//! response mode. Retries rate limits and server errors with exponential
//! backoff; client errors are fatal.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::CompletionError;
use crate::llm::{
    CompletionClient, CompletionRequest, CompletionResponse, ToolChoice, ToolInvocation,
};

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: f64 = 120.0;

/// Default number of retries for retryable statuses.
const DEFAULT_MAX_RETRIES: u32 = 2;

/// OpenAI-compatible Chat Completions client.
#[derive(Debug, Clone)]
pub struct OpenAiCompletion {
    /// Model identifier sent with every request.
    pub model: String,
    /// API key; falls back to `OPENAI_API_KEY` at construction.
    api_key: Option<String>,
    /// Base URL of the API, without the `/chat/completions` suffix.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout: f64,
    /// Maximum retry attempts for 429/5xx responses.
    pub max_retries: u32,
}

impl OpenAiCompletion {
    /// Create a client for the given model, reading `OPENAI_API_KEY` from
    /// the environment.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            api_key: std::env::var("OPENAI_API_KEY").ok(),
            base_url: "https://api.openai.com/v1".into(),
            timeout: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Override the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Point the client at a different OpenAI-compatible endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Build the Chat Completions request body.
    pub fn build_request_body(&self, request: &CompletionRequest) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": request.messages,
        });

        if let Some(temp) = request.temperature {
            body["temperature"] = json!(temp);
        }
        if request.json_mode {
            body["response_format"] = json!({"type": "json_object"});
        }
        if !request.tools.is_empty() {
            let tools: Vec<Value> = request
                .tools
                .iter()
                .map(|t| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.parameters,
                        }
                    })
                })
                .collect();
            body["tools"] = json!(tools);
            body["tool_choice"] = match &request.tool_choice {
                ToolChoice::Auto => json!("auto"),
                ToolChoice::Required => json!("required"),
                ToolChoice::Forced(name) => {
                    json!({"type": "function", "function": {"name": name}})
                }
            };
        }

        body
    }

    /// Extract text and tool invocations from a Chat Completions response.
    fn parse_response(&self, response: &Value) -> Result<CompletionResponse, CompletionError> {
        let message = response
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .ok_or_else(|| {
                CompletionError::Malformed("response has no choices[0].message".into())
            })?;

        let text = message
            .get("content")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(String::from);

        let mut tool_invocations = Vec::new();
        if let Some(calls) = message.get("tool_calls").and_then(Value::as_array) {
            for call in calls {
                let function = call.get("function").ok_or_else(|| {
                    CompletionError::Malformed("tool call has no function".into())
                })?;
                let name = function
                    .get("name")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        CompletionError::Malformed("tool call has no function name".into())
                    })?;
                // Arguments arrive as a JSON-encoded string.
                let arguments = match function.get("arguments") {
                    Some(Value::String(s)) => serde_json::from_str(s).map_err(|e| {
                        CompletionError::Malformed(format!(
                            "tool arguments are not valid JSON: {e}"
                        ))
                    })?,
                    Some(v) => v.clone(),
                    None => json!({}),
                };
                tool_invocations.push(ToolInvocation::new(name, arguments));
            }
        }

        if let Some(usage) = response.get("usage") {
            log::debug!(
                "openai token usage: prompt={}, completion={}, total={}",
                usage.get("prompt_tokens").and_then(Value::as_i64).unwrap_or(0),
                usage.get("completion_tokens").and_then(Value::as_i64).unwrap_or(0),
                usage.get("total_tokens").and_then(Value::as_i64).unwrap_or(0),
            );
        }

        let parsed = CompletionResponse {
            text,
            tool_invocations,
        };
        if parsed.is_empty() {
            return Err(CompletionError::Empty);
        }
        Ok(parsed)
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompletion {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        log::debug!(
            "OpenAiCompletion.complete: model={}, messages={}, tools={}",
            self.model,
            request.messages.len(),
            request.tools.len(),
        );

        let api_key = self
            .api_key
            .as_ref()
            .ok_or(CompletionError::MissingApiKey)?;

        let body = self.build_request_body(&request);
        let endpoint = format!("{}/chat/completions", self.base_url);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs_f64(self.timeout))
            .build()?;

        let mut last_error = String::from("no attempt made");
        let mut retry_delay = Duration::from_secs(1);

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                log::warn!("openai retry attempt {} after {:?}", attempt, retry_delay);
                tokio::time::sleep(retry_delay).await;
                retry_delay *= 2;
            }

            let response = match client
                .post(&endpoint)
                .header("Content-Type", "application/json")
                .header("Authorization", format!("Bearer {api_key}"))
                .json(&body)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    last_error = e.to_string();
                    continue;
                }
            };

            let status = response.status();
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                last_error = format!("status {status}");
                continue;
            }

            let text = response.text().await?;
            if status.is_client_error() {
                return Err(CompletionError::Provider {
                    status: status.as_u16(),
                    detail: text,
                });
            }

            let parsed: Value = serde_json::from_str(&text).map_err(|e| {
                CompletionError::Malformed(format!("invalid JSON body: {e}"))
            })?;
            return self.parse_response(&parsed);
        }

        Err(CompletionError::RetriesExhausted {
            attempts: self.max_retries + 1,
            detail: last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{Message, ToolSchema};

    #[test]
    fn test_request_body_carries_forced_tool_choice() {
        let client = OpenAiCompletion::new("gpt-4o-mini").with_api_key("test");
        let schema = ToolSchema::new("classify_intent", "Classify", json!({"type": "object"}));
        let req = CompletionRequest::forced_tool(vec![Message::user("create a sticky")], schema, 0.0);
        let body = client.build_request_body(&req);
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["tool_choice"]["function"]["name"], "classify_intent");
        assert_eq!(body["temperature"], json!(0.0));
    }

    #[test]
    fn test_request_body_marks_worker_tools_required() {
        let client = OpenAiCompletion::new("gpt-4o-mini").with_api_key("test");
        let schema = ToolSchema::new("createShape", "Create", json!({"type": "object"}));
        let req = CompletionRequest::with_tools(vec![Message::user("add a circle")], vec![schema], 0.2);
        let body = client.build_request_body(&req);
        assert_eq!(body["tool_choice"], json!("required"));
    }

    #[test]
    fn test_json_mode_sets_response_format() {
        let client = OpenAiCompletion::new("gpt-4o").with_api_key("test");
        let req = CompletionRequest::json(vec![Message::user("plan")], 0.1);
        let body = client.build_request_body(&req);
        assert_eq!(body["response_format"]["type"], "json_object");
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn test_parse_response_decodes_string_arguments() {
        let client = OpenAiCompletion::new("gpt-4o").with_api_key("test");
        let raw = json!({
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "function": {
                            "name": "createShape",
                            "arguments": "{\"type\":\"circle\",\"quantity\":5}"
                        }
                    }]
                }
            }]
        });
        let parsed = client.parse_response(&raw).unwrap();
        assert_eq!(parsed.tool_invocations.len(), 1);
        assert_eq!(parsed.tool_invocations[0].arguments["quantity"], json!(5));
    }

    #[test]
    fn test_parse_empty_response_is_error() {
        let client = OpenAiCompletion::new("gpt-4o").with_api_key("test");
        let raw = json!({"choices": [{"message": {"content": ""}}]});
        assert!(matches!(
            client.parse_response(&raw),
            Err(CompletionError::Empty)
        ));
    }
}
