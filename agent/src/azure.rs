//! Azure OpenAI chat-completions backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{AgentError, AssistantTurn, ChatBackend, ChatMessage, Tool, ToolCall};

pub struct AzureBackend {
    client: reqwest::Client,
    url: String,
    api_key: String,
    temperature: f32,
}

impl AzureBackend {
    /// Build a backend from resolved Azure settings. A missing API key is an
    /// error here rather than at the first request.
    pub fn new(conf: &config::AzureConfig) -> Result<Self, AgentError> {
        let api_key = conf.api_key.clone().ok_or(AgentError::MissingApiKey)?;

        Ok(Self {
            client: reqwest::Client::new(),
            url: chat_completions_url(&conf.endpoint, &conf.deployment, &conf.api_version),
            api_key,
            temperature: conf.temperature,
        })
    }
}

fn chat_completions_url(endpoint: &str, deployment: &str, api_version: &str) -> String {
    format!(
        "{}/openai/deployments/{deployment}/chat/completions?api-version={api_version}",
        endpoint.trim_end_matches('/')
    )
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [Tool]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ToolCall>>,
}

#[async_trait]
impl ChatBackend for AzureBackend {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[Tool],
    ) -> Result<AssistantTurn, AgentError> {
        let body = ChatRequest {
            messages,
            temperature: self.temperature,
            tools: (!tools.is_empty()).then_some(tools),
            tool_choice: (!tools.is_empty()).then_some("auto"),
        };

        tracing::debug!(url = %self.url, messages = messages.len(), "sending chat request");

        let response = self
            .client
            .post(&self.url)
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AgentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or(AgentError::EmptyResponse)?;

        Ok(AssistantTurn {
            content: choice.message.content,
            tool_calls: choice.message.tool_calls.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn url_joins_endpoint_deployment_and_version() {
        let url = chat_completions_url(
            "https://example.openai.azure.com/",
            "gpt-4o",
            "2025-01-01-preview",
        );
        assert_eq!(
            url,
            "https://example.openai.azure.com/openai/deployments/gpt-4o/chat/completions?api-version=2025-01-01-preview"
        );
    }

    #[test]
    fn request_omits_tool_fields_when_no_tools_are_registered() {
        let messages = vec![ChatMessage::user("hi")];
        let body = ChatRequest {
            messages: &messages,
            temperature: 0.2,
            tools: None,
            tool_choice: None,
        };

        let wire = serde_json::to_value(&body).unwrap();
        assert!(wire.get("tools").is_none());
        assert!(wire.get("tool_choice").is_none());
    }

    #[test]
    fn response_with_tool_calls_parses() {
        let parsed: ChatResponse = serde_json::from_value(json!({
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "run_query", "arguments": "{\"query\": \"SELECT 1\"}"}
                    }]
                }
            }]
        }))
        .unwrap();

        let message = &parsed.choices[0].message;
        assert!(message.content.is_none());
        let calls = message.tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].function.name, "run_query");
    }
}
