//! OpenAI-compatible chat completions client.
//!
//! Endpoint: POST {base_url}/chat/completions
//! Auth: Bearer token
//!
//! Used for both the OpenAI reasoning models and the Perplexity research
//! models; Perplexity adds a top-level `citations` array of source URLs.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use schemars::schema::RootSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ChatMessage, Collaborator, Completion, CompletionRequest, ReasoningEffort};
use crate::error::{GenerationError, GenerationResult};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const PERPLEXITY_BASE_URL: &str = "https://api.perplexity.ai";

/// Chat completions client for one provider
pub struct ChatClient {
    name: String,
    base_url: String,
    api_key: String,
    timeout: Duration,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ChatRequestBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning_effort: Option<ReasoningEffort>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat<'a>>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    json_schema: JsonSchemaFormat<'a>,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat<'a> {
    name: &'a str,
    schema: &'a RootSchema,
}

#[derive(Debug, Deserialize)]
struct ChatResponseBody {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    citations: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

impl ChatClient {
    /// Create a client for an arbitrary OpenAI-compatible endpoint
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            timeout,
            client,
        })
    }

    pub fn openai(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        Self::new("openai", OPENAI_BASE_URL, api_key, timeout)
    }

    pub fn perplexity(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        Self::new("perplexity", PERPLEXITY_BASE_URL, api_key, timeout)
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn map_send_error(&self, err: reqwest::Error) -> GenerationError {
        if err.is_timeout() {
            GenerationError::Timeout(self.timeout.as_secs())
        } else {
            GenerationError::from(err)
        }
    }
}

#[async_trait]
impl Collaborator for ChatClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: &CompletionRequest) -> GenerationResult<Completion> {
        let response_format = request.response_format.as_ref().map(|format| ResponseFormat {
            kind: "json_schema",
            json_schema: JsonSchemaFormat {
                name: &format.name,
                schema: &format.schema,
            },
        });

        let body = ChatRequestBody {
            model: &request.model,
            messages: &request.messages,
            reasoning_effort: request.reasoning_effort,
            response_format,
        };

        debug!(provider = %self.name, model = %request.model, "Sending chat completion request");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if status.as_u16() == 429 {
            let text = response.text().await.unwrap_or_default();
            return Err(GenerationError::RateLimited(text));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        let parsed: ChatResponseBody = response
            .json()
            .await
            .map_err(|e| GenerationError::Transport(format!("invalid response body: {}", e)))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or(GenerationError::EmptyResponse)?;

        if let Some(refusal) = choice.message.refusal {
            return Ok(Completion::refused(refusal));
        }

        let content = choice
            .message
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or(GenerationError::EmptyResponse)?;

        debug!(provider = %self.name, response = %content, "Received chat completion");

        Ok(Completion::text(content).with_citations(parsed.citations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = ChatClient::perplexity("key", Duration::from_secs(5)).unwrap();
        assert_eq!(client.name(), "perplexity");
        assert_eq!(client.endpoint(), "https://api.perplexity.ai/chat/completions");
    }

    #[test]
    fn test_custom_base_url_trailing_slash() {
        let client = ChatClient::new("local", "http://localhost:8080/v1/", "k", Duration::from_secs(1)).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_response_body_parsing() {
        let json = r#"{
            "choices": [{"message": {"role": "assistant", "content": "hello"}}],
            "citations": ["https://a.dev", "https://b.dev"]
        }"#;
        let parsed: ChatResponseBody = serde_json::from_str(json).unwrap();

        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("hello"));
        assert_eq!(parsed.citations.len(), 2);
    }

    #[test]
    fn test_request_body_carries_json_schema_format() {
        let request = CompletionRequest::new("gpt-4o")
            .user("hello")
            .with_schema::<crate::domain::ScoredCitations>("scores");
        let format = request.response_format.as_ref().unwrap();
        let body = ChatRequestBody {
            model: &request.model,
            messages: &request.messages,
            reasoning_effort: None,
            response_format: Some(ResponseFormat {
                kind: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: &format.name,
                    schema: &format.schema,
                },
            }),
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["response_format"]["type"], "json_schema");
        assert_eq!(json["response_format"]["json_schema"]["name"], "scores");
        assert!(json["response_format"]["json_schema"]["schema"]["properties"].is_object());
        assert!(json.get("reasoning_effort").is_none());
    }
}
