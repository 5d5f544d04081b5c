//! Adapter interfaces for external systems.
//!
//! Two generative providers sit behind the same `Collaborator` trait: a
//! reasoning/chat model and a knowledge-retrieval model. Both speak the
//! OpenAI-compatible chat completions protocol (see `chat`). Page titles
//! for research citations come from a separate `TitleFetcher`.

pub mod chat;
pub mod titles;

use async_trait::async_trait;
use schemars::schema::RootSchema;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{GenerationError, GenerationResult};

pub use chat::ChatClient;
pub use titles::{HttpTitleFetcher, TitleFetcher};

/// Trait for generative text providers
#[async_trait]
pub trait Collaborator: Send + Sync {
    /// Human-readable provider name
    fn name(&self) -> &str;

    /// Run one completion request (a single attempt; retries are composed by the caller)
    async fn complete(&self, request: &CompletionRequest) -> GenerationResult<Completion>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
    Low,
    Medium,
    High,
}

/// A named JSON schema the response must conform to
///
/// Kept typed; it is serialized with the request body.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSchema {
    pub name: String,
    pub schema: RootSchema,
}

impl ResponseSchema {
    /// Build the schema for a Rust type
    pub fn of<T: JsonSchema>(name: &str) -> Self {
        Self {
            name: name.to_string(),
            schema: schemars::schema_for!(T),
        }
    }
}

/// A single chat completion request
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub reasoning_effort: Option<ReasoningEffort>,
    pub response_format: Option<ResponseSchema>,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            reasoning_effort: None,
            response_format: None,
        }
    }

    pub fn system(mut self, content: impl Into<String>) -> Self {
        self.messages.push(ChatMessage::system(content));
        self
    }

    pub fn user(mut self, content: impl Into<String>) -> Self {
        self.messages.push(ChatMessage::user(content));
        self
    }

    /// Prior context presented as the assistant's own turn
    pub fn assistant(mut self, content: impl Into<String>) -> Self {
        self.messages.push(ChatMessage::assistant(content));
        self
    }

    pub fn with_reasoning(mut self, effort: ReasoningEffort) -> Self {
        self.reasoning_effort = Some(effort);
        self
    }

    /// Require the response to match the schema of `T`
    pub fn with_schema<T: JsonSchema>(mut self, name: &str) -> Self {
        self.response_format = Some(ResponseSchema::of::<T>(name));
        self
    }

    /// Name of the requested schema, if any
    pub fn schema_name(&self) -> Option<&str> {
        self.response_format.as_ref().map(|s| s.name.as_str())
    }
}

/// A provider response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    /// Text content (JSON text for structured requests)
    pub content: String,

    /// Set when the model declined to answer
    pub refusal: Option<String>,

    /// Source URLs returned by retrieval providers
    pub citations: Vec<String>,
}

impl Completion {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn refused(reason: impl Into<String>) -> Self {
        Self {
            refusal: Some(reason.into()),
            ..Default::default()
        }
    }

    pub fn with_citations(mut self, citations: Vec<String>) -> Self {
        self.citations = citations;
        self
    }
}

/// Outcome of parsing a structured response
#[derive(Debug, Clone, PartialEq)]
pub enum Structured<T> {
    Parsed(T),
    Refused(String),
}

/// Validate a completion against the target type
pub fn parse_structured<T: DeserializeOwned>(
    completion: &Completion,
    schema: &str,
) -> GenerationResult<Structured<T>> {
    if let Some(reason) = &completion.refusal {
        return Ok(Structured::Refused(reason.clone()));
    }

    let body = strip_code_fence(&completion.content);
    if body.is_empty() {
        return Err(GenerationError::EmptyResponse);
    }

    serde_json::from_str(body)
        .map(Structured::Parsed)
        .map_err(|e| GenerationError::schema(schema, e.to_string()))
}

/// Remove a surrounding ```json fence, if present
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the info string (e.g. "json") on the opening line
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };

    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ScoredCitations;

    #[test]
    fn test_parse_structured_tolerates_fences() {
        let completion = Completion::text("```json\n{\"official_resources\": [], \"citations\": []}\n```");
        let parsed: Structured<ScoredCitations> = parse_structured(&completion, "scores").unwrap();

        assert_eq!(parsed, Structured::Parsed(ScoredCitations::default()));
    }

    #[test]
    fn test_parse_structured_refusal() {
        let completion = Completion::refused("policy");
        let parsed: Structured<ScoredCitations> = parse_structured(&completion, "scores").unwrap();

        assert_eq!(parsed, Structured::Refused("policy".to_string()));
    }

    #[test]
    fn test_parse_structured_schema_error() {
        let completion = Completion::text("not json at all");
        let err = parse_structured::<ScoredCitations>(&completion, "scores").unwrap_err();

        assert!(matches!(err, GenerationError::SchemaValidation { ref schema, .. } if schema == "scores"));
    }

    #[test]
    fn test_request_builder() {
        let request = CompletionRequest::new("gpt-4o")
            .system("be brief")
            .user("hello")
            .with_schema::<ScoredCitations>("scores");

        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, Role::System);
        assert_eq!(request.schema_name(), Some("scores"));
        let format = request.response_format.unwrap();
        assert!(format.schema.schema.object.is_some());
        assert!(serde_json::to_value(&format.schema).unwrap().is_object());
    }
}
