//! Typed failures raised at the collaborator boundary.
//!
//! Everything above the adapters works in `anyhow::Result`; this enum exists
//! so the retry policy can tell transient failures from permanent ones.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("rate limited by provider: {0}")]
    RateLimited(String),

    #[error("provider returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("provider returned an empty response")]
    EmptyResponse,

    #[error("response did not match schema '{schema}': {message}")]
    SchemaValidation { schema: String, message: String },

    #[error("model refused to comply: {0}")]
    Refused(String),

    #[error("missing required environment variable(s): {0}")]
    MissingCredential(String),
}

impl GenerationError {
    /// Whether another attempt may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout(_) | Self::RateLimited(_) => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn schema(schema: &str, message: impl Into<String>) -> Self {
        Self::SchemaValidation {
            schema: schema.to_string(),
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::Api {
                status: status.as_u16(),
                message: err.to_string(),
            };
        }
        if err.is_timeout() {
            return Self::Timeout(0);
        }
        Self::Transport(err.to_string())
    }
}

pub type GenerationResult<T> = std::result::Result<T, GenerationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(GenerationError::RateLimited("slow down".into()).is_transient());
        assert!(GenerationError::Transport("reset".into()).is_transient());
        assert!(GenerationError::Timeout(300).is_transient());
        assert!(GenerationError::Api {
            status: 503,
            message: "unavailable".into()
        }
        .is_transient());

        assert!(!GenerationError::Api {
            status: 400,
            message: "bad request".into()
        }
        .is_transient());
        assert!(!GenerationError::EmptyResponse.is_transient());
        assert!(!GenerationError::schema("StructuredUseCase", "missing field").is_transient());
        assert!(!GenerationError::Refused("no".into()).is_transient());
    }
}
