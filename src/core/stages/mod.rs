//! The six pipeline stages.
//!
//! Every stage follows the same template (`StageContext::execute`):
//! return the cached result if there is one, otherwise call the
//! collaborator, persist the result, and hand any failure to the
//! `FailurePolicy`.

pub mod deep_research;
pub mod example_solution;
pub mod polish;
pub mod prompts;
pub mod refine;
pub mod research_questions;
pub mod visual_suggestions;

use std::future::Future;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::failure::FailurePolicy;
use super::retry::RetryPolicy;
use super::step_cache::StepCache;
use crate::adapters::{Collaborator, Completion, CompletionRequest, TitleFetcher};
use crate::config::Settings;
use crate::domain::{
    ExampleSolutionOutput, ResearchResult, StageName, StageOutcome, StructuredUseCase, UseCaseSpec,
};
use crate::error::GenerationResult;

/// A stage's value and how it was obtained
#[derive(Debug, Clone, PartialEq)]
pub struct StageRun<T> {
    pub value: T,
    pub outcome: StageOutcome,
}

impl<T> StageRun<T> {
    pub fn new(value: T, outcome: StageOutcome) -> Self {
        Self { value, outcome }
    }
}

/// How a stage's value is stored in the step cache
pub trait StageOutput: Sized {
    fn encode(&self) -> Result<String>;
    fn decode(content: &str) -> Result<Self>;
}

/// Research questions: one per line
impl StageOutput for Vec<String> {
    fn encode(&self) -> Result<String> {
        Ok(self.join("\n"))
    }

    fn decode(content: &str) -> Result<Self> {
        Ok(split_lines(content))
    }
}

/// Free text, stored verbatim
impl StageOutput for String {
    fn encode(&self) -> Result<String> {
        Ok(self.clone())
    }

    fn decode(content: &str) -> Result<Self> {
        Ok(content.to_string())
    }
}

impl StageOutput for ResearchResult {
    fn encode(&self) -> Result<String> {
        to_json(self)
    }

    fn decode(content: &str) -> Result<Self> {
        from_json(content)
    }
}

impl StageOutput for StructuredUseCase {
    fn encode(&self) -> Result<String> {
        to_json(self)
    }

    fn decode(content: &str) -> Result<Self> {
        from_json(content)
    }
}

impl StageOutput for ExampleSolutionOutput {
    fn encode(&self) -> Result<String> {
        to_json(self)
    }

    fn decode(content: &str) -> Result<Self> {
        from_json(content)
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize stage result")
}

fn from_json<T: DeserializeOwned>(content: &str) -> Result<T> {
    serde_json::from_str(content).context("Failed to parse cached stage result")
}

/// Non-empty trimmed lines
pub(crate) fn split_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// A collaborator with its retry policy composed around every call
#[derive(Clone, Copy)]
pub struct Provider<'a> {
    client: &'a dyn Collaborator,
    retry: &'a RetryPolicy,
}

impl<'a> Provider<'a> {
    pub fn new(client: &'a dyn Collaborator, retry: &'a RetryPolicy) -> Self {
        Self { client, retry }
    }

    pub async fn complete(&self, label: &str, request: CompletionRequest) -> GenerationResult<Completion> {
        for message in &request.messages {
            debug!(
                stage = label,
                provider = self.client.name(),
                role = ?message.role,
                "Prompt:\n{}",
                message.content
            );
        }

        let client = self.client;
        let request = &request;
        self.retry.run(label, || client.complete(request)).await
    }
}

/// Everything a stage needs, passed explicitly
pub struct StageContext<'a> {
    pub spec: &'a UseCaseSpec,
    pub cache: &'a dyn StepCache,
    pub reasoning: Provider<'a>,
    pub research: Provider<'a>,
    pub titles: &'a dyn TitleFetcher,
    pub settings: &'a Settings,
    /// Recompute even when a cached result exists
    pub refresh: bool,
}

impl<'a> StageContext<'a> {
    /// Run one stage through the cache / compute / recover template.
    ///
    /// `compute` is only polled on a cache miss.
    pub async fn execute<T, Fut>(&self, stage: StageName, compute: Fut) -> Result<StageRun<T>>
    where
        T: StageOutput,
        Fut: Future<Output = Result<T>>,
    {
        if self.refresh {
            debug!(stage = %stage, "Refresh requested, ignoring cached result");
        } else if let Some(value) = self.cached::<T>(stage).await {
            info!(stage = %stage, "Resuming from cached result");
            return Ok(StageRun::new(value, StageOutcome::CacheHit));
        }

        match compute.await {
            Ok(value) => {
                let content = value.encode()?;
                self.cache
                    .save(stage, &content)
                    .await
                    .with_context(|| format!("Failed to cache result for stage '{}'", stage))?;
                Ok(StageRun::new(value, StageOutcome::Fresh))
            }
            Err(cause) => {
                let recovery = FailurePolicy
                    .recover(stage, self.cache, cause, T::decode)
                    .await?;
                Ok(StageRun::new(recovery.value, recovery.outcome))
            }
        }
    }

    /// A corrupt record counts as a miss; the fresh result overwrites it
    async fn cached<T: StageOutput>(&self, stage: StageName) -> Option<T> {
        let content = match self.cache.load(stage).await {
            Ok(Some(content)) => content,
            Ok(None) => return None,
            Err(e) => {
                warn!(stage = %stage, "Ignoring unreadable cache record: {:#}", e);
                return None;
            }
        };

        match T::decode(&content) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(stage = %stage, "Ignoring unreadable cached result: {:#}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_lines_are_trimmed_and_compacted() {
        let questions = Vec::<String>::decode("  first?  \n\n second?\n").unwrap();
        assert_eq!(questions, vec!["first?".to_string(), "second?".to_string()]);
        assert_eq!(questions.encode().unwrap(), "first?\nsecond?");
    }

    #[test]
    fn test_structured_results_are_json_strings() {
        let research = ResearchResult::unavailable();
        let encoded = research.encode().unwrap();

        assert!(encoded.trim_start().starts_with('{'));
        assert_eq!(ResearchResult::decode(&encoded).unwrap(), research);
    }
}
