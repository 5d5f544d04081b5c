//! What happens when a stage's collaborator call fails for good.
//!
//! Recovery order: a previously cached result for the stage, then the
//! stage's fixed fallback, then the original error. Refinement, polish and
//! the example solution have no fallback because they shape everything
//! downstream.

use anyhow::{Context, Result};
use tracing::{error, warn};

use super::step_cache::StepCache;
use crate::domain::{ResearchResult, StageName, StageOutcome};

const FALLBACK_QUESTIONS: &str = "What are the current best practices for this use case?\n\
                                  What are common pitfalls to avoid?";
const FALLBACK_VISUALS: &str = "Visual suggestions unavailable due to processing error.";

/// Substitute value produced by the policy
#[derive(Debug, Clone, PartialEq)]
pub struct Recovery<T> {
    pub value: T,
    pub outcome: StageOutcome,
}

/// Per-stage recovery decisions
#[derive(Debug, Clone, Copy, Default)]
pub struct FailurePolicy;

impl FailurePolicy {
    /// Fallback content for a stage, encoded as the step cache stores it
    pub fn fallback_for(stage: StageName) -> Option<String> {
        match stage {
            StageName::ResearchQuestions => Some(FALLBACK_QUESTIONS.to_string()),
            StageName::DeepResearch => serde_json::to_string(&ResearchResult::unavailable()).ok(),
            StageName::VisualSuggestions => Some(FALLBACK_VISUALS.to_string()),
            StageName::RefinedDraft | StageName::FinalUseCase | StageName::ExampleSolution => None,
        }
    }

    /// Whether a failure of this stage can be absorbed
    pub fn has_fallback(stage: StageName) -> bool {
        Self::fallback_for(stage).is_some()
    }

    /// Resolve a stage failure into a substitute value, or re-raise it.
    ///
    /// A cached record only counts when `decode` accepts it; an unreadable
    /// one falls through to the fallback table.
    pub async fn recover<T, D>(
        &self,
        stage: StageName,
        cache: &dyn StepCache,
        cause: anyhow::Error,
        decode: D,
    ) -> Result<Recovery<T>>
    where
        D: Fn(&str) -> Result<T>,
    {
        error!("Stage '{}' failed: {:#}", stage, cause);

        match cache.load(stage).await {
            Ok(Some(content)) => match decode(&content) {
                Ok(value) => {
                    warn!("Using cached result for '{}' after failure", stage);
                    return Ok(Recovery {
                        value,
                        outcome: StageOutcome::Recovered,
                    });
                }
                Err(e) => warn!("Cached result for '{}' is unreadable: {:#}", stage, e),
            },
            Ok(None) => {}
            Err(e) => warn!("Could not read cached result for '{}': {:#}", stage, e),
        }

        if let Some(content) = Self::fallback_for(stage) {
            warn!("Using fallback content for '{}'", stage);
            let value = decode(&content)
                .with_context(|| format!("Unreadable fallback content for stage '{}'", stage))?;
            return Ok(Recovery {
                value,
                outcome: StageOutcome::Degraded,
            });
        }

        Err(cause.context(format!("Stage '{}' failed with no cached result or fallback", stage)))
    }
}
