//! The six fixed pipeline stages and how each one ended.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Pipeline stage identifiers, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    ResearchQuestions,
    DeepResearch,
    RefinedDraft,
    FinalUseCase,
    ExampleSolution,
    VisualSuggestions,
}

impl StageName {
    /// All stages in execution order
    pub const ALL: [StageName; 6] = [
        Self::ResearchQuestions,
        Self::DeepResearch,
        Self::RefinedDraft,
        Self::FinalUseCase,
        Self::ExampleSolution,
        Self::VisualSuggestions,
    ];

    /// Step cache key and file stem
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResearchQuestions => "research_questions",
            Self::DeepResearch => "deep_research",
            Self::RefinedDraft => "refined_draft",
            Self::FinalUseCase => "final_use_case",
            Self::ExampleSolution => "example_solution",
            Self::VisualSuggestions => "visual_suggestions",
        }
    }

    /// 1-based position in the pipeline
    pub fn number(&self) -> usize {
        Self::ALL.iter().position(|s| s == self).unwrap_or(0) + 1
    }

    /// Progress description shown when the stage starts
    pub fn description(&self) -> &'static str {
        match self {
            Self::ResearchQuestions => "Identifying research questions",
            Self::DeepResearch => "Conducting deep research",
            Self::RefinedDraft => "Refining use case with research findings",
            Self::FinalUseCase => "Applying final polish",
            Self::ExampleSolution => "Generating example solution",
            Self::VisualSuggestions => "Creating visual element suggestions",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == name)
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a stage produced (or failed to produce) its output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageOutcome {
    /// Computed by a successful collaborator call
    Fresh,

    /// Returned from the step cache without any outbound call
    CacheHit,

    /// Collaborator failed; a previously cached result was reused
    Recovered,

    /// Collaborator failed; a fixed fallback was substituted
    Degraded,

    /// Collaborator failed with nothing to fall back on
    Fatal,
}

impl StageOutcome {
    /// Whether the pipeline may continue past this stage
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Fatal)
    }

    /// Whether the output came from a recovery path
    pub fn is_partial(&self) -> bool {
        matches!(self, Self::Recovered | Self::Degraded)
    }
}

impl fmt::Display for StageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Fresh => "fresh",
            Self::CacheHit => "cache-hit",
            Self::Recovered => "recovered",
            Self::Degraded => "degraded",
            Self::Fatal => "fatal",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order_and_numbers() {
        assert_eq!(StageName::ResearchQuestions.number(), 1);
        assert_eq!(StageName::VisualSuggestions.number(), 6);
        assert!(StageName::DeepResearch < StageName::RefinedDraft);
    }

    #[test]
    fn test_stage_name_roundtrip() {
        for stage in StageName::ALL {
            assert_eq!(StageName::parse(stage.as_str()), Some(stage));
        }
        assert_eq!(StageName::parse("unknown"), None);
    }

    #[test]
    fn test_outcome_classification() {
        assert!(StageOutcome::CacheHit.is_success());
        assert!(StageOutcome::Degraded.is_success());
        assert!(StageOutcome::Degraded.is_partial());
        assert!(!StageOutcome::Fresh.is_partial());
        assert!(!StageOutcome::Fatal.is_success());
    }
}
