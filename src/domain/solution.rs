//! Example solution produced by Stage 5.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::use_case::UseCaseMetadata;

/// One demonstrable action with the code or prompt to type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DemoStep {
    pub action: String,
    pub code_or_prompt: String,
}

/// A short, video-ready worked example
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExampleSolution {
    pub title: String,

    /// Setup time in minutes
    pub setup_time: u32,

    /// Demo time in minutes (target: two to three)
    pub demo_time: u32,

    pub prerequisites: Vec<String>,

    /// Real-world context for the example
    pub scenario: String,

    pub steps: Vec<DemoStep>,

    /// How to verify the solution works
    pub validation: Vec<String>,

    pub key_points: Vec<String>,

    pub common_issues: Vec<String>,

    /// Required, may be empty
    pub variations: Vec<String>,
}

/// Example solution wrapped with metadata and a narration script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExampleSolutionOutput {
    pub metadata: UseCaseMetadata,
    pub solution: ExampleSolution,
    pub demo_script: String,
}
