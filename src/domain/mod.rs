//! Domain types for the use case generator.
//!
//! This module contains the core data structures:
//! - UseCaseSpec: the immutable input brief
//! - StructuredUseCase, ResearchResult, ExampleSolutionOutput: stage contracts
//! - StageName / StageOutcome: the fixed stage list and its outcomes
//! - Event / JobReport: the per-job progress log

pub mod document;
pub mod events;
pub mod job;
pub mod research;
pub mod solution;
pub mod stage;
pub mod use_case;

// Re-export commonly used types
pub use document::{Resource, ResourceType, StructuredUseCase, SubStep, UseCaseStep};
pub use events::{Event, EventType};
pub use job::{JobReport, JobState};
pub use research::{Citation, ResearchResult, ScoredCitations, RELEVANCE_THRESHOLD};
pub use solution::{DemoStep, ExampleSolution, ExampleSolutionOutput};
pub use stage::{StageName, StageOutcome};
pub use use_case::{UseCaseMetadata, UseCaseSpec};
