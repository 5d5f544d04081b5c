//! usecase-gen - resumable AI pipeline for use case documents
//!
//! Turns a structured use case brief into a polished, research-backed
//! Markdown document through six fixed stages:
//!
//! 1. research questions
//! 2. deep research (with citation titles)
//! 3. refinement into a structured use case
//! 4. final polish
//! 5. example solution
//! 6. visual element suggestions
//!
//! # Architecture
//!
//! - Every stage result is cached in the job directory as soon as it exists
//! - Rerunning a job reuses cached results and makes no provider calls for them
//! - A failed stage falls back to its cached result, then to fixed fallback
//!   content; stages that shape the document abort the job instead
//! - Progress is recorded in an append-only event log per job
//!
//! # Modules
//!
//! - `adapters`: Provider clients (OpenAI-compatible chat, page titles)
//! - `core`: Step cache, job context, policies, stages, orchestrator
//! - `domain`: Data contracts (UseCaseSpec, StructuredUseCase, Event, ...)
//! - `config`: Config file and environment resolution
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Generate with the default brief
//! usecase-gen generate --title "Create a project plan" --tool none
//!
//! # Check a job
//! usecase-gen status <job-id>
//!
//! # Resume an interrupted job
//! usecase-gen generate --title "Create a project plan" --job-id <job-id>
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod error;

// Re-export main types at crate root for convenience
pub use core::{JobContext, Orchestrator};
pub use domain::{Event, EventType, JobReport, JobState, StructuredUseCase, UseCaseSpec};
pub use error::{GenerationError, GenerationResult};
