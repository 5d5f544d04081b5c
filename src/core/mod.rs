//! Core orchestration logic.
//!
//! This module contains:
//! - StepCache: per-stage result persistence
//! - JobContext: job identity, directory and logging sinks
//! - EventLog: append-only job progress log
//! - RetryPolicy / FailurePolicy: transient retries and stage recovery
//! - stages: the six pipeline stages
//! - assembler: Markdown rendering of the final document
//! - Orchestrator: main execution engine

pub mod assembler;
pub mod event_log;
pub mod failure;
pub mod job;
pub mod orchestrator;
pub mod retry;
pub mod stages;
pub mod step_cache;

// Re-export commonly used types
pub use assembler::{assemble, order_citations};
pub use event_log::EventLog;
pub use failure::{FailurePolicy, Recovery};
pub use job::{derive_job_id, slugify, spec_fingerprint, JobContext, JobMetadata};
pub use orchestrator::Orchestrator;
pub use retry::RetryPolicy;
pub use stages::{StageOutput, StageRun};
pub use step_cache::{FileStepCache, MemoryStepCache, StepCache};
