//! Job events recorded in the per-job append-only log.
//!
//! The log is a progress record; the step cache, not the log, is the source
//! of truth for resumption.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::stage::{StageName, StageOutcome};

/// A single entry in `events.jsonl`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique identifier for this event
    pub id: Uuid,

    /// When this event occurred (ISO 8601)
    pub timestamp: DateTime<Utc>,

    /// The job this event belongs to
    pub job_id: String,

    /// Stage this event concerns (if applicable)
    pub stage: Option<StageName>,

    /// Type of event
    pub event_type: EventType,

    /// Human-readable summary (no prompt or response bodies)
    pub summary: String,

    /// Time taken in milliseconds (for finished stages)
    pub duration_ms: Option<u64>,

    /// Error message if something failed
    pub error: Option<String>,
}

impl Event {
    /// Create a new event with the current timestamp
    pub fn new(
        job_id: impl Into<String>,
        stage: Option<StageName>,
        event_type: EventType,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            job_id: job_id.into(),
            stage,
            event_type,
            summary: summary.into(),
            duration_ms: None,
            error: None,
        }
    }

    /// Event recording how a stage finished
    pub fn stage_finished(job_id: &str, stage: StageName, outcome: StageOutcome) -> Self {
        let summary = format!("Stage '{}' finished: {}", stage, outcome);
        Self::new(job_id, Some(stage), EventType::from_outcome(outcome), summary)
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Types of events that can occur during a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    JobStarted,
    StageStarted,
    /// Fresh result from the collaborator
    StageCompleted,
    /// Result served from the step cache
    StageCached,
    /// Collaborator failed, cached result reused
    StageRecovered,
    /// Collaborator failed, fallback substituted
    StageDegraded,
    StageFailed,
    DocumentWritten,
    JobCompleted,
    JobFailed,
}

impl EventType {
    pub fn from_outcome(outcome: StageOutcome) -> Self {
        match outcome {
            StageOutcome::Fresh => Self::StageCompleted,
            StageOutcome::CacheHit => Self::StageCached,
            StageOutcome::Recovered => Self::StageRecovered,
            StageOutcome::Degraded => Self::StageDegraded,
            StageOutcome::Fatal => Self::StageFailed,
        }
    }

    /// The stage outcome this event records, if it is a stage-finished event
    pub fn outcome(&self) -> Option<StageOutcome> {
        match self {
            Self::StageCompleted => Some(StageOutcome::Fresh),
            Self::StageCached => Some(StageOutcome::CacheHit),
            Self::StageRecovered => Some(StageOutcome::Recovered),
            Self::StageDegraded => Some(StageOutcome::Degraded),
            Self::StageFailed => Some(StageOutcome::Fatal),
            _ => None,
        }
    }
}
