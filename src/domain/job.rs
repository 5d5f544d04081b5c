//! Job report reconstructed from the event log.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::events::{Event, EventType};
use super::stage::{StageName, StageOutcome};

/// Summary of one generation job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    pub job_id: String,

    pub state: JobState,

    pub started_at: DateTime<Utc>,

    pub completed_at: Option<DateTime<Utc>>,

    /// Stage currently executing (started but not yet finished)
    pub running: Option<StageName>,

    /// Outcome of every finished stage
    pub stages: BTreeMap<StageName, StageOutcome>,
}

impl JobReport {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            state: JobState::Running,
            started_at: Utc::now(),
            completed_at: None,
            running: None,
            stages: BTreeMap::new(),
        }
    }

    /// Reconstruct a report by replaying events in order
    pub fn from_events(events: &[Event]) -> Option<Self> {
        let first = events.first()?;

        let mut report = Self::new(first.job_id.clone());
        report.started_at = first.timestamp;

        for event in events {
            report.apply_event(event);
        }

        Some(report)
    }

    /// Apply a single event to update the report
    pub fn apply_event(&mut self, event: &Event) {
        match event.event_type {
            EventType::JobStarted => {
                // Outcomes describe the latest attempt only
                self.state = JobState::Running;
                self.completed_at = None;
                self.running = None;
                self.stages.clear();
            }
            EventType::StageStarted => {
                self.running = event.stage;
            }
            EventType::JobCompleted => {
                self.running = None;
                self.state = if self.partial_stages().is_empty() {
                    JobState::Completed
                } else {
                    JobState::CompletedWithWarnings
                };
                self.completed_at = Some(event.timestamp);
            }
            EventType::JobFailed => {
                self.running = None;
                self.state = JobState::Failed {
                    error: event.error.clone().unwrap_or_default(),
                };
                self.completed_at = Some(event.timestamp);
            }
            EventType::DocumentWritten => {}
            other => {
                if let (Some(stage), Some(outcome)) = (event.stage, other.outcome()) {
                    self.record(stage, outcome);
                }
            }
        }
    }

    /// Record how a stage finished
    pub fn record(&mut self, stage: StageName, outcome: StageOutcome) {
        if self.running == Some(stage) {
            self.running = None;
        }
        self.stages.insert(stage, outcome);
    }

    /// Stages whose output came from a recovery path
    pub fn partial_stages(&self) -> Vec<StageName> {
        self.stages
            .iter()
            .filter(|(_, outcome)| outcome.is_partial())
            .map(|(stage, _)| *stage)
            .collect()
    }

    pub fn outcome(&self, stage: StageName) -> Option<StageOutcome> {
        self.stages.get(&stage).copied()
    }

    pub fn is_finished(&self) -> bool {
        !matches!(self.state, JobState::Running)
    }
}

/// Overall state of a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum JobState {
    Running,
    Completed,
    /// Finished, but at least one stage was degraded or recovered
    CompletedWithWarnings,
    Failed { error: String },
}
