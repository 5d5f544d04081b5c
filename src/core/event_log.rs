//! Append-only job event log with file-based persistence.
//!
//! Events are stored as newline-delimited JSON (JSONL) for simplicity
//! and easy debugging/inspection.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncSeekExt, AsyncWriteExt, BufReader};
use tracing::warn;

use crate::domain::{Event, EventType, JobReport};

/// File-based event log using JSONL format
#[derive(Debug, Clone)]
pub struct EventLog {
    /// Path to the events.jsonl file
    events_path: PathBuf,
}

impl EventLog {
    /// Log stored as `events.jsonl` inside a job directory
    pub fn in_dir(job_dir: &Path) -> Self {
        Self {
            events_path: job_dir.join("events.jsonl"),
        }
    }

    /// Get the path to the events file
    pub fn path(&self) -> &Path {
        &self.events_path
    }

    /// Append an event to the log
    pub async fn append(&self, event: &Event) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.events_path)
            .await
            .with_context(|| {
                format!(
                    "Failed to open events file: {}",
                    self.events_path.display()
                )
            })?;

        let json = serde_json::to_string(event).context("Failed to serialize event")?;
        let line = if ends_mid_line(&mut file).await? {
            format!("\n{}\n", json)
        } else {
            format!("{}\n", json)
        };
        file.write_all(line.as_bytes())
            .await
            .context("Failed to write event")?;
        file.flush().await.context("Failed to flush event")?;

        Ok(())
    }

    /// Replay all events in order, skipping lines that do not parse
    pub async fn replay(&self) -> Result<Vec<Event>> {
        if !self.events_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.events_path)
            .await
            .with_context(|| format!("Failed to open events file: {}", self.events_path.display()))?;

        let reader = BufReader::new(file);
        let mut lines = reader.lines();
        let mut events = Vec::new();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            // A run killed mid-append leaves a partial last line
            match serde_json::from_str::<Event>(&line) {
                Ok(event) => events.push(event),
                Err(e) => warn!(
                    path = %self.events_path.display(),
                    "Skipping unreadable event line: {}",
                    e
                ),
            }
        }

        Ok(events)
    }

    /// Rebuild the job report from the log
    pub async fn report(&self) -> Result<Option<JobReport>> {
        let events = self.replay().await?;
        Ok(JobReport::from_events(&events))
    }

    /// Get the last event of a specific type
    pub async fn last_event_of_type(&self, event_type: EventType) -> Result<Option<Event>> {
        let events = self.replay().await?;
        Ok(events.into_iter().rev().find(|e| e.event_type == event_type))
    }
}

/// Whether the last write stopped before its newline
async fn ends_mid_line(file: &mut File) -> Result<bool> {
    let len = file.metadata().await.context("Failed to stat events file")?.len();
    if len == 0 {
        return Ok(false);
    }

    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(len - 1))
        .await
        .context("Failed to seek events file")?;
    file.read_exact(&mut last)
        .await
        .context("Failed to read events file")?;
    Ok(last[0] != b'\n')
}
