//! Per-job persistence of stage outputs.
//!
//! Each stage result is stored as `<job-dir>/<stage>.json` containing
//! `{"content": "<string>"}`. Structured stages store their JSON document
//! as that string. Saving overwrites; a missing file is a cache miss.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::domain::StageName;

/// Load/save contract for stage results
#[async_trait]
pub trait StepCache: Send + Sync {
    /// Exactly the last saved content, or `None` if the stage was never saved
    async fn load(&self, stage: StageName) -> Result<Option<String>>;

    /// Store content for a stage, replacing any previous value
    async fn save(&self, stage: StageName, content: &str) -> Result<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct StepRecord {
    content: String,
}

/// File-backed cache rooted at a job directory
#[derive(Debug, Clone)]
pub struct FileStepCache {
    dir: PathBuf,
}

impl FileStepCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record for a stage
    pub fn path_for(&self, stage: StageName) -> PathBuf {
        self.dir.join(format!("{}.json", stage.as_str()))
    }
}

#[async_trait]
impl StepCache for FileStepCache {
    async fn load(&self, stage: StageName) -> Result<Option<String>> {
        let path = self.path_for(stage);

        let raw = match fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read cache file: {}", path.display()))
            }
        };

        let record: StepRecord = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse cache file: {}", path.display()))?;

        Ok(Some(record.content))
    }

    async fn save(&self, stage: StageName, content: &str) -> Result<()> {
        let path = self.path_for(stage);
        let record = StepRecord {
            content: content.to_string(),
        };
        let json = serde_json::to_string_pretty(&record).context("Failed to serialize step record")?;

        fs::write(&path, json)
            .await
            .with_context(|| format!("Failed to write cache file: {}", path.display()))
    }
}

/// In-memory cache, for tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryStepCache {
    entries: Mutex<HashMap<StageName, String>>,
}

impl MemoryStepCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl StepCache for MemoryStepCache {
    async fn load(&self, stage: StageName) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("Step cache lock poisoned"))?;
        Ok(entries.get(&stage).cloned())
    }

    async fn save(&self, stage: StageName, content: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("Step cache lock poisoned"))?;
        entries.insert(stage, content.to_string());
        Ok(())
    }
}
