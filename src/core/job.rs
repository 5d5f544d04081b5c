//! Job identity, directory, metadata and logging sinks.
//!
//! A job owns one directory for its whole lifetime:
//!
//! ```text
//! <jobs-root>/<job-id>/
//!   metadata.json         written once at job start
//!   execution.log         DEBUG-level log of the run
//!   events.jsonl          stage progress log
//!   <stage>.json          step cache records
//!   use_case.md           assembled document
//! ```

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};
use uuid::Uuid;

use super::event_log::EventLog;
use super::step_cache::FileStepCache;
use crate::domain::UseCaseSpec;

const METADATA_FILE: &str = "metadata.json";
const LOG_FILE: &str = "execution.log";
const DOCUMENT_FILE: &str = "use_case.md";

/// Summary persisted once when a job starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobMetadata {
    pub job_id: String,
    pub created_at: DateTime<Utc>,
    pub use_case_title: String,
    /// Fingerprint of the brief the cached outputs were produced from
    #[serde(default)]
    pub spec_fingerprint: Option<String>,
}

/// A generation job and its output directory
#[derive(Debug, Clone)]
pub struct JobContext {
    job_id: String,
    dir: PathBuf,
    events: EventLog,
}

impl JobContext {
    /// Start a new job: derive an id from the title and create its directory
    pub fn create(jobs_root: &Path, title: &str) -> Result<Self> {
        let job_id = derive_job_id(title, Local::now());
        Self::with_id(jobs_root, &job_id)
    }

    /// Use an explicit job id, creating the directory if needed (resume)
    pub fn with_id(jobs_root: &Path, job_id: &str) -> Result<Self> {
        let dir = jobs_root.join(job_id);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create job directory: {}", dir.display()))?;

        Ok(Self::at(job_id, dir))
    }

    /// Open a job directory that must already exist
    pub fn open_existing(jobs_root: &Path, job_id: &str) -> Result<Self> {
        let dir = jobs_root.join(job_id);
        if !dir.is_dir() {
            anyhow::bail!("Job not found: {} (looked in {})", job_id, jobs_root.display());
        }

        Ok(Self::at(job_id, dir))
    }

    fn at(job_id: &str, dir: PathBuf) -> Self {
        Self {
            job_id: job_id.to_string(),
            events: EventLog::in_dir(&dir),
            dir,
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn directory(&self) -> &Path {
        &self.dir
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn step_cache(&self) -> FileStepCache {
        FileStepCache::new(&self.dir)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.dir.join(METADATA_FILE)
    }

    pub fn log_path(&self) -> PathBuf {
        self.dir.join(LOG_FILE)
    }

    pub fn document_path(&self) -> PathBuf {
        self.dir.join(DOCUMENT_FILE)
    }

    /// Persist job metadata on first start.
    ///
    /// An existing file is left untouched; if its fingerprint differs from
    /// `spec`, cached stage outputs came from a different brief and a
    /// warning is logged.
    pub fn record_metadata(&self, spec: &UseCaseSpec) -> Result<JobMetadata> {
        let path = self.metadata_path();
        let fingerprint = spec_fingerprint(spec);

        if path.exists() {
            let existing = self.read_metadata()?;
            if existing.spec_fingerprint.as_deref() != Some(fingerprint.as_str()) {
                warn!(
                    "Job {} was started from a different use case spec; cached stage results may not match",
                    self.job_id
                );
            }
            return Ok(existing);
        }

        let metadata = JobMetadata {
            job_id: self.job_id.clone(),
            created_at: Utc::now(),
            use_case_title: spec.title.clone(),
            spec_fingerprint: Some(fingerprint),
        };

        let json = serde_json::to_string_pretty(&metadata).context("Failed to serialize job metadata")?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write job metadata: {}", path.display()))?;

        Ok(metadata)
    }

    pub fn read_metadata(&self) -> Result<JobMetadata> {
        let path = self.metadata_path();
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read job metadata: {}", path.display()))?;

        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse job metadata: {}", path.display()))
    }

    /// Write the assembled document, replacing any previous version
    pub async fn write_document(&self, document: &str) -> Result<PathBuf> {
        let path = self.document_path();
        tokio::fs::write(&path, document)
            .await
            .with_context(|| format!("Failed to write document: {}", path.display()))?;
        Ok(path)
    }

    /// Install the console progress sink and the per-job DEBUG file sink.
    ///
    /// Only the first subscriber installed in a process takes effect.
    pub fn install_logging(&self) -> Result<()> {
        let path = self.log_path();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file: {}", path.display()))?;

        let console = fmt::layer()
            .with_target(false)
            .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

        let durable = fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .with_filter(LevelFilter::DEBUG);

        if tracing_subscriber::registry()
            .with(console)
            .with(durable)
            .try_init()
            .is_ok()
        {
            info!("Logging to {}", path.display());
        }

        Ok(())
    }
}

/// Derive a job id: normalized title, local timestamp, short random suffix
pub fn derive_job_id(title: &str, now: DateTime<Local>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}_{}_{}",
        slugify(title),
        now.format("%Y%m%d_%H%M%S"),
        &suffix[..4]
    )
}

/// Lowercase, whitespace-separated words joined by `_`
pub fn slugify(title: &str) -> String {
    let slug = title
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
                .flat_map(char::to_lowercase)
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("_");

    if slug.is_empty() {
        "use_case".to_string()
    } else {
        slug
    }
}

/// First 16 hex chars of SHA-256 over the formatted spec
pub fn spec_fingerprint(spec: &UseCaseSpec) -> String {
    let mut hasher = Sha256::new();
    hasher.update(spec.to_prompt_text().as_bytes());
    let result = hasher.finalize();
    hex::encode(&result[..8])
}
