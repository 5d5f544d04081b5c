//! Command-line interface for usecase-gen.
//!
//! Provides commands for generating a use case document, checking a job's
//! progress, re-rendering a document from cached results, and inspecting
//! the resolved configuration.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::config::{Credentials, ResolvedConfig, OPENAI_KEY_ENV, PERPLEXITY_KEY_ENV};
use crate::core::{JobContext, Orchestrator};
use crate::domain::{JobState, StageName, UseCaseSpec};

const DEFAULT_OBJECTIVE: &str = "Enable developers to effectively communicate programming intent \
through structured comments that trigger accurate AI code generation";

const DEFAULT_DESCRIPTION: &str = "This use case trains developers to harness AI tooling by writing \
precise comments and docstrings that function as prompts for automated code generation. It \
emphasizes the importance of natural language clarity in directives (e.g., docstrings and TODOs) \
and guides participants to refine prompts as needed while validating AI-generated outputs against \
the original intent.";

const DEFAULT_PREREQUISITES: &str = "Writing clear code comments, Understanding code structure, \
Basic algorithmic thinking, Familiarity with code completion tools, Basic understanding of \
natural language processing";

const DEFAULT_STEPS: &str = "Write a detailed function description in docstring format, Add TODO \
comments with specific algorithm requirements, Use natural language to describe complex logic \
before implementation, Refine prompts based on initial AI outputs, Validate generated code \
against original intent";

/// usecase-gen - research-backed use case document generator
#[derive(Parser, Debug)]
#[command(name = "usecase-gen")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory holding job directories (overrides config and USECASE_GEN_HOME)
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a use case document
    Generate {
        #[command(flatten)]
        spec: SpecArgs,

        /// Resume an existing job instead of starting a new one
        #[arg(long)]
        job_id: Option<String>,

        /// Ignore cached stage results and recompute every stage
        #[arg(long)]
        refresh: bool,
    },

    /// Show per-stage progress of a job
    Status {
        /// Job ID (directory name under the jobs root)
        job_id: String,
    },

    /// Rebuild use_case.md from a job's cached results
    Render {
        /// Job ID to render
        job_id: String,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Commands {
    /// Whether this command runs inside a job and installs the job's own log sinks
    pub fn creates_job(&self) -> bool {
        matches!(self, Commands::Generate { .. })
    }
}

/// Use case brief; every flag has a default
#[derive(Args, Debug, Clone)]
pub struct SpecArgs {
    /// Use case title
    #[arg(long, default_value = "Craft Effective Code Prompts for AI Assistance")]
    pub title: String,

    /// Use case family
    #[arg(long, default_value = "Core Skills")]
    pub family: String,

    /// AI tool category
    #[arg(long, alias = "ai_tool", default_value = "Coding Assistants")]
    pub ai_tool: String,

    /// Use case objective
    #[arg(long, default_value = DEFAULT_OBJECTIVE)]
    pub objective: String,

    /// Use case description
    #[arg(long, default_value = DEFAULT_DESCRIPTION)]
    pub description: String,

    /// Comma-separated list of prerequisites
    #[arg(long, default_value = DEFAULT_PREREQUISITES)]
    pub prerequisites: String,

    /// Time estimate
    #[arg(long, alias = "time_estimate", default_value = "20 minutes")]
    pub time_estimate: String,

    /// Comma-separated list of steps
    #[arg(long, default_value = DEFAULT_STEPS)]
    pub steps: String,

    /// Tool name ("none" if not applicable)
    #[arg(long, default_value = "GitHub Copilot")]
    pub tool: String,

    /// Comma-separated list of departments
    #[arg(long, default_value = "SWE")]
    pub department: String,

    /// Comma-separated list of roles
    #[arg(long, default_value = "front-end")]
    pub role: String,

    /// Tool mode ("none" if not applicable)
    #[arg(long, default_value = "inline chat")]
    pub mode: String,

    /// Model ("none" if not applicable)
    #[arg(long, default_value = "GPT-4o")]
    pub model: String,

    /// Coding language ("not applicable" for non-coding use cases)
    #[arg(long, alias = "coding_language", default_value = "Python")]
    pub coding_language: String,
}

impl SpecArgs {
    pub fn into_spec(self) -> UseCaseSpec {
        UseCaseSpec {
            title: self.title.trim().to_string(),
            family: self.family,
            ai_tool: self.ai_tool,
            objective: self.objective,
            description: self.description,
            prerequisites: split_list(&self.prerequisites),
            time_estimate: self.time_estimate,
            steps: split_list(&self.steps),
            tool: optional(&self.tool),
            department: split_list(&self.department),
            role: split_list(&self.role),
            mode: optional(&self.mode),
            model: optional(&self.model),
            coding_language: optional(&self.coding_language),
        }
    }
}

/// Split a comma-separated flag into trimmed, non-empty items
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// `None` for blank or "not applicable" style values
fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "" | "none" | "n/a" | "na" | "not applicable" => None,
        _ => Some(trimmed.to_string()),
    }
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Generate {
                spec,
                job_id,
                refresh,
            } => generate(spec.into_spec(), self.output_dir, job_id, refresh).await,
            Commands::Status { job_id } => show_status(self.output_dir, &job_id).await,
            Commands::Render { job_id } => render(self.output_dir, &job_id).await,
            Commands::Config => show_config(self.output_dir),
        }
    }
}

/// Run (or resume) a generation job
async fn generate(
    spec: UseCaseSpec,
    output_dir: Option<PathBuf>,
    job_id: Option<String>,
    refresh: bool,
) -> Result<()> {
    let config = ResolvedConfig::load(output_dir)?;

    // Fail before any job directory or stage exists
    let credentials = Credentials::from_env()?;

    let job = match job_id {
        Some(id) => JobContext::with_id(&config.jobs_root, &id)?,
        None => JobContext::create(&config.jobs_root, &spec.title)?,
    };
    job.install_logging()?;

    info!("Starting use case generation for: {}", spec.title);
    info!("Job ID: {}", job.job_id());

    let orchestrator = Orchestrator::from_credentials(&credentials, config.settings)?;
    let report = orchestrator.run_job(&spec, &job, refresh).await?;

    println!("Job ID: {}", report.job_id);
    println!("Results stored in: {}", job.directory().display());
    println!("Document: {}", job.document_path().display());
    if matches!(report.state, JobState::CompletedWithWarnings) {
        let names: Vec<&str> = report.partial_stages().iter().map(|s| s.as_str()).collect();
        eprintln!("\n[Generated with partial results: {}]", names.join(", "));
    }

    Ok(())
}

/// Show the status of a job
async fn show_status(output_dir: Option<PathBuf>, job_id: &str) -> Result<()> {
    let config = ResolvedConfig::load(output_dir)?;
    let job = JobContext::open_existing(&config.jobs_root, job_id)?;
    let report = Orchestrator::job_status(&job).await?;

    println!("Job ID: {}", report.job_id);
    if let Ok(metadata) = job.read_metadata() {
        println!("Title: {}", metadata.use_case_title);
    }
    println!("State: {}", describe_state(&report.state));
    println!("Started: {}", report.started_at);
    if let Some(completed) = report.completed_at {
        println!("Completed: {}", completed);
    }
    println!("\nStages:");
    for stage in StageName::ALL {
        let status = match report.outcome(stage) {
            Some(outcome) => outcome.to_string(),
            None if report.running == Some(stage) => "running".to_string(),
            None => "pending".to_string(),
        };
        println!("  {}. {:<20} {}", stage.number(), stage.as_str(), status);
    }

    if job.document_path().exists() {
        println!("\nDocument: {}", job.document_path().display());
    }

    Ok(())
}

fn describe_state(state: &JobState) -> String {
    match state {
        JobState::Running => "running".to_string(),
        JobState::Completed => "completed".to_string(),
        JobState::CompletedWithWarnings => "completed (partial results)".to_string(),
        JobState::Failed { error } => format!("failed: {}", error),
    }
}

/// Re-assemble a job's document without calling any provider
async fn render(output_dir: Option<PathBuf>, job_id: &str) -> Result<()> {
    let config = ResolvedConfig::load(output_dir)?;
    let job = JobContext::open_existing(&config.jobs_root, job_id)?;

    let path = Orchestrator::render_job(&job)
        .await
        .with_context(|| format!("Failed to render job {}", job_id))?;

    println!("Document: {}", path.display());
    Ok(())
}

/// Show resolved configuration. Credentials are reported as present or missing only.
fn show_config(output_dir: Option<PathBuf>) -> Result<()> {
    let config = ResolvedConfig::load(output_dir)?;
    let yaml = serde_yaml::to_string(&config).context("Failed to serialize configuration")?;

    println!("{}", yaml.trim_end());
    println!();
    println!("Credentials:");
    for name in [OPENAI_KEY_ENV, PERPLEXITY_KEY_ENV] {
        let state = match std::env::var(name) {
            Ok(value) if !value.trim().is_empty() => "set",
            _ => "missing",
        };
        println!("  {}: {}", name, state);
    }

    Ok(())
}
