//! Main orchestrator for pipeline execution.
//!
//! Runs the six stages in order against one job, records progress in the
//! job's event log, and writes the assembled document. Stage results live in
//! the job's step cache, so rerunning a job picks up wherever it stopped.

use std::future::Future;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{error, info, instrument, warn};

use crate::adapters::{ChatClient, Collaborator, HttpTitleFetcher, TitleFetcher};
use crate::config::{Credentials, Settings};
use crate::domain::{
    Event, EventType, ExampleSolutionOutput, JobReport, StageName, StageOutcome,
    StructuredUseCase, UseCaseSpec,
};

use super::assembler::assemble;
use super::job::JobContext;
use super::stages::{
    deep_research, example_solution, polish, refine, research_questions, visual_suggestions,
    Provider, StageContext, StageOutput, StageRun,
};
use super::step_cache::StepCache;

/// Everything the final document is built from
struct Artifacts {
    polished: StructuredUseCase,
    solution: ExampleSolutionOutput,
    visuals: String,
}

/// Main pipeline orchestrator
pub struct Orchestrator {
    /// Reasoning/chat provider (questions, scoring, refinement, polish, solution, visuals)
    reasoning: Box<dyn Collaborator>,

    /// Knowledge-retrieval provider (deep research)
    research: Box<dyn Collaborator>,

    titles: Box<dyn TitleFetcher>,

    settings: Settings,
}

impl Orchestrator {
    pub fn new(
        reasoning: Box<dyn Collaborator>,
        research: Box<dyn Collaborator>,
        titles: Box<dyn TitleFetcher>,
        settings: Settings,
    ) -> Self {
        Self {
            reasoning,
            research,
            titles,
            settings,
        }
    }

    /// Orchestrator backed by the OpenAI and Perplexity HTTP clients
    pub fn from_credentials(credentials: &Credentials, settings: Settings) -> Result<Self> {
        let timeout = settings.http.request_timeout();
        let reasoning = ChatClient::openai(&credentials.openai_api_key, timeout)?;
        let research = ChatClient::perplexity(&credentials.perplexity_api_key, timeout)?;
        let titles = HttpTitleFetcher::new(settings.research.title_timeout());

        Ok(Self::new(
            Box::new(reasoning),
            Box::new(research),
            Box::new(titles),
            settings,
        ))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Run all six stages for `spec` inside `job` and write the document.
    ///
    /// With `refresh`, cached stage results are ignored and recomputed; they
    /// are still used as the recovery source if recomputation fails.
    #[instrument(skip(self, spec, job), fields(job_id = %job.job_id()))]
    pub async fn run_job(
        &self,
        spec: &UseCaseSpec,
        job: &JobContext,
        refresh: bool,
    ) -> Result<JobReport> {
        match job.events().last_event_of_type(EventType::JobFailed).await {
            Ok(Some(previous)) => info!(
                failed_at = %previous.timestamp,
                "Resuming job after an earlier failure"
            ),
            Ok(None) => {}
            Err(e) => warn!("Could not read previous job events: {:#}", e),
        }

        job.record_metadata(spec)?;

        let mut report = JobReport::new(job.job_id());
        self.emit(
            job,
            &mut report,
            Event::new(
                job.job_id(),
                None,
                EventType::JobStarted,
                format!("Generating use case '{}'", spec.title),
            ),
        )
        .await?;

        let cache = job.step_cache();
        let ctx = StageContext {
            spec,
            cache: &cache,
            reasoning: Provider::new(self.reasoning.as_ref(), &self.settings.retry.openai),
            research: Provider::new(self.research.as_ref(), &self.settings.retry.perplexity),
            titles: self.titles.as_ref(),
            settings: &self.settings,
            refresh,
        };

        let artifacts = match self.run_stages(&ctx, job, &mut report).await {
            Ok(artifacts) => artifacts,
            Err(e) => {
                error!("Job failed: {:#}", e);
                let failed = Event::new(job.job_id(), None, EventType::JobFailed, "Job failed")
                    .with_error(format!("{:#}", e));
                self.emit(job, &mut report, failed).await?;
                return Err(e);
            }
        };

        let document = assemble(
            &artifacts.polished,
            Some(&artifacts.solution),
            Some(&artifacts.visuals),
        );
        let path = job.write_document(&document).await?;
        info!(path = %path.display(), "Use case document written");

        self.emit(
            job,
            &mut report,
            Event::new(
                job.job_id(),
                None,
                EventType::DocumentWritten,
                format!("Wrote {}", path.display()),
            ),
        )
        .await?;
        self.emit(
            job,
            &mut report,
            Event::new(job.job_id(), None, EventType::JobCompleted, "Job completed"),
        )
        .await?;

        let partial = report.partial_stages();
        if partial.is_empty() {
            info!("Use case generated successfully");
        } else {
            let names: Vec<&str> = partial.iter().map(|s| s.as_str()).collect();
            warn!(
                "Use case generated with partial results (degraded stages: {})",
                names.join(", ")
            );
        }

        Ok(report)
    }

    async fn run_stages(
        &self,
        ctx: &StageContext<'_>,
        job: &JobContext,
        report: &mut JobReport,
    ) -> Result<Artifacts> {
        let questions = self
            .track(job, report, StageName::ResearchQuestions, research_questions::run(ctx))
            .await?;

        let research = self
            .track(job, report, StageName::DeepResearch, deep_research::run(ctx, &questions))
            .await?;

        let draft = self
            .track(job, report, StageName::RefinedDraft, refine::run(ctx, &research))
            .await?;

        let polished = self
            .track(job, report, StageName::FinalUseCase, polish::run(ctx, &draft))
            .await?;

        let solution = self
            .track(
                job,
                report,
                StageName::ExampleSolution,
                example_solution::run(ctx, &polished, &research),
            )
            .await?;

        let visuals = self
            .track(
                job,
                report,
                StageName::VisualSuggestions,
                visual_suggestions::run(ctx, &polished, &solution),
            )
            .await?;

        Ok(Artifacts {
            polished,
            solution,
            visuals,
        })
    }

    /// Run one stage, recording its start and outcome in the event log
    async fn track<T, Fut>(
        &self,
        job: &JobContext,
        report: &mut JobReport,
        stage: StageName,
        run: Fut,
    ) -> Result<T>
    where
        Fut: Future<Output = Result<StageRun<T>>>,
    {
        info!(
            stage = %stage,
            "Step {}/{}: {}",
            stage.number(),
            StageName::ALL.len(),
            stage.description()
        );
        self.emit(
            job,
            report,
            Event::new(
                job.job_id(),
                Some(stage),
                EventType::StageStarted,
                format!("Starting {}", stage.description()),
            ),
        )
        .await?;

        let started = Instant::now();
        let result = run.await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(StageRun { value, outcome }) => {
                match outcome {
                    StageOutcome::Degraded => {
                        warn!(stage = %stage, duration_ms, "Stage degraded to fallback content")
                    }
                    StageOutcome::Recovered => {
                        warn!(stage = %stage, duration_ms, "Stage recovered from cached result")
                    }
                    _ => info!(stage = %stage, %outcome, duration_ms, "Stage finished"),
                }

                let finished =
                    Event::stage_finished(job.job_id(), stage, outcome).with_duration(duration_ms);
                self.emit(job, report, finished).await?;
                Ok(value)
            }
            Err(e) => {
                let failed = Event::stage_finished(job.job_id(), stage, StageOutcome::Fatal)
                    .with_duration(duration_ms)
                    .with_error(format!("{:#}", e));
                self.emit(job, report, failed).await?;
                Err(e)
            }
        }
    }

    async fn emit(&self, job: &JobContext, report: &mut JobReport, event: Event) -> Result<()> {
        job.events().append(&event).await?;
        report.apply_event(&event);
        Ok(())
    }

    /// Rebuild `use_case.md` from cached stage results only.
    ///
    /// The polished use case must be cached; the example solution and visual
    /// suggestions are included when present.
    pub async fn render_job(job: &JobContext) -> Result<PathBuf> {
        let cache = job.step_cache();

        let polished: StructuredUseCase = load_required(&cache, StageName::FinalUseCase).await?;
        let solution: Option<ExampleSolutionOutput> =
            load_optional(&cache, StageName::ExampleSolution).await;
        let visuals: Option<String> = load_optional(&cache, StageName::VisualSuggestions).await;

        let document = assemble(&polished, solution.as_ref(), visuals.as_deref());
        let path = job.write_document(&document).await?;

        job.events()
            .append(&Event::new(
                job.job_id(),
                None,
                EventType::DocumentWritten,
                format!("Re-rendered {}", path.display()),
            ))
            .await?;

        info!(path = %path.display(), "Use case document re-rendered from cache");
        Ok(path)
    }

    /// Current state of a job, replayed from its event log
    pub async fn job_status(job: &JobContext) -> Result<JobReport> {
        job.events()
            .report()
            .await?
            .with_context(|| format!("No events recorded for job {}", job.job_id()))
    }
}

async fn load_required<T: StageOutput>(cache: &dyn StepCache, stage: StageName) -> Result<T> {
    let content = cache
        .load(stage)
        .await?
        .with_context(|| format!("No cached result for stage '{}'; run generate first", stage))?;

    T::decode(&content).with_context(|| format!("Unreadable cached result for stage '{}'", stage))
}

async fn load_optional<T: StageOutput>(cache: &dyn StepCache, stage: StageName) -> Option<T> {
    match cache.load(stage).await {
        Ok(Some(content)) => match T::decode(&content) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(stage = %stage, "Skipping unreadable cached result: {:#}", e);
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            warn!(stage = %stage, "Could not read cached result: {:#}", e);
            None
        }
    }
}
