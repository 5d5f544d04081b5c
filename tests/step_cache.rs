//! Step Cache Integration Tests
//!
//! Cache round-trips through the job directory and stage idempotence:
//! a cached stage returns its stored value without calling out.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tempfile::TempDir;

use usecase_gen::adapters::{Collaborator, Completion, CompletionRequest, TitleFetcher};
use usecase_gen::config::Settings;
use usecase_gen::core::stages::{research_questions, visual_suggestions, Provider, StageContext};
use usecase_gen::core::{JobContext, RetryPolicy, StageOutput, StepCache};
use usecase_gen::domain::{
    DemoStep, ExampleSolution, ExampleSolutionOutput, StageName, StageOutcome, StructuredUseCase,
    UseCaseMetadata, UseCaseSpec,
};
use usecase_gen::error::GenerationResult;

/// Answers every request with the same text and counts calls
struct Counting {
    reply: &'static str,
    calls: AtomicUsize,
}

impl Counting {
    fn new(reply: &'static str) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Collaborator for Counting {
    fn name(&self) -> &str {
        "counting"
    }

    async fn complete(&self, _request: &CompletionRequest) -> GenerationResult<Completion> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Completion::text(self.reply))
    }
}

struct NoTitles;

#[async_trait]
impl TitleFetcher for NoTitles {
    async fn fetch_title(&self, _url: &str) -> Option<String> {
        None
    }
}

fn spec() -> UseCaseSpec {
    UseCaseSpec {
        title: "Create a project plan".to_string(),
        family: "Planning".to_string(),
        ai_tool: "Chat Assistants".to_string(),
        objective: "Plan a project".to_string(),
        description: "Plan with an assistant.".to_string(),
        prerequisites: Vec::new(),
        time_estimate: "15 minutes".to_string(),
        steps: vec!["Describe the project".to_string()],
        tool: Some("ChatGPT".to_string()),
        department: Vec::new(),
        role: vec!["project manager".to_string()],
        mode: None,
        model: None,
        coding_language: None,
    }
}

#[tokio::test]
async fn test_job_cache_roundtrip_preserves_content() {
    let temp = TempDir::new().unwrap();
    let job = JobContext::with_id(temp.path(), "plan_job").unwrap();
    let cache = job.step_cache();

    let samples = [
        "",
        "plain text",
        "{\"nested\": {\"json\": [1, 2, 3]}}",
        "line one\n  line two\t\r\n",
        "unicode: \u{00e9}\u{4e2d}\u{1F680}",
    ];

    for (stage, content) in StageName::ALL.into_iter().zip(samples) {
        cache.save(stage, content).await.unwrap();
        assert_eq!(cache.load(stage).await.unwrap().as_deref(), Some(content));
        assert!(job.directory().join(format!("{}.json", stage)).exists());
    }

    // Identical saves are no-ops in effect
    cache.save(StageName::ResearchQuestions, "").await.unwrap();
    assert_eq!(
        cache.load(StageName::ResearchQuestions).await.unwrap().as_deref(),
        Some("")
    );
}

#[tokio::test]
async fn test_cached_stage_makes_no_calls() {
    let temp = TempDir::new().unwrap();
    let job = JobContext::with_id(temp.path(), "plan_job").unwrap();
    let cache = job.step_cache();
    let spec = spec();
    let settings = Settings::default();
    let retry = RetryPolicy::none();
    let provider = Counting::new("What does ChatGPT offer for planning?\nWhat are best practices?");

    let ctx = StageContext {
        spec: &spec,
        cache: &cache,
        reasoning: Provider::new(&provider, &retry),
        research: Provider::new(&provider, &retry),
        titles: &NoTitles,
        settings: &settings,
        refresh: false,
    };

    let first = research_questions::run(&ctx).await.unwrap();
    assert_eq!(first.outcome, StageOutcome::Fresh);
    assert_eq!(provider.calls(), 1);

    let second = research_questions::run(&ctx).await.unwrap();
    assert_eq!(second.outcome, StageOutcome::CacheHit);
    assert_eq!(second.value, first.value);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_unreadable_cache_is_recomputed() {
    let temp = TempDir::new().unwrap();
    let job = JobContext::with_id(temp.path(), "plan_job").unwrap();
    let cache = job.step_cache();
    cache
        .save(StageName::VisualSuggestions, "charts")
        .await
        .unwrap();
    std::fs::write(job.directory().join("visual_suggestions.json"), "not json").unwrap();

    let spec = spec();
    let settings = Settings::default();
    let retry = RetryPolicy::none();
    let provider = Counting::new("  1. A screenshot of the plan  \n");
    let ctx = StageContext {
        spec: &spec,
        cache: &cache,
        reasoning: Provider::new(&provider, &retry),
        research: Provider::new(&provider, &retry),
        titles: &NoTitles,
        settings: &settings,
        refresh: false,
    };

    let polished = StructuredUseCase::refusal(Vec::new(), UseCaseMetadata::from(&spec), None);
    let solution = ExampleSolutionOutput {
        metadata: UseCaseMetadata::default(),
        solution: ExampleSolution {
            title: "Plan".to_string(),
            setup_time: 1,
            demo_time: 2,
            prerequisites: Vec::new(),
            scenario: "Planning".to_string(),
            steps: vec![DemoStep {
                action: "Ask".to_string(),
                code_or_prompt: "Plan my launch".to_string(),
            }],
            validation: Vec::new(),
            key_points: Vec::new(),
            common_issues: Vec::new(),
            variations: Vec::new(),
        },
        demo_script: "Ask for a plan.".to_string(),
    };

    let run = visual_suggestions::run(&ctx, &polished, &solution)
        .await
        .unwrap();

    assert_eq!(run.outcome, StageOutcome::Fresh);
    assert_eq!(run.value, "1. A screenshot of the plan");
    assert_eq!(provider.calls(), 1);
    assert_eq!(
        String::decode(&cache.load(StageName::VisualSuggestions).await.unwrap().unwrap()).unwrap(),
        "1. A screenshot of the plan"
    );
}
