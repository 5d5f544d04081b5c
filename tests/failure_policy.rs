//! Failure Policy Integration Tests
//!
//! Stage recovery through `StageContext::execute`: cached results first,
//! then fixed fallbacks, otherwise the failure propagates.

use async_trait::async_trait;

use usecase_gen::adapters::{Collaborator, Completion, CompletionRequest, TitleFetcher};
use usecase_gen::config::Settings;
use usecase_gen::core::stages::{Provider, StageContext};
use usecase_gen::core::{FailurePolicy, MemoryStepCache, RetryPolicy, StepCache};
use usecase_gen::domain::{ResearchResult, StageName, StageOutcome, UseCaseSpec};
use usecase_gen::error::{GenerationError, GenerationResult};

struct Unreachable;

#[async_trait]
impl Collaborator for Unreachable {
    fn name(&self) -> &str {
        "unreachable"
    }

    async fn complete(&self, _request: &CompletionRequest) -> GenerationResult<Completion> {
        Err(GenerationError::Transport("connection refused".to_string()))
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
        tool: None,
        department: Vec::new(),
        role: Vec::new(),
        mode: None,
        model: None,
        coding_language: None,
    }
}

fn failure() -> anyhow::Result<String> {
    Err(GenerationError::Transport("connection refused".to_string()).into())
}

fn context<'a>(
    spec: &'a UseCaseSpec,
    cache: &'a dyn StepCache,
    settings: &'a Settings,
    retry: &'a RetryPolicy,
) -> StageContext<'a> {
    StageContext {
        spec,
        cache,
        reasoning: Provider::new(&Unreachable, retry),
        research: Provider::new(&Unreachable, retry),
        titles: &NoTitles,
        settings,
        refresh: false,
    }
}

#[tokio::test]
async fn test_fallback_stages_degrade() {
    let spec = spec();
    let cache = MemoryStepCache::new();
    let settings = Settings::default();
    let retry = RetryPolicy::none();
    let ctx = context(&spec, &cache, &settings, &retry);

    let questions = ctx
        .execute(StageName::ResearchQuestions, async {
            failure().map(|_| Vec::<String>::new())
        })
        .await
        .unwrap();
    assert_eq!(questions.outcome, StageOutcome::Degraded);
    assert_eq!(questions.value.len(), 2);

    let research = ctx
        .execute(StageName::DeepResearch, async {
            failure().map(|_| ResearchResult::unavailable())
        })
        .await
        .unwrap();
    assert_eq!(research.outcome, StageOutcome::Degraded);
    assert!(research.value.content.contains("unavailable"));
    assert!(research.value.citations.is_empty());

    let visuals = ctx
        .execute(StageName::VisualSuggestions, async { failure() })
        .await
        .unwrap();
    assert_eq!(visuals.outcome, StageOutcome::Degraded);
    assert!(!visuals.value.is_empty());

    // Degraded results are not cached
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_no_fallback_stages_abort() {
    let spec = spec();
    let cache = MemoryStepCache::new();
    let settings = Settings::default();
    let retry = RetryPolicy::none();
    let ctx = context(&spec, &cache, &settings, &retry);

    for stage in [
        StageName::RefinedDraft,
        StageName::FinalUseCase,
        StageName::ExampleSolution,
    ] {
        assert!(!FailurePolicy::has_fallback(stage));

        let result = ctx
            .execute(stage, async {
                Err::<String, _>(anyhow::anyhow!("schema mismatch"))
            })
            .await;

        let err = result.unwrap_err();
        assert!(format!("{:#}", err).contains(stage.as_str()), "{}", stage);
    }
}

#[tokio::test]
async fn test_unreachable_collaborator_falls_back_through_stage() {
    let spec = spec();
    let cache = MemoryStepCache::new();
    let settings = Settings::default();
    let retry = RetryPolicy {
        max_attempts: 2,
        ..RetryPolicy::none()
    };
    let ctx = context(&spec, &cache, &settings, &retry);

    let run = usecase_gen::core::stages::research_questions::run(&ctx)
        .await
        .unwrap();

    assert_eq!(run.outcome, StageOutcome::Degraded);
    assert_eq!(
        run.value,
        vec![
            "What are the current best practices for this use case?".to_string(),
            "What are common pitfalls to avoid?".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_previous_result_preferred_over_fallback() {
    let spec = spec();
    let cache = MemoryStepCache::new();
    cache
        .save(StageName::ResearchQuestions, "Which features help planning?")
        .await
        .unwrap();
    let settings = Settings::default();
    let retry = RetryPolicy::none();
    let mut ctx = context(&spec, &cache, &settings, &retry);
    ctx.refresh = true;

    let run = usecase_gen::core::stages::research_questions::run(&ctx)
        .await
        .unwrap();

    assert_eq!(run.outcome, StageOutcome::Recovered);
    assert_eq!(run.value, vec!["Which features help planning?".to_string()]);
}
