//! Stage 3: score citations, then merge research and spec into a structured use case.

use anyhow::Result;
use tracing::{info, warn};

use super::{prompts, StageContext, StageRun};
use crate::adapters::{parse_structured, CompletionRequest, ReasoningEffort, Structured};
use crate::domain::{
    ResearchResult, ScoredCitations, StageName, StructuredUseCase, UseCaseMetadata,
};

const SCORES_SCHEMA: &str = "ScoredCitations";
const USE_CASE_SCHEMA: &str = "StructuredUseCase";

pub async fn run(
    ctx: &StageContext<'_>,
    research: &ResearchResult,
) -> Result<StageRun<StructuredUseCase>> {
    ctx.execute(StageName::RefinedDraft, refine(ctx, research)).await
}

async fn refine(ctx: &StageContext<'_>, research: &ResearchResult) -> Result<StructuredUseCase> {
    let scored = score_citations(ctx, research).await?;
    let official = scored.official_resources.clone();
    let relevant = scored.relevant_citations();

    info!(
        official = official.len(),
        relevant = relevant.len(),
        "Citations scored"
    );

    let request = CompletionRequest::new(&ctx.settings.models.refine)
        .with_reasoning(ReasoningEffort::High)
        .with_schema::<StructuredUseCase>(USE_CASE_SCHEMA)
        .system(prompts::refine_system())
        .assistant(prompts::refine_research_turn(&research.content, &relevant))
        .user(prompts::refine_user(ctx.spec));

    let completion = ctx
        .reasoning
        .complete(StageName::RefinedDraft.as_str(), request)
        .await?;

    let metadata = UseCaseMetadata::from(ctx.spec);

    let draft = match parse_structured::<StructuredUseCase>(&completion, USE_CASE_SCHEMA)? {
        Structured::Parsed(mut draft) => {
            // Metadata and references always come from local data, never the model
            draft.metadata = Some(metadata);
            draft.resources = official;
            draft.citations = Some(relevant);
            draft
        }
        Structured::Refused(reason) => {
            warn!("Refinement refused by model: {}", reason);
            StructuredUseCase::refusal(official, metadata, Some(Vec::new()))
        }
    };

    Ok(draft)
}

/// Bucket research citations into official resources and scored others
async fn score_citations(
    ctx: &StageContext<'_>,
    research: &ResearchResult,
) -> Result<ScoredCitations> {
    let request = CompletionRequest::new(&ctx.settings.models.citations)
        .with_reasoning(ReasoningEffort::Low)
        .system(prompts::citation_scoring_system(ctx.spec))
        .user(prompts::citation_scoring_user(ctx.spec, &research.citations));

    let completion = ctx.reasoning.complete("citation_scoring", request).await?;

    let scored = match parse_structured::<ScoredCitations>(&completion, SCORES_SCHEMA)? {
        Structured::Parsed(scored) => scored,
        Structured::Refused(reason) => {
            warn!("Citation scoring refused by model: {}", reason);
            ScoredCitations::default()
        }
    };

    if !(2..=4).contains(&scored.official_resources.len()) {
        warn!(
            "Expected 2-4 official resources, got {}",
            scored.official_resources.len()
        );
    }

    Ok(scored)
}
