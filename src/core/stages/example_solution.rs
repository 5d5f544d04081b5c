//! Stage 5: a short, demonstrable worked example aligned with the polished steps.

use anyhow::{Context, Result};
use tracing::{info, warn};

use super::{prompts, StageContext, StageOutput, StageRun};
use crate::adapters::{parse_structured, CompletionRequest, ReasoningEffort, Structured};
use crate::domain::{ExampleSolutionOutput, ResearchResult, StageName, StructuredUseCase};
use crate::error::GenerationError;

const SCHEMA: &str = "ExampleSolutionOutput";

pub async fn run(
    ctx: &StageContext<'_>,
    polished: &StructuredUseCase,
    research: &ResearchResult,
) -> Result<StageRun<ExampleSolutionOutput>> {
    ctx.execute(StageName::ExampleSolution, generate(ctx, polished, research))
        .await
}

/// Step titles the solution should align with
pub fn alignment_steps(ctx: &StageContext<'_>, polished: &StructuredUseCase) -> Vec<String> {
    if polished.steps.is_empty() {
        ctx.spec.steps.clone()
    } else {
        polished.step_titles()
    }
}

async fn generate(
    ctx: &StageContext<'_>,
    polished: &StructuredUseCase,
    research: &ResearchResult,
) -> Result<ExampleSolutionOutput> {
    let steps = alignment_steps(ctx, polished);
    let polished_json = polished.encode().context("Failed to serialize polished use case")?;

    if ctx.spec.is_generic() {
        info!("Using tool-agnostic example solution prompt");
    }

    let request = CompletionRequest::new(&ctx.settings.models.solution)
        .with_reasoning(ReasoningEffort::High)
        .with_schema::<ExampleSolutionOutput>(SCHEMA)
        .system(prompts::solution_system(ctx.spec, &steps))
        .user(prompts::solution_user(&polished_json, &research.content));

    let completion = ctx
        .reasoning
        .complete(StageName::ExampleSolution.as_str(), request)
        .await?;

    let output = match parse_structured::<ExampleSolutionOutput>(&completion, SCHEMA)? {
        Structured::Parsed(output) => output,
        Structured::Refused(reason) => return Err(GenerationError::Refused(reason).into()),
    };

    if output.solution.steps.len() != steps.len() {
        warn!(
            "Generated solution has {} steps but use case has {} steps",
            output.solution.steps.len(),
            steps.len()
        );
    }

    Ok(output)
}
