//! Stage 6: free-text recommendations for screenshots, GIFs and diagrams.

use anyhow::{Context, Result};

use super::{prompts, StageContext, StageOutput, StageRun};
use crate::adapters::CompletionRequest;
use crate::domain::{ExampleSolutionOutput, StageName, StructuredUseCase};
use crate::error::GenerationError;

pub async fn run(
    ctx: &StageContext<'_>,
    polished: &StructuredUseCase,
    solution: &ExampleSolutionOutput,
) -> Result<StageRun<String>> {
    ctx.execute(StageName::VisualSuggestions, suggest(ctx, polished, solution))
        .await
}

async fn suggest(
    ctx: &StageContext<'_>,
    polished: &StructuredUseCase,
    solution: &ExampleSolutionOutput,
) -> Result<String> {
    let polished_json = polished.encode().context("Failed to serialize polished use case")?;
    let solution_json = solution.encode().context("Failed to serialize example solution")?;

    let request = CompletionRequest::new(&ctx.settings.models.visuals)
        .system(prompts::visuals_system())
        .user(prompts::visuals_user(&polished_json, &solution_json));

    let completion = ctx
        .reasoning
        .complete(StageName::VisualSuggestions.as_str(), request)
        .await?;

    if let Some(reason) = completion.refusal {
        return Err(GenerationError::Refused(reason).into());
    }

    let suggestions = completion.content.trim().to_string();
    if suggestions.is_empty() {
        return Err(GenerationError::EmptyResponse.into());
    }

    Ok(suggestions)
}
