//! Stage 1: derive 2-4 self-contained research questions from the spec.

use anyhow::Result;
use tracing::{info, warn};

use super::{prompts, split_lines, StageContext, StageRun};
use crate::adapters::{CompletionRequest, ReasoningEffort};
use crate::domain::StageName;
use crate::error::GenerationError;

pub async fn run(ctx: &StageContext<'_>) -> Result<StageRun<Vec<String>>> {
    ctx.execute(StageName::ResearchQuestions, generate(ctx)).await
}

async fn generate(ctx: &StageContext<'_>) -> Result<Vec<String>> {
    let request = CompletionRequest::new(&ctx.settings.models.questions)
        .with_reasoning(ReasoningEffort::Medium)
        .system(prompts::QUESTIONS_SYSTEM)
        .user(prompts::questions_user(ctx.spec));

    let completion = ctx
        .reasoning
        .complete(StageName::ResearchQuestions.as_str(), request)
        .await?;

    let questions = split_lines(&completion.content);
    if questions.is_empty() {
        return Err(GenerationError::EmptyResponse.into());
    }
    if !(2..=4).contains(&questions.len()) {
        warn!("Expected 2-4 research questions, got {}", questions.len());
    }

    info!("Identified {} research questions", questions.len());
    Ok(questions)
}
