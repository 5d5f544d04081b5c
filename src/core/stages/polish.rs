//! Stage 4: prose polish that keeps every technical field intact.

use anyhow::{Context, Result};
use tracing::warn;

use super::{prompts, StageContext, StageOutput, StageRun};
use crate::adapters::{parse_structured, CompletionRequest, Structured};
use crate::domain::{StageName, StructuredUseCase, UseCaseMetadata};

const SCHEMA: &str = "StructuredUseCase";

pub async fn run(
    ctx: &StageContext<'_>,
    draft: &StructuredUseCase,
) -> Result<StageRun<StructuredUseCase>> {
    ctx.execute(StageName::FinalUseCase, polish(ctx, draft)).await
}

async fn polish(ctx: &StageContext<'_>, draft: &StructuredUseCase) -> Result<StructuredUseCase> {
    let draft_json = draft.encode().context("Failed to serialize refined draft")?;

    let request = CompletionRequest::new(&ctx.settings.models.polish)
        .with_schema::<StructuredUseCase>(SCHEMA)
        .system(prompts::polish_system())
        .user(prompts::polish_user(&draft_json));

    let completion = ctx
        .reasoning
        .complete(StageName::FinalUseCase.as_str(), request)
        .await?;

    let metadata = UseCaseMetadata::from(ctx.spec);

    let polished = match parse_structured::<StructuredUseCase>(&completion, SCHEMA)? {
        Structured::Parsed(mut polished) => {
            polished.metadata = Some(metadata);
            polished
        }
        Structured::Refused(reason) => {
            warn!("Final polish refused by model: {}", reason);
            StructuredUseCase::refusal(Vec::new(), metadata, None)
        }
    };

    Ok(polished)
}
