//! Stage 2: research the questions against the retrieval provider.

use anyhow::Result;
use futures::future::join_all;
use tracing::{info, warn};

use super::{prompts, StageContext, StageRun};
use crate::adapters::{CompletionRequest, TitleFetcher};
use crate::config::ResearchMode;
use crate::domain::{Citation, ResearchResult, StageName};

const LABEL: &str = "deep_research";

pub async fn run(ctx: &StageContext<'_>, questions: &[String]) -> Result<StageRun<ResearchResult>> {
    ctx.execute(StageName::DeepResearch, research(ctx, questions)).await
}

async fn research(ctx: &StageContext<'_>, questions: &[String]) -> Result<ResearchResult> {
    let result = match ctx.settings.research.mode {
        ResearchMode::Consolidated => consolidated(ctx, questions).await?,
        ResearchMode::PerQuestion => per_question(ctx, questions).await,
    };

    info!(
        citations = result.citations.len(),
        "Research complete"
    );
    Ok(result)
}

/// All questions in a single request
async fn consolidated(ctx: &StageContext<'_>, questions: &[String]) -> Result<ResearchResult> {
    let request = CompletionRequest::new(&ctx.settings.models.research)
        .system(prompts::RESEARCH_SYSTEM)
        .user(prompts::research_consolidated(ctx.spec, questions));

    let completion = ctx.research.complete(LABEL, request).await?;
    let citations = resolve_titles(ctx.titles, &completion.citations).await;

    Ok(ResearchResult {
        content: completion.content.trim().to_string(),
        citations,
    })
}

/// One concurrent request per question; a failed question becomes an error answer
async fn per_question(ctx: &StageContext<'_>, questions: &[String]) -> ResearchResult {
    let answers = join_all(questions.iter().map(|question| async move {
        let request = CompletionRequest::new(&ctx.settings.models.research)
            .system(prompts::RESEARCH_SYSTEM)
            .user(prompts::research_single(ctx.spec, question));
        (question, ctx.research.complete(LABEL, request).await)
    }))
    .await;

    let mut blocks = Vec::with_capacity(answers.len());
    let mut urls = Vec::new();

    for (question, answer) in answers {
        match answer {
            Ok(completion) => {
                blocks.push(format!("Q: {}\nA: {}\n", question, completion.content.trim()));
                urls.extend(completion.citations);
            }
            Err(e) => {
                warn!("Error researching question '{}': {}", question, e);
                blocks.push(format!("Q: {}\nA: Error during research: {}\n", question, e));
            }
        }
    }

    ResearchResult {
        content: blocks.join("\n"),
        citations: resolve_titles(ctx.titles, &urls).await,
    }
}

/// Look up page titles concurrently; a failed lookup leaves the title empty
pub async fn resolve_titles(titles: &dyn TitleFetcher, urls: &[String]) -> Vec<Citation> {
    let lookups = join_all(urls.iter().map(|url| titles.fetch_title(url))).await;

    urls.iter()
        .zip(lookups)
        .map(|(url, title)| Citation::new(url.clone(), title))
        .collect()
}
