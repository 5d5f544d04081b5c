//! Prompt text for each stage.
//!
//! Kept apart from the stage logic so the wording can change without
//! touching caching or recovery.

use crate::domain::{Citation, UseCaseSpec};

pub const BRAND_GUIDELINES: &str = "\
Writing guidelines:
- Write at an 8th-grade reading level, in the active voice.
- Address the reader as \"you\" in a conversational, action-oriented tone.
- Assume the knowledge of an average junior developer; define advanced terms.
- Use US English and keep content concise.
- Break anything longer than a sentence into bullets; use headings for scanning.
- Use sentence case for titles and headings.
- Use words for zero through nine and numerals for 10 and above.
- Cite and link original sources whenever data is referenced.
- Keep language bias-free and gender-neutral (\"permit list\", not \"whitelist\").";

pub const USE_CASE_GUIDELINES: &str = "\
Use case guidelines:
1. Structure: follow the provided tagged structure; every section must add value.
2. Quality: goals are clear, specific, time-bound and achievable; each step is essential,
   sequential and self-contained.
3. Technical: include accurate time estimates, prerequisites, required tools and permissions,
   and likely obstacles with mitigations.
4. Guidance: give concrete examples, verification steps and measurable success criteria.
5. Integration: note where the use case fits in larger workflows.";

pub const QUESTIONS_SYSTEM: &str = "\
You are an AI researcher generating research questions for a software development use case.
Each question will be researched independently by another AI system.

Requirements:
- Incorporate the key technical elements of the use case (tools, models, languages, versions).
- Every question must be self-contained and focus on a distinct aspect.
- When a tool is specified, at least one question covers its specific capabilities.
- At least one question covers best practices or common pitfalls.
- Include temporal context such as \"current best practices\" or \"latest features\".

Format: exactly 2-4 questions, one per line, no numbering or prefixes.";

pub fn questions_user(spec: &UseCaseSpec) -> String {
    format!(
        "Generate research questions for this use case:\n\n{}",
        spec.to_prompt_text()
    )
}

pub const RESEARCH_SYSTEM: &str = "\
You are a specialized AI researcher providing comprehensive information for educational content.
Responses are thorough, well structured, and include technical detail, best practices and
real-world examples.";

/// Context prefix shared by both research modes
pub fn research_context(spec: &UseCaseSpec) -> String {
    format!(
        "I'm researching for a use case titled '{}' in the category '{}'.\n\
         The objective is: '{}'.\n\
         This is for developer educational content about AI skills.",
        spec.title, spec.family, spec.objective
    )
}

/// One request covering every question
pub fn research_consolidated(spec: &UseCaseSpec, questions: &[String]) -> String {
    let bullets = questions
        .iter()
        .map(|q| format!("- {}", q))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{}\n\nPlease research and answer these questions:\n{}\n\n\
         Make the response directly usable in educational material. Include specific examples,\n\
         code samples where relevant, and cite recent sources.",
        research_context(spec),
        bullets
    )
}

/// One request per question
pub fn research_single(spec: &UseCaseSpec, question: &str) -> String {
    format!(
        "{}\n\nQuestion: {}\n\nInclude specific examples and cite recent sources.",
        research_context(spec),
        question
    )
}

pub fn citation_scoring_system(spec: &UseCaseSpec) -> String {
    format!(
        "Score each research citation's relevance to the use case from 0.0 to 1.0 and sort them into\n\
         two groups.\n\n\
         Context:\n\
         - Tool: {}\n\
         - Language: {}\n\
         - Mode: {}\n\n\
         1. official_resources: the 2-4 best official documentation links (vendor docs, official blogs,\n\
            official repositories). Priority: tool docs, then language docs, then mode-specific docs.\n\
            Each entry has url, title, type (one of \"tool\", \"language\", \"mode\") and section.\n\
         2. citations: every other citation with url, title, snippet and relevance_score, judged on\n\
            recency, authority, direct relevance and practical value.\n\n\
         Return only a JSON object with the keys \"official_resources\" and \"citations\".",
        spec.tool.as_deref().unwrap_or("Not specified"),
        spec.coding_language.as_deref().unwrap_or("Not specified"),
        spec.mode.as_deref().unwrap_or("Not specified"),
    )
}

pub fn citation_scoring_user(spec: &UseCaseSpec, citations: &[Citation]) -> String {
    let listed = serde_json::to_string_pretty(citations).unwrap_or_else(|_| "[]".to_string());
    format!(
        "Score these citations for the use case:\n{}\n\nCitations:\n{}",
        spec.to_prompt_text(),
        listed
    )
}

pub fn refine_system() -> String {
    format!(
        "You create a comprehensive structured use case by merging research findings with the\n\
         original use case design. Output valid JSON for the StructuredUseCase schema.\n\n\
         - Preserve every tool, model, version, language and platform named in the design.\n\
         - Keep the intended complexity, time estimate, roles and departments.\n\
         - Bring in research only where it fits the configured tools and environment.\n\
         - Every step relates directly to the configured tools; examples match the specified language.\n\
         - Steps are bullet-listed, time-bound and address the reader as \"you\".\n\n\
         {}\n\n{}",
        BRAND_GUIDELINES, USE_CASE_GUIDELINES
    )
}

pub fn refine_research_turn(content: &str, citations: &[Citation]) -> String {
    let listed = serde_json::to_string_pretty(citations).unwrap_or_else(|_| "[]".to_string());
    format!(
        "Research findings:\n{}\n\nSelected citations:\n{}",
        content, listed
    )
}

pub fn refine_user(spec: &UseCaseSpec) -> String {
    format!(
        "Combine the research findings with this use case design into an end-to-end structured\n\
         use case. Preserve every configuration detail.\n\n{}",
        spec.to_prompt_text()
    )
}

pub fn polish_system() -> String {
    format!(
        "You improve prose clarity and readability of a StructuredUseCase JSON document while\n\
         strictly preserving its technical content.\n\n\
         Never change tool names, versions, capabilities, code, step ordering, metadata or field\n\
         names. Only improve sentence structure, clarity, grammar and formatting: active voice,\n\
         8th-grade reading level, consistent terminology, bullet lists where appropriate, and time\n\
         estimates on steps that lack them.\n\n\
         Return valid JSON for the same schema.\n\n{}\n\n{}",
        BRAND_GUIDELINES, USE_CASE_GUIDELINES
    )
}

pub fn polish_user(draft_json: &str) -> String {
    format!(
        "Polish the prose and formatting of this use case while preserving all technical content:\n\n{}",
        draft_json
    )
}

pub fn solution_system(spec: &UseCaseSpec, step_titles: &[String]) -> String {
    let tool_rule = if spec.is_generic() {
        "- Keep examples tool and language agnostic, with clear alternatives"
    } else {
        "- Use the specified tool and language exclusively"
    };
    let steps = serde_json::to_string_pretty(step_titles).unwrap_or_else(|_| "[]".to_string());

    format!(
        "You are an expert AI instructor writing a practical example solution for a software\n\
         development use case. A subject matter expert will demonstrate it in a 2-3 minute video.\n\n\
         Configuration:\n\
         - Title: {}\n\
         - Family: {}\n\
         - Tool: {}\n\
         - Language: {}\n\
         - Role: {}\n\
         - Mode: {}\n\
         - Model: {}\n\n\
         Requirements:\n\
         - Demonstrable in 2-3 minutes with a realistic, stated setup time\n\
         {}\n\
         - Include explicit validation steps and tool-specific pitfalls\n\
         - Each solution step maps to one of these use case steps, in order:\n{}\n\n\
         Output valid JSON for the ExampleSolutionOutput schema. Every step has an action and\n\
         concrete code or prompt. The variations list must be present (it may be empty).\n\n{}",
        spec.title,
        spec.family,
        spec.tool.as_deref().unwrap_or("Any AI coding assistant"),
        spec.coding_language.as_deref().unwrap_or("Any"),
        if spec.role.is_empty() {
            "Any".to_string()
        } else {
            spec.role.join(", ")
        },
        spec.mode.as_deref().unwrap_or("Any"),
        spec.model.as_deref().unwrap_or("Not specified"),
        tool_rule,
        steps,
        BRAND_GUIDELINES
    )
}

pub fn solution_user(polished_json: &str, research: &str) -> String {
    format!(
        "Generate a complete example solution that follows the configuration exactly.\n\n\
         Use case:\n{}\n\nResearch findings:\n{}\n\n\
         The demo script is a clear 2-3 minute technical walkthrough.",
        polished_json, research
    )
}

pub fn visuals_system() -> String {
    format!(
        "You are an instructional designer suggesting visual elements for a software development\n\
         use case. Focus on tool-specific interface elements, technically accurate code and\n\
         diagrams, and visuals that serve a clear learning purpose.\n\n{}",
        BRAND_GUIDELINES
    )
}

pub fn visuals_user(polished_json: &str, solution_json: &str) -> String {
    format!(
        "Review the use case and example solution and suggest 3-5 visual elements.\n\n\
         Final use case JSON:\n{}\n\nExample solution JSON:\n{}\n\n\
         For each visual give: what to capture, technical requirements, its educational value,\n\
         the step or concept it supports, and a format (screenshot, GIF, diagram, etc.).",
        polished_json, solution_json
    )
}
