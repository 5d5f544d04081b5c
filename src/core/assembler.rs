//! Renders the final Markdown document.
//!
//! Section order: title, time and description; numbered steps; resources
//! grouped by category (tool, language, mode); additional references by
//! descending relevance; example solution; visual elements; metadata.
//! Missing optional inputs drop their section.

use std::cmp::Ordering;

use crate::domain::{
    Citation, ExampleSolutionOutput, Resource, ResourceType, StructuredUseCase, UseCaseMetadata,
    UseCaseStep,
};

/// Assemble the document from the polished use case and optional extras
pub fn assemble(
    use_case: &StructuredUseCase,
    solution: Option<&ExampleSolutionOutput>,
    visuals: Option<&str>,
) -> String {
    let mut md = String::new();

    md.push_str(&format!("# {}\n\n", use_case.title));
    md.push_str(&format!("**Time to Complete:** {}\n\n", use_case.time_to_complete));
    md.push_str(&format!("## Description\n{}\n\n", use_case.description));

    md.push_str("## Steps\n");
    for (i, step) in use_case.steps.iter().enumerate() {
        render_step(&mut md, i + 1, step);
    }

    if !use_case.resources.is_empty() {
        render_resources(&mut md, &use_case.resources);
    }

    if let Some(citations) = use_case.citations.as_deref().filter(|c| !c.is_empty()) {
        render_citations(&mut md, citations);
    }

    if let Some(solution) = solution {
        render_solution(&mut md, solution);
    }

    if let Some(visuals) = visuals.filter(|v| !v.trim().is_empty()) {
        md.push_str("\n## Visual Elements\n");
        md.push_str("The following visual elements are recommended to enhance this use case:\n\n");
        md.push_str(visuals);
        md.push('\n');
    }

    if let Some(metadata) = &use_case.metadata {
        render_metadata(&mut md, metadata);
    }

    md
}

fn render_step(md: &mut String, number: usize, step: &UseCaseStep) {
    md.push_str(&format!("### Step {}: {}\n", number, step.step_title));
    md.push_str(&format!("{}\n\n", step.step_instructions));

    for (j, sub_step) in step.sub_steps.iter().flatten().enumerate() {
        md.push_str(&format!("{}. **{}**\n", j + 1, sub_step.title));
        if let Some(description) = sub_step.description.as_deref().filter(|d| !d.is_empty()) {
            md.push_str(&format!("   {}\n", description));
        }
        for bullet in sub_step.bullets.iter().flatten() {
            md.push_str(&format!("   - {}\n", bullet));
        }
        md.push('\n');
    }

    if let Some(advice) = step.advice.as_deref().filter(|a| !a.is_empty()) {
        md.push_str(&format!("{}\n\n", advice));
    }
}

fn render_resources(md: &mut String, resources: &[Resource]) {
    md.push_str("## Resources\n");

    for category in ResourceType::ALL {
        let group: Vec<&Resource> = resources
            .iter()
            .filter(|r| r.resource_type == category)
            .collect();
        if group.is_empty() {
            continue;
        }

        md.push_str(&format!("### {}\n", category.heading()));
        for resource in group {
            let title = resource.title.as_deref().unwrap_or("Official Resource");
            md.push_str(&format!("* [{}]({})", title, resource.url));
            if let Some(section) = resource.section.as_deref().filter(|s| !s.is_empty()) {
                md.push_str(&format!(" - {}", section));
            }
            md.push('\n');
        }
        md.push('\n');
    }
}

/// Citations by descending score; missing scores sort as zero, ties keep input order
pub fn order_citations(citations: &[Citation]) -> Vec<&Citation> {
    let mut ordered: Vec<&Citation> = citations.iter().collect();
    ordered.sort_by(|a, b| b.score().partial_cmp(&a.score()).unwrap_or(Ordering::Equal));
    ordered
}

fn render_citations(md: &mut String, citations: &[Citation]) {
    md.push_str("## Additional References\n");
    for citation in order_citations(citations) {
        let title = citation.title.as_deref().unwrap_or("Untitled");
        md.push_str(&format!("* [{}]({})", title, citation.url));
        if let Some(snippet) = citation.snippet.as_deref().filter(|s| !s.is_empty()) {
            md.push_str(&format!("\n  > {}", snippet));
        }
        md.push('\n');
    }
    md.push('\n');
}

fn render_solution(md: &mut String, output: &ExampleSolutionOutput) {
    let solution = &output.solution;

    md.push_str(&format!("## Example Solution: {}\n\n", solution.title));
    md.push_str(&format!("**Setup Time:** {} minutes  \n", solution.setup_time));
    md.push_str(&format!("**Demo Time:** {} minutes\n\n", solution.demo_time));
    md.push_str(&format!("### Scenario\n{}\n\n", solution.scenario));

    md.push_str("### Prerequisites\n");
    push_bullets(md, &solution.prerequisites);

    md.push_str("\n### Demo Steps\n");
    for (i, step) in solution.steps.iter().enumerate() {
        md.push_str(&format!("{}. **{}**\n", i + 1, step.action));
        md.push_str(&format!("```\n{}\n```\n", step.code_or_prompt));
    }

    md.push_str("\n### Validation\n");
    push_bullets(md, &solution.validation);

    md.push_str("\n### Key Teaching Points\n");
    push_bullets(md, &solution.key_points);

    md.push_str("\n### Common Issues to Watch For\n");
    push_bullets(md, &solution.common_issues);

    if !solution.variations.is_empty() {
        md.push_str("\n### Variations\n");
        push_bullets(md, &solution.variations);
    }

    md.push_str(&format!("\n### Demo Script\n{}\n", output.demo_script));
}

fn push_bullets(md: &mut String, items: &[String]) {
    for item in items {
        md.push_str(&format!("* {}\n", item));
    }
}

fn render_metadata(md: &mut String, metadata: &UseCaseMetadata) {
    let entries = metadata.entries();
    if entries.is_empty() {
        return;
    }

    md.push_str("\n## Metadata\n");
    for (key, value) in entries {
        md.push_str(&format!("* **{}:** {}\n", key, value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> StructuredUseCase {
        StructuredUseCase {
            title: "Plan".to_string(),
            time_to_complete: "10 minutes".to_string(),
            description: "Make a plan.".to_string(),
            steps: Vec::new(),
            resources: Vec::new(),
            metadata: None,
            citations: None,
        }
    }

    #[test]
    fn test_optional_sections_are_omitted() {
        let md = assemble(&minimal(), None, None);

        assert!(md.starts_with("# Plan\n\n**Time to Complete:** 10 minutes\n"));
        assert!(md.contains("## Steps\n"));
        assert!(!md.contains("## Resources"));
        assert!(!md.contains("## Additional References"));
        assert!(!md.contains("## Example Solution"));
        assert!(!md.contains("## Visual Elements"));
        assert!(!md.contains("## Metadata"));
    }

    #[test]
    fn test_step_rendering_with_sub_steps_and_advice() {
        let mut use_case = minimal();
        use_case.steps.push(UseCaseStep {
            step_title: "Outline".to_string(),
            step_instructions: "List the milestones.".to_string(),
            sub_steps: Some(vec![crate::domain::SubStep {
                title: "Ask".to_string(),
                description: Some("Prompt the assistant.".to_string()),
                bullets: Some(vec!["Be specific".to_string()]),
            }]),
            advice: Some("Review every date.".to_string()),
        });

        let md = assemble(&use_case, None, None);

        assert!(md.contains(
            "### Step 1: Outline\nList the milestones.\n\n1. **Ask**\n   Prompt the assistant.\n   - Be specific\n\nReview every date.\n\n"
        ));
    }

    #[test]
    fn test_citation_without_title_or_snippet() {
        let mut use_case = minimal();
        let mut quoted = Citation::new("https://b.dev", Some("B".to_string()));
        quoted.snippet = Some("a quote".to_string());
        use_case.citations = Some(vec![Citation::new("https://a.dev", None), quoted]);

        let md = assemble(&use_case, None, None);

        assert!(md.contains("* [Untitled](https://a.dev)\n"));
        assert!(md.contains("* [B](https://b.dev)\n  > a quote\n"));
    }
}
