//! The use case brief that drives a generation job.
//!
//! A `UseCaseSpec` is built once at job start and threaded read-only through
//! every stage. `UseCaseMetadata` is the shape the brief takes when it is
//! attached to generated documents.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Input brief for a generation job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UseCaseSpec {
    /// Use case title (also seeds the job id)
    pub title: String,

    /// Category or family the use case belongs to
    pub family: String,

    /// Broad class of AI tool the use case targets
    pub ai_tool: String,

    /// What the learner should be able to do afterwards
    pub objective: String,

    /// Free-text description
    pub description: String,

    /// Ordered prerequisites
    pub prerequisites: Vec<String>,

    /// Human time estimate (e.g. "20 minutes")
    pub time_estimate: String,

    /// Ordered step descriptions
    pub steps: Vec<String>,

    /// Specific tool (e.g. "GitHub Copilot"), if any
    pub tool: Option<String>,

    /// Target departments
    pub department: Vec<String>,

    /// Target roles
    pub role: Vec<String>,

    /// Tool mode (e.g. "inline chat"), if any
    pub mode: Option<String>,

    /// Model identifier, if any
    pub model: Option<String>,

    /// Coding language; `None` means not applicable
    pub coding_language: Option<String>,
}

impl UseCaseSpec {
    /// Render the brief in the tagged layout the prompts expect
    pub fn to_prompt_text(&self) -> String {
        let prerequisites = bullet_lines(&self.prerequisites);
        let steps = bullet_lines(&self.steps);

        format!(
            "<Use_Case>{}</Use_Case>\n\
             <Family>{}</Family>\n\
             <AI_Tool>{}</AI_Tool>\n\
             <Objective>{}</Objective>\n\
             <Description>{}</Description>\n\
             <Prerequisites>\n{}\n</Prerequisites>\n\
             <Time_Estimate>{}</Time_Estimate>\n\
             <Steps>\n{}\n</Steps>\n\
             <Tool>{}</Tool>\n\
             <Department>{}</Department>\n\
             <Role>{}</Role>\n\
             <Mode>{}</Mode>\n\
             <Model>{}</Model>\n\
             <Coding_Language>{}</Coding_Language>\n",
            self.title,
            self.family,
            self.ai_tool,
            self.objective,
            self.description,
            prerequisites,
            self.time_estimate,
            steps,
            self.tool.as_deref().unwrap_or_default(),
            self.department.join(", "),
            self.role.join(", "),
            self.mode.as_deref().unwrap_or_default(),
            self.model.as_deref().unwrap_or_default(),
            self.coding_language.as_deref().unwrap_or("Not applicable"),
        )
    }

    /// True when the brief does not pin a language, tool, and role
    pub fn is_generic(&self) -> bool {
        self.coding_language.is_none() || self.tool.is_none() || self.role.is_empty()
    }
}

fn bullet_lines(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("- {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Metadata block attached to generated documents.
///
/// Mirrors the brief plus a few editorial fields the generators may fill in.
/// Every field is optional so that collaborator output with partial metadata
/// still validates; the pipeline overwrites it from the brief anyway.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UseCaseMetadata {
    pub title: Option<String>,
    pub family: Option<String>,
    pub ai_tool: Option<String>,
    pub objective: Option<String>,
    pub description: Option<String>,
    pub prerequisites: Option<Vec<String>>,
    pub time_estimate: Option<String>,
    pub steps: Option<Vec<String>>,
    pub tool: Option<String>,
    pub department: Option<Vec<String>>,
    pub role: Option<Vec<String>>,
    pub mode: Option<String>,
    pub model: Option<String>,
    pub coding_language: Option<String>,
    pub status: Option<String>,
    pub complexity_level: Option<String>,
    pub customization_level: Option<String>,
    pub time_minutes: Option<u32>,
    pub notes: Option<String>,
}

impl UseCaseMetadata {
    /// Non-null fields in declaration order, lists joined with ", "
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let mut entries = Vec::new();

        push_text(&mut entries, "title", &self.title);
        push_text(&mut entries, "family", &self.family);
        push_text(&mut entries, "ai_tool", &self.ai_tool);
        push_text(&mut entries, "objective", &self.objective);
        push_text(&mut entries, "description", &self.description);
        push_list(&mut entries, "prerequisites", &self.prerequisites);
        push_text(&mut entries, "time_estimate", &self.time_estimate);
        push_list(&mut entries, "steps", &self.steps);
        push_text(&mut entries, "tool", &self.tool);
        push_list(&mut entries, "department", &self.department);
        push_list(&mut entries, "role", &self.role);
        push_text(&mut entries, "mode", &self.mode);
        push_text(&mut entries, "model", &self.model);
        push_text(&mut entries, "coding_language", &self.coding_language);
        push_text(&mut entries, "status", &self.status);
        push_text(&mut entries, "complexity_level", &self.complexity_level);
        push_text(&mut entries, "customization_level", &self.customization_level);
        if let Some(minutes) = self.time_minutes {
            entries.push(("time_minutes", minutes.to_string()));
        }
        push_text(&mut entries, "notes", &self.notes);

        entries
    }
}

fn push_text(entries: &mut Vec<(&'static str, String)>, key: &'static str, value: &Option<String>) {
    if let Some(value) = value {
        entries.push((key, value.clone()));
    }
}

fn push_list(
    entries: &mut Vec<(&'static str, String)>,
    key: &'static str,
    value: &Option<Vec<String>>,
) {
    if let Some(values) = value {
        entries.push((key, values.join(", ")));
    }
}

impl From<&UseCaseSpec> for UseCaseMetadata {
    fn from(spec: &UseCaseSpec) -> Self {
        Self {
            title: Some(spec.title.clone()),
            family: Some(spec.family.clone()),
            ai_tool: Some(spec.ai_tool.clone()),
            objective: Some(spec.objective.clone()),
            description: Some(spec.description.clone()),
            prerequisites: Some(spec.prerequisites.clone()),
            time_estimate: Some(spec.time_estimate.clone()),
            steps: Some(spec.steps.clone()),
            tool: spec.tool.clone(),
            department: Some(spec.department.clone()),
            role: Some(spec.role.clone()),
            mode: spec.mode.clone(),
            model: spec.model.clone(),
            coding_language: spec.coding_language.clone(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_spec() -> UseCaseSpec {
    UseCaseSpec {
        title: "Create a project plan".to_string(),
        family: "Core Skills".to_string(),
        ai_tool: "Chat Assistants".to_string(),
        objective: "Draft a project plan with an assistant".to_string(),
        description: "Use an assistant to outline milestones.".to_string(),
        prerequisites: vec!["A project idea".to_string()],
        time_estimate: "15 minutes".to_string(),
        steps: vec!["Describe the project".to_string(), "Ask for milestones".to_string()],
        tool: Some("ChatGPT".to_string()),
        department: vec!["PMO".to_string()],
        role: vec!["manager".to_string(), "lead".to_string()],
        mode: Some("chat".to_string()),
        model: Some("GPT-4o".to_string()),
        coding_language: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_text_contains_tagged_fields() {
        let text = sample_spec().to_prompt_text();

        assert!(text.contains("<Use_Case>Create a project plan</Use_Case>"));
        assert!(text.contains("<Steps>\n- Describe the project\n- Ask for milestones\n</Steps>"));
        assert!(text.contains("<Role>manager, lead</Role>"));
        assert!(text.contains("<Coding_Language>Not applicable</Coding_Language>"));
    }

    #[test]
    fn test_generic_when_language_missing() {
        let mut spec = sample_spec();
        assert!(spec.is_generic());

        spec.coding_language = Some("Python".to_string());
        assert!(!spec.is_generic());
    }

    #[test]
    fn test_metadata_entries_skip_nulls_and_join_lists() {
        let metadata = UseCaseMetadata::from(&sample_spec());
        let entries = metadata.entries();

        assert_eq!(entries[0], ("title", "Create a project plan".to_string()));
        assert!(entries.contains(&("role", "manager, lead".to_string())));
        assert!(!entries.iter().any(|(key, _)| *key == "coding_language"));
        assert!(!entries.iter().any(|(key, _)| *key == "status"));
    }
}
