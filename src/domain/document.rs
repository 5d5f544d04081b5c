//! The structured use case document produced from Stage 3 onward.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

use super::research::Citation;
use super::use_case::UseCaseMetadata;

/// Canonical structured use case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StructuredUseCase {
    /// Document title
    pub title: String,

    /// e.g. "20 minutes"
    pub time_to_complete: String,

    /// Two or three sentences on the primary objective
    pub description: String,

    /// Ordered steps
    pub steps: Vec<UseCaseStep>,

    /// Resource references (official documentation)
    #[serde(default)]
    pub resources: Vec<Resource>,

    /// Spec-derived metadata
    #[serde(default)]
    pub metadata: Option<UseCaseMetadata>,

    /// Additional scored citations
    #[serde(default)]
    pub citations: Option<Vec<Citation>>,
}

impl StructuredUseCase {
    /// Placeholder produced when the collaborator declines to answer
    pub fn refusal(
        resources: Vec<Resource>,
        metadata: UseCaseMetadata,
        citations: Option<Vec<Citation>>,
    ) -> Self {
        Self {
            title: "Refusal".to_string(),
            time_to_complete: "0 minutes".to_string(),
            description: "The model refused to comply.".to_string(),
            steps: Vec::new(),
            resources,
            metadata: Some(metadata),
            citations,
        }
    }

    /// Step titles in order
    pub fn step_titles(&self) -> Vec<String> {
        self.steps.iter().map(|s| s.step_title.clone()).collect()
    }
}

/// A single step of the use case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UseCaseStep {
    /// Brief name, e.g. "Draft a docstring"
    pub step_title: String,

    /// One to three sentences of instructions
    pub step_instructions: String,

    #[serde(default)]
    pub sub_steps: Option<Vec<SubStep>>,

    /// Best practices or cautionary notes
    #[serde(default)]
    pub advice: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SubStep {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub bullets: Option<Vec<String>>,
}

/// Category of an official resource, in rendering priority order
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Tool,
    Language,
    Mode,
}

impl ResourceType {
    /// All categories in priority order
    pub const ALL: [ResourceType; 3] = [Self::Tool, Self::Language, Self::Mode];

    /// Section heading used in the rendered document
    pub fn heading(&self) -> &'static str {
        match self {
            Self::Tool => "Tool Documentation",
            Self::Language => "Language Documentation",
            Self::Mode => "Mode-specific Documentation",
        }
    }

    fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "language" => Self::Language,
            "mode" => Self::Mode,
            _ => Self::Tool,
        }
    }
}

impl Default for ResourceType {
    fn default() -> Self {
        Self::Tool
    }
}

/// A documentation link attached to the use case.
///
/// Accepts either a bare URL string (treated as a tool resource) or an
/// object; unknown categories fall back to `tool`.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct Resource {
    pub url: String,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(rename = "type", default)]
    pub resource_type: ResourceType,

    /// Specific documentation section, if any
    #[serde(default)]
    pub section: Option<String>,
}

impl Resource {
    pub fn new(url: impl Into<String>, title: impl Into<String>, resource_type: ResourceType) -> Self {
        Self {
            url: url.into(),
            title: Some(title.into()),
            resource_type,
            section: None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ResourceRepr {
    Link(String),
    Entry {
        url: String,
        #[serde(default)]
        title: Option<String>,
        #[serde(rename = "type", default)]
        resource_type: Option<String>,
        #[serde(default)]
        section: Option<String>,
    },
}

impl<'de> Deserialize<'de> for Resource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let resource = match ResourceRepr::deserialize(deserializer)? {
            ResourceRepr::Link(url) => Resource {
                url,
                title: Some("Official Resource".to_string()),
                resource_type: ResourceType::Tool,
                section: None,
            },
            ResourceRepr::Entry {
                url,
                title,
                resource_type,
                section,
            } => Resource {
                url,
                title,
                resource_type: resource_type
                    .as_deref()
                    .map(ResourceType::from_label)
                    .unwrap_or_default(),
                section,
            },
        };
        Ok(resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_accepts_bare_url() {
        let resource: Resource = serde_json::from_str(r#""https://docs.example.com""#).unwrap();

        assert_eq!(resource.url, "https://docs.example.com");
        assert_eq!(resource.resource_type, ResourceType::Tool);
        assert_eq!(resource.title.as_deref(), Some("Official Resource"));
    }

    #[test]
    fn test_resource_type_tag_and_unknown_fallback() {
        let language: Resource =
            serde_json::from_str(r#"{"url": "https://docs.python.org", "type": "language"}"#)
                .unwrap();
        let unknown: Resource =
            serde_json::from_str(r#"{"url": "https://blog.example.com", "type": "blog"}"#).unwrap();

        assert_eq!(language.resource_type, ResourceType::Language);
        assert_eq!(unknown.resource_type, ResourceType::Tool);
    }

    #[test]
    fn test_resource_serializes_type_field() {
        let resource = Resource::new("https://x.dev", "X", ResourceType::Mode);
        let json = serde_json::to_value(&resource).unwrap();

        assert_eq!(json["type"], "mode");
    }

    #[test]
    fn test_refusal_placeholder() {
        let doc = StructuredUseCase::refusal(Vec::new(), UseCaseMetadata::default(), None);

        assert_eq!(doc.title, "Refusal");
        assert_eq!(doc.time_to_complete, "0 minutes");
        assert!(doc.steps.is_empty());
    }

    #[test]
    fn test_minimal_document_parses() {
        let json = r#"{
            "title": "T",
            "time_to_complete": "5 minutes",
            "description": "D",
            "steps": [{"step_title": "One", "step_instructions": "Do it"}]
        }"#;
        let doc: StructuredUseCase = serde_json::from_str(json).unwrap();

        assert_eq!(doc.step_titles(), vec!["One".to_string()]);
        assert!(doc.resources.is_empty());
        assert!(doc.metadata.is_none());
    }
}
