//! Research output and citation scoring contracts.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::document::Resource;

/// Minimum relevance for a non-official citation to be kept
pub const RELEVANCE_THRESHOLD: f64 = 0.7;

/// A source reference returned by research
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Citation {
    /// Source URL
    pub url: String,

    /// Page title, when known
    #[serde(default)]
    pub title: Option<String>,

    /// Relevant quote from the source
    #[serde(default)]
    pub snippet: Option<String>,

    /// Relevance in [0, 1], assigned during refinement
    #[serde(default)]
    pub relevance_score: Option<f64>,
}

impl Citation {
    /// Unscored citation for a URL
    pub fn new(url: impl Into<String>, title: Option<String>) -> Self {
        Self {
            url: url.into(),
            title,
            snippet: None,
            relevance_score: None,
        }
    }

    /// Score used for ordering; missing scores count as zero
    pub fn score(&self) -> f64 {
        self.relevance_score.unwrap_or(0.0)
    }
}

/// Synthesized research narrative plus its sources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchResult {
    pub content: String,
    #[serde(default)]
    pub citations: Vec<Citation>,
}

impl ResearchResult {
    /// Placeholder used when research could not be performed
    pub fn unavailable() -> Self {
        Self {
            content: "Research unavailable due to API error. Please review manually.".to_string(),
            citations: Vec::new(),
        }
    }
}

/// Citation scoring response from the refinement stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScoredCitations {
    /// Curated official documentation, tagged by category
    #[serde(default)]
    pub official_resources: Vec<Resource>,

    /// Other scored citations
    #[serde(default)]
    pub citations: Vec<Citation>,
}

impl ScoredCitations {
    /// Citations at or above the relevance threshold, in response order
    pub fn relevant_citations(&self) -> Vec<Citation> {
        self.citations
            .iter()
            .filter(|c| c.score() >= RELEVANCE_THRESHOLD)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(score: Option<f64>) -> Citation {
        Citation {
            relevance_score: score,
            ..Citation::new("https://example.com", None)
        }
    }

    #[test]
    fn test_relevant_citations_threshold() {
        let scored = ScoredCitations {
            official_resources: Vec::new(),
            citations: vec![scored(Some(0.69)), scored(Some(0.7)), scored(None), scored(Some(0.95))],
        };

        let kept = scored.relevant_citations();
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].relevance_score, Some(0.7));
        assert_eq!(kept[1].relevance_score, Some(0.95));
    }

    #[test]
    fn test_research_result_tolerates_missing_citations() {
        let parsed: ResearchResult = serde_json::from_str(r#"{"content": "notes"}"#).unwrap();
        assert_eq!(parsed.content, "notes");
        assert!(parsed.citations.is_empty());
    }
}
