//! Candidate value model
//!
//! A Candidate is one retrievable unit (entity, passage, or graph node) under
//! consideration by the reasoning loop. Candidates are immutable values:
//! every score change produces a new Candidate, so no retrieval stage can
//! alias a container mutated by another stage.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Provenance of a retrieval hit
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    /// Vector similarity search
    Vector,
    /// Knowledge-graph seed lookup
    Graph,
    /// Frontier expansion (1-hop neighbors of the working set)
    Expansion,
}

impl CandidateSource {
    /// Stable label for logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateSource::Vector => "vector",
            CandidateSource::Graph => "graph",
            CandidateSource::Expansion => "expansion",
        }
    }
}

/// Loosely-typed hit as returned by retrieval collaborators.
///
/// Backends disagree about where identifiers live: some put them at the top
/// level, some nest them in `metadata` (as `id` or `node_id`). `Candidate::from_raw`
/// normalizes both shapes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawHit {
    /// Top-level identifier, if the backend provides one
    pub id: Option<String>,

    /// Display name / lookup label
    pub name: Option<String>,

    /// Text used for scoring
    pub description: Option<String>,

    /// Backend-assigned relevance, if any
    pub score: Option<f32>,

    /// Free-form backend metadata (`id`, `node_id`, `name`, `description`,
    /// `relation`, `source_node`, ...)
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl RawHit {
    fn meta_str(&self, key: &str) -> Option<String> {
        self.metadata
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

/// Immutable candidate under consideration by the reasoning loop
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    /// Stable identifier, unique within a session; never empty
    pub id: String,

    /// Display / lookup text
    pub name: String,

    /// Text used for scoring
    pub description: String,

    /// Current relevance score (assigned by the reranker)
    pub score: f32,

    /// Relevance reported by the retrieval stage that produced this hit
    pub retrieval_score: f32,

    /// Provenance of this hit
    pub source: CandidateSource,
}

/// Default display name when a backend omits one
const UNKNOWN_NAME: &str = "Unknown";

impl Candidate {
    /// Normalize a loosely-structured hit into a Candidate.
    ///
    /// Fields fall back to the nested `metadata` map; missing `name` and
    /// `description` become explicit defaults. Returns `None` when no
    /// non-empty identifier can be recovered; callers skip such hits
    /// rather than manufacturing colliding placeholder ids.
    pub fn from_raw(hit: &RawHit, source: CandidateSource) -> Option<Self> {
        let id = hit
            .id
            .clone()
            .filter(|s| !s.is_empty())
            .or_else(|| hit.meta_str("id"))
            .or_else(|| hit.meta_str("node_id"))
            .filter(|s| !s.is_empty())?;

        let name = hit
            .name
            .clone()
            .filter(|s| !s.is_empty())
            .or_else(|| hit.meta_str("name"))
            .unwrap_or_else(|| UNKNOWN_NAME.to_string());

        let description = hit
            .description
            .clone()
            .or_else(|| hit.meta_str("description"))
            .unwrap_or_default();

        let retrieval_score = hit.score.unwrap_or(0.0);

        Some(Self {
            id,
            name,
            description,
            score: 0.0,
            retrieval_score,
            source,
        })
    }

    /// Return a new Candidate identical except for `score`
    pub fn with_score(&self, score: f32) -> Self {
        Self {
            score,
            ..self.clone()
        }
    }

    /// Text handed to the reranker for this candidate
    pub fn scoring_text(&self) -> String {
        format!("{} {}", self.name, self.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta(entries: &[(&str, &str)]) -> Map<String, Value> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), json!(v)))
            .collect()
    }

    #[test]
    fn test_from_raw_top_level_fields() {
        let hit = RawHit {
            id: Some("Q25188".into()),
            name: Some("Inception".into()),
            description: Some("2010 science fiction film".into()),
            score: Some(0.91),
            metadata: Map::new(),
        };

        let cand = Candidate::from_raw(&hit, CandidateSource::Vector).unwrap();
        assert_eq!(cand.id, "Q25188");
        assert_eq!(cand.name, "Inception");
        assert_eq!(cand.retrieval_score, 0.91);
        assert_eq!(cand.score, 0.0);
        assert_eq!(cand.source, CandidateSource::Vector);
    }

    #[test]
    fn test_from_raw_nested_metadata_fallback() {
        let hit = RawHit {
            metadata: meta(&[
                ("node_id", "n42"),
                ("name", "Christopher Nolan"),
                ("description", "British-American film director"),
            ]),
            ..Default::default()
        };

        let cand = Candidate::from_raw(&hit, CandidateSource::Graph).unwrap();
        assert_eq!(cand.id, "n42");
        assert_eq!(cand.name, "Christopher Nolan");
        assert_eq!(cand.description, "British-American film director");
    }

    #[test]
    fn test_from_raw_missing_fields_get_defaults() {
        let hit = RawHit {
            metadata: meta(&[("id", "n7")]),
            ..Default::default()
        };

        let cand = Candidate::from_raw(&hit, CandidateSource::Expansion).unwrap();
        assert_eq!(cand.name, "Unknown");
        assert_eq!(cand.description, "");
    }

    #[test]
    fn test_from_raw_rejects_missing_id() {
        let hit = RawHit {
            name: Some("orphan".into()),
            ..Default::default()
        };
        assert!(Candidate::from_raw(&hit, CandidateSource::Vector).is_none());

        let empty_id = RawHit {
            id: Some(String::new()),
            ..Default::default()
        };
        assert!(Candidate::from_raw(&empty_id, CandidateSource::Vector).is_none());
    }

    #[test]
    fn test_with_score_does_not_mutate_original() {
        let hit = RawHit {
            id: Some("a".into()),
            name: Some("A".into()),
            ..Default::default()
        };
        let original = Candidate::from_raw(&hit, CandidateSource::Vector).unwrap();
        let rescored = original.with_score(0.75);

        assert_eq!(original.score, 0.0);
        assert_eq!(rescored.score, 0.75);
        assert_eq!(rescored.id, original.id);
    }

    #[test]
    fn test_value_equality() {
        let hit = RawHit {
            id: Some("a".into()),
            name: Some("A".into()),
            description: Some("desc".into()),
            ..Default::default()
        };
        let one = Candidate::from_raw(&hit, CandidateSource::Vector).unwrap();
        let two = Candidate::from_raw(&hit, CandidateSource::Vector).unwrap();
        assert_eq!(one, two);
        assert_ne!(one, two.with_score(1.0));
    }
}
