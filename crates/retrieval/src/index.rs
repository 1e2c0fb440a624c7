//! Vector search collaborator contract
//!
//! The reasoning core never computes embeddings; it only consumes
//! similarity-ordered hits through the `VectorSearch` trait. The in-memory
//! index here is a lexical stand-in for tests and demos.

use async_trait::async_trait;
use cograg_common::candidate::RawHit;
use cograg_common::errors::Result;
use serde_json::json;
use std::collections::HashSet;

/// Trait for similarity search over an indexed corpus
#[async_trait]
pub trait VectorSearch: Send + Sync {
    /// Return up to `k` hits for the query, best match first. May be empty.
    async fn search(&self, query: &str, k: usize) -> Result<Vec<RawHit>>;
}

/// Indexed document: identifier, display name, and scoring text
#[derive(Debug, Clone)]
struct Document {
    id: String,
    name: String,
    description: String,
}

/// In-memory index scoring documents by query-term overlap.
///
/// Not a storage engine: scores are `matched / (matched + 1)` over distinct
/// query terms, which keeps them in 0..1 like a real similarity backend.
#[derive(Debug, Default)]
pub struct InMemoryVectorIndex {
    documents: Vec<Document>,
}

impl InMemoryVectorIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document to the index
    pub fn add_document(&mut self, id: &str, name: &str, description: &str) {
        self.documents.push(Document {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
        });
    }

    fn terms(text: &str) -> HashSet<String> {
        text.split_whitespace()
            .map(|w| {
                w.chars()
                    .filter(|c| c.is_alphanumeric())
                    .collect::<String>()
                    .to_lowercase()
            })
            .filter(|w| w.len() > 2)
            .collect()
    }
}

#[async_trait]
impl VectorSearch for InMemoryVectorIndex {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<RawHit>> {
        let query_terms = Self::terms(query);
        if query_terms.is_empty() {
            return Ok(vec![]);
        }

        let mut scored: Vec<(f32, &Document)> = self
            .documents
            .iter()
            .filter_map(|doc| {
                let doc_terms = Self::terms(&format!("{} {}", doc.name, doc.description));
                let matched = query_terms.intersection(&doc_terms).count();
                if matched == 0 {
                    return None;
                }
                // Normalize to 0..1, as ts_rank-style scores can exceed 1
                let score = matched as f32 / (matched as f32 + 1.0);
                Some((score, doc))
            })
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(score, doc)| RawHit {
                id: None,
                name: None,
                description: None,
                score: Some(score),
                metadata: json!({
                    "id": doc.id,
                    "name": doc.name,
                    "description": doc.description,
                })
                .as_object()
                .cloned()
                .unwrap_or_default(),
            })
            .collect())
    }
}
