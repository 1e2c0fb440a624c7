//! Hybrid retrieval combining vector search and knowledge-graph lookup
//!
//! Fuses similarity hits with graph hits into one deduplicated candidate set,
//! and expands the reasoning frontier by one graph hop at a time.

use crate::entities::extract_seed_entities;
use crate::graph::KnowledgeGraph;
use crate::index::VectorSearch;
use cograg_common::candidate::{Candidate, CandidateSource};
use cograg_common::errors::{CogragError, Result};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Per-seed limit for graph node resolution
const SEED_MATCH_LIMIT: usize = 3;

/// Hybrid retriever combining vector and knowledge-graph sources
pub struct HybridRetriever {
    vector: Arc<dyn VectorSearch>,
    graph: Arc<dyn KnowledgeGraph>,
}

impl HybridRetriever {
    /// Create a new hybrid retriever
    pub fn new(vector: Arc<dyn VectorSearch>, graph: Arc<dyn KnowledgeGraph>) -> Self {
        Self { vector, graph }
    }

    /// Retrieve the initial candidate set for a query.
    ///
    /// Vector hits come first in similarity order; graph hits for the query's
    /// seed entities (matched nodes, then their 1-hop neighbors) follow in
    /// backend order. The result is the union of both sets deduplicated by
    /// id, where the first occurrence wins.
    ///
    /// Returns `CogragError::NoInitialCandidates` when both sources are
    /// empty; callers handle that as a recoverable condition.
    pub async fn retrieve_initial(&self, query: &str, k: usize) -> Result<Vec<Candidate>> {
        let mut candidates: Vec<Candidate> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        let vector_hits = self.vector.search(query, k).await?;

        for hit in &vector_hits {
            let Some(candidate) = Candidate::from_raw(hit, CandidateSource::Vector) else {
                warn!(?hit, "skipping vector hit without a recoverable id");
                continue;
            };
            if seen.insert(candidate.id.clone()) {
                candidates.push(candidate);
            }
        }

        // Graph side: resolve seed entities to nodes, then pull their 1-hop
        // neighborhood so the first prune sees some graph structure.
        let seeds = extract_seed_entities(query);
        let mut matched_ids: Vec<String> = Vec::new();
        let mut graph_hits = Vec::new();

        for seed in &seeds {
            let matches = self.graph.search_nodes(seed, SEED_MATCH_LIMIT).await?;
            graph_hits.extend(matches);
        }

        for hit in &graph_hits {
            if let Some(id) = hit
                .metadata
                .get("id")
                .and_then(|v| v.as_str())
                .or(hit.id.as_deref())
            {
                matched_ids.push(id.to_string());
            }
        }

        if !matched_ids.is_empty() {
            let neighbor_hits = self.graph.neighbors(&matched_ids).await?;
            graph_hits.extend(neighbor_hits);
        }

        for hit in &graph_hits {
            let Some(candidate) = Candidate::from_raw(hit, CandidateSource::Graph) else {
                warn!(?hit, "skipping graph hit without a recoverable id");
                continue;
            };
            if seen.insert(candidate.id.clone()) {
                candidates.push(candidate);
            }
        }

        if candidates.is_empty() {
            return Err(CogragError::NoInitialCandidates {
                query: query.to_string(),
            });
        }

        debug!(
            total = candidates.len(),
            vector = vector_hits.len(),
            seeds = seeds.len(),
            "initial retrieval complete"
        );

        Ok(candidates)
    }

    /// Expand the frontier by one graph hop.
    ///
    /// Selects at most `max_expansions` input candidates by score descending
    /// (stable, so ties keep their retrieval order), looks up their neighbors
    /// in a single call, and returns only nodes that are new with respect to
    /// both the input set and the result itself. An empty return is a normal
    /// outcome, not an error; the agent decides what exhaustion means.
    pub async fn expand(
        &self,
        candidates: &[Candidate],
        max_expansions: usize,
    ) -> Result<Vec<Candidate>> {
        debug_assert!(max_expansions > 0, "max_expansions validated at construction");

        let mut selected: Vec<&Candidate> = candidates.iter().collect();
        selected.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        selected.truncate(max_expansions);

        let known_ids: HashSet<&str> = candidates.iter().map(|c| c.id.as_str()).collect();
        let frontier_ids: Vec<String> = selected.iter().map(|c| c.id.clone()).collect();

        let neighbor_hits = self.graph.neighbors(&frontier_ids).await?;

        let mut discovered = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for hit in &neighbor_hits {
            let Some(candidate) = Candidate::from_raw(hit, CandidateSource::Expansion) else {
                warn!(?hit, "skipping neighbor hit without a recoverable id");
                continue;
            };
            if known_ids.contains(candidate.id.as_str()) {
                continue;
            }
            if seen.insert(candidate.id.clone()) {
                discovered.push(candidate);
            }
        }

        debug!(
            frontier = frontier_ids.len(),
            discovered = discovered.len(),
            "frontier expansion complete"
        );

        Ok(discovered)
    }
}
