//! Knowledge graph collaborator contract
//!
//! Provides the neighbor-lookup and node-search boundary the reasoning core
//! depends on, plus an in-memory adjacency-map implementation for tests,
//! demos, and small datasets.

use async_trait::async_trait;
use cograg_common::candidate::RawHit;
use cograg_common::errors::Result;
use serde_json::json;
use std::collections::HashMap;

/// Trait for 1-hop knowledge-graph access
#[async_trait]
pub trait KnowledgeGraph: Send + Sync {
    /// Get the immediate neighbors of the given nodes.
    ///
    /// Returns zero or more hits per input id; order is backend-defined.
    async fn neighbors(&self, node_ids: &[String]) -> Result<Vec<RawHit>>;

    /// Search for nodes by name. Case-insensitive, at most `limit` hits.
    async fn search_nodes(&self, query: &str, limit: usize) -> Result<Vec<RawHit>>;
}

/// Node payload stored in the in-memory graph
#[derive(Debug, Clone)]
struct NodeRecord {
    name: String,
    description: String,
}

/// Labeled edge in the in-memory graph
#[derive(Debug, Clone)]
struct Edge {
    target: String,
    relation: String,
}

/// In-memory knowledge graph
///
/// Edges are stored in both directions so neighbor lookup is symmetric.
#[derive(Debug, Default)]
pub struct InMemoryKnowledgeGraph {
    /// node_id -> payload
    nodes: HashMap<String, NodeRecord>,

    /// Adjacency list: node_id -> labeled edges
    adjacency: HashMap<String, Vec<Edge>>,
}

impl InMemoryKnowledgeGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node to the graph
    pub fn add_node(&mut self, id: &str, name: &str, description: &str) {
        self.nodes.insert(
            id.to_string(),
            NodeRecord {
                name: name.to_string(),
                description: description.to_string(),
            },
        );
    }

    /// Add a labeled edge between two nodes (both directions)
    pub fn add_edge(&mut self, from: &str, to: &str, relation: &str) {
        self.adjacency.entry(from.to_string()).or_default().push(Edge {
            target: to.to_string(),
            relation: relation.to_string(),
        });
        self.adjacency.entry(to.to_string()).or_default().push(Edge {
            target: from.to_string(),
            relation: relation.to_string(),
        });
    }

    /// Get node count
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn hit_for(&self, node_id: &str, relation: &str, source_node: &str) -> RawHit {
        let (name, description) = match self.nodes.get(node_id) {
            Some(record) => (record.name.clone(), record.description.clone()),
            None => (node_id.to_string(), String::new()),
        };

        RawHit {
            metadata: json!({
                "id": node_id,
                "name": name,
                "description": description,
                "relation": relation,
                "source_node": source_node,
            })
            .as_object()
            .cloned()
            .unwrap_or_default(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl KnowledgeGraph for InMemoryKnowledgeGraph {
    async fn neighbors(&self, node_ids: &[String]) -> Result<Vec<RawHit>> {
        let mut hits = Vec::new();
        for node_id in node_ids {
            let Some(edges) = self.adjacency.get(node_id) else {
                continue;
            };
            for edge in edges {
                hits.push(self.hit_for(&edge.target, &edge.relation, node_id));
            }
        }
        Ok(hits)
    }

    async fn search_nodes(&self, query: &str, limit: usize) -> Result<Vec<RawHit>> {
        let needle = query.to_lowercase();
        let mut results = Vec::new();

        for (id, record) in &self.nodes {
            if record.name.to_lowercase().contains(&needle) {
                results.push(self.hit_for(id, "", ""));
                if results.len() >= limit {
                    break;
                }
            }
        }

        Ok(results)
    }
}
