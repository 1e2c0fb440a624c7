//! CogRAG Hybrid Retrieval Module
//!
//! Provides the retrieval half of the reasoning loop:
//! - Vector search collaborator contract (+ in-memory lexical index)
//! - Knowledge graph collaborator contract (+ in-memory graph)
//! - Seed entity extraction from query text
//! - Hybrid fusion of vector and graph hits, and frontier expansion
//! - Cross-encoder-style reranking with top-k pruning

pub mod entities;
pub mod graph;
pub mod hybrid;
pub mod index;
pub mod rerank;

pub use graph::{InMemoryKnowledgeGraph, KnowledgeGraph};
pub use hybrid::HybridRetriever;
pub use index::{InMemoryVectorIndex, VectorSearch};
pub use rerank::{HeuristicRerankModel, RerankModel, RerankerAdapter};
