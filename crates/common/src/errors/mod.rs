//! Error types for the CogRAG reasoning engine
//!
//! Provides a layered error taxonomy with:
//! - Input-validation errors (rejected before any state is created)
//! - Recoverable domain conditions the agent resolves into terminal states
//! - Backend/integration failures per external collaborator
//! - Cancellation, which is always re-raised and never absorbed

use thiserror::Error;

/// Result type alias using CogragError
pub type Result<T> = std::result::Result<T, CogragError>;

/// Application error types
#[derive(Error, Debug)]
pub enum CogragError {
    // Input validation
    #[error("Invalid query: {reason}")]
    InvalidQuery { reason: String },

    // Recoverable domain conditions
    #[error("No initial candidates found for query: {query}")]
    NoInitialCandidates { query: String },

    // Configuration
    #[error("Configuration error: {field} = {value} violates {constraint}")]
    Configuration {
        field: &'static str,
        value: String,
        constraint: &'static str,
    },

    // External collaborator failures
    #[error("Language model error: {message}")]
    LlmBackend { message: String },

    #[error("Vector search error: {message}")]
    VectorBackend { message: String },

    #[error("Knowledge graph error: {message}")]
    GraphBackend { message: String },

    #[error("Reranker error: {message}")]
    RerankBackend { message: String },

    #[error("Reranker returned {actual} scores for {expected} candidates")]
    ScoreAlignment { expected: usize, actual: usize },

    #[error("{collaborator} call timed out after {timeout_ms}ms")]
    Timeout {
        collaborator: &'static str,
        timeout_ms: u64,
    },

    // Cancellation
    #[error("Reasoning session cancelled")]
    Cancelled,
}

impl CogragError {
    /// Stable label for this error, used in logs and metric labels
    pub fn kind(&self) -> &'static str {
        match self {
            CogragError::InvalidQuery { .. } => "invalid_query",
            CogragError::NoInitialCandidates { .. } => "no_initial_candidates",
            CogragError::Configuration { .. } => "configuration",
            CogragError::LlmBackend { .. } => "llm_backend",
            CogragError::VectorBackend { .. } => "vector_backend",
            CogragError::GraphBackend { .. } => "graph_backend",
            CogragError::RerankBackend { .. } => "rerank_backend",
            CogragError::ScoreAlignment { .. } => "score_alignment",
            CogragError::Timeout { .. } => "timeout",
            CogragError::Cancelled => "cancelled",
        }
    }

    /// Whether the agent resolves this error into a terminal reasoning state.
    ///
    /// Non-recoverable errors (invalid input, configuration, cancellation)
    /// propagate out of `solve` instead.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            CogragError::InvalidQuery { .. }
                | CogragError::Configuration { .. }
                | CogragError::Cancelled
        )
    }

    /// Whether this error is a cancellation signal that must be re-raised
    pub fn is_cancellation(&self) -> bool {
        matches!(self, CogragError::Cancelled)
    }
}
