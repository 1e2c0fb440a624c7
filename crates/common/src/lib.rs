//! CogRAG Common Library
//!
//! Shared code for the CogRAG reasoning engine including:
//! - The immutable Candidate value model
//! - Error types and handling
//! - Configuration management
//! - Language model client abstraction
//! - Tracing and metrics utilities

pub mod candidate;
pub mod config;
pub mod errors;
pub mod llm;
pub mod observability;

// Re-export commonly used types
pub use candidate::{Candidate, CandidateSource, RawHit};
pub use crate::config::{AgentConfig, CogragConfig};
pub use errors::{CogragError, Result};
pub use llm::LanguageModel;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default language model served by a local Ollama instance
pub const DEFAULT_LLM_MODEL: &str = "llama3";

/// Default Ollama endpoint
pub const DEFAULT_LLM_BASE_URL: &str = "http://localhost:11434";
