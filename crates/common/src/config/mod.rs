//! Configuration management for the CogRAG engine
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with COGRAG__)
//! - Configuration files (config/default, config/<env>, config/local)
//! - Default values
//!
//! Bounded tuning knobs are clamped to documented ranges; required knobs set
//! to zero are a construction-time error, never silently accepted.

use crate::errors::{CogragError, Result};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CogragConfig {
    /// Reasoning agent configuration
    #[serde(default)]
    pub agent: AgentConfig,

    /// Language model backend configuration
    #[serde(default)]
    pub llm: LlmConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Tuning knobs consumed by the reasoning loop
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AgentConfig {
    /// Maximum Think-Act-Observe hops per query
    #[serde(default = "default_max_hops")]
    pub max_hops: usize,

    /// Maximum candidates selected for frontier expansion per hop
    #[serde(default = "default_max_expansions")]
    pub max_expansions: usize,

    /// Working-set size retained after each rerank/prune step
    #[serde(default = "default_rerank_top_k")]
    pub rerank_top_k: usize,

    /// Top-k for the initial vector search
    #[serde(default = "default_retrieval_k")]
    pub retrieval_k: usize,

    /// Score candidates with the reranking model (pass-through when false)
    #[serde(default = "default_use_reranker")]
    pub use_reranker: bool,

    /// Maximum accepted query length in characters
    #[serde(default = "default_max_query_chars")]
    pub max_query_chars: usize,

    /// Timeout for a single language-model call in seconds
    #[serde(default = "default_llm_timeout")]
    pub llm_timeout_secs: u64,

    /// Timeout for a single graph-expansion call in seconds
    #[serde(default = "default_expansion_timeout")]
    pub expansion_timeout_secs: u64,

    /// Timeout for a single rerank-scoring call in seconds
    #[serde(default = "default_rerank_timeout")]
    pub rerank_timeout_secs: u64,
}

/// Language model backend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    /// LLM provider: ollama, mock
    #[serde(default = "default_llm_provider")]
    pub provider: String,

    /// Base URL of the model server
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    /// Model to use
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Maximum retries per generate call
    #[serde(default = "default_llm_retries")]
    pub max_retries: u32,
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Service name for tracing
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

// Upper bounds for bounded tuning knobs
const MAX_HOPS_CEILING: usize = 10;
const MAX_EXPANSIONS_CEILING: usize = 20;
const RERANK_TOP_K_CEILING: usize = 50;
const RETRIEVAL_K_CEILING: usize = 100;

// Default value functions
fn default_max_hops() -> usize { 3 }
fn default_max_expansions() -> usize { 5 }
fn default_rerank_top_k() -> usize { 5 }
fn default_retrieval_k() -> usize { 10 }
fn default_use_reranker() -> bool { true }
fn default_max_query_chars() -> usize { 1000 }
fn default_llm_timeout() -> u64 { 60 }
fn default_expansion_timeout() -> u64 { 10 }
fn default_rerank_timeout() -> u64 { 10 }
fn default_llm_provider() -> String { "ollama".to_string() }
fn default_llm_base_url() -> String { crate::DEFAULT_LLM_BASE_URL.to_string() }
fn default_llm_model() -> String { crate::DEFAULT_LLM_MODEL.to_string() }
fn default_llm_retries() -> u32 { 2 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { false }
fn default_service_name() -> String { "cograg".to_string() }

impl AgentConfig {
    /// Validate this configuration, clamping bounded knobs to their
    /// documented ranges.
    ///
    /// Zero values for required numeric knobs are rejected; clamping only
    /// applies to the explicitly bounded upper ranges.
    pub fn validated(mut self) -> Result<Self> {
        fn require_nonzero(field: &'static str, value: usize) -> Result<()> {
            if value == 0 {
                return Err(CogragError::Configuration {
                    field,
                    value: value.to_string(),
                    constraint: "must be >= 1",
                });
            }
            Ok(())
        }

        require_nonzero("max_hops", self.max_hops)?;
        require_nonzero("max_expansions", self.max_expansions)?;
        require_nonzero("rerank_top_k", self.rerank_top_k)?;
        require_nonzero("retrieval_k", self.retrieval_k)?;
        require_nonzero("max_query_chars", self.max_query_chars)?;

        fn clamp(field: &'static str, value: usize, ceiling: usize) -> usize {
            if value > ceiling {
                warn!(field, value, ceiling, "clamping configuration value");
                ceiling
            } else {
                value
            }
        }

        self.max_hops = clamp("max_hops", self.max_hops, MAX_HOPS_CEILING);
        self.max_expansions = clamp("max_expansions", self.max_expansions, MAX_EXPANSIONS_CEILING);
        self.rerank_top_k = clamp("rerank_top_k", self.rerank_top_k, RERANK_TOP_K_CEILING);
        self.retrieval_k = clamp("retrieval_k", self.retrieval_k, RETRIEVAL_K_CEILING);

        Ok(self)
    }

    /// Get the language-model call timeout as Duration
    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }

    /// Get the graph-expansion call timeout as Duration
    pub fn expansion_timeout(&self) -> Duration {
        Duration::from_secs(self.expansion_timeout_secs)
    }

    /// Get the rerank-scoring call timeout as Duration
    pub fn rerank_timeout(&self) -> Duration {
        Duration::from_secs(self.rerank_timeout_secs)
    }
}

impl CogragConfig {
    /// Load configuration from environment and files
    pub fn load() -> std::result::Result<Self, ConfigError> {
        let env = std::env::var("COGRAG_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables with COGRAG__ prefix
            // e.g., COGRAG__AGENT__MAX_HOPS=5
            .add_source(
                Environment::with_prefix("COGRAG")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> std::result::Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("COGRAG")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_hops: default_max_hops(),
            max_expansions: default_max_expansions(),
            rerank_top_k: default_rerank_top_k(),
            retrieval_k: default_retrieval_k(),
            use_reranker: default_use_reranker(),
            max_query_chars: default_max_query_chars(),
            llm_timeout_secs: default_llm_timeout(),
            expansion_timeout_secs: default_expansion_timeout(),
            rerank_timeout_secs: default_rerank_timeout(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            max_retries: default_llm_retries(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            service_name: default_service_name(),
        }
    }
}

impl Default for CogragConfig {
    fn default() -> Self {
        Self {
            agent: AgentConfig::default(),
            llm: LlmConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}
