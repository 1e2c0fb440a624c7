//! Cognitive reasoning loop
//!
//! Orchestrates one query's session: initial retrieval → prune → bounded
//! Think-Act-Observe hops → terminal outcome. Recoverable domain conditions
//! and backend failures are resolved into terminal states here; only invalid
//! input, configuration errors, and cancellation escape `solve`.

use crate::parser::{parse_response, ThinkAction};
use crate::prompt::build_think_prompt;
use crate::state::{HopTrace, ReasoningState, TerminationReason};
use cograg_common::candidate::Candidate;
use cograg_common::config::AgentConfig;
use cograg_common::errors::{CogragError, Result};
use cograg_common::llm::LanguageModel;
use cograg_common::observability;
use cograg_retrieval::hybrid::HybridRetriever;
use cograg_retrieval::rerank::{RerankModel, RerankerAdapter};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Thought preview retained in hop traces
const THOUGHT_PREVIEW_CHARS: usize = 200;

/// The Think-Act-Observe reasoning agent
pub struct CognitiveAgent {
    hrm: HybridRetriever,
    reranker: RerankerAdapter,
    llm: Arc<dyn LanguageModel>,
    config: AgentConfig,
    cancellation: CancellationToken,
}

impl CognitiveAgent {
    /// Create a new agent.
    ///
    /// Validates the configuration: bounded knobs are clamped here, invalid
    /// required knobs are rejected now rather than mid-session.
    pub fn new(
        hrm: HybridRetriever,
        rerank_model: Arc<dyn RerankModel>,
        llm: Arc<dyn LanguageModel>,
        config: AgentConfig,
    ) -> Result<Self> {
        let config = config.validated()?;
        let reranker = RerankerAdapter::new(rerank_model, config.use_reranker);

        Ok(Self {
            hrm,
            reranker,
            llm,
            config,
            cancellation: CancellationToken::new(),
        })
    }

    /// Attach a cancellation token, checked at every hop boundary
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Answer one query, returning its terminal reasoning state.
    ///
    /// Returns `Err` only for malformed input and cancellation; every other
    /// failure mode resolves into a terminal state with both termination
    /// reason and final answer set.
    pub async fn solve(&self, query: &str) -> Result<ReasoningState> {
        self.validate_query(query)?;

        let mut state = ReasoningState::new(query);
        let started = Instant::now();
        info!(session_id = %state.session_id, query, "reasoning session started");

        self.drive(&mut state).await?;
        debug_assert!(state.is_terminated(), "drive always terminates the session");

        if let Some(outcome) = state.outcome() {
            info!(
                session_id = %state.session_id,
                reason = outcome.reason.as_str(),
                hops = state.hop_count(),
                "reasoning session finished"
            );
            observability::record_session(
                outcome.reason.as_str(),
                state.hop_count(),
                started.elapsed().as_secs_f64(),
            );
        }

        Ok(state)
    }

    fn validate_query(&self, query: &str) -> Result<()> {
        if query.trim().is_empty() {
            return Err(CogragError::InvalidQuery {
                reason: "query cannot be empty".to_string(),
            });
        }
        if query.chars().count() > self.config.max_query_chars {
            return Err(CogragError::InvalidQuery {
                reason: format!(
                    "query too long (max {} chars)",
                    self.config.max_query_chars
                ),
            });
        }
        Ok(())
    }

    /// Run the state machine to a terminal state.
    ///
    /// Returns `Err` only for non-recoverable errors (cancellation); on
    /// `Ok(())` the state is guaranteed terminated.
    async fn drive(&self, state: &mut ReasoningState) -> Result<()> {
        // RETRIEVING
        let retrieved = self
            .with_timeout(
                "retrieval",
                self.config.expansion_timeout(),
                self.hrm.retrieve_initial(&state.query, self.config.retrieval_k),
            )
            .await;
        let initial = match retrieved {
            Ok(candidates) => candidates,
            Err(CogragError::NoInitialCandidates { .. }) => {
                info!(session_id = %state.session_id, "no initial candidates");
                state.terminate(TerminationReason::NoInitialCandidates, None);
                return Ok(());
            }
            Err(e) => return self.resolve_backend_failure(state, "retrieval", e),
        };

        // PRUNING
        let first_prune = self
            .with_timeout(
                "reranker",
                self.config.rerank_timeout(),
                self.reranker
                    .score_and_prune(&state.query, initial, self.config.rerank_top_k),
            )
            .await;
        let pruned = match first_prune {
            Ok(pruned) => pruned,
            Err(e) => return self.resolve_backend_failure(state, "reranker", e),
        };

        state.record_trace(HopTrace {
            hop: 0,
            action: "initial_retrieval".to_string(),
            thought: "Starting search.".to_string(),
            candidate_count: pruned.len(),
        });
        state.set_context(pruned);

        // REASONING(hop = 1..=max_hops)
        while state.hop_count() < self.config.max_hops {
            if self.cancellation.is_cancelled() {
                // Re-raised, never absorbed into a terminal state
                return Err(CogragError::Cancelled);
            }

            let hop = state.begin_hop();
            debug!(session_id = %state.session_id, hop, "hop started");

            // THINK
            let prompt =
                build_think_prompt(&state.query, state.context(), state.hypotheses());
            let generated = self
                .with_timeout("llm", self.config.llm_timeout(), self.llm.generate(&prompt))
                .await;
            let response = match generated {
                Ok(response) => response,
                Err(e) => return self.resolve_backend_failure(state, "llm", e),
            };

            // An unparseable response degrades to "expand: generic" inside
            // the parser; it never aborts the session.
            let directive = parse_response(&response);
            state.push_hypothesis(&directive.hypothesis);

            let thought: String = response.chars().take(THOUGHT_PREVIEW_CHARS).collect();

            let target = match directive.action {
                ThinkAction::AnswerFound { answer } => {
                    state.record_trace(HopTrace {
                        hop,
                        action: "terminate".to_string(),
                        thought,
                        candidate_count: state.context().len(),
                    });
                    state.terminate(TerminationReason::Success, Some(answer));
                    return Ok(());
                }
                ThinkAction::Expand { target } => target,
            };

            // ACT
            let frontier = expansion_targets(state.context(), &target);
            let expanded = self
                .with_timeout(
                    "graph",
                    self.config.expansion_timeout(),
                    self.hrm.expand(&frontier, self.config.max_expansions),
                )
                .await;
            let discovered = match expanded {
                Ok(discovered) => discovered,
                Err(e) => return self.resolve_backend_failure(state, "graph", e),
            };

            if discovered.is_empty() {
                info!(session_id = %state.session_id, hop, "frontier exhausted");
                state.record_trace(HopTrace {
                    hop,
                    action: "terminate".to_string(),
                    thought,
                    candidate_count: state.context().len(),
                });
                state.terminate(TerminationReason::ExhaustedContext, None);
                return Ok(());
            }

            // OBSERVE
            let mut pool = state.context().to_vec();
            pool.extend(discovered);
            let observed = self
                .with_timeout(
                    "reranker",
                    self.config.rerank_timeout(),
                    self.reranker
                        .score_and_prune(&state.query, pool, self.config.rerank_top_k),
                )
                .await;
            let next_context = match observed {
                Ok(next) => next,
                Err(e) => return self.resolve_backend_failure(state, "reranker", e),
            };

            state.record_trace(HopTrace {
                hop,
                action: "expand".to_string(),
                thought,
                candidate_count: next_context.len(),
            });
            state.set_context(next_context);
        }

        // Hop budget exhausted without an answer
        state.terminate(TerminationReason::MaxStepsReached, None);
        Ok(())
    }

    /// Resolve a collaborator failure into a terminal state, unless it is a
    /// non-recoverable signal (cancellation) that must propagate.
    fn resolve_backend_failure(
        &self,
        state: &mut ReasoningState,
        collaborator: &'static str,
        err: CogragError,
    ) -> Result<()> {
        if !err.is_recoverable() {
            return Err(err);
        }

        error!(
            session_id = %state.session_id,
            collaborator,
            kind = err.kind(),
            error = %err,
            "collaborator failure, terminating session"
        );
        observability::record_collaborator_error(collaborator, err.kind());
        state.terminate(TerminationReason::LlmError, None);
        Ok(())
    }

    async fn with_timeout<T>(
        &self,
        collaborator: &'static str,
        duration: Duration,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(duration, fut).await {
            Ok(result) => result,
            Err(_) => Err(CogragError::Timeout {
                collaborator,
                timeout_ms: duration.as_millis() as u64,
            }),
        }
    }
}

/// Pick the expansion frontier for a directive target.
///
/// Candidates whose name or description mentions the target are preferred;
/// a generic or unmatched target falls back to the full working set.
fn expansion_targets(context: &[Candidate], target: &str) -> Vec<Candidate> {
    if target.is_empty() || target == "generic" {
        return context.to_vec();
    }

    let needle = target.to_lowercase();
    let matched: Vec<Candidate> = context
        .iter()
        .filter(|c| {
            c.name.to_lowercase().contains(&needle)
                || c.description.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect();

    if matched.is_empty() {
        context.to_vec()
    } else {
        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cograg_common::llm::MockLanguageModel;
    use cograg_retrieval::graph::InMemoryKnowledgeGraph;
    use cograg_retrieval::index::InMemoryVectorIndex;
    use cograg_retrieval::rerank::HeuristicRerankModel;

    fn movie_world() -> (InMemoryVectorIndex, InMemoryKnowledgeGraph) {
        let mut index = InMemoryVectorIndex::new();
        index.add_document("Q25188", "Inception (film)", "2010 science fiction film");

        let mut graph = InMemoryKnowledgeGraph::new();
        graph.add_node("Q25188", "Inception", "2010 science fiction film");
        graph.add_node("Q25191", "Christopher Nolan", "film director");
        graph.add_node("Q180", "Memento", "2000 film");
        graph.add_edge("Q25188", "Q25191", "director");
        // A node two hops out, so expansion always has somewhere to go
        graph.add_edge("Q25191", "Q180", "notable work");
        (index, graph)
    }

    fn agent_with(
        index: InMemoryVectorIndex,
        graph: InMemoryKnowledgeGraph,
        llm: MockLanguageModel,
        config: AgentConfig,
    ) -> CognitiveAgent {
        let hrm = HybridRetriever::new(Arc::new(index), Arc::new(graph));
        CognitiveAgent::new(hrm, Arc::new(HeuristicRerankModel), Arc::new(llm), config)
            .expect("valid config")
    }

    /// LLM stub that always fails structurally
    struct FailingLlm;

    #[async_trait]
    impl cograg_common::llm::LanguageModel for FailingLlm {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Err(CogragError::LlmBackend {
                message: "connection refused".to_string(),
            })
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_scenario_answer_on_first_hop() {
        let (index, graph) = movie_world();
        let llm = MockLanguageModel::with_responses(["ANSWER_FOUND: Christopher Nolan"]);
        let agent = agent_with(index, graph, llm, AgentConfig::default());

        let state = agent.solve("who directed the movie Inception?").await.unwrap();

        assert_eq!(state.termination_reason(), Some(TerminationReason::Success));
        assert_eq!(state.final_answer(), Some("Christopher Nolan"));
        assert_eq!(state.hop_count(), 1);
    }

    #[tokio::test]
    async fn test_scenario_no_initial_candidates() {
        let agent = agent_with(
            InMemoryVectorIndex::new(),
            InMemoryKnowledgeGraph::new(),
            MockLanguageModel::new(),
            AgentConfig::default(),
        );

        let state = agent.solve("completely unknown topic").await.unwrap();

        assert_eq!(
            state.termination_reason(),
            Some(TerminationReason::NoInitialCandidates)
        );
        assert_eq!(state.final_answer(), Some("No relevant information found."));
        assert_eq!(state.hop_count(), 0);
    }

    #[tokio::test]
    async fn test_scenario_exhausted_context() {
        // Vector hit exists but the graph has no edges to expand into.
        let mut index = InMemoryVectorIndex::new();
        index.add_document("Q25188", "Inception (film)", "2010 science fiction film");
        let agent = agent_with(
            index,
            InMemoryKnowledgeGraph::new(),
            MockLanguageModel::new(),
            AgentConfig::default(),
        );

        let state = agent.solve("who directed the movie Inception?").await.unwrap();

        assert_eq!(
            state.termination_reason(),
            Some(TerminationReason::ExhaustedContext)
        );
        assert_eq!(
            state.final_answer(),
            Some("No relevant context found. Unable to answer.")
        );
        assert_eq!(state.hop_count(), 1);
    }

    #[tokio::test]
    async fn test_hop_budget_exhaustion() {
        let (index, graph) = movie_world();
        // Mock never reports an answer; the graph always has neighbors.
        let agent = agent_with(
            index,
            graph,
            MockLanguageModel::new(),
            AgentConfig {
                max_hops: 1,
                ..Default::default()
            },
        );

        let state = agent.solve("who directed the movie Inception?").await.unwrap();

        assert_eq!(
            state.termination_reason(),
            Some(TerminationReason::MaxStepsReached)
        );
        assert_eq!(state.hop_count(), 1);
        assert!(!state.final_answer().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_multi_hop_success() {
        let (index, graph) = movie_world();
        let llm = MockLanguageModel::with_responses([
            "HYPOTHESIS: Need the director relation.\nACTION: EXPAND: director",
            "HYPOTHESIS: Inception was directed by Christopher Nolan.\n\
             ACTION: ANSWER_FOUND: Christopher Nolan",
        ]);
        let agent = agent_with(index, graph, llm, AgentConfig::default());

        let state = agent.solve("who directed the movie Inception?").await.unwrap();

        assert_eq!(state.termination_reason(), Some(TerminationReason::Success));
        assert_eq!(state.hop_count(), 2);
        assert_eq!(state.hypotheses().len(), 2);
    }

    #[tokio::test]
    async fn test_llm_backend_failure_terminates_with_answer() {
        let (index, graph) = movie_world();
        let hrm = HybridRetriever::new(Arc::new(index), Arc::new(graph));
        let agent = CognitiveAgent::new(
            hrm,
            Arc::new(HeuristicRerankModel),
            Arc::new(FailingLlm),
            AgentConfig::default(),
        )
        .unwrap();

        let state = agent.solve("who directed the movie Inception?").await.unwrap();

        assert_eq!(state.termination_reason(), Some(TerminationReason::LlmError));
        assert!(!state.final_answer().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancellation_is_reraised() {
        let (index, graph) = movie_world();
        let token = CancellationToken::new();
        token.cancel();

        let agent = agent_with(index, graph, MockLanguageModel::new(), AgentConfig::default())
            .with_cancellation(token);

        let err = agent
            .solve("who directed the movie Inception?")
            .await
            .unwrap_err();
        assert!(err.is_cancellation());
    }

    #[tokio::test]
    async fn test_empty_query_rejected_before_retrieval() {
        let (index, graph) = movie_world();
        let agent = agent_with(index, graph, MockLanguageModel::new(), AgentConfig::default());

        let err = agent.solve("   ").await.unwrap_err();
        assert!(matches!(err, CogragError::InvalidQuery { .. }));
    }

    #[tokio::test]
    async fn test_overlong_query_rejected() {
        let (index, graph) = movie_world();
        let agent = agent_with(index, graph, MockLanguageModel::new(), AgentConfig::default());

        let err = agent.solve(&"x".repeat(2000)).await.unwrap_err();
        assert!(matches!(err, CogragError::InvalidQuery { .. }));
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let hrm = HybridRetriever::new(
            Arc::new(InMemoryVectorIndex::new()),
            Arc::new(InMemoryKnowledgeGraph::new()),
        );
        let result = CognitiveAgent::new(
            hrm,
            Arc::new(HeuristicRerankModel),
            Arc::new(MockLanguageModel::new()),
            AgentConfig {
                max_expansions: 0,
                ..Default::default()
            },
        );
        assert!(matches!(
            result,
            Err(CogragError::Configuration { field: "max_expansions", .. })
        ));
    }

    #[tokio::test]
    async fn test_context_is_pruned_to_top_k() {
        let (index, mut graph) = movie_world();
        for i in 0..10 {
            let id = format!("extra-{i}");
            graph.add_node(&id, &format!("Extra {i}"), "related entity");
            graph.add_edge("Q25188", &id, "related");
        }

        let agent = agent_with(
            index,
            graph,
            MockLanguageModel::new(),
            AgentConfig {
                max_hops: 2,
                rerank_top_k: 3,
                ..Default::default()
            },
        );

        let state = agent.solve("who directed the movie Inception?").await.unwrap();
        assert!(state.context().len() <= 3);
    }
}
