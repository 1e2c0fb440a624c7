//! Reasoning session state
//!
//! Tracks one query's progress through the hop loop and owns the terminal
//! transition: termination reason and final answer are only ever assigned
//! together, through a single operation.

use chrono::{DateTime, Utc};
use cograg_common::candidate::Candidate;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

/// Why a reasoning session ended
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// The model reported an answer
    Success,
    /// Hop budget exhausted without an answer
    MaxStepsReached,
    /// Frontier expansion produced nothing new
    ExhaustedContext,
    /// Neither vector nor graph source returned any initial hits
    NoInitialCandidates,
    /// A backend collaborator failed structurally
    LlmError,
}

impl TerminationReason {
    /// Stable label for logs, metrics, and persisted records
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminationReason::Success => "success",
            TerminationReason::MaxStepsReached => "max_steps_reached",
            TerminationReason::ExhaustedContext => "exhausted_context",
            TerminationReason::NoInitialCandidates => "no_initial_candidates",
            TerminationReason::LlmError => "llm_error",
        }
    }

    /// Human-readable default answer for this outcome.
    ///
    /// For `Success` this is the sentinel used when the extracted answer text
    /// turned out empty; every other reason has a fixed explanation.
    pub fn default_answer(&self) -> &'static str {
        match self {
            TerminationReason::Success => "Answer identified but could not be extracted.",
            TerminationReason::MaxStepsReached => {
                "Answer inference incomplete. Please refine the query."
            }
            TerminationReason::ExhaustedContext => "No relevant context found. Unable to answer.",
            TerminationReason::NoInitialCandidates => "No relevant information found.",
            TerminationReason::LlmError => {
                "Language model processing failed. Unable to complete reasoning."
            }
        }
    }
}

/// Terminal outcome of a session: reason and answer, inseparable
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Outcome {
    /// Closed-set outcome code
    pub reason: TerminationReason,

    /// Human-readable answer; never empty
    pub answer: String,
}

/// Per-hop audit record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HopTrace {
    /// Hop number (1-indexed; 0 is initial retrieval)
    pub hop: usize,

    /// What the agent did ("initial_retrieval", "expand", "terminate")
    pub action: String,

    /// Model output or summary for this hop
    pub thought: String,

    /// Working-set size after this hop
    pub candidate_count: usize,
}

/// Plain key-value record an external harness persists per session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Session correlation id
    pub session_id: Uuid,

    /// Original question text
    pub query: String,

    /// Closed-set outcome code
    pub termination_reason: TerminationReason,

    /// Final answer; never empty
    pub final_answer: String,

    /// Hops executed
    pub hop_count: usize,
}

/// Mutable state of one query's reasoning session.
///
/// Created at `solve` entry, mutated only by the agent, terminal once an
/// outcome is assigned.
#[derive(Debug, Clone)]
pub struct ReasoningState {
    /// Session correlation id
    pub session_id: Uuid,

    /// Original question text
    pub query: String,

    /// Session start time
    pub started_at: DateTime<Utc>,

    hop_count: usize,
    context: Vec<Candidate>,
    hypotheses: Vec<String>,
    trace: Vec<HopTrace>,
    outcome: Option<Outcome>,
}

impl ReasoningState {
    /// Create a fresh session for a query
    pub fn new(query: &str) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            query: query.to_string(),
            started_at: Utc::now(),
            hop_count: 0,
            context: Vec::new(),
            hypotheses: Vec::new(),
            trace: Vec::new(),
            outcome: None,
        }
    }

    /// Completed hops so far
    pub fn hop_count(&self) -> usize {
        self.hop_count
    }

    /// The current working set of candidates
    pub fn context(&self) -> &[Candidate] {
        &self.context
    }

    /// Hypothesis history across hops
    pub fn hypotheses(&self) -> &[String] {
        &self.hypotheses
    }

    /// Per-hop audit trail
    pub fn trace(&self) -> &[HopTrace] {
        &self.trace
    }

    /// Whether a terminal outcome has been assigned
    pub fn is_terminated(&self) -> bool {
        self.outcome.is_some()
    }

    /// Terminal outcome, if the session has ended
    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    /// Termination reason, if the session has ended
    pub fn termination_reason(&self) -> Option<TerminationReason> {
        self.outcome.as_ref().map(|o| o.reason)
    }

    /// Final answer, if the session has ended
    pub fn final_answer(&self) -> Option<&str> {
        self.outcome.as_ref().map(|o| o.answer.as_str())
    }

    /// Mark the start of a new hop
    pub fn begin_hop(&mut self) -> usize {
        self.hop_count += 1;
        self.hop_count
    }

    /// Replace the working set with a freshly pruned one
    pub fn set_context(&mut self, candidates: Vec<Candidate>) {
        if self.is_terminated() {
            warn!(session_id = %self.session_id, "ignoring context update on terminated session");
            return;
        }
        self.context = candidates;
    }

    /// Record a hypothesis from the think phase
    pub fn push_hypothesis(&mut self, hypothesis: &str) {
        if !hypothesis.is_empty() {
            self.hypotheses.push(hypothesis.to_string());
        }
    }

    /// Append a hop audit record
    pub fn record_trace(&mut self, trace: HopTrace) {
        self.trace.push(trace);
    }

    /// Assign the terminal outcome.
    ///
    /// Reason and answer are set in this single operation; an empty or
    /// missing answer falls back to the reason's default so no terminal
    /// state can be observed without an answer. Terminated is absorbing:
    /// later calls are ignored.
    pub fn terminate(&mut self, reason: TerminationReason, answer: Option<String>) {
        if let Some(existing) = &self.outcome {
            warn!(
                session_id = %self.session_id,
                existing = existing.reason.as_str(),
                attempted = reason.as_str(),
                "ignoring terminate on already-terminated session"
            );
            return;
        }

        let answer = answer
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| reason.default_answer().to_string());

        self.outcome = Some(Outcome { reason, answer });
    }

    /// The persisted key-value record for this session.
    ///
    /// Only meaningful once terminated.
    pub fn summary(&self) -> Option<SessionSummary> {
        self.outcome.as_ref().map(|outcome| SessionSummary {
            session_id: self.session_id,
            query: self.query.clone(),
            termination_reason: outcome.reason,
            final_answer: outcome.answer.clone(),
            hop_count: self.hop_count,
        })
    }
}
