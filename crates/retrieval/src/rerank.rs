//! Cross-encoder-style reranking with top-k pruning
//!
//! The scoring model itself is an external collaborator behind `RerankModel`;
//! this module owns the batch construction and the pruning policy.

use async_trait::async_trait;
use cograg_common::candidate::Candidate;
use cograg_common::errors::{CogragError, Result};
use std::sync::Arc;
use tracing::debug;

/// Trait for relevance scoring of (query, text) pairs
#[async_trait]
pub trait RerankModel: Send + Sync {
    /// Score each text against the query.
    ///
    /// Must return exactly `texts.len()` scores, positionally aligned with
    /// the input.
    async fn score(&self, query: &str, texts: &[String]) -> Result<Vec<f32>>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Length-based fallback scorer for environments without a real
/// cross-encoder service.
pub struct HeuristicRerankModel;

#[async_trait]
impl RerankModel for HeuristicRerankModel {
    async fn score(&self, _query: &str, texts: &[String]) -> Result<Vec<f32>> {
        Ok(texts.iter().map(|t| t.len() as f32).collect())
    }

    fn model_name(&self) -> &str {
        "heuristic-length"
    }
}

/// Reranker adapter: builds scoring batches and prunes to the working-set size
pub struct RerankerAdapter {
    model: Arc<dyn RerankModel>,
    use_reranker: bool,
}

impl RerankerAdapter {
    /// Create a new adapter
    pub fn new(model: Arc<dyn RerankModel>, use_reranker: bool) -> Self {
        Self {
            model,
            use_reranker,
        }
    }

    /// Score candidates against the query and keep the top `top_k`.
    ///
    /// Scoring texts are built from the same list that scores are zipped
    /// back onto: one canonical ordered sequence for the whole batch; no
    /// re-derived copy may sit between text construction and score
    /// assignment. A score vector of any other length is rejected.
    ///
    /// With the reranker disabled, the input passes through truncated to
    /// `top_k` with scores unchanged.
    pub async fn score_and_prune(
        &self,
        query: &str,
        candidates: Vec<Candidate>,
        top_k: usize,
    ) -> Result<Vec<Candidate>> {
        if candidates.is_empty() {
            return Ok(vec![]);
        }

        if !self.use_reranker {
            let mut passthrough = candidates;
            passthrough.truncate(top_k);
            return Ok(passthrough);
        }

        let texts: Vec<String> = candidates.iter().map(Candidate::scoring_text).collect();
        let scores = self.model.score(query, &texts).await?;

        if scores.len() != candidates.len() {
            return Err(CogragError::ScoreAlignment {
                expected: candidates.len(),
                actual: scores.len(),
            });
        }

        let mut scored: Vec<Candidate> = candidates
            .into_iter()
            .zip(scores)
            .map(|(candidate, score)| candidate.with_score(score))
            .collect();

        // Stable sort: ties keep their input order
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(top_k);

        debug!(
            model = self.model.model_name(),
            kept = scored.len(),
            "rerank complete"
        );

        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cograg_common::candidate::{CandidateSource, RawHit};
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn candidate(id: &str, name: &str, description: &str) -> Candidate {
        let hit = RawHit {
            metadata: json!({"id": id, "name": name, "description": description})
                .as_object()
                .cloned()
                .unwrap_or_default(),
            ..Default::default()
        };
        Candidate::from_raw(&hit, CandidateSource::Vector).unwrap()
    }

    /// Scorer that records whether it was invoked and replays fixed scores
    struct FixedScorer {
        scores: Vec<f32>,
        called: AtomicBool,
    }

    impl FixedScorer {
        fn new(scores: Vec<f32>) -> Self {
            Self {
                scores,
                called: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl RerankModel for FixedScorer {
        async fn score(&self, _query: &str, _texts: &[String]) -> Result<Vec<f32>> {
            self.called.store(true, Ordering::SeqCst);
            Ok(self.scores.clone())
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    #[tokio::test]
    async fn test_scores_follow_candidate_identity() {
        // The third input gets the highest score and must surface first.
        let scorer = Arc::new(FixedScorer::new(vec![0.1, 0.2, 0.9]));
        let adapter = RerankerAdapter::new(scorer, true);

        let candidates = vec![
            candidate("a", "Alpha", "first"),
            candidate("b", "Beta", "second"),
            candidate("c", "Gamma", "third"),
        ];

        let ranked = adapter
            .score_and_prune("query", candidates, 3)
            .await
            .unwrap();
        assert_eq!(ranked[0].id, "c");
        assert_eq!(ranked[0].score, 0.9);
        assert_eq!(ranked[2].id, "a");
    }

    #[tokio::test]
    async fn test_misaligned_score_count_is_rejected() {
        let scorer = Arc::new(FixedScorer::new(vec![0.5]));
        let adapter = RerankerAdapter::new(scorer, true);

        let candidates = vec![candidate("a", "A", ""), candidate("b", "B", "")];
        let err = adapter
            .score_and_prune("query", candidates, 5)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CogragError::ScoreAlignment {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[tokio::test]
    async fn test_empty_input_skips_the_scorer() {
        let scorer = Arc::new(FixedScorer::new(vec![]));
        let adapter = RerankerAdapter::new(scorer.clone(), true);

        let ranked = adapter.score_and_prune("query", vec![], 5).await.unwrap();
        assert!(ranked.is_empty());
        assert!(!scorer.called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_disabled_reranker_is_passthrough() {
        let scorer = Arc::new(FixedScorer::new(vec![0.9, 0.8, 0.7]));
        let adapter = RerankerAdapter::new(scorer.clone(), false);

        let candidates = vec![
            candidate("a", "A", "").with_score(0.3),
            candidate("b", "B", "").with_score(0.1),
            candidate("c", "C", "").with_score(0.2),
        ];

        let kept = adapter
            .score_and_prune("query", candidates, 2)
            .await
            .unwrap();
        // Truncated, original order and scores untouched, scorer never called
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].id, "a");
        assert_eq!(kept[0].score, 0.3);
        assert_eq!(kept[1].id, "b");
        assert!(!scorer.called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_pruning_is_idempotent() {
        // Deterministic scorer: longer description scores higher.
        let adapter = RerankerAdapter::new(Arc::new(HeuristicRerankModel), true);

        let candidates = vec![
            candidate("a", "A", "a much longer description"),
            candidate("b", "B", "short"),
            candidate("c", "C", "medium length"),
            candidate("d", "D", "x"),
        ];

        let once = adapter
            .score_and_prune("query", candidates, 3)
            .await
            .unwrap();
        let twice = adapter
            .score_and_prune("query", once.clone(), 3)
            .await
            .unwrap();
        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn test_ties_keep_input_order() {
        let scorer = Arc::new(FixedScorer::new(vec![0.5, 0.5, 0.5]));
        let adapter = RerankerAdapter::new(scorer, true);

        let candidates = vec![
            candidate("first", "F", ""),
            candidate("second", "S", ""),
            candidate("third", "T", ""),
        ];

        let ranked = adapter
            .score_and_prune("query", candidates, 3)
            .await
            .unwrap();
        let ids: Vec<&str> = ranked.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }
}
