//! Think-phase prompt construction

use cograg_common::candidate::Candidate;

/// Context entries shown to the model per hop
const CONTEXT_SUMMARY_LIMIT: usize = 5;

/// Description preview length per context entry
const DESCRIPTION_PREVIEW_CHARS: usize = 50;

/// Build the think-phase prompt from the query, the current working set,
/// and the hypothesis history.
pub fn build_think_prompt(query: &str, context: &[Candidate], hypotheses: &[String]) -> String {
    let context_summary: Vec<String> = context
        .iter()
        .take(CONTEXT_SUMMARY_LIMIT)
        .map(|c| {
            let preview: String = c.description.chars().take(DESCRIPTION_PREVIEW_CHARS).collect();
            format!("- {} ({})", c.name, preview)
        })
        .collect();

    let hypotheses_block = if hypotheses.is_empty() {
        "(none)".to_string()
    } else {
        hypotheses.join("; ")
    };

    format!(
        "You are a Knowledge Graph Reasoning Agent.\n\
         Query: {query}\n\
         \n\
         Current known entities:\n\
         {entities}\n\
         \n\
         Previous hypotheses: {hypotheses}\n\
         \n\
         Task: Analyze and determine the next step.\n\
         Format:\n\
         HYPOTHESIS: <working hypothesis>\n\
         MISSING: <missing info>\n\
         ACTION: <ANSWER_FOUND: answer | EXPAND: relation/entity>",
        query = query,
        entities = context_summary.join("\n"),
        hypotheses = hypotheses_block,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use cograg_common::candidate::{CandidateSource, RawHit};

    fn candidate(name: &str, description: &str) -> Candidate {
        let hit = RawHit {
            id: Some(name.to_string()),
            name: Some(name.to_string()),
            description: Some(description.to_string()),
            ..Default::default()
        };
        Candidate::from_raw(&hit, CandidateSource::Vector).unwrap()
    }

    #[test]
    fn test_prompt_contains_query_and_entities() {
        let context = vec![candidate("Inception", "2010 science fiction film")];
        let prompt = build_think_prompt("who directed Inception?", &context, &[]);

        assert!(prompt.contains("Query: who directed Inception?"));
        assert!(prompt.contains("- Inception (2010 science fiction film)"));
        assert!(prompt.contains("Previous hypotheses: (none)"));
    }

    #[test]
    fn test_prompt_truncates_long_descriptions() {
        let long = "x".repeat(500);
        let context = vec![candidate("Node", &long)];
        let prompt = build_think_prompt("q", &context, &[]);

        assert!(prompt.contains(&"x".repeat(50)));
        assert!(!prompt.contains(&"x".repeat(51)));
    }

    #[test]
    fn test_prompt_limits_context_entries() {
        let context: Vec<Candidate> = (0..10)
            .map(|i| candidate(&format!("node-{i}"), ""))
            .collect();
        let prompt = build_think_prompt("q", &context, &[]);

        assert!(prompt.contains("node-4"));
        assert!(!prompt.contains("node-5"));
    }

    #[test]
    fn test_prompt_carries_hypotheses() {
        let prompt = build_think_prompt("q", &[], &["first guess".into(), "second".into()]);
        assert!(prompt.contains("first guess; second"));
    }
}
