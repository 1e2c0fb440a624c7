//! Seed entity extraction from query text
//!
//! A lightweight heuristic that turns a natural-language question into
//! knowledge-graph lookup seeds: capitalized phrases are grouped into
//! multi-word entities, remaining content words survive stop-word filtering.

/// Maximum seeds handed to the graph backend per query
const MAX_SEEDS: usize = 5;

/// Extract seed entity strings from a query, best candidates first.
///
/// Capitalized runs ("Tom Hanks", "Forrest Gump") are grouped into phrases
/// and preferred over loose content words.
pub fn extract_seed_entities(query: &str) -> Vec<String> {
    let words: Vec<&str> = query.split_whitespace().collect();

    let mut phrases: Vec<String> = Vec::new();
    let mut terms: Vec<String> = Vec::new();
    let mut current_phrase: Vec<String> = Vec::new();

    for (i, word) in words.iter().enumerate() {
        let clean: String = word.chars().filter(|c| c.is_alphanumeric()).collect();
        if clean.is_empty() {
            continue;
        }

        // Capitalized non-leading words open or extend a phrase; the first
        // word of a question is capitalized by convention, not by naming.
        let is_capitalized = clean.chars().next().map_or(false, |c| c.is_uppercase());
        if is_capitalized && i > 0 {
            current_phrase.push(clean);
            continue;
        }

        if !current_phrase.is_empty() {
            phrases.push(current_phrase.join(" "));
            current_phrase.clear();
        }

        let lower = clean.to_lowercase();
        if lower.len() > 3 && !is_stop_word(&lower) {
            terms.push(lower);
        }
    }
    if !current_phrase.is_empty() {
        phrases.push(current_phrase.join(" "));
    }

    let mut seeds = phrases;
    for term in terms {
        if !seeds.iter().any(|s| s.to_lowercase() == term) {
            seeds.push(term);
        }
    }
    seeds.truncate(MAX_SEEDS);
    seeds
}

fn is_stop_word(word: &str) -> bool {
    const STOP_WORDS: &[&str] = &[
        "a", "an", "the", "is", "are", "was", "were", "be", "been", "in", "on", "at", "to",
        "for", "of", "with", "by", "from", "and", "or", "but", "not", "this", "that", "these",
        "those", "it", "its", "as", "do", "does", "did", "has", "have", "had", "can", "could",
        "will", "would", "should", "may", "might", "who", "whom", "what", "which", "when",
        "where", "why", "how",
    ];
    STOP_WORDS.contains(&word)
}
