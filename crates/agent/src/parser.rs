//! Tolerant parser for language-model responses
//!
//! Handles both the structured HYPOTHESIS/ACTION format and free-form prose.
//! Parsing is total: malformed output degrades to a "keep expanding"
//! directive instead of failing the session.

use regex_lite::Regex;

/// What the think phase decided
#[derive(Debug, Clone, PartialEq)]
pub enum ThinkAction {
    /// The model reported a final answer
    AnswerFound { answer: String },
    /// Keep searching, optionally along a named relation or entity
    Expand { target: String },
}

/// Parsed think-phase output
#[derive(Debug, Clone, PartialEq)]
pub struct ThinkDirective {
    /// Working hypothesis extracted from the response (may be empty)
    pub hypothesis: String,

    /// The decided action
    pub action: ThinkAction,
}

/// Fallback expansion target when the model names nothing specific
const GENERIC_TARGET: &str = "generic";

/// Maximum characters kept when a whole response becomes the hypothesis
const HYPOTHESIS_FALLBACK_CHARS: usize = 200;

/// Keywords suggesting the model wants more information
const EXPAND_INDICATORS: &[&str] = &[
    "need to", "should", "must", "require", "missing", "don't know", "unclear", "not sure",
    "expand", "explore",
];

/// Parse a think-phase response. Never fails.
pub fn parse_response(response: &str) -> ThinkDirective {
    // 1. Structured HYPOTHESIS/ACTION format first
    if let Some(directive) = parse_structured(response) {
        return directive;
    }

    // 2. Direct answer patterns in free-form prose
    if let Some(answer) = extract_answer(response) {
        return ThinkDirective {
            hypothesis: format!("Found answer: {}", answer),
            action: ThinkAction::AnswerFound { answer },
        };
    }

    // 3. Default: keep expanding, carrying whatever reasoning we can salvage
    let response_lower = response.to_lowercase();
    let target = if EXPAND_INDICATORS
        .iter()
        .any(|kw| response_lower.contains(kw))
    {
        extract_expansion_target(&response_lower)
    } else {
        GENERIC_TARGET.to_string()
    };

    ThinkDirective {
        hypothesis: extract_hypothesis(response),
        action: ThinkAction::Expand { target },
    }
}

/// Parse the strict HYPOTHESIS/ACTION line format
fn parse_structured(response: &str) -> Option<ThinkDirective> {
    let mut hypothesis = String::new();
    let mut action: Option<ThinkAction> = None;
    let mut found_structured = false;

    for line in response.lines() {
        let line = line.trim();

        if let Some(rest) = line.strip_prefix("HYPOTHESIS:") {
            hypothesis = rest.trim().to_string();
            found_structured = true;
        }

        if let Some(rest) = line.strip_prefix("ACTION:") {
            found_structured = true;
            let rest = rest.trim();
            if let Some(idx) = rest.find("ANSWER_FOUND") {
                let tail = &rest[idx + "ANSWER_FOUND".len()..];
                let answer = tail.trim_start_matches(':').trim().to_string();
                action = Some(ThinkAction::AnswerFound { answer });
            } else if let Some(target) = rest.strip_prefix("EXPAND") {
                let target = target.trim_start_matches(':').trim();
                action = Some(ThinkAction::Expand {
                    target: if target.is_empty() {
                        GENERIC_TARGET.to_string()
                    } else {
                        target.to_string()
                    },
                });
            }
        }

        // Bare ANSWER_FOUND line, outside an ACTION tag
        if let Some(rest) = line.strip_prefix("ANSWER_FOUND:") {
            action = Some(ThinkAction::AnswerFound {
                answer: rest.trim().to_string(),
            });
            found_structured = true;
        }
    }

    if !found_structured {
        return None;
    }

    Some(ThinkDirective {
        hypothesis,
        action: action.unwrap_or(ThinkAction::Expand {
            target: GENERIC_TARGET.to_string(),
        }),
    })
}

/// Try to extract a direct answer from free-form prose
fn extract_answer(response: &str) -> Option<String> {
    let patterns = [
        r"(?i)(?:the\s+)?answer\s+is\s+(.+?)(?:\.|$)",
        r"(?i)(?:it\s+is|it's)\s+(.+?)(?:\.|$)",
        r"(?i)therefore,?\s+(.+?)(?:\.|$)",
        r"(?i)thus,?\s+(.+?)(?:\.|$)",
    ];

    for pattern in patterns {
        let re = Regex::new(pattern).expect("answer pattern is valid");
        if let Some(caps) = re.captures(response) {
            if let Some(m) = caps.get(1) {
                let answer = m.as_str().trim();
                if !answer.is_empty() {
                    return Some(answer.to_string());
                }
            }
        }
    }

    // Quoted entity fallback
    let quoted = Regex::new(r#""([^"]+)""#).expect("quote pattern is valid");
    quoted
        .captures(response)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Extract reasoning from the response: first two sentences, else a prefix
fn extract_hypothesis(response: &str) -> String {
    let sentences: Vec<&str> = response.split('.').collect();
    let hypothesis = sentences
        .iter()
        .take(2)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(". ");

    if !hypothesis.is_empty() {
        return hypothesis;
    }
    response.chars().take(HYPOTHESIS_FALLBACK_CHARS).collect()
}

/// Guess the relation the model wants to follow
fn extract_expansion_target(response_lower: &str) -> String {
    const RELATIONS: &[(&str, &[&str])] = &[
        ("director", &["director", "directed by", "filmmaker"]),
        ("actor", &["actor", "starred", "cast", "starring"]),
        ("spouse", &["spouse", "married", "wife", "husband"]),
        ("genre", &["genre", "type of", "category"]),
        ("year", &["year", "date", "when", "time"]),
    ];

    for (relation, keywords) in RELATIONS {
        if keywords.iter().any(|kw| response_lower.contains(kw)) {
            return relation.to_string();
        }
    }

    GENERIC_TARGET.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_answer_found() {
        let directive = parse_response(
            "HYPOTHESIS: The director is connected to the movie entity.\n\
             MISSING: nothing.\n\
             ACTION: ANSWER_FOUND: Christopher Nolan",
        );
        assert_eq!(
            directive.action,
            ThinkAction::AnswerFound {
                answer: "Christopher Nolan".into()
            }
        );
        assert!(directive.hypothesis.contains("director"));
    }

    #[test]
    fn test_structured_expand_with_target() {
        let directive = parse_response(
            "HYPOTHESIS: Need the director relation.\nACTION: EXPAND: director",
        );
        assert_eq!(
            directive.action,
            ThinkAction::Expand {
                target: "director".into()
            }
        );
    }

    #[test]
    fn test_bare_answer_found_line() {
        let directive = parse_response("ANSWER_FOUND: Forrest Gump");
        assert_eq!(
            directive.action,
            ThinkAction::AnswerFound {
                answer: "Forrest Gump".into()
            }
        );
    }

    #[test]
    fn test_freeform_answer_pattern() {
        let directive = parse_response("After reviewing the context, the answer is Christopher Nolan.");
        assert_eq!(
            directive.action,
            ThinkAction::AnswerFound {
                answer: "Christopher Nolan".into()
            }
        );
    }

    #[test]
    fn test_quoted_entity_fallback() {
        let directive = parse_response("The evidence points to \"Christopher Nolan\" here");
        assert_eq!(
            directive.action,
            ThinkAction::AnswerFound {
                answer: "Christopher Nolan".into()
            }
        );
    }

    #[test]
    fn test_expand_indicator_with_relation() {
        let directive =
            parse_response("I still need to find who the director of this film was");
        assert_eq!(
            directive.action,
            ThinkAction::Expand {
                target: "director".into()
            }
        );
    }

    #[test]
    fn test_garbage_degrades_to_generic_expand() {
        let directive = parse_response("%%%% ???");
        assert_eq!(
            directive.action,
            ThinkAction::Expand {
                target: GENERIC_TARGET.into()
            }
        );
    }

    #[test]
    fn test_empty_response_degrades_to_generic_expand() {
        let directive = parse_response("");
        assert!(matches!(directive.action, ThinkAction::Expand { .. }));
        assert!(directive.hypothesis.is_empty());
    }

    #[test]
    fn test_hypothesis_is_first_two_sentences() {
        let directive = parse_response(
            "Sentence one about evidence. Sentence two narrows it down. Sentence three is noise.",
        );
        assert_eq!(
            directive.hypothesis,
            "Sentence one about evidence. Sentence two narrows it down"
        );
    }
}
