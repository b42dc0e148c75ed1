//! Tokenization and the fixed lexical tables.
//!
//! `tokenize` turns raw field text or query text into the canonical token
//! stream: lowercased components split on anything outside the indexable
//! character class, with sigil expansion and atomic-phrase joining applied
//! before length filtering. Stop-word removal is NOT done here; the index
//! and the query parser filter stop words at the point where they stem.

/// Word pairs indexed as a single token. The first word maps to the second;
/// when they appear adjacently the tokenizer emits `"first second"`.
pub const ATOMIC_PHRASES: &[(&str, &str)] = &[
    ("ops", "manager"),
    ("cloud", "manager"),
    ("real", "time"),
];

/// Bare query terms that behave as if the user had quoted them.
pub const MANDATORY_TERMS: &[&str] = &["realm", "atlas", "compass"];

const STOP_WORDS: &[&str] = &[
    "a", "able", "about", "across", "after", "all", "almost", "also", "am",
    "among", "an", "and", "any", "are", "as", "at", "be", "because", "been",
    "but", "by", "can", "cannot", "could", "dear", "did", "do", "does",
    "either", "else", "ever", "every", "for", "from", "get", "got", "had",
    "has", "have", "he", "her", "hers", "him", "his", "how", "however", "i",
    "if", "in", "into", "is", "it", "its", "just", "least", "let", "like",
    "likely", "may", "me", "might", "most", "must", "my", "neither", "no",
    "nor", "not", "of", "off", "often", "on", "only", "or", "other", "our",
    "own", "rather", "said", "say", "says", "she", "should", "since", "so",
    "some", "than", "that", "the", "their", "them", "then", "there", "these",
    "they", "this", "tis", "to", "too", "twas", "us", "wants", "was", "we",
    "were", "what", "when", "where", "which", "while", "who", "whom", "why",
    "will", "with", "would", "yet", "you", "your",
];

/// Membership in the fixed English stop list.
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.binary_search(&word).is_ok()
}

/// Look up the atomic phrase starting with `first`, if any.
fn atomic_phrase_second(first: &str) -> Option<&'static str> {
    ATOMIC_PHRASES
        .iter()
        .find(|(f, _)| *f == first)
        .map(|(_, s)| *s)
}

/// Is `word` an atomic phrase token (`"ops manager"` etc.)?
pub fn is_atomic_phrase(word: &str) -> bool {
    word.split_once(' ')
        .map(|(f, s)| atomic_phrase_second(f) == Some(s))
        .unwrap_or(false)
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '%' | '.')
}

/// Tokenize `text` into the canonical stream.
///
/// Splits on runs of characters outside `[A-Za-z0-9_$%.]`, lowercases, and
/// strips leading/trailing dots. A bare `$` expands to the two tokens
/// `positional` and `operator`. Adjacent atomic-phrase words join into one
/// token. Components of length 1 are dropped. With `fuzzy`, a component
/// containing `.` additionally yields each dotted sub-component (in order,
/// after the full token).
pub fn tokenize(text: &str, fuzzy: bool) -> Vec<String> {
    let components: Vec<String> = text
        .split(|c: char| !is_token_char(c))
        .map(|part| part.to_lowercase())
        .map(|part| part.trim_matches('.').to_string())
        .filter(|part| !part.is_empty())
        .collect();

    let mut tokens = Vec::with_capacity(components.len());
    let mut i = 0;
    while i < components.len() {
        let component = &components[i];

        if component == "$" {
            tokens.push("positional".to_string());
            tokens.push("operator".to_string());
            i += 1;
            continue;
        }

        if let Some(second) = atomic_phrase_second(component) {
            if components.get(i + 1).map(String::as_str) == Some(second) {
                tokens.push(format!("{} {}", component, second));
                i += 2;
                continue;
            }
        }

        if component.len() > 1 {
            tokens.push(component.clone());
            if fuzzy && component.contains('.') {
                for sub in component.split('.') {
                    if sub.len() > 1 {
                        tokens.push(sub.to_string());
                    }
                }
            }
        }
        i += 1;
    }

    tokens
}

#[cfg(test)]
mod table_tests {
    use super::*;

    #[test]
    fn stop_words_are_sorted_for_binary_search() {
        let mut sorted = STOP_WORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, STOP_WORDS);
    }
}
