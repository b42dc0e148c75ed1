//! Query string parsing.
//!
//! A raw query is a mix of bare terms and quoted phrases. An unterminated
//! opening quote still counts: its body is treated as a phrase, as if the
//! user had closed it. Mandatory terms behave as if quoted even when bare.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use super::stem::stem;
use super::text::{is_stop_word, MANDATORY_TERMS};

static WORD_SPLIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\W+").unwrap());

/// Which documents a query is allowed to match.
#[derive(Debug, Clone)]
pub enum DocFilter {
    /// Documents whose search property is in the set.
    Properties(HashSet<String>),
    /// Documents flagged for global search.
    GlobalSearch,
}

/// A parsed query.
#[derive(Debug)]
pub struct Query {
    /// Ordered, deduplicated, lowercased terms (phrase words included).
    pub terms: Vec<String>,
    /// Quoted phrase literals, lowercased.
    pub phrases: Vec<String>,
    /// Per phrase, the stems of its non-stop-word tokens, in order.
    pub stemmed_phrases: Vec<Vec<String>>,
    /// Document admission predicate, assigned by the searcher.
    pub filter: DocFilter,
}

impl Query {
    pub fn parse(raw: &str) -> Query {
        let lowered = raw.to_lowercase();

        // Odd-numbered segments of a quote split are phrase bodies; a
        // trailing unterminated quote lands there too.
        let mut phrases = Vec::new();
        for (i, segment) in lowered.split('"').enumerate() {
            if i % 2 == 1 && !segment.trim().is_empty() {
                phrases.push(segment.to_string());
            }
        }

        let mut terms = Vec::new();
        let mut seen = HashSet::new();
        for word in WORD_SPLIT.split(&lowered) {
            if !word.is_empty() && seen.insert(word.to_string()) {
                terms.push(word.to_string());
            }
        }

        let mut stemmed_phrases: Vec<Vec<String>> = phrases
            .iter()
            .map(|phrase| {
                WORD_SPLIT
                    .split(phrase)
                    .filter(|word| !word.is_empty() && !is_stop_word(word))
                    .map(stem)
                    .collect::<Vec<_>>()
            })
            .filter(|stems: &Vec<String>| !stems.is_empty())
            .collect();

        // Mandatory terms are rewritten into single-word phrases so the
        // adjacency filter requires them verbatim.
        for term in &terms {
            if MANDATORY_TERMS.contains(&term.as_str()) {
                let single = vec![stem(term)];
                if !stemmed_phrases.contains(&single) {
                    stemmed_phrases.push(single);
                }
            }
        }

        Query {
            terms,
            phrases,
            stemmed_phrases,
            filter: DocFilter::GlobalSearch,
        }
    }
}
