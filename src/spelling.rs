//! Spelling suggestions for query terms.
//!
//! An optional wordlist (one word per line) backs "did you mean" output
//! when a search comes back empty or with a weak top score. Suggestions
//! are the closest dictionary word within edit distance 2, first-listed
//! wins ties.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;

const MAX_EDIT_DISTANCE: usize = 2;

#[derive(Debug)]
pub struct Dictionary {
    words: Vec<String>,
    membership: HashSet<String>,
}

impl Dictionary {
    /// Load a wordlist file: one word per line, case-insensitive,
    /// duplicates ignored.
    pub fn load(path: &Path) -> Result<Dictionary> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read wordlist {:?}", path))?;
        Ok(Dictionary::from_words(raw.lines()))
    }

    pub fn from_words<'a>(words: impl IntoIterator<Item = &'a str>) -> Dictionary {
        let mut list = Vec::new();
        let mut membership = HashSet::new();
        for word in words {
            let word = word.trim().to_lowercase();
            if !word.is_empty() && membership.insert(word.clone()) {
                list.push(word);
            }
        }
        Dictionary {
            words: list,
            membership,
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.membership.contains(word)
    }

    /// Closest dictionary word within the edit-distance bound, or `None`
    /// when the term is already spelled correctly or nothing is close.
    pub fn suggest(&self, term: &str) -> Option<String> {
        let term = term.to_lowercase();
        if self.membership.contains(&term) {
            return None;
        }

        let mut best: Option<(usize, &String)> = None;
        for word in &self.words {
            if word.len().abs_diff(term.len()) > MAX_EDIT_DISTANCE {
                continue;
            }
            let Some(distance) = edit_distance_within(&term, word, MAX_EDIT_DISTANCE) else {
                continue;
            };
            match best {
                Some((best_distance, _)) if best_distance <= distance => {}
                _ => best = Some((distance, word)),
            }
        }
        best.map(|(_, word)| word.clone())
    }
}

/// Levenshtein distance, abandoning rows once every cell exceeds `max`.
fn edit_distance_within(a: &str, b: &str, max: usize) -> Option<usize> {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    for (i, &ca) in a.iter().enumerate() {
        let mut current = vec![i + 1];
        let mut row_min = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            let insertion = current[j] + 1;
            let deletion = previous[j + 1] + 1;
            let cell = substitution.min(insertion).min(deletion);
            row_min = row_min.min(cell);
            current.push(cell);
        }
        if row_min > max {
            return None;
        }
        previous = current;
    }

    let distance = previous[b.len()];
    (distance <= max).then_some(distance)
}
