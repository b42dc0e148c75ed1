//! In-memory inverted index over stemmed tokens.
//!
//! One `FtsIndex` is one generation: document ids are dense integers
//! assigned in insertion order and are only meaningful within the
//! generation that produced them. Rebuilds create a fresh index and a
//! fresh id space. Per-field posting data, token positions, the trie, the
//! link graph, and synonym correlations are all populated by `add`; after
//! the build the structure is only read.

use std::cell::Cell;
use std::collections::{BTreeSet, HashMap};

use super::query::DocFilter;
use super::stem::stem;
use super::text::{is_stop_word, tokenize};
use super::trie::Trie;

/// Canonical field configuration: (name, multiplicative weight).
pub const FIELD_WEIGHTS: &[(&str, f64)] = &[
    ("text", 1.0),
    ("headings", 5.0),
    ("title", 10.0),
    ("tags", 75.0),
];

/// A document handed to the index, already flattened from its manifest.
#[derive(Debug, Clone)]
pub struct IndexableDocument {
    pub search_property: String,
    pub url: String,
    pub links: Vec<String>,
    pub weight: f64,
    pub include_in_global_search: bool,
    pub title: String,
    pub preview: String,
    /// Field name -> raw text for each configured field.
    pub fields: HashMap<String, String>,
}

/// Display metadata retained per document.
#[derive(Debug, Clone)]
pub struct DocumentMeta {
    pub search_property: String,
    pub include_in_global_search: bool,
    pub title: String,
    pub preview: String,
    pub url: String,
}

/// Per-field record of one document.
#[derive(Debug, Default)]
pub struct DocumentEntry {
    pub len: u64,
    pub term_frequencies: HashMap<String, u64>,
}

/// One named field bucket with its scoring weight.
#[derive(Debug)]
pub struct Field {
    pub name: String,
    pub weight: f64,
    pub documents: HashMap<u32, DocumentEntry>,
    pub total_tokens_seen: u64,
    length_weight: Cell<Option<f64>>,
}

impl Field {
    fn new(name: &str, weight: f64) -> Field {
        Field {
            name: name.to_string(),
            weight,
            documents: HashMap::new(),
            total_tokens_seen: 0,
            length_weight: Cell::new(None),
        }
    }

    /// `|docs| / Σ |unique terms per doc|`, computed on first use after the
    /// build.
    pub fn length_weight(&self) -> f64 {
        if let Some(cached) = self.length_weight.get() {
            return cached;
        }
        let unique_total: u64 = self
            .documents
            .values()
            .map(|entry| entry.term_frequencies.len() as u64)
            .sum();
        let weight = if unique_total == 0 {
            0.0
        } else {
            self.documents.len() as f64 / unique_total as f64
        };
        self.length_weight.set(Some(weight));
        weight
    }
}

/// Cross-field statistics for one token.
#[derive(Debug, Default)]
pub struct TermEntry {
    /// Documents containing the token, each listed once.
    pub docs: Vec<u32>,
    /// Field name -> number of documents in which the token appears.
    pub times_appeared: HashMap<String, u64>,
    /// Document -> global token positions, strictly increasing.
    pub positions: HashMap<u32, Vec<u64>>,
}

pub struct FtsIndex {
    pub fields: Vec<Field>,
    pub terms: HashMap<String, TermEntry>,
    pub trie: Trie,
    correlations: HashMap<String, Vec<(String, f64)>>,
    pub documents: Vec<DocumentMeta>,
    pub document_weights: Vec<f64>,
    /// url -> urls it links to.
    pub outgoing: HashMap<String, BTreeSet<String>>,
    /// url -> urls linking to it.
    pub incoming: HashMap<String, BTreeSet<String>>,
    pub url_to_id: HashMap<String, u32>,
    /// Global position counter; bumped an extra step between fields so
    /// phrase adjacency never spans a field boundary.
    position: u64,
}

/// Directory-style urls and their index.html form are the same document.
pub fn normalize_url(url: &str) -> String {
    url.strip_suffix("/index.html").unwrap_or(url).to_string()
}

/// Canonical correlation-table key for a word or word pair: tokenize (so
/// atomic phrases join), stem each token, join with a space.
pub fn correlation_key(text: &str) -> String {
    tokenize(text, false)
        .iter()
        .map(|t| stem(t))
        .collect::<Vec<_>>()
        .join(" ")
}

impl FtsIndex {
    pub fn new() -> FtsIndex {
        FtsIndex::with_fields(FIELD_WEIGHTS)
    }

    pub fn with_fields(weights: &[(&str, f64)]) -> FtsIndex {
        FtsIndex {
            fields: weights.iter().map(|(n, w)| Field::new(n, *w)).collect(),
            terms: HashMap::new(),
            trie: Trie::new(),
            correlations: HashMap::new(),
            documents: Vec::new(),
            document_weights: Vec::new(),
            outgoing: HashMap::new(),
            incoming: HashMap::new(),
            url_to_id: HashMap::new(),
            position: 0,
        }
    }

    /// Register a synonym, stemming both sides: `stem(word)` maps to
    /// `(stem(synonym), closeness)`. `word` may be a bigram; its stems are
    /// joined by a space. Targets that are indexed unstemmed (sigil
    /// tokens) must go through `correlate_token` instead, or the stored
    /// synonym can drift away from what the trie actually holds.
    pub fn correlate_word(&mut self, word: &str, synonym: &str, closeness: f64) {
        let key = correlation_key(word);
        if key.is_empty() {
            return;
        }
        self.correlations
            .entry(key)
            .or_default()
            .push((stem(synonym), closeness));
    }

    /// Register a correlation whose target is an indexed token kept
    /// exactly as written. Only the key side is stemmed.
    fn correlate_token(&mut self, word: &str, token: &str, closeness: f64) {
        let key = correlation_key(word);
        if key.is_empty() {
            return;
        }
        self.correlations
            .entry(key)
            .or_default()
            .push((token.to_string(), closeness));
    }

    /// Add a document; returns its id within this generation.
    pub fn add(&mut self, doc: IndexableDocument) -> u32 {
        let doc_id = self.documents.len() as u32;
        let url = normalize_url(&doc.url);

        if !url.is_empty() {
            self.url_to_id.insert(url.clone(), doc_id);
            for link in &doc.links {
                let target = normalize_url(link);
                self.outgoing
                    .entry(url.clone())
                    .or_default()
                    .insert(target.clone());
                self.incoming.entry(target).or_default().insert(url.clone());
            }
        }

        self.document_weights.push(doc.weight);

        for field_index in 0..self.fields.len() {
            let field_name = self.fields[field_index].name.clone();
            let text = match doc.fields.get(&field_name) {
                Some(text) if !text.is_empty() => text,
                _ => continue,
            };

            let mut indexed = 0u64;
            for token in tokenize(text, true) {
                if is_stop_word(&token) {
                    continue;
                }

                // Sigil tokens are indexed verbatim and correlated back to
                // their bare form. The correlation target must be the
                // token as indexed, never its stem.
                let term = if token.starts_with('$') || token.starts_with('%') {
                    let bare = if let Some(rest) = token.strip_prefix("%%") {
                        rest.to_string()
                    } else {
                        token[1..].to_string()
                    };
                    if !bare.is_empty() {
                        self.correlate_token(&bare, &token, 0.9);
                    }
                    token
                } else {
                    stem(&token)
                };

                let entry = self.terms.entry(term.clone()).or_default();
                let field = &mut self.fields[field_index];
                let doc_entry = field.documents.entry(doc_id).or_default();

                if !doc_entry.term_frequencies.contains_key(&term) {
                    *entry.times_appeared.entry(field_name.clone()).or_insert(0) += 1;
                    if !entry.docs.contains(&doc_id) {
                        entry.docs.push(doc_id);
                    }
                }

                entry.positions.entry(doc_id).or_default().push(self.position);
                self.position += 1;

                *doc_entry.term_frequencies.entry(term.clone()).or_insert(0) += 1;
                doc_entry.len += 1;
                indexed += 1;

                self.trie.insert(&term, doc_id);
            }

            self.fields[field_index].total_tokens_seen += indexed;
            // Separator bump: tokens at a field boundary must not look
            // adjacent to the phrase filter.
            self.position += 1;
        }

        self.documents.push(DocumentMeta {
            search_property: doc.search_property,
            include_in_global_search: doc.include_in_global_search,
            title: doc.title,
            preview: doc.preview,
            url,
        });

        doc_id
    }

    /// Expand query terms through the correlation table.
    ///
    /// Seeds every stemmed query term at weight 1, merges correlations for
    /// each term and each adjacent bigram (taking the max weight), then
    /// applies the table once more over the produced set so one transitive
    /// hop is honored.
    pub fn collect_correlations(&self, query_terms: &[String]) -> Vec<(String, f64)> {
        let mut ordered: Vec<String> = Vec::new();
        let mut weights: HashMap<String, f64> = HashMap::new();

        let stems: Vec<String> = query_terms.iter().map(|t| stem(t)).collect();
        for s in &stems {
            if weights.insert(s.clone(), 1.0).is_none() {
                ordered.push(s.clone());
            }
        }

        // Bigram probes go through the same keying as `correlate_word`, so
        // atomic phrases land on their joined-token key.
        let mut probe_keys = stems.clone();
        for pair in query_terms.windows(2) {
            probe_keys.push(correlation_key(&format!("{} {}", pair[0], pair[1])));
        }

        for key in &probe_keys {
            self.merge_correlations(key, &mut ordered, &mut weights);
        }

        let produced = ordered.clone();
        for key in &produced {
            self.merge_correlations(key, &mut ordered, &mut weights);
        }

        ordered
            .into_iter()
            .map(|term| {
                let weight = weights[&term];
                (term, weight)
            })
            .collect()
    }

    fn merge_correlations(
        &self,
        key: &str,
        ordered: &mut Vec<String>,
        weights: &mut HashMap<String, f64>,
    ) {
        let Some(synonyms) = self.correlations.get(key) else {
            return;
        };
        for (synonym, closeness) in synonyms {
            match weights.get_mut(synonym) {
                Some(existing) => *existing = existing.max(*closeness),
                None => {
                    weights.insert(synonym.clone(), *closeness);
                    ordered.push(synonym.clone());
                }
            }
        }
    }

    /// Does the filter admit this document?
    pub fn admits(&self, filter: &DocFilter, doc_id: u32) -> bool {
        let Some(meta) = self.documents.get(doc_id as usize) else {
            return false;
        };
        match filter {
            DocFilter::Properties(set) => set.contains(&meta.search_property),
            DocFilter::GlobalSearch => meta.include_in_global_search,
        }
    }

    pub fn doc_count(&self) -> usize {
        self.documents.len()
    }
}

impl Default for FtsIndex {
    fn default() -> Self {
        FtsIndex::new()
    }
}
