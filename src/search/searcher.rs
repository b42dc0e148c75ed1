//! Per-worker search facade.
//!
//! A `Searcher` wraps one index generation together with the alias table
//! and property list that generation was built from. Workers replace their
//! searcher wholesale on every sync; nothing here mutates after build.

use std::collections::HashMap;

use crate::error::SearchError;
use crate::fts::index::FtsIndex;
use crate::fts::query::{DocFilter, Query};
use crate::manifest::types::ParsedManifest;
use crate::spelling::Dictionary;

use super::types::{SearchResponse, SearchResult};

/// Queries with more terms than this are rejected outright.
pub const MAXIMUM_TERMS: usize = 10;
/// Top scores at or below this trigger spelling suggestions.
const SPELLING_SCORE_THRESHOLD: f64 = 0.6;

pub struct Searcher {
    index: FtsIndex,
    /// alias -> canonical search property
    aliases: HashMap<String, String>,
    properties: Vec<String>,
}

impl Searcher {
    /// Build one index generation from a manifest snapshot.
    pub fn build(manifests: &[ParsedManifest]) -> Searcher {
        let mut index = FtsIndex::new();
        let mut aliases = HashMap::new();
        let mut properties = Vec::new();

        for manifest in manifests {
            properties.push(manifest.search_property.clone());
            for alias in &manifest.manifest.aliases {
                aliases.insert(alias.clone(), manifest.search_property.clone());
            }
            for doc in manifest.indexable_documents() {
                index.add(doc);
            }
        }

        Searcher {
            index,
            aliases,
            properties,
        }
    }

    pub fn doc_count(&self) -> usize {
        self.index.doc_count()
    }

    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    /// Run a query against this generation.
    pub fn search(
        &self,
        raw_query: &str,
        search_properties: &[String],
        use_hits: bool,
        dictionary: Option<&Dictionary>,
    ) -> Result<SearchResponse, SearchError> {
        let mut query = Query::parse(raw_query);
        if query.terms.is_empty() || query.terms.len() > MAXIMUM_TERMS {
            return Err(SearchError::QueryTooLong);
        }

        let resolved: Vec<String> = search_properties
            .iter()
            .map(|property| {
                self.aliases
                    .get(property)
                    .cloned()
                    .unwrap_or_else(|| property.clone())
            })
            .collect();
        query.filter = if resolved.is_empty() {
            DocFilter::GlobalSearch
        } else {
            DocFilter::Properties(resolved.into_iter().collect())
        };

        let matches = self.index.search(&query, use_hits);
        let results: Vec<SearchResult> = matches
            .iter()
            .map(|m| {
                let meta = &self.index.documents[m.doc_id as usize];
                SearchResult {
                    title: meta.title.clone(),
                    preview: meta.preview.clone(),
                    url: meta.url.clone(),
                }
            })
            .collect();

        let mut spelling_corrections = HashMap::new();
        if let Some(dictionary) = dictionary {
            let weak_results = match matches.first() {
                None => true,
                Some(top) => top.score <= SPELLING_SCORE_THRESHOLD,
            };
            if weak_results {
                for term in &query.terms {
                    if let Some(suggestion) = dictionary.suggest(term) {
                        spelling_corrections.insert(term.clone(), suggestion);
                    }
                }
            }
        }

        Ok(SearchResponse {
            results,
            spelling_corrections,
        })
    }
}
