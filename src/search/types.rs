use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One ranked document summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub preview: String,
    pub url: String,
}

/// Body of a `/search` response. Errors are returned with this body empty
/// and the HTTP code carrying the outcome.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    #[serde(rename = "spellingCorrections")]
    pub spelling_corrections: HashMap<String, String>,
}
