//! Manifest JSON model.
//!
//! Each search property publishes one manifest enumerating its documents.
//! `ParsedManifest` pairs the deserialized body with the property tag
//! derived from the manifest's filename.

use serde::Deserialize;
use std::collections::HashMap;
use std::time::SystemTime;

use crate::fts::index::IndexableDocument;

#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    /// Base URL of the property; trailing slashes are stripped.
    pub url: String,
    /// Alternate tags resolving to this property.
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default, rename = "includeInGlobalSearch")]
    pub include_in_global_search: bool,
    pub documents: Vec<ManifestDocument>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestDocument {
    /// Appended to the manifest url to form the document URL.
    pub slug: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub preview: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub headings: Vec<String>,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

/// Raw manifest returned by a fetcher, before parsing.
#[derive(Debug, Clone)]
pub struct FetchedManifest {
    pub search_property: String,
    pub body: String,
    pub last_modified: SystemTime,
}

/// A manifest parsed and tagged with its search property.
#[derive(Debug, Clone)]
pub struct ParsedManifest {
    pub search_property: String,
    pub manifest: Manifest,
}

impl ParsedManifest {
    pub fn parse(fetched: &FetchedManifest) -> anyhow::Result<ParsedManifest> {
        let manifest: Manifest = serde_json::from_str(&fetched.body)?;
        Ok(ParsedManifest {
            search_property: fetched.search_property.clone(),
            manifest,
        })
    }

    /// Flatten the manifest into index-ready documents.
    pub fn indexable_documents(&self) -> Vec<IndexableDocument> {
        let base_url = self.manifest.url.trim_end_matches('/');
        self.manifest
            .documents
            .iter()
            .map(|doc| {
                let url = format!("{}/{}", base_url, doc.slug.trim_start_matches('/'));
                let mut fields = HashMap::new();
                fields.insert("title".to_string(), doc.title.clone());
                fields.insert("headings".to_string(), doc.headings.join(" "));
                fields.insert("text".to_string(), doc.text.clone());
                fields.insert("tags".to_string(), doc.tags.clone());
                IndexableDocument {
                    search_property: self.search_property.clone(),
                    url,
                    links: doc.links.clone(),
                    weight: doc.weight,
                    include_in_global_search: self.manifest.include_in_global_search,
                    title: doc.title.clone(),
                    preview: doc.preview.clone(),
                    fields,
                }
            })
            .collect()
    }
}
