//! Manifest Module Tests
//!
//! Covers the source-string grammar, property derivation from filenames,
//! the directory fetcher, and manifest JSON parsing with defaults.

#[cfg(test)]
mod tests {
    use crate::manifest::fetcher::{property_from_path, ManifestFetcher, ManifestSource};
    use crate::manifest::types::{FetchedManifest, ParsedManifest};
    use std::str::FromStr;
    use std::time::SystemTime;

    const SAMPLE_MANIFEST: &str = r#"{
        "url": "https://docs.example.com/manual/",
        "aliases": ["manual-current"],
        "includeInGlobalSearch": true,
        "documents": [
            {
                "slug": "/tutorial/install",
                "title": "Install the Server",
                "preview": "How to install.",
                "text": "Download and install the server.",
                "tags": "install setup",
                "headings": ["Install", "Verify"],
                "links": ["https://docs.example.com/manual/tutorial/verify"],
                "weight": 2
            },
            {
                "slug": "reference/config",
                "title": "Configuration Reference",
                "preview": "All options.",
                "text": "Every configuration option.",
                "tags": "",
                "headings": [],
                "links": []
            }
        ]
    }"#;

    fn fetched(body: &str) -> FetchedManifest {
        FetchedManifest {
            search_property: "manual-master".to_string(),
            body: body.to_string(),
            last_modified: SystemTime::now(),
        }
    }

    // ============================================================
    // SOURCE STRING TESTS
    // ============================================================

    #[test]
    fn test_source_dir() {
        let source = ManifestSource::from_str("dir:/srv/manifests").unwrap();
        assert_eq!(source, ManifestSource::Dir("/srv/manifests".into()));
    }

    #[test]
    fn test_source_bucket() {
        let source = ManifestSource::from_str("bucket:docs-search/prod/manifests").unwrap();
        assert_eq!(
            source,
            ManifestSource::Bucket {
                bucket: "docs-search".to_string(),
                prefix: "prod/manifests".to_string(),
            }
        );
    }

    #[test]
    fn test_source_rejects_unknown_scheme() {
        assert!(ManifestSource::from_str("ftp:whatever").is_err());
        assert!(ManifestSource::from_str("dir:").is_err());
        assert!(ManifestSource::from_str("bucket:no-prefix").is_err());
        assert!(ManifestSource::from_str("bucket:/prefix-only").is_err());
    }

    // ============================================================
    // PROPERTY DERIVATION TESTS
    // ============================================================

    #[test]
    fn test_property_from_path() {
        assert_eq!(
            property_from_path("prod/manifests/atlas-master.json"),
            Some("atlas-master".to_string())
        );
        assert_eq!(
            property_from_path("bi-connector-master.json"),
            Some("bi-connector-master".to_string())
        );
        assert_eq!(property_from_path("README.md"), None);
        assert_eq!(property_from_path("nested/dir/"), None);
    }

    // ============================================================
    // MANIFEST PARSING TESTS
    // ============================================================

    #[test]
    fn test_parse_manifest_with_defaults() {
        let parsed = ParsedManifest::parse(&fetched(SAMPLE_MANIFEST)).unwrap();
        assert_eq!(parsed.search_property, "manual-master");
        assert_eq!(parsed.manifest.aliases, vec!["manual-current"]);
        assert!(parsed.manifest.include_in_global_search);
        assert_eq!(parsed.manifest.documents.len(), 2);
        assert_eq!(parsed.manifest.documents[0].weight, 2.0);
        // weight defaults to 1 when omitted
        assert_eq!(parsed.manifest.documents[1].weight, 1.0);
    }

    #[test]
    fn test_parse_manifest_rejects_missing_url() {
        let err = ParsedManifest::parse(&fetched(r#"{"documents": []}"#));
        assert!(err.is_err());
    }

    #[test]
    fn test_parse_manifest_optional_include_flag() {
        let body = r#"{"url": "https://docs.example.com", "documents": []}"#;
        let parsed = ParsedManifest::parse(&fetched(body)).unwrap();
        assert!(!parsed.manifest.include_in_global_search);
        assert!(parsed.manifest.aliases.is_empty());
    }

    #[test]
    fn test_indexable_documents_join_urls_and_headings() {
        let parsed = ParsedManifest::parse(&fetched(SAMPLE_MANIFEST)).unwrap();
        let docs = parsed.indexable_documents();

        // trailing slash on the base and leading slash on the slug collapse
        assert_eq!(docs[0].url, "https://docs.example.com/manual/tutorial/install");
        assert_eq!(docs[1].url, "https://docs.example.com/manual/reference/config");

        assert_eq!(docs[0].fields["headings"], "Install Verify");
        assert_eq!(docs[0].fields["title"], "Install the Server");
        assert!(docs[0].include_in_global_search);
        assert_eq!(docs[0].weight, 2.0);
    }

    // ============================================================
    // DIRECTORY FETCHER TESTS
    // ============================================================

    #[tokio::test]
    async fn test_dir_fetcher_reads_manifests_and_reports_strays() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("atlas-master.json"), SAMPLE_MANIFEST).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a manifest").unwrap();

        let source = ManifestSource::Dir(dir.path().to_path_buf());
        let fetcher = ManifestFetcher::for_source(&source);
        let outcome = fetcher.fetch().await.unwrap();

        assert_eq!(outcome.manifests.len(), 1);
        assert_eq!(outcome.manifests[0].search_property, "atlas-master");
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].contains("notes.txt"));
    }

    #[tokio::test]
    async fn test_dir_fetcher_missing_directory_is_fatal() {
        let source = ManifestSource::Dir("/definitely/not/here".into());
        let fetcher = ManifestFetcher::for_source(&source);
        assert!(fetcher.fetch().await.is_err());
    }
}
