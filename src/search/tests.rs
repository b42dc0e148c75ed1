//! Search Module Tests
//!
//! Facade-level tests: alias resolution, term limits, property filtering,
//! spelling corrections, response serialization, and the end-to-end
//! reference scenario over two inline manifests.

#[cfg(test)]
mod tests {
    use crate::error::SearchError;
    use crate::manifest::types::{FetchedManifest, ParsedManifest};
    use crate::search::searcher::Searcher;
    use crate::search::types::{SearchResponse, SearchResult};
    use crate::spelling::Dictionary;
    use std::time::SystemTime;

    const ATLAS_MANIFEST: &str = r#"{
        "url": "https://docs.atlas.example.com",
        "aliases": ["atlas-current"],
        "includeInGlobalSearch": true,
        "documents": [
            {
                "slug": "tutorial/connect-via-compass",
                "title": "Connect via Compass",
                "preview": "Use Compass to explore your data.",
                "text": "In the connect dialog choose Compass to connect to your cluster.",
                "tags": "connect compass",
                "headings": ["Connect Dialog"],
                "links": [],
                "weight": 1.5
            },
            {
                "slug": "tutorial/connect-via-driver",
                "title": "Connect via Driver",
                "preview": "Use a driver to connect applications.",
                "text": "In the connect dialog choose Compass to connect to your cluster.",
                "tags": "connect driver",
                "headings": ["Connect Dialog"],
                "links": [],
                "weight": 1.25
            },
            {
                "slug": "tutorial/connect-via-shell",
                "title": "Connect via Shell",
                "preview": "Use the shell to connect interactively.",
                "text": "In the connect dialog choose Compass to connect to your cluster.",
                "tags": "connect shell",
                "headings": ["Connect Dialog"],
                "links": [],
                "weight": 1.0
            },
            {
                "slug": "tutorial/import-data",
                "title": "Import Data",
                "preview": "Bring your data in.",
                "text": "Import your data with the import tooling.",
                "tags": "import",
                "headings": [],
                "links": []
            }
        ]
    }"#;

    const BI_CONNECTOR_MANIFEST: &str = r#"{
        "url": "https://docs.example.com/bi-connector",
        "aliases": [],
        "includeInGlobalSearch": true,
        "documents": [
            {
                "slug": "installation",
                "title": "Connect BI Connector",
                "preview": "Wire up the BI connector.",
                "text": "Connect the BI connector to your cluster.",
                "tags": "bi",
                "headings": [],
                "links": []
            }
        ]
    }"#;

    fn parsed(property: &str, body: &str) -> ParsedManifest {
        ParsedManifest::parse(&FetchedManifest {
            search_property: property.to_string(),
            body: body.to_string(),
            last_modified: SystemTime::now(),
        })
        .unwrap()
    }

    fn reference_searcher() -> Searcher {
        Searcher::build(&[
            parsed("atlas-master", ATLAS_MANIFEST),
            parsed("bi-connector-master", BI_CONNECTOR_MANIFEST),
        ])
    }

    // ============================================================
    // FACADE TESTS
    // ============================================================

    #[test]
    fn test_search_resolves_aliases() {
        let searcher = reference_searcher();

        let direct = searcher
            .search("compass", &["atlas-master".to_string()], false, None)
            .unwrap();
        let aliased = searcher
            .search("compass", &["atlas-current".to_string()], false, None)
            .unwrap();

        assert!(!direct.results.is_empty());
        assert_eq!(direct.results.len(), aliased.results.len());
    }

    #[test]
    fn test_search_rejects_too_many_terms() {
        let searcher = reference_searcher();
        let raw = "one two three four five six seven eight nine ten eleven";
        let err = searcher.search(raw, &[], true, None).unwrap_err();
        assert_eq!(err, SearchError::QueryTooLong);
    }

    #[test]
    fn test_search_rejects_empty_query() {
        let searcher = reference_searcher();
        let err = searcher.search("", &[], true, None).unwrap_err();
        assert_eq!(err, SearchError::QueryTooLong);
    }

    #[test]
    fn test_search_property_filter_scopes_results() {
        let searcher = reference_searcher();

        let scoped = searcher
            .search("connect", &["bi-connector-master".to_string()], false, None)
            .unwrap();
        assert_eq!(scoped.results.len(), 1);
        assert_eq!(scoped.results[0].title, "Connect BI Connector");

        let unknown = searcher
            .search("connect", &["no-such-property".to_string()], false, None)
            .unwrap();
        assert!(unknown.results.is_empty());
    }

    #[test]
    fn test_results_carry_display_metadata() {
        let searcher = reference_searcher();
        let response = searcher.search("import tooling", &[], false, None).unwrap();
        assert_eq!(response.results.len(), 1);
        let result = &response.results[0];
        assert_eq!(result.title, "Import Data");
        assert_eq!(result.preview, "Bring your data in.");
        assert_eq!(
            result.url,
            "https://docs.atlas.example.com/tutorial/import-data"
        );
    }

    // ============================================================
    // SPELLING CORRECTION TESTS
    // ============================================================

    #[test]
    fn test_spelling_corrections_on_empty_results() {
        let searcher = reference_searcher();
        let dictionary = Dictionary::from_words(["connect", "compass", "cluster"]);

        let response = searcher
            .search("conect", &[], false, Some(&dictionary))
            .unwrap();
        assert!(response.results.is_empty());
        assert_eq!(
            response.spelling_corrections.get("conect"),
            Some(&"connect".to_string())
        );
    }

    #[test]
    fn test_no_spelling_corrections_without_dictionary() {
        let searcher = reference_searcher();
        let response = searcher.search("conect", &[], false, None).unwrap();
        assert!(response.spelling_corrections.is_empty());
    }

    #[test]
    fn test_no_spelling_corrections_on_strong_results() {
        let searcher = reference_searcher();
        let dictionary = Dictionary::from_words(["compass", "compost"]);

        let response = searcher
            .search("compass", &[], false, Some(&dictionary))
            .unwrap();
        assert!(!response.results.is_empty());
        assert!(response.spelling_corrections.is_empty());
    }

    // ============================================================
    // END-TO-END REFERENCE SCENARIO
    // ============================================================

    #[test]
    fn test_connect_dialog_compass_returns_connect_docs_in_order() {
        let searcher = reference_searcher();
        let response = searcher
            .search("\"connect dialog\" compass", &[], true, None)
            .unwrap();

        let titles: Vec<&str> = response
            .results
            .iter()
            .take(3)
            .map(|r| r.title.as_str())
            .collect();
        assert_eq!(
            titles,
            vec!["Connect via Compass", "Connect via Driver", "Connect via Shell"]
        );
        // the phrase filter drops every document without the literal run
        assert_eq!(response.results.len(), 3);
    }

    #[test]
    fn test_mandatory_compass_requires_verbatim_presence() {
        let searcher = reference_searcher();
        // "compass" is mandatory: documents without it are filtered even
        // though they match "connect"
        let response = searcher.search("connect compass", &[], false, None).unwrap();
        assert!(!response.results.is_empty());
        assert!(response
            .results
            .iter()
            .all(|r| r.title != "Connect BI Connector"));
    }

    // ============================================================
    // RESPONSE TYPE TESTS
    // ============================================================

    #[test]
    fn test_search_response_serialization() {
        let mut response = SearchResponse::default();
        response.results.push(SearchResult {
            title: "Connect via Compass".to_string(),
            preview: "Use Compass.".to_string(),
            url: "https://docs.atlas.example.com/tutorial/connect-via-compass".to_string(),
        });
        response
            .spelling_corrections
            .insert("conect".to_string(), "connect".to_string());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["results"][0]["title"], "Connect via Compass");
        assert_eq!(json["spellingCorrections"]["conect"], "connect");
    }

    #[test]
    fn test_search_response_default_is_empty() {
        let json = serde_json::to_value(SearchResponse::default()).unwrap();
        assert_eq!(json["results"], serde_json::json!([]));
        assert_eq!(json["spellingCorrections"], serde_json::json!({}));
    }
}
