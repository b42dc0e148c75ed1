//! Pool Module Tests
//!
//! Covers dispatch order, suspension, admission thresholds, death
//! reporting, and the worker request/reply cycle end to end.

#[cfg(test)]
mod tests {
    use crate::error::SearchError;
    use crate::manifest::types::{Manifest, ManifestDocument, ParsedManifest};
    use crate::pool::pool::Pool;
    use crate::pool::types::WorkerStatus;

    fn manifest(property: &str, docs: &[(&str, &str, &str)]) -> ParsedManifest {
        ParsedManifest {
            search_property: property.to_string(),
            manifest: Manifest {
                url: format!("https://docs.example.com/{}", property),
                aliases: vec![format!("{}-alias", property)],
                include_in_global_search: true,
                documents: docs
                    .iter()
                    .map(|(slug, title, text)| ManifestDocument {
                        slug: slug.to_string(),
                        title: title.to_string(),
                        preview: format!("Preview of {}", title),
                        text: text.to_string(),
                        tags: String::new(),
                        headings: Vec::new(),
                        links: Vec::new(),
                        weight: 1.0,
                    })
                    .collect(),
            },
        }
    }

    fn sample_manifests() -> Vec<ParsedManifest> {
        vec![manifest(
            "manual-master",
            &[
                ("install", "Install the Server", "download and install the server"),
                ("sharding", "Sharding Guide", "shard your cluster for scale"),
            ],
        )]
    }

    // ============================================================
    // TEST 1: Dispatch picks the least-loaded worker
    // ============================================================

    #[tokio::test]
    async fn test_get_returns_smallest_backlog_with_suspension() {
        let pool = Pool::new(3, None).unwrap();
        let workers = pool.workers();
        workers[0].force_backlog(1);
        workers[1].force_backlog(2);
        workers[2].force_backlog(3);

        // load up the first worker; the second becomes the minimum
        workers[0].force_backlog(4);
        let chosen = pool.get().unwrap();
        assert_eq!(chosen.id, 2);

        // suspending it moves dispatch to the third
        chosen.suspend();
        assert_eq!(pool.get().unwrap().id, 3);

        workers[1].resume();
        let status = serde_json::to_value(pool.status()).unwrap();
        assert_eq!(status, serde_json::json!([4, 2, 3]));
    }

    #[tokio::test]
    async fn test_get_breaks_ties_by_spawn_order() {
        let pool = Pool::new(3, None).unwrap();
        assert_eq!(pool.get().unwrap().id, 1);
    }

    #[tokio::test]
    async fn test_get_fails_when_all_suspended() {
        let pool = Pool::new(2, None).unwrap();
        for worker in pool.workers() {
            worker.suspend();
        }
        assert_eq!(pool.get().unwrap_err(), SearchError::PoolUnavailable);

        pool.workers()[0].resume();
        assert_eq!(pool.get().unwrap().id, 1);
    }

    #[tokio::test]
    async fn test_suspended_worker_reports_s_and_is_skipped() {
        let pool = Pool::new(2, None).unwrap();
        pool.workers()[0].suspend();

        assert_eq!(pool.get().unwrap().id, 2);
        let status = pool.status();
        assert_eq!(status[0], WorkerStatus::Suspended);
        assert_eq!(status[1], WorkerStatus::Backlog(0));
        assert_eq!(
            serde_json::to_value(&status).unwrap(),
            serde_json::json!(["s", 0])
        );
    }

    // ============================================================
    // TEST 2: Admission thresholds
    // ============================================================

    #[tokio::test]
    async fn test_dispatch_rejects_over_backlog_cap() {
        let pool = Pool::new(1, None).unwrap();
        pool.workers()[0].force_backlog(21);

        let err = pool.dispatch_search("anything", &[]).await.unwrap_err();
        assert_eq!(err, SearchError::BacklogExceeded);
        // rejected requests never reach the worker
        assert_eq!(pool.workers()[0].backlog(), 21);
    }

    #[tokio::test]
    async fn test_dispatch_degrades_but_still_answers_over_warning() {
        let pool = Pool::new(1, None).unwrap();
        pool.workers()[0].sync(sample_manifests()).await.unwrap();
        pool.workers()[0].force_backlog(16);

        let response = pool.dispatch_search("sharding", &[]).await.unwrap();
        assert_eq!(response.results.len(), 1);
    }

    // ============================================================
    // TEST 3: Death reporting
    // ============================================================

    #[tokio::test]
    async fn test_dead_worker_is_skipped_and_reported() {
        let pool = Pool::new(2, None).unwrap();
        pool.workers()[0].force_dead();

        assert!(pool.any_dead());
        assert_eq!(pool.get().unwrap().id, 2);
        assert_eq!(
            serde_json::to_value(pool.status()).unwrap(),
            serde_json::json!(["d", 0])
        );
    }

    #[tokio::test]
    async fn test_requests_to_dead_worker_fail() {
        let pool = Pool::new(1, None).unwrap();
        pool.workers()[0].force_dead();

        let err = pool.workers()[0].search("query", &[], true).await.unwrap_err();
        assert_eq!(err, SearchError::WorkerNotRunning);
        assert_eq!(
            pool.dispatch_search("query", &[]).await.unwrap_err(),
            SearchError::PoolUnavailable
        );
    }

    // ============================================================
    // TEST 4: Worker request/reply cycle
    // ============================================================

    #[tokio::test]
    async fn test_search_before_first_sync_is_still_indexing() {
        let pool = Pool::new(1, None).unwrap();
        let err = pool.dispatch_search("anything", &[]).await.unwrap_err();
        assert_eq!(err, SearchError::StillIndexing);
    }

    #[tokio::test]
    async fn test_sync_installs_generation_and_search_succeeds() {
        let pool = Pool::new(1, None).unwrap();
        let stats = pool.workers()[0].sync(sample_manifests()).await.unwrap();
        assert_eq!(stats.documents, 2);
        assert_eq!(stats.properties, 1);

        let response = pool.dispatch_search("install", &[]).await.unwrap();
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].title, "Install the Server");
        // backlog drains once the reply arrives
        assert_eq!(pool.workers()[0].backlog(), 0);
    }

    #[tokio::test]
    async fn test_suspended_worker_still_processes_syncs() {
        let pool = Pool::new(1, None).unwrap();
        let worker = &pool.workers()[0];
        worker.suspend();
        let stats = worker.sync(sample_manifests()).await.unwrap();
        assert_eq!(stats.documents, 2);
        worker.resume();

        let response = pool.dispatch_search("sharding", &[]).await.unwrap();
        assert_eq!(response.results.len(), 1);
    }

    #[tokio::test]
    async fn test_resync_replaces_generation() {
        let pool = Pool::new(1, None).unwrap();
        let worker = &pool.workers()[0];
        worker.sync(sample_manifests()).await.unwrap();

        let replacement = vec![manifest(
            "manual-master",
            &[("upgrade", "Upgrade Guide", "upgrade the cluster in place")],
        )];
        let stats = worker.sync(replacement).await.unwrap();
        assert_eq!(stats.documents, 1);

        // old generation's documents are gone
        let response = pool.dispatch_search("install", &[]).await.unwrap();
        assert!(response.results.is_empty());
        let response = pool.dispatch_search("upgrade", &[]).await.unwrap();
        assert_eq!(response.results.len(), 1);
    }

    #[tokio::test]
    async fn test_dictionary_flows_through_workers() {
        use crate::spelling::Dictionary;
        use std::sync::Arc;

        let dictionary = Arc::new(Dictionary::from_words(["install", "sharding"]));
        let pool = Pool::new(1, Some(dictionary)).unwrap();
        pool.workers()[0].sync(sample_manifests()).await.unwrap();

        let response = pool.dispatch_search("instakl", &[]).await.unwrap();
        assert!(response.results.is_empty());
        assert_eq!(
            response.spelling_corrections.get("instakl"),
            Some(&"install".to_string())
        );
    }

    #[tokio::test]
    async fn test_requests_to_one_worker_keep_order() {
        let pool = Pool::new(1, None).unwrap();
        let worker = &pool.workers()[0];

        // a sync followed immediately by a search must be answered by the
        // new generation, because the inbox preserves send order
        let sync = worker.sync(sample_manifests());
        let search = worker.search("sharding", &[], false);
        let (stats, response) = tokio::join!(sync, search);
        assert_eq!(stats.unwrap().documents, 2);
        assert_eq!(response.unwrap().results.len(), 1);
    }
}
