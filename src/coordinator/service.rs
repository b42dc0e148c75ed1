//! Index coordinator.
//!
//! Owns the manifest fetcher and drives rebuilds across the pool: one
//! worker at a time is suspended, handed the manifest snapshot, and
//! resumed, so the remaining workers keep answering queries throughout a
//! load. Per-manifest errors accumulate on the sync record instead of
//! aborting it; only a failed listing is fatal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::manifest::fetcher::ManifestFetcher;
use crate::manifest::types::ParsedManifest;
use crate::pool::pool::Pool;
use crate::timefmt::format_rfc1123;

use super::types::{LastSync, StatusResponse};

/// How a `load()` call ended, short of a fatal fetch failure.
#[derive(Debug)]
pub enum LoadOutcome {
    /// The sync ran; any per-manifest or per-worker errors are listed.
    Completed { errors: Vec<String> },
    /// Another load was already running; nothing was done.
    AlreadyIndexing,
}

#[derive(Default)]
struct CoordinatorState {
    manifests: Vec<String>,
    last_sync_date: Option<SystemTime>,
    errors: Vec<String>,
    finished: Option<SystemTime>,
}

pub struct Coordinator {
    pool: Arc<Pool>,
    fetcher: ManifestFetcher,
    indexing: AtomicBool,
    state: Mutex<CoordinatorState>,
}

impl Coordinator {
    pub fn new(pool: Arc<Pool>, fetcher: ManifestFetcher) -> Coordinator {
        Coordinator {
            pool,
            fetcher,
            indexing: AtomicBool::new(false),
            state: Mutex::new(CoordinatorState::default()),
        }
    }

    pub fn is_indexing(&self) -> bool {
        self.indexing.load(Ordering::SeqCst)
    }

    /// Fetch manifests and rebuild every worker's index.
    ///
    /// Concurrent calls are refused; a fetch failure propagates after
    /// clearing the indexing flag.
    pub async fn load(&self) -> anyhow::Result<LoadOutcome> {
        if self
            .indexing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::info!("Load requested while already indexing");
            return Ok(LoadOutcome::AlreadyIndexing);
        }

        let result = self.run_sync().await;
        self.indexing.store(false, Ordering::SeqCst);

        match result {
            Ok(errors) => Ok(LoadOutcome::Completed { errors }),
            Err(err) => Err(err),
        }
    }

    async fn run_sync(&self) -> anyhow::Result<Vec<String>> {
        let outcome = self.fetcher.fetch().await?;
        let mut errors = outcome.errors;

        let mut parsed: Vec<ParsedManifest> = Vec::new();
        for fetched in &outcome.manifests {
            match ParsedManifest::parse(fetched) {
                Ok(manifest) => parsed.push(manifest),
                Err(err) => {
                    tracing::warn!("Skipping manifest {}: {}", fetched.search_property, err);
                    errors.push(format!(
                        "Failed to parse manifest {}: {}",
                        fetched.search_property, err
                    ));
                }
            }
        }

        for worker in self.pool.workers() {
            worker.suspend();
            let synced = worker.sync(parsed.clone()).await;
            worker.resume();

            match synced {
                Ok(stats) => {
                    tracing::info!(
                        "Worker {} indexed {} documents across {} properties",
                        worker.id,
                        stats.documents,
                        stats.properties
                    );
                }
                Err(err) => {
                    tracing::error!("Worker {} failed to sync: {}", worker.id, err);
                    errors.push(format!("Worker {} failed to sync: {}", worker.id, err));
                }
            }

            self.state.lock().unwrap().last_sync_date = Some(SystemTime::now());
        }

        let mut state = self.state.lock().unwrap();
        state.manifests = parsed
            .iter()
            .map(|manifest| manifest.search_property.clone())
            .collect();
        state.errors = errors.clone();
        state.finished = Some(SystemTime::now());

        Ok(errors)
    }

    pub fn last_sync_date(&self) -> Option<SystemTime> {
        self.state.lock().unwrap().last_sync_date
    }

    /// Should a conditional request be answered with 304? Compared at
    /// seconds precision; the epoch placeholder never qualifies.
    pub fn not_modified(&self, if_modified_since: SystemTime) -> bool {
        let Some(last_sync) = self.last_sync_date() else {
            return false;
        };
        let to_secs = |time: SystemTime| {
            time.duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0)
        };
        let given = to_secs(if_modified_since);
        given != 0 && given >= to_secs(last_sync)
    }

    pub fn status(&self) -> StatusResponse {
        let state = self.state.lock().unwrap();
        StatusResponse {
            manifests: state.manifests.clone(),
            last_sync: LastSync {
                errors: state.errors.clone(),
                finished: state.finished.map(format_rfc1123),
            },
            workers: self.pool.status(),
        }
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    #[cfg(test)]
    pub(crate) fn force_last_sync_date(&self, time: SystemTime) {
        self.state.lock().unwrap().last_sync_date = Some(time);
    }

    #[cfg(test)]
    pub(crate) fn force_indexing(&self, value: bool) {
        self.indexing.store(value, Ordering::SeqCst);
    }
}
