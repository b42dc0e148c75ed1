//! Balancing pool over the task workers.
//!
//! The pool is a scheduling table, not a thread pool: each worker already
//! owns its thread and its index replica. Dispatch picks the eligible
//! worker with the smallest backlog (ties go to the earliest spawned) and
//! applies the admission and degradation thresholds.

use std::sync::Arc;

use crate::error::SearchError;
use crate::search::types::SearchResponse;
use crate::spelling::Dictionary;

use super::types::WorkerStatus;
use super::worker::{Worker, MAXIMUM_BACKLOG, WARNING_BACKLOG};

/// Workers per pool unless configured otherwise.
pub const DEFAULT_POOL_SIZE: usize = 2;

pub struct Pool {
    workers: Vec<Worker>,
}

impl Pool {
    pub fn new(size: usize, dictionary: Option<Arc<Dictionary>>) -> anyhow::Result<Pool> {
        let mut workers = Vec::with_capacity(size);
        for id in 1..=size {
            workers.push(Worker::spawn(id, dictionary.clone())?);
        }
        tracing::info!("Started pool with {} workers", size);
        Ok(Pool { workers })
    }

    pub fn workers(&self) -> &[Worker] {
        &self.workers
    }

    /// The non-suspended, non-dead worker with the smallest backlog.
    /// `min_by_key` keeps the first minimum, so ties break by spawn order.
    pub fn get(&self) -> Result<&Worker, SearchError> {
        self.workers
            .iter()
            .filter(|worker| !worker.is_suspended() && !worker.is_dead())
            .min_by_key(|worker| worker.backlog())
            .ok_or(SearchError::PoolUnavailable)
    }

    /// One entry per worker in declaration order.
    pub fn status(&self) -> Vec<WorkerStatus> {
        self.workers.iter().map(Worker::status).collect()
    }

    pub fn any_dead(&self) -> bool {
        self.workers.iter().any(Worker::is_dead)
    }

    /// Admission-checked search: reject over the backlog cap, degrade to
    /// relevance-only ranking over the warning threshold.
    pub async fn dispatch_search(
        &self,
        raw_query: &str,
        search_properties: &[String],
    ) -> Result<SearchResponse, SearchError> {
        let worker = self.get()?;
        let backlog = worker.backlog();
        if backlog > MAXIMUM_BACKLOG {
            return Err(SearchError::BacklogExceeded);
        }
        let use_hits = backlog <= WARNING_BACKLOG;
        if !use_hits {
            tracing::warn!(
                "Worker {} backlog {} over warning threshold; skipping link analysis",
                worker.id,
                backlog
            );
        }
        worker.search(raw_query, search_properties, use_hits).await
    }
}
