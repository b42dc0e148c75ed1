//! Task worker: a dedicated OS thread owning one index replica.
//!
//! The front-end talks to a worker only through its mpsc inbox; replies
//! travel back over per-request oneshot channels. Within a request the
//! thread runs to completion, so a worker never interleaves two requests
//! and a sync replaces its searcher without any locking.
//!
//! Lifecycle: {Idle, Busy} are implicit in the thread loop; `suspended`
//! gates pool dispatch without cancelling in-flight work; a worker whose
//! thread dies is restarted once, and a restart failing inside the minimum
//! uptime window marks it dead for good.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::oneshot;

use crate::error::SearchError;
use crate::manifest::types::ParsedManifest;
use crate::search::searcher::Searcher;
use crate::search::types::SearchResponse;
use crate::spelling::Dictionary;

use super::types::{SyncStats, WorkerRequest, WorkerStatus};

/// Admission cap: above this the request is rejected outright.
pub const MAXIMUM_BACKLOG: usize = 20;
/// Degradation threshold: above this, searches skip link analysis.
pub const WARNING_BACKLOG: usize = 15;
/// A worker that dies faster than this after starting is not restarted.
const MIN_WORKER_UPTIME: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub struct Worker {
    /// 1-based display id, stable across restarts.
    pub id: usize,
    inbox: Mutex<mpsc::Sender<WorkerRequest>>,
    backlog: Arc<AtomicUsize>,
    suspended: AtomicBool,
    dead: AtomicBool,
    started_at: Mutex<Instant>,
    seq: AtomicU64,
    dictionary: Option<Arc<Dictionary>>,
}

impl Worker {
    pub fn spawn(id: usize, dictionary: Option<Arc<Dictionary>>) -> anyhow::Result<Worker> {
        let backlog = Arc::new(AtomicUsize::new(0));
        let inbox = spawn_thread(id, dictionary.clone(), backlog.clone())?;
        Ok(Worker {
            id,
            inbox: Mutex::new(inbox),
            backlog,
            suspended: AtomicBool::new(false),
            dead: AtomicBool::new(false),
            started_at: Mutex::new(Instant::now()),
            seq: AtomicU64::new(0),
            dictionary,
        })
    }

    pub fn backlog(&self) -> usize {
        self.backlog.load(Ordering::SeqCst)
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::SeqCst)
    }

    pub fn is_dead(&self) -> bool {
        self.dead.load(Ordering::SeqCst)
    }

    /// Stop receiving new requests. In-flight requests keep running.
    pub fn suspend(&self) {
        self.suspended.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.suspended.store(false, Ordering::SeqCst);
    }

    pub fn status(&self) -> WorkerStatus {
        if self.is_dead() {
            WorkerStatus::Dead
        } else if self.is_suspended() {
            WorkerStatus::Suspended
        } else {
            WorkerStatus::Backlog(self.backlog())
        }
    }

    /// Send a search to this worker and await its reply.
    pub async fn search(
        &self,
        raw_query: &str,
        search_properties: &[String],
        use_hits: bool,
    ) -> Result<SearchResponse, SearchError> {
        let (reply, receiver) = oneshot::channel();
        self.send(WorkerRequest::Search {
            seq: self.next_seq(),
            raw_query: raw_query.to_string(),
            search_properties: search_properties.to_vec(),
            use_hits,
            reply,
        })?;
        receiver.await.map_err(|_| SearchError::WorkerNotRunning)?
    }

    /// Send a manifest snapshot and wait for the rebuild to complete.
    pub async fn sync(&self, manifests: Vec<ParsedManifest>) -> Result<SyncStats, SearchError> {
        let (reply, receiver) = oneshot::channel();
        self.send(WorkerRequest::Sync {
            seq: self.next_seq(),
            manifests,
            reply,
        })?;
        receiver.await.map_err(|_| SearchError::WorkerNotRunning)
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst)
    }

    fn send(&self, request: WorkerRequest) -> Result<(), SearchError> {
        if self.is_dead() {
            return Err(SearchError::WorkerNotRunning);
        }

        let mut inbox = self.inbox.lock().unwrap();
        let request = match inbox.send(request) {
            Ok(()) => {
                self.backlog.fetch_add(1, Ordering::SeqCst);
                return Ok(());
            }
            Err(mpsc::SendError(request)) => request,
        };

        // The thread is gone. Restart unless it already died within its
        // minimum uptime window.
        let uptime = self.started_at.lock().unwrap().elapsed();
        if uptime < MIN_WORKER_UPTIME {
            tracing::error!("Worker {} died {}ms after starting; marking dead", self.id, uptime.as_millis());
            self.dead.store(true, Ordering::SeqCst);
            return Err(SearchError::WorkerNotRunning);
        }

        tracing::warn!("Worker {} thread is gone; restarting", self.id);
        match spawn_thread(self.id, self.dictionary.clone(), self.backlog.clone()) {
            Ok(sender) => {
                *inbox = sender;
                *self.started_at.lock().unwrap() = Instant::now();
                self.backlog.store(0, Ordering::SeqCst);
                if inbox.send(request).is_ok() {
                    self.backlog.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                } else {
                    self.dead.store(true, Ordering::SeqCst);
                    Err(SearchError::WorkerNotRunning)
                }
            }
            Err(err) => {
                tracing::error!("Worker {} failed to restart: {}", self.id, err);
                self.dead.store(true, Ordering::SeqCst);
                Err(SearchError::WorkerNotRunning)
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn force_backlog(&self, value: usize) {
        self.backlog.store(value, Ordering::SeqCst);
    }

    #[cfg(test)]
    pub(crate) fn force_dead(&self) {
        self.dead.store(true, Ordering::SeqCst);
    }
}

fn spawn_thread(
    id: usize,
    dictionary: Option<Arc<Dictionary>>,
    backlog: Arc<AtomicUsize>,
) -> anyhow::Result<mpsc::Sender<WorkerRequest>> {
    let (sender, receiver) = mpsc::channel();
    std::thread::Builder::new()
        .name(format!("marian-worker-{}", id))
        .spawn(move || worker_loop(id, receiver, dictionary, backlog))?;
    Ok(sender)
}

/// The main loop for a single worker thread: receive, handle, reply.
fn worker_loop(
    id: usize,
    inbox: mpsc::Receiver<WorkerRequest>,
    dictionary: Option<Arc<Dictionary>>,
    backlog: Arc<AtomicUsize>,
) {
    tracing::info!("Worker {} started", id);

    let mut searcher: Option<Searcher> = None;

    while let Ok(request) = inbox.recv() {
        match request {
            WorkerRequest::Search {
                seq,
                raw_query,
                search_properties,
                use_hits,
                reply,
            } => {
                let result = match &searcher {
                    Some(ready) => {
                        ready.search(&raw_query, &search_properties, use_hits, dictionary.as_deref())
                    }
                    None => Err(SearchError::StillIndexing),
                };
                backlog.fetch_sub(1, Ordering::SeqCst);
                if reply.send(result).is_err() {
                    tracing::debug!("Worker {}: caller dropped before reply to request {}", id, seq);
                }
            }
            WorkerRequest::Sync {
                seq,
                manifests,
                reply,
            } => {
                tracing::info!("Worker {} rebuilding from {} manifests (request {})", id, manifests.len(), seq);
                let built = Searcher::build(&manifests);
                let stats = SyncStats {
                    documents: built.doc_count(),
                    properties: built.property_count(),
                };
                // The old generation drops here; queries already answered
                // from it hold their own results.
                searcher = Some(built);
                backlog.fetch_sub(1, Ordering::SeqCst);
                let _ = reply.send(stats);
            }
        }
    }

    tracing::info!("Worker {} inbox closed; exiting", id);
}
