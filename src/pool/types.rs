use serde::ser::Serializer;
use serde::Serialize;
use tokio::sync::oneshot;

use crate::error::SearchError;
use crate::manifest::types::ParsedManifest;
use crate::search::types::SearchResponse;

/// Messages accepted by a worker's inbox. Requests to one worker are
/// processed strictly in send order; `seq` identifies the request in logs.
pub enum WorkerRequest {
    Search {
        seq: u64,
        raw_query: String,
        search_properties: Vec<String>,
        use_hits: bool,
        reply: oneshot::Sender<Result<SearchResponse, SearchError>>,
    },
    Sync {
        seq: u64,
        manifests: Vec<ParsedManifest>,
        reply: oneshot::Sender<SyncStats>,
    },
}

/// What a worker reports after installing a new index generation.
#[derive(Debug, Clone, Serialize)]
pub struct SyncStats {
    pub documents: usize,
    pub properties: usize,
}

/// One worker's entry in the status report: its backlog while eligible,
/// `"s"` while suspended, `"d"` once dead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerStatus {
    Backlog(usize),
    Suspended,
    Dead,
}

impl Serialize for WorkerStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            WorkerStatus::Backlog(n) => serializer.serialize_u64(*n as u64),
            WorkerStatus::Suspended => serializer.serialize_str("s"),
            WorkerStatus::Dead => serializer.serialize_str("d"),
        }
    }
}
