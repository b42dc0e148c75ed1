use serde::Serialize;

use crate::pool::types::WorkerStatus;

/// Body of `GET /status`.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Search property tags published by the last successful load.
    pub manifests: Vec<String>,
    #[serde(rename = "lastSync")]
    pub last_sync: LastSync,
    /// One entry per worker in declaration order.
    pub workers: Vec<WorkerStatus>,
}

#[derive(Debug, Serialize)]
pub struct LastSync {
    pub errors: Vec<String>,
    /// RFC 1123 timestamp of the last completed load, if any.
    pub finished: Option<String>,
}

/// Body of `POST /refresh`.
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub errors: Vec<String>,
}
