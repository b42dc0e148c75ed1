//! Wire-stable error values shared between the core and the HTTP layer.
//!
//! The front-end picks HTTP status codes from these strings, so the
//! `Display` output of each variant must never change.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors surfaced by the search/sync paths.
///
/// Each variant renders to its wire-stable string; `status_code` gives the
/// HTTP mapping the front-end uses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// No index generation has been installed into the worker yet.
    #[error("still-indexing")]
    StillIndexing,

    /// The parsed query carries more terms than the service accepts.
    #[error("query-too-long")]
    QueryTooLong,

    /// The chosen worker already has too many in-flight requests.
    #[error("backlog-exceeded")]
    BacklogExceeded,

    /// Every worker is suspended (or dead); nothing can take the request.
    #[error("pool-unavailable")]
    PoolUnavailable,

    /// A manifest load is already running.
    #[error("already-indexing")]
    AlreadyIndexing,

    /// The worker's thread is gone and could not be restarted.
    #[error("Worker not running")]
    WorkerNotRunning,
}

impl SearchError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            SearchError::StillIndexing
            | SearchError::BacklogExceeded
            | SearchError::PoolUnavailable
            | SearchError::WorkerNotRunning => StatusCode::SERVICE_UNAVAILABLE,
            SearchError::QueryTooLong => StatusCode::BAD_REQUEST,
            // An accepted duplicate: the load is already scheduled.
            SearchError::AlreadyIndexing => StatusCode::OK,
        }
    }
}
