use axum::http::header::{IF_MODIFIED_SINCE, LAST_MODIFIED};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use std::sync::Arc;

use crate::timefmt::{format_rfc1123, parse_rfc1123};

use super::service::{Coordinator, LoadOutcome};
use super::types::RefreshResponse;

/// `GET /status`
///
/// Reports published manifests, the last sync record, and per-worker
/// backlog. Conditional requests short-circuit to 304 against the last
/// sync date; a dead worker turns the report into a 500.
pub async fn handle_status(
    headers: HeaderMap,
    Extension(coordinator): Extension<Arc<Coordinator>>,
) -> impl IntoResponse {
    if let Some(given) = headers
        .get(IF_MODIFIED_SINCE)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_rfc1123)
    {
        if coordinator.not_modified(given) {
            return StatusCode::NOT_MODIFIED.into_response();
        }
    }

    let mut response_headers = HeaderMap::new();
    if let Some(last_sync) = coordinator.last_sync_date() {
        if let Ok(value) = HeaderValue::from_str(&format_rfc1123(last_sync)) {
            response_headers.insert(LAST_MODIFIED, value);
        }
    }

    let code = if coordinator.pool().any_dead() {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    };

    (code, response_headers, Json(coordinator.status())).into_response()
}

/// `POST /refresh`
///
/// Runs a manifest load. A load already in progress is reported as
/// accepted; a failed listing comes back as a 500 with the error text.
pub async fn handle_refresh(
    Extension(coordinator): Extension<Arc<Coordinator>>,
) -> (StatusCode, Json<RefreshResponse>) {
    match coordinator.load().await {
        Ok(LoadOutcome::Completed { errors }) => {
            (StatusCode::OK, Json(RefreshResponse { errors }))
        }
        Ok(LoadOutcome::AlreadyIndexing) => (
            StatusCode::OK,
            Json(RefreshResponse {
                errors: vec!["already-indexing".to_string()],
            }),
        ),
        Err(err) => {
            tracing::error!("Manifest load failed: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(RefreshResponse {
                    errors: vec![err.to_string()],
                }),
            )
        }
    }
}
