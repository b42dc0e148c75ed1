use axum::extract::Query;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use std::sync::Arc;

use crate::pool::pool::Pool;

use super::types::SearchResponse;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    #[serde(rename = "searchProperty")]
    pub search_property: Option<String>,
}

/// `GET /search?q=<query>&searchProperty=<csv>`
///
/// Errors come back as an empty result body with the mapped status code.
pub async fn handle_search(
    Query(params): Query<SearchParams>,
    Extension(pool): Extension<Arc<Pool>>,
) -> (StatusCode, Json<SearchResponse>) {
    let Some(raw_query) = params.q.filter(|q| !q.trim().is_empty()) else {
        return (StatusCode::BAD_REQUEST, Json(SearchResponse::default()));
    };

    let properties: Vec<String> = params
        .search_property
        .map(|csv| {
            csv.split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    match pool.dispatch_search(&raw_query, &properties).await {
        Ok(response) => (StatusCode::OK, Json(response)),
        Err(err) => {
            tracing::debug!("Search rejected: {}", err);
            (err.status_code(), Json(SearchResponse::default()))
        }
    }
}
