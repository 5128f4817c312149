//! Substring search over titles, authors and lines

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use shici_common::SearchResult;

use super::response::{ok, Envelope};
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default = "super::default_page")]
    pub page: i64,
    #[serde(default = "super::default_page_size", alias = "pageSize")]
    pub page_size: i64,
}

/// GET /api/v1/search?q&page&page_size
///
/// A missing or blank `q` is a 400.
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Envelope<SearchResult>>> {
    let result = state
        .queries
        .search(&query.q, query.page, query.page_size)
        .await?;
    Ok(ok(result))
}
