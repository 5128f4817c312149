//! Author listing and per-author works

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use shici_common::{AuthorSummary, Page, Work};

use super::response::{ok, Envelope};
use super::PageQuery;
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListAuthorsQuery {
    #[serde(default = "super::default_page")]
    pub page: i64,
    #[serde(default = "super::default_page_size", alias = "pageSize")]
    pub page_size: i64,
    #[serde(default)]
    pub dynasty: Option<String>,
}

/// GET /api/v1/authors?page&page_size&dynasty
pub async fn list_authors(
    State(state): State<AppState>,
    Query(query): Query<ListAuthorsQuery>,
) -> ApiResult<Json<Envelope<Page<AuthorSummary>>>> {
    let page = state
        .queries
        .list_authors(query.page, query.page_size, query.dynasty.as_deref())
        .await?;
    Ok(ok(page))
}

/// GET /api/v1/authors/:name
pub async fn get_author(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<Envelope<AuthorSummary>>> {
    Ok(ok(state.queries.get_author(&name).await?))
}

/// GET /api/v1/authors/:name/poems?page&page_size
pub async fn author_poems(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(paging): Query<PageQuery>,
) -> ApiResult<Json<Envelope<Page<Work>>>> {
    let page = state
        .queries
        .works_by_author(&name, paging.page, paging.page_size)
        .await?;
    Ok(ok(page))
}
