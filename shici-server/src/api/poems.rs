//! Poem listing, lookup and random sampling

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use shici_common::{Page, Work};

use super::response::{ok, Envelope};
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListPoemsQuery {
    #[serde(default = "super::default_page")]
    pub page: i64,
    #[serde(default = "super::default_page_size", alias = "pageSize")]
    pub page_size: i64,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RandomQuery {
    #[serde(default = "default_count")]
    pub count: i64,
    #[serde(default)]
    pub category: Option<String>,
}

fn default_count() -> i64 {
    1
}

/// GET /api/v1/poems?page&page_size&category
pub async fn list_poems(
    State(state): State<AppState>,
    Query(query): Query<ListPoemsQuery>,
) -> ApiResult<Json<Envelope<Page<Work>>>> {
    let page = state
        .queries
        .list_works(query.page, query.page_size, query.category.as_deref())
        .await?;
    Ok(ok(page))
}

/// GET /api/v1/poems/random?count&category
pub async fn random_poems(
    State(state): State<AppState>,
    Query(query): Query<RandomQuery>,
) -> ApiResult<Json<Envelope<Vec<Work>>>> {
    let works = state
        .queries
        .random_works(query.count, query.category.as_deref())
        .await?;
    Ok(ok(works))
}

/// GET /api/v1/poems/:id
pub async fn get_poem(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Envelope<Work>>> {
    Ok(ok(state.queries.get_work(&id).await?))
}
