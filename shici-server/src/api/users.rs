//! Profile, favorites and history endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use shici_common::{Page, TargetKind, TargetRef};

use super::auth::AuthUser;
use super::response::{created, ok, Envelope};
use crate::account::{PublicProfile, UpdateProfileRequest, User, UserTarget};
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct TargetListQuery {
    #[serde(default = "super::default_page")]
    pub page: i64,
    #[serde(default = "super::default_page_size", alias = "pageSize")]
    pub page_size: i64,
    #[serde(default)]
    pub kind: Option<String>,
}

impl TargetListQuery {
    fn kind(&self) -> shici_common::Result<Option<TargetKind>> {
        match self.kind.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(kind) => kind.parse().map(Some),
        }
    }
}

/// `?kind=poem&id=...` for removals
#[derive(Debug, Deserialize)]
pub struct TargetQuery {
    pub kind: String,
    pub id: String,
}

/// GET /api/v2/users/:id
pub async fn public_profile(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Envelope<PublicProfile>>> {
    Ok(ok(state.accounts.get_public_profile(id).await?))
}

/// GET /api/v2/users/profile
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<Envelope<User>>> {
    Ok(ok(state.accounts.get_profile(user.id).await?))
}

/// PUT /api/v2/users/profile
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<UpdateProfileRequest>,
) -> ApiResult<Json<Envelope<User>>> {
    Ok(ok(state.accounts.update_profile(user.id, body).await?))
}

/// GET /api/v2/users/favorites?kind&page&page_size
pub async fn list_favorites(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<TargetListQuery>,
) -> ApiResult<Json<Envelope<Page<UserTarget>>>> {
    let page = state
        .accounts
        .list_favorites(user.id, query.kind()?, query.page, query.page_size)
        .await?;
    Ok(ok(page))
}

/// POST /api/v2/users/favorites with `{"kind": "poem", "id": "..."}`
pub async fn add_favorite(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(target): Json<TargetRef>,
) -> ApiResult<(StatusCode, Json<Envelope<UserTarget>>)> {
    Ok(created(state.accounts.add_favorite(user.id, target).await?))
}

/// DELETE /api/v2/users/favorites?kind&id
pub async fn remove_favorite(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<TargetQuery>,
) -> ApiResult<Json<Envelope<TargetRef>>> {
    let target = TargetRef::from_parts(&query.kind, query.id)?;
    state.accounts.remove_favorite(user.id, target.clone()).await?;
    Ok(ok(target))
}

/// GET /api/v2/users/history?kind&page&page_size
pub async fn list_history(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<TargetListQuery>,
) -> ApiResult<Json<Envelope<Page<UserTarget>>>> {
    let page = state
        .accounts
        .list_history(user.id, query.kind()?, query.page, query.page_size)
        .await?;
    Ok(ok(page))
}

/// POST /api/v2/users/history with `{"kind": "poem", "id": "..."}`
pub async fn record_history(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(target): Json<TargetRef>,
) -> ApiResult<(StatusCode, Json<Envelope<UserTarget>>)> {
    Ok(created(state.accounts.record_history(user.id, target).await?))
}
