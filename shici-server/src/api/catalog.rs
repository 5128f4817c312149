//! Static reference data: dynasties and categories

use axum::{extract::State, Json};
use shici_common::catalog::{Category, Dynasty};

use super::response::{ok, Envelope};
use crate::AppState;

/// GET /api/v1/dynasties
pub async fn list_dynasties(State(state): State<AppState>) -> Json<Envelope<Vec<Dynasty>>> {
    ok(state.queries.dynasties())
}

/// GET /api/v1/categories
pub async fn list_categories(State(state): State<AppState>) -> Json<Envelope<Vec<Category>>> {
    ok(state.queries.categories())
}
