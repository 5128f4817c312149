//! shici-server library: entity stores, query and account services, HTTP API

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use shici_common::config::Backend;
use shici_ingest::CorpusLoader;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;
use tracing::info;

pub mod account;
pub mod api;
pub mod error;
pub mod query;
pub mod store;

use account::AccountService;
use query::QueryService;
use store::{EntityStore, MemoryStore, SqliteStore};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub queries: QueryService,
    pub accounts: AccountService,
}

impl AppState {
    pub fn new(queries: QueryService, accounts: AccountService) -> Self {
        Self { queries, accounts }
    }
}

/// Build the corpus store for `backend`
///
/// The memory backend reads every collection before returning so that no
/// request pays for the first load.
pub async fn open_store(
    backend: Backend,
    data_path: PathBuf,
    pool: SqlitePool,
) -> shici_common::Result<Arc<dyn EntityStore>> {
    match backend {
        Backend::Sqlite => Ok(Arc::new(SqliteStore::new(pool))),
        Backend::Memory => {
            let loader = Arc::new(CorpusLoader::new(data_path));
            let warm = Arc::clone(&loader);
            let works = tokio::task::spawn_blocking(move || warm.warm_up())
                .await
                .map_err(|e| shici_common::Error::Internal(format!("corpus load task failed: {}", e)))?;
            info!("Loaded {} works into memory", works);
            Ok(Arc::new(MemoryStore::new(loader)))
        }
    }
}

/// Build application router
///
/// `/health` and `/api/v1` are public; `/api/v2/users/*` except the public
/// profile requires a bearer credential.
pub fn build_router(state: AppState) -> Router {
    let corpus = Router::new()
        .route("/api/v1/dynasties", get(api::catalog::list_dynasties))
        .route("/api/v1/categories", get(api::catalog::list_categories))
        .route("/api/v1/poems", get(api::poems::list_poems))
        .route("/api/v1/poems/random", get(api::poems::random_poems))
        .route("/api/v1/poems/:id", get(api::poems::get_poem))
        .route("/api/v1/authors", get(api::authors::list_authors))
        .route("/api/v1/authors/:name", get(api::authors::get_author))
        .route("/api/v1/authors/:name/poems", get(api::authors::author_poems))
        .route("/api/v1/search", get(api::search::search));

    let accounts = Router::new()
        .route("/api/v2/auth/register", post(api::auth::register))
        .route("/api/v2/auth/login", post(api::auth::login))
        .route("/api/v2/auth/refresh", post(api::auth::refresh))
        .route("/api/v2/users/:id", get(api::users::public_profile));

    let protected = Router::new()
        .route(
            "/api/v2/users/profile",
            get(api::users::get_profile).put(api::users::update_profile),
        )
        .route(
            "/api/v2/users/favorites",
            get(api::users::list_favorites)
                .post(api::users::add_favorite)
                .delete(api::users::remove_favorite),
        )
        .route(
            "/api/v2/users/history",
            get(api::users::list_history).post(api::users::record_history),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), api::require_auth));

    Router::new()
        .merge(api::health_routes())
        .merge(corpus)
        .merge(accounts)
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
