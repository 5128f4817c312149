//! Shared fixtures: both entity stores over the ingestion fixture corpus

#![allow(dead_code)]

use chrono::Duration;
use shici_common::db::open_in_memory;
use shici_ingest::{CorpusLoader, IngestJob, IngestOptions};
use shici_server::account::{AccountService, Argon2Hasher, JwtIssuer, UserRepository};
use shici_server::query::QueryService;
use shici_server::store::{EntityStore, MemoryStore, SqliteStore};
use shici_server::{build_router, AppState};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;

pub const TEST_SECRET: &str = "test-secret";

pub fn fixture_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../shici-ingest/tests/fixtures/corpus")
}

pub fn memory_store() -> Arc<dyn EntityStore> {
    let loader = Arc::new(CorpusLoader::new(fixture_root()));
    Arc::new(MemoryStore::new(loader))
}

/// In-memory database with the fixture corpus ingested
pub async fn ingested_pool() -> SqlitePool {
    let pool = open_in_memory().await.unwrap();
    IngestJob::new(pool.clone(), fixture_root())
        .run(IngestOptions::default())
        .await
        .unwrap();
    pool
}

pub async fn sqlite_store() -> Arc<dyn EntityStore> {
    Arc::new(SqliteStore::new(ingested_pool().await))
}

/// Both backends, memory first
pub async fn both_stores() -> Vec<Arc<dyn EntityStore>> {
    vec![memory_store(), sqlite_store().await]
}

pub fn issuer() -> JwtIssuer {
    JwtIssuer::new(TEST_SECRET, Duration::days(7), Duration::minutes(30)).unwrap()
}

pub fn account_service(pool: SqlitePool) -> AccountService {
    AccountService::new(
        UserRepository::new(pool),
        Arc::new(Argon2Hasher),
        Arc::new(issuer()),
    )
}

pub async fn app_state() -> AppState {
    let pool = ingested_pool().await;
    AppState::new(
        QueryService::new(Arc::new(SqliteStore::new(pool.clone()))),
        account_service(pool),
    )
}

pub async fn app() -> axum::Router {
    build_router(app_state().await)
}
