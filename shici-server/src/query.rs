//! Query service: request sanitizing over an [`EntityStore`]
//!
//! Clamps paging and sample sizes, resolves category and dynasty filters
//! against the catalog, and times searches. Behavior is identical for every
//! store backend.

use crate::store::EntityStore;
use shici_common::catalog::{self, Category, Dynasty};
use shici_common::{AuthorSummary, Error, Page, PageRequest, Result, SearchResult, Work};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

pub const MIN_RANDOM_COUNT: usize = 1;
pub const MAX_RANDOM_COUNT: usize = 10;

/// Resolved category filter
enum CategoryFilter {
    All,
    Collection(&'static str),
    /// Names no known collection: matches nothing
    Unknown,
}

#[derive(Clone)]
pub struct QueryService {
    store: Arc<dyn EntityStore>,
}

impl QueryService {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    pub async fn list_works(&self, page: i64, page_size: i64, category: Option<&str>) -> Result<Page<Work>> {
        let page = PageRequest::new(page, page_size);
        match resolve_category(category) {
            CategoryFilter::All => self.store.list_works(page, None).await,
            CategoryFilter::Collection(id) => self.store.list_works(page, Some(id)).await,
            CategoryFilter::Unknown => Ok(Page::empty(page)),
        }
    }

    pub async fn get_work(&self, id: &str) -> Result<Work> {
        let id = id.trim();
        if id.is_empty() {
            return Err(Error::InvalidInput("poem id is required".into()));
        }
        self.store.work_by_id(id).await
    }

    /// `count` is clamped into [1, 10]
    pub async fn random_works(&self, count: i64, category: Option<&str>) -> Result<Vec<Work>> {
        let count = count.clamp(MIN_RANDOM_COUNT as i64, MAX_RANDOM_COUNT as i64) as usize;
        match resolve_category(category) {
            CategoryFilter::All => self.store.random_works(count, None).await,
            CategoryFilter::Collection(id) => self.store.random_works(count, Some(id)).await,
            CategoryFilter::Unknown => Ok(Vec::new()),
        }
    }

    pub async fn works_by_author(&self, name: &str, page: i64, page_size: i64) -> Result<Page<Work>> {
        self.store
            .works_by_author(name.trim(), PageRequest::new(page, page_size))
            .await
    }

    /// A dynasty filter may be an id (tang), display name (唐代) or label (唐).
    /// Other values filter on the raw label.
    pub async fn list_authors(&self, page: i64, page_size: i64, dynasty: Option<&str>) -> Result<Page<AuthorSummary>> {
        let page = PageRequest::new(page, page_size);
        let dynasty = non_empty(dynasty).map(|d| {
            catalog::find_dynasty(d)
                .map(|found| found.label)
                .unwrap_or(d)
        });
        self.store.list_authors(page, dynasty).await
    }

    pub async fn get_author(&self, name: &str) -> Result<AuthorSummary> {
        self.store.author_by_name(name.trim()).await
    }

    /// Substring search; an empty query is rejected
    pub async fn search(&self, query: &str, page: i64, page_size: i64) -> Result<SearchResult> {
        if query.trim().is_empty() {
            return Err(Error::InvalidInput("search query is required".into()));
        }

        let started = Instant::now();
        let results = self
            .store
            .search(query, PageRequest::new(page, page_size))
            .await?;
        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;

        debug!(
            "search {:?}: {} matches in {:.2} ms ({})",
            query,
            results.total,
            duration_ms,
            self.store.backend()
        );

        Ok(SearchResult {
            query: query.to_string(),
            results,
            duration_ms,
        })
    }

    pub fn categories(&self) -> Vec<Category> {
        catalog::categories()
    }

    pub fn dynasties(&self) -> Vec<Dynasty> {
        catalog::dynasties()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn resolve_category(category: Option<&str>) -> CategoryFilter {
    match non_empty(category) {
        None => CategoryFilter::All,
        Some(key) => match catalog::find_collection(key) {
            Some(collection) => CategoryFilter::Collection(collection.id),
            None => CategoryFilter::Unknown,
        },
    }
}
