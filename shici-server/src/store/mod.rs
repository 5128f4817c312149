//! Entity store: read access to works and authors
//!
//! Two interchangeable backends satisfy one contract:
//! - [`MemoryStore`]: index over the corpus loader's cached collections
//! - [`SqliteStore`]: the relational store populated by `shici-ingest`
//!
//! Filters arrive already resolved: a category is a collection id, a dynasty
//! is a canonical label. Results follow corpus order (collection, file,
//! record) in both backends.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use shici_common::{AuthorSummary, Page, PageRequest, Result, Work};

#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Short backend name for logs and health output
    fn backend(&self) -> &'static str;

    /// Works in corpus order, optionally limited to one collection
    async fn list_works(&self, page: PageRequest, category: Option<&str>) -> Result<Page<Work>>;

    /// One work by its stable ID; `Error::NotFound` if absent
    async fn work_by_id(&self, id: &str) -> Result<Work>;

    /// Up to `count` distinct works sampled uniformly without replacement
    async fn random_works(&self, count: usize, category: Option<&str>) -> Result<Vec<Work>>;

    /// Works whose author field equals `name` exactly
    async fn works_by_author(&self, name: &str, page: PageRequest) -> Result<Page<Work>>;

    /// Authors in order of first appearance, with their work counts
    async fn list_authors(&self, page: PageRequest, dynasty: Option<&str>) -> Result<Page<AuthorSummary>>;

    /// First author (in corpus order) with this exact name
    async fn author_by_name(&self, name: &str) -> Result<AuthorSummary>;

    /// Case-sensitive substring match on title, author or any body line
    async fn search(&self, query: &str, page: PageRequest) -> Result<Page<Work>>;
}
