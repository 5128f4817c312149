//! In-memory entity store over the corpus loader's cached collections
//!
//! Every query walks the cached collections in catalog order. A query
//! against a cold loader first warms it on the blocking pool, so corpus
//! files are never read on an async worker.

use super::EntityStore;
use async_trait::async_trait;
use rand::seq::index;
use shici_common::catalog::{collections, find_collection, Collection};
use shici_common::{AuthorSummary, Error, Page, PageRequest, Result, Work};
use shici_ingest::CorpusLoader;
use std::collections::HashMap;
use std::sync::Arc;

pub struct MemoryStore {
    loader: Arc<CorpusLoader>,
}

impl MemoryStore {
    pub fn new(loader: Arc<CorpusLoader>) -> Self {
        Self { loader }
    }

    /// Load every collection and biography file once, off the async workers
    async fn ensure_warm(&self) -> Result<()> {
        if self.loader.is_warm() {
            return Ok(());
        }
        let loader = Arc::clone(&self.loader);
        tokio::task::spawn_blocking(move || loader.warm_up())
            .await
            .map_err(|e| Error::Internal(format!("corpus warm-up task failed: {}", e)))?;
        Ok(())
    }

    /// Cached work sets for one collection or all of them
    fn work_sets(&self, category: Option<&str>) -> Vec<Arc<Vec<Work>>> {
        let selected: Vec<&'static Collection> = match category {
            Some(id) => find_collection(id).into_iter().collect(),
            None => collections().iter().collect(),
        };
        selected
            .into_iter()
            .map(|c| self.loader.load_collection(c))
            .collect()
    }

    /// (name, dynasty) to biography, first biography file wins
    fn biographies(&self) -> HashMap<(String, String), String> {
        let mut bios = HashMap::new();
        for collection in collections() {
            let label = collection.dynasty_label();
            for (name, bio) in self.loader.load_biographies(collection).iter() {
                bios.entry((name.clone(), label.to_string()))
                    .or_insert_with(|| bio.clone());
            }
        }
        bios
    }

    /// Authors in first-appearance order with work counts
    fn aggregate_authors(&self, dynasty: Option<&str>) -> Vec<AuthorSummary> {
        let sets = self.work_sets(None);
        let mut index: HashMap<(&str, &str), usize> = HashMap::new();
        let mut authors: Vec<AuthorSummary> = Vec::new();

        for work in sets.iter().flat_map(|set| set.iter()) {
            if work.author.is_empty() {
                continue;
            }
            if dynasty.is_some_and(|d| d != work.dynasty) {
                continue;
            }
            let key = (work.author.as_str(), work.dynasty.as_str());
            match index.get(&key) {
                Some(&i) => authors[i].poem_count += 1,
                None => {
                    index.insert(key, authors.len());
                    authors.push(AuthorSummary {
                        name: work.author.clone(),
                        dynasty: work.dynasty.clone(),
                        biography: None,
                        poem_count: 1,
                    });
                }
            }
        }

        let bios = self.biographies();
        for author in &mut authors {
            author.biography = bios
                .get(&(author.name.clone(), author.dynasty.clone()))
                .cloned();
        }
        authors
    }
}

fn paginate(matches: Vec<&Work>, page: PageRequest) -> Page<Work> {
    let (start, end) = page.bounds(matches.len());
    let items = matches[start..end].iter().map(|w| (*w).clone()).collect();
    page.page_of(items, matches.len())
}

fn sample<T: Clone>(pool: &[&T], count: usize) -> Vec<T> {
    let amount = count.min(pool.len());
    let mut rng = rand::thread_rng();
    index::sample(&mut rng, pool.len(), amount)
        .into_iter()
        .map(|i| pool[i].clone())
        .collect()
}

#[async_trait]
impl EntityStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn list_works(&self, page: PageRequest, category: Option<&str>) -> Result<Page<Work>> {
        self.ensure_warm().await?;
        let sets = self.work_sets(category);
        let total: usize = sets.iter().map(|s| s.len()).sum();
        let (start, end) = page.bounds(total);

        let items = sets
            .iter()
            .flat_map(|set| set.iter())
            .skip(start)
            .take(end - start)
            .cloned()
            .collect();
        Ok(page.page_of(items, total))
    }

    async fn work_by_id(&self, id: &str) -> Result<Work> {
        self.ensure_warm().await?;
        self.work_sets(None)
            .iter()
            .flat_map(|set| set.iter())
            .find(|w| w.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("poem {}", id)))
    }

    async fn random_works(&self, count: usize, category: Option<&str>) -> Result<Vec<Work>> {
        self.ensure_warm().await?;
        let sets = self.work_sets(category);
        let pool: Vec<&Work> = sets.iter().flat_map(|set| set.iter()).collect();
        Ok(sample(&pool, count))
    }

    async fn works_by_author(&self, name: &str, page: PageRequest) -> Result<Page<Work>> {
        self.ensure_warm().await?;
        let sets = self.work_sets(None);
        let matches: Vec<&Work> = sets
            .iter()
            .flat_map(|set| set.iter())
            .filter(|w| w.author == name)
            .collect();
        Ok(paginate(matches, page))
    }

    async fn list_authors(&self, page: PageRequest, dynasty: Option<&str>) -> Result<Page<AuthorSummary>> {
        self.ensure_warm().await?;
        Ok(page.slice(&self.aggregate_authors(dynasty)))
    }

    async fn author_by_name(&self, name: &str) -> Result<AuthorSummary> {
        self.ensure_warm().await?;
        self.aggregate_authors(None)
            .into_iter()
            .find(|a| a.name == name)
            .ok_or_else(|| Error::NotFound(format!("author {}", name)))
    }

    async fn search(&self, query: &str, page: PageRequest) -> Result<Page<Work>> {
        self.ensure_warm().await?;
        let sets = self.work_sets(None);
        let matches: Vec<&Work> = sets
            .iter()
            .flat_map(|set| set.iter())
            .filter(|w| w.matches(query))
            .collect();
        Ok(paginate(matches, page))
    }
}
