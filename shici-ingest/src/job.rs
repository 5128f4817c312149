//! Offline ingestion: corpus files into the relational store
//!
//! Each record file is written in its own transaction (works plus their
//! batched comments). A file that fails is rolled back, logged and skipped;
//! the run continues with the next file.

use crate::db::{authors, categories, works};
use crate::loader::{load_file, read_biographies, CorpusLoader};
use shici_common::catalog::{collections, Collection};
use shici_common::{Comment, Error, Result, Work};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Ingestion run options
#[derive(Debug, Clone, Copy)]
pub struct IngestOptions {
    /// Clear corpus tables before ingesting
    pub reset: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self { reset: true }
    }
}

/// Counts from one ingestion run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub collections: usize,
    pub files: usize,
    pub files_skipped: usize,
    pub works: usize,
    pub comments: usize,
    pub authors: usize,
}

/// Populates categories, authors, works and comments from a data root
pub struct IngestJob {
    pool: SqlitePool,
    loader: CorpusLoader,
    author_ids: HashMap<(String, String), i64>,
}

impl IngestJob {
    pub fn new(pool: SqlitePool, data_root: impl Into<PathBuf>) -> Self {
        Self {
            pool,
            loader: CorpusLoader::new(data_root),
            author_ids: HashMap::new(),
        }
    }

    pub fn data_root(&self) -> &Path {
        self.loader.data_root()
    }

    pub async fn run(&mut self, options: IngestOptions) -> Result<IngestReport> {
        info!("Ingesting corpus from {}", self.data_root().display());

        let category_ids = {
            let mut tx = self.pool.begin().await?;
            if options.reset {
                works::clear_corpus(&mut tx).await?;
                info!("Cleared existing corpus tables");
            }
            categories::seed_categories(&mut tx).await?;
            let ids = categories::category_ids(&mut tx).await?;
            tx.commit().await?;
            ids
        };
        self.author_ids.clear();

        let mut report = IngestReport::default();

        for collection in collections() {
            let Some(&category_id) = category_ids.get(collection.id) else {
                return Err(Error::Internal(format!("category {} was not seeded", collection.id)));
            };

            self.ingest_biographies(collection).await?;

            let files = self.loader.collection_files(collection);
            if files.is_empty() {
                debug!("Collection {}: no files", collection.id);
                continue;
            }
            report.collections += 1;

            for path in files {
                report.files += 1;

                let batch = match load_file(&path, collection) {
                    Ok(batch) => batch,
                    Err(e) => {
                        warn!("Skipping file: {}", e);
                        report.files_skipped += 1;
                        continue;
                    }
                };

                match self.ingest_file(&batch, category_id).await {
                    Ok(comment_count) => {
                        report.works += batch.len();
                        report.comments += comment_count;
                        debug!("{}: {} works", path.display(), batch.len());
                    }
                    Err(e) => {
                        warn!("Rolled back {}: {}", path.display(), e);
                        report.files_skipped += 1;
                    }
                }
            }

            info!("Collection {} ingested", collection.id);
        }

        report.authors = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM authors")
            .fetch_one(&self.pool)
            .await? as usize;

        info!(
            "Ingestion complete: {} works, {} comments, {} authors from {} files ({} skipped)",
            report.works, report.comments, report.authors, report.files, report.files_skipped
        );

        Ok(report)
    }

    async fn ingest_biographies(&mut self, collection: &Collection) -> Result<()> {
        let Some(path) = self.loader.biography_file(collection) else {
            return Ok(());
        };

        let entries = match read_biographies(&path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Skipping biography file: {}", e);
                return Ok(());
            }
        };

        let dynasty = collection.dynasty_label();
        let mut tx = self.pool.begin().await?;
        for (name, bio) in &entries {
            let id = authors::upsert_author(&mut tx, name, dynasty, Some(bio)).await?;
            self.author_ids.insert((name.clone(), dynasty.to_string()), id);
        }
        tx.commit().await?;

        info!("Collection {}: {} author biographies", collection.id, entries.len());
        Ok(())
    }

    /// Write one file's works atomically; returns the number of comments
    async fn ingest_file(&mut self, batch: &[Work], category_id: i64) -> Result<usize> {
        let mut created: Vec<(String, String)> = Vec::new();

        let result = self.write_batch(batch, category_id, &mut created).await;

        if result.is_err() {
            // Authors created inside the rolled-back transaction no longer exist
            for key in created {
                self.author_ids.remove(&key);
            }
        }
        result
    }

    async fn write_batch(
        &mut self,
        batch: &[Work],
        category_id: i64,
        created: &mut Vec<(String, String)>,
    ) -> Result<usize> {
        let mut tx = self.pool.begin().await?;
        let mut comments: Vec<(i64, usize, &Comment)> = Vec::new();

        for work in batch {
            let key = (work.author.clone(), work.dynasty.clone());
            let author_id = match self.author_ids.get(&key) {
                Some(&id) => id,
                None => {
                    let id = authors::upsert_author(&mut tx, &work.author, &work.dynasty, None).await?;
                    self.author_ids.insert(key.clone(), id);
                    created.push(key);
                    id
                }
            };

            let work_id = works::insert_work(&mut tx, work, author_id, category_id).await?;
            comments.extend(
                work.comments
                    .iter()
                    .enumerate()
                    .map(|(position, comment)| (work_id, position, comment)),
            );
        }

        let count = works::insert_comments(&mut tx, &comments).await?;
        tx.commit().await?;
        Ok(count)
    }
}
