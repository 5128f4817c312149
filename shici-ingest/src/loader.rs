//! Corpus loader with a per-collection cache
//!
//! The loader owns its cache; its lifetime is the loader's. The first request
//! for a collection scans and normalizes its files, later requests share the
//! same `Arc`. Concurrent first loads of one collection may both do the work;
//! the first result stored wins and both callers see identical data.

use crate::normalizer::{normalize_batch, FileContext};
use crate::raw::{parse_records, DecodeMode, ParseError};
use crate::scanner::CorpusScanner;
use serde::Deserialize;
use shici_common::catalog::{collections, Collection};
use shici_common::Work;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why a single file was skipped
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {0}: {1}")]
    Io(PathBuf, std::io::Error),

    #[error("cannot parse {0}: {1}")]
    Parse(PathBuf, ParseError),
}

/// Author biographies keyed by author name
pub type Biographies = HashMap<String, String>;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawAuthor {
    name: Option<String>,
    desc: Option<String>,
    description: Option<String>,
    short_description: Option<String>,
}

impl RawAuthor {
    fn into_entry(self) -> Option<(String, String)> {
        let name = self.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())?;
        let bio = [self.desc, self.description, self.short_description]
            .into_iter()
            .flatten()
            .map(|b| b.trim().to_string())
            .find(|b| !b.is_empty())?;
        Some((name, bio))
    }
}

/// Loads, normalizes and caches collections under one data root
pub struct CorpusLoader {
    data_root: PathBuf,
    scanner: CorpusScanner,
    works: RwLock<HashMap<&'static str, Arc<Vec<Work>>>>,
    biographies: RwLock<HashMap<&'static str, Arc<Biographies>>>,
}

impl CorpusLoader {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
            scanner: CorpusScanner::new(),
            works: RwLock::new(HashMap::new()),
            biographies: RwLock::new(HashMap::new()),
        }
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    /// All works of a collection, loading them on first use
    pub fn load_collection(&self, collection: &'static Collection) -> Arc<Vec<Work>> {
        if let Some(cached) = self
            .works
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(collection.id)
        {
            return Arc::clone(cached);
        }

        let loaded = Arc::new(self.load_uncached(collection));

        let mut cache = self.works.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(cache.entry(collection.id).or_insert(loaded))
    }

    /// Biographies of a collection's authors, loading them on first use
    pub fn load_biographies(&self, collection: &'static Collection) -> Arc<Biographies> {
        if let Some(cached) = self
            .biographies
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(collection.id)
        {
            return Arc::clone(cached);
        }

        let loaded = Arc::new(
            self.scanner
                .biography_file(&self.data_root, collection)
                .map(|path| match read_biographies(&path) {
                    Ok(entries) => entries.into_iter().collect(),
                    Err(e) => {
                        warn!("Skipping biography file: {}", e);
                        Biographies::new()
                    }
                })
                .unwrap_or_default(),
        );

        let mut cache = self.biographies.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(cache.entry(collection.id).or_insert(loaded))
    }

    /// Load every collection; returns the total number of works
    pub fn warm_up(&self) -> usize {
        let total = collections()
            .iter()
            .map(|c| {
                self.load_biographies(c);
                self.load_collection(c).len()
            })
            .sum();
        info!("Corpus loaded: {} works from {}", total, self.data_root.display());
        total
    }

    /// True once every collection's works and biographies are cached, so
    /// further lookups never touch the filesystem
    pub fn is_warm(&self) -> bool {
        let works = self.works.read().unwrap_or_else(PoisonError::into_inner);
        let bios = self.biographies.read().unwrap_or_else(PoisonError::into_inner);
        collections()
            .iter()
            .all(|c| works.contains_key(c.id) && bios.contains_key(c.id))
    }

    /// Number of collections currently cached
    pub fn cached_collections(&self) -> usize {
        self.works.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Record files of a collection in corpus order
    pub fn collection_files(&self, collection: &Collection) -> Vec<PathBuf> {
        match self.scanner.scan(&self.data_root, collection) {
            Ok(files) => files,
            Err(e) => {
                warn!("Collection {} unavailable: {}", collection.id, e);
                Vec::new()
            }
        }
    }

    /// Path of a collection's biography file, if present
    pub fn biography_file(&self, collection: &Collection) -> Option<PathBuf> {
        self.scanner.biography_file(&self.data_root, collection)
    }

    fn load_uncached(&self, collection: &Collection) -> Vec<Work> {
        let mut works = Vec::new();
        let mut skipped = 0usize;

        for path in self.collection_files(collection) {
            match load_file(&path, collection) {
                Ok(mut batch) => works.append(&mut batch),
                Err(e) => {
                    skipped += 1;
                    warn!("Skipping file: {}", e);
                }
            }
        }

        info!(
            "Loaded collection {}: {} works ({} files skipped)",
            collection.id,
            works.len(),
            skipped
        );
        works
    }
}

/// Read and normalize one record file
pub fn load_file(path: &Path, collection: &Collection) -> Result<Vec<Work>, LoadError> {
    let bytes = std::fs::read(path).map_err(|e| LoadError::Io(path.to_path_buf(), e))?;
    let (records, mode) =
        parse_records(&bytes).map_err(|e| LoadError::Parse(path.to_path_buf(), e))?;

    if mode == DecodeMode::Lossy {
        debug!("{} decoded on the lossy path", path.display());
    }

    let file_stem = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    let file_stem = file_stem.strip_suffix(".json").unwrap_or(&file_stem);

    Ok(normalize_batch(
        &records,
        FileContext {
            collection,
            file_stem,
        },
    ))
}

/// Read an author biography file into (name, biography) pairs
///
/// Entries without a name or without any biography text are dropped.
pub fn read_biographies(path: &Path) -> Result<Vec<(String, String)>, LoadError> {
    let bytes = std::fs::read(path).map_err(|e| LoadError::Io(path.to_path_buf(), e))?;
    let authors: Vec<RawAuthor> = serde_json::from_slice(&bytes)
        .map_err(|e| LoadError::Parse(path.to_path_buf(), ParseError::Json(e)))?;
    Ok(authors.into_iter().filter_map(RawAuthor::into_entry).collect())
}
