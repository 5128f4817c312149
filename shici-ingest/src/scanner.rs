//! Corpus file scanner
//!
//! Recursive discovery of a collection's record files, in file-name order so
//! that corpus order is stable across runs and across entity stores.

use shici_common::catalog::Collection;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

/// Corpus scanner errors
#[derive(Debug, Error)]
pub enum ScanError {
    /// Collection directory does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Path exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Finds the record files of one collection
pub struct CorpusScanner {
    ignore_patterns: Vec<String>,
}

impl CorpusScanner {
    /// Scanner with default ignore patterns (VCS and OS metadata)
    pub fn new() -> Self {
        Self {
            ignore_patterns: vec![
                ".DS_Store".to_string(),
                ".git".to_string(),
                "node_modules".to_string(),
            ],
        }
    }

    /// Eligible record files for `collection` under `data_root`
    ///
    /// Unreadable entries are logged and skipped.
    pub fn scan(&self, data_root: &Path, collection: &Collection) -> Result<Vec<PathBuf>, ScanError> {
        let root = data_root.join(collection.dir);

        if !root.exists() {
            return Err(ScanError::PathNotFound(root));
        }
        if !root.is_dir() {
            return Err(ScanError::NotADirectory(root));
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(&root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| self.should_process_entry(e));

        for entry in walker {
            match entry {
                Ok(entry) => {
                    if !entry.file_type().is_file() {
                        continue;
                    }
                    let name = entry.file_name().to_string_lossy();
                    if collection.files.matches(&name) {
                        files.push(entry.into_path());
                    }
                }
                Err(e) => {
                    tracing::warn!("Error accessing entry: {}", e);
                }
            }
        }

        tracing::debug!(
            "Collection {}: {} record files under {}",
            collection.id,
            files.len(),
            root.display()
        );

        Ok(files)
    }

    /// Path of the collection's author biography file, if it has one and it exists
    pub fn biography_file(&self, data_root: &Path, collection: &Collection) -> Option<PathBuf> {
        let name = collection.biographies?;
        let path = data_root.join(collection.dir).join(name);
        path.is_file().then_some(path)
    }

    fn should_process_entry(&self, entry: &DirEntry) -> bool {
        let file_name = entry.file_name().to_string_lossy();
        !self
            .ignore_patterns
            .iter()
            .any(|pattern| file_name.contains(pattern.as_str()))
    }
}

impl Default for CorpusScanner {
    fn default() -> Self {
        Self::new()
    }
}
