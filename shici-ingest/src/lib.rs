//! # shici ingestion library
//!
//! Turns the heterogeneous chinese-poetry source tree into canonical works:
//! - `raw`: shape-tolerant decoding of source records
//! - `normalizer`: raw record to canonical work
//! - `scanner` and `loader`: per-collection file discovery and caching
//! - `job`: offline load into the relational store

pub mod db;
pub mod job;
pub mod loader;
pub mod normalizer;
pub mod raw;
pub mod scanner;

pub use job::{IngestJob, IngestOptions, IngestReport};
pub use loader::CorpusLoader;
