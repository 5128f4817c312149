//! # shici common library
//!
//! Shared code for the corpus ingestion job and the API server:
//! - Error taxonomy
//! - Canonical corpus models and pagination
//! - Dynasty and collection catalog
//! - Bootstrap configuration
//! - Relational schema

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod pagination;

pub use error::{Error, Result};
pub use models::{AuthorSummary, Comment, CommentKind, SearchResult, TargetKind, TargetRef, Work};
pub use pagination::{Page, PageRequest};
