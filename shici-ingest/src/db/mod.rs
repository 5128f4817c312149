//! Relational writes performed by the ingestion job

pub mod authors;
pub mod categories;
pub mod works;
