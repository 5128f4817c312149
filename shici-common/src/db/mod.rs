//! Relational store schema and connection setup

pub mod init;

pub use init::{init_database, init_schema, open_in_memory};
