//! HTTP API handlers
//!
//! v1 serves the poetry corpus, v2 the account endpoints. Handlers only
//! extract parameters and wrap service results in the response envelope.

pub mod auth;
pub mod authors;
pub mod catalog;
pub mod health;
pub mod poems;
pub mod response;
pub mod search;
pub mod users;

pub use auth::{require_auth, AuthUser};
pub use health::health_routes;

use serde::Deserialize;
use shici_common::pagination::DEFAULT_PAGE_SIZE;

/// `page` / `page_size` query parameters; clamping happens in the services.
/// Handlers with extra filters repeat these two fields rather than flatten
/// them, since `serde(flatten)` loses number parsing for query strings.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size", alias = "pageSize")]
    pub page_size: i64,
}

pub(crate) fn default_page() -> i64 {
    1
}

pub(crate) fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE as i64
}
