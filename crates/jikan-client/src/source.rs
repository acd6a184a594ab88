//! The catalog as seen by the rest of the workspace.
//!
//! [`JikanClient`](crate::JikanClient) is the production implementation;
//! tests drive the coordinator and the app loop with scripted sources.

use std::future::Future;

use crate::api::{CatalogError, CatalogItem, SearchPage};

/// A read-only anime catalog.
pub trait CatalogSource: Send + Sync {
    /// Search the catalog by text, one page at a time (1-indexed).
    fn search(
        &self,
        query: &str,
        page: u32,
    ) -> impl Future<Output = Result<SearchPage, CatalogError>> + Send;

    /// Fetch a single entry by its identifier.
    fn get_by_id(&self, id: u32) -> impl Future<Output = Result<CatalogItem, CatalogError>> + Send;
}
