//! Jikan catalog client.
//!
//! This library fetches anime search results and details from the Jikan
//! API v4, and coordinates search requests so that only the newest one can
//! complete.

pub mod api;
pub mod coordinator;
pub mod source;

pub use api::{CatalogError, CatalogItem, JikanClient, SearchPage, Tag, PAGE_SIZE};
pub use coordinator::{RequestCoordinator, RequestId, SearchTicket};
pub use source::CatalogSource;
