//! Jikan API v4 client implementation.
//!
//! This module provides the HTTP client for the Jikan API (MyAnimeList
//! unofficial API), its response types and the error taxonomy.

pub mod client;
pub mod error;
pub mod types;

pub use client::{JikanClient, PAGE_SIZE};
pub use error::CatalogError;
pub use types::*;
