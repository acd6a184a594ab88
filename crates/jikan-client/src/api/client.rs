//! Jikan API client.
//!
//! Two read-only queries: paginated anime search and anime-by-id. Failures
//! are mapped onto [`CatalogError`] and returned as-is; there are no retries
//! and no caching.

use super::error::CatalogError;
use super::types::*;
use crate::source::CatalogSource;
use anyhow::{Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Fixed number of results per search page
pub const PAGE_SIZE: u32 = 20;

/// Jikan API v4 client
#[derive(Debug, Clone)]
pub struct JikanClient {
    /// HTTP client
    client: Client,
    /// Base URL for Jikan API, without trailing slash
    base_url: String,
}

impl JikanClient {
    /// Create a new Jikan client
    pub fn new(base_url: impl Into<String>, timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        info!(base_url = %base_url, "Jikan client ready");

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Make a GET request and decode the JSON body
    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, CatalogError> {
        let url = format!("{}{}", self.base_url, endpoint);

        debug!(url = %url, ?query, "Making API request");

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "Request error");
                CatalogError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = %status, "Request failed");
            return Err(CatalogError::Http {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| {
            warn!(url = %url, error = %e, "Failed to read response body");
            CatalogError::Network(e.to_string())
        })?;

        let data = serde_json::from_slice(&body).map_err(|e| {
            warn!(url = %url, error = %e, "Failed to parse response");
            CatalogError::from(e)
        })?;

        debug!(url = %url, bytes = body.len(), "Request successful");
        Ok(data)
    }

    /// Search anime by title, one page of [`PAGE_SIZE`] results
    pub async fn search(&self, query: &str, page: u32) -> Result<SearchPage, CatalogError> {
        info!(query = query, page = page, "Searching anime");
        self.get(
            "/anime",
            &[
                ("q", query.to_string()),
                ("page", page.to_string()),
                ("limit", PAGE_SIZE.to_string()),
            ],
        )
        .await
    }

    /// Fetch full anime details by MAL ID
    pub async fn get_by_id(&self, mal_id: u32) -> Result<CatalogItem, CatalogError> {
        debug!(mal_id = mal_id, "Fetching anime details");
        let response: DataResponse<CatalogItem> =
            self.get(&format!("/anime/{}", mal_id), &[]).await?;
        Ok(response.data)
    }
}

impl CatalogSource for JikanClient {
    async fn search(&self, query: &str, page: u32) -> Result<SearchPage, CatalogError> {
        JikanClient::search(self, query, page).await
    }

    async fn get_by_id(&self, id: u32) -> Result<CatalogItem, CatalogError> {
        JikanClient::get_by_id(self, id).await
    }
}
