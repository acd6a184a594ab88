use thiserror::Error;

/// Errors from the Jikan API client.
///
/// Messages are shown to the user as-is, so they carry no request details
/// beyond the status code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request failed with status {status}")]
    Http { status: u16 },

    #[error("failed to decode response: {0}")]
    Decode(String),

    /// A newer request superseded this one
    #[error("request cancelled")]
    Cancelled,
}

impl CatalogError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CatalogError::Cancelled)
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(e: serde_json::Error) -> Self {
        CatalogError::Decode(e.to_string())
    }
}
