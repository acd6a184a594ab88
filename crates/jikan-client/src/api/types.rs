//! Jikan API v4 response types.
//!
//! These types represent the JSON responses from the Jikan API. Only the
//! fields the browser displays are modelled; everything else is ignored.

use serde::{Deserialize, Serialize};

/// Generic pagination wrapper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

/// One page of anime search results
pub type SearchPage = Paginated<CatalogItem>;

impl<T> Paginated<T> {
    /// Last page number, never below 1 (an empty result set is one empty page)
    pub fn last_page(&self) -> u32 {
        self.pagination.last_visible_page.max(1)
    }

    /// Current page number, never below 1
    pub fn current_page(&self) -> u32 {
        self.pagination.current_page.max(1)
    }
}

/// Single-object wrapper (`{ "data": ... }`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub data: T,
}

/// Pagination metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    pub last_visible_page: u32,
    pub has_next_page: bool,
    #[serde(default = "first_page")]
    pub current_page: u32,
    #[serde(default)]
    pub items: Option<PaginationItems>,
}

fn first_page() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginationItems {
    pub count: u32,
    pub total: u32,
    pub per_page: u32,
}

/// One anime entry from the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub mal_id: u32,
    #[serde(default)]
    pub images: Images,

    // Titles
    pub title: String,
    #[serde(default)]
    pub title_english: Option<String>,
    #[serde(default)]
    pub title_japanese: Option<String>,

    // Type and status
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub episodes: Option<u32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub aired: Option<Aired>,
    #[serde(default)]
    pub rating: Option<String>,
    #[serde(default)]
    pub year: Option<u32>,

    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub synopsis: Option<String>,

    #[serde(default)]
    pub genres: Vec<Tag>,
    #[serde(default)]
    pub studios: Vec<Tag>,
}

impl CatalogItem {
    /// Best image for a full-size view: large, then regular, then small
    pub fn poster_url(&self) -> Option<&str> {
        let jpg = &self.images.jpg;
        jpg.large_image_url
            .as_deref()
            .or(jpg.image_url.as_deref())
            .or(jpg.small_image_url.as_deref())
    }

    /// Best image for a list entry: regular, then small
    pub fn thumbnail_url(&self) -> Option<&str> {
        let jpg = &self.images.jpg;
        jpg.image_url.as_deref().or(jpg.small_image_url.as_deref())
    }

    /// Human-readable air date, if the catalog provided one
    pub fn aired_label(&self) -> Option<&str> {
        self.aired
            .as_ref()
            .and_then(|a| a.string.as_deref())
            .filter(|s| !s.is_empty())
    }
}

/// Anime images
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Images {
    #[serde(default)]
    pub jpg: ImageSet,
    #[serde(default)]
    pub webp: Option<ImageSet>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageSet {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub small_image_url: Option<String>,
    #[serde(default)]
    pub large_image_url: Option<String>,
}

/// Aired dates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aired {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub string: Option<String>,
}

/// Genre or studio reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub mal_id: u32,
    pub name: String,
}
