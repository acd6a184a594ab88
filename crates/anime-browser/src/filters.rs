//! Client-side result filters.
//!
//! Filters narrow the current page of results without a new request. Each
//! filter value maps onto the strings Jikan uses for the corresponding field.

use anyhow::{anyhow, bail, Result};
use jikan_client::CatalogItem;
use serde::{Deserialize, Serialize};

/// Media type filter
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum KindFilter {
    Tv,
    Movie,
    Ova,
    Special,
    Ona,
}

impl KindFilter {
    /// Value of the catalog's `type` field
    pub fn catalog_value(&self) -> &'static str {
        match self {
            KindFilter::Tv => "TV",
            KindFilter::Movie => "Movie",
            KindFilter::Ova => "OVA",
            KindFilter::Special => "Special",
            KindFilter::Ona => "ONA",
        }
    }
}

impl std::fmt::Display for KindFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KindFilter::Tv => write!(f, "tv"),
            KindFilter::Movie => write!(f, "movie"),
            KindFilter::Ova => write!(f, "ova"),
            KindFilter::Special => write!(f, "special"),
            KindFilter::Ona => write!(f, "ona"),
        }
    }
}

impl std::str::FromStr for KindFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tv" => Ok(KindFilter::Tv),
            "movie" => Ok(KindFilter::Movie),
            "ova" => Ok(KindFilter::Ova),
            "special" => Ok(KindFilter::Special),
            "ona" => Ok(KindFilter::Ona),
            _ => Err(anyhow!("Invalid type filter: {}", s)),
        }
    }
}

/// Airing status filter
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    Airing,
    Complete,
    Upcoming,
}

impl StatusFilter {
    /// Value of the catalog's `status` field
    pub fn catalog_value(&self) -> &'static str {
        match self {
            StatusFilter::Airing => "Currently Airing",
            StatusFilter::Complete => "Finished Airing",
            StatusFilter::Upcoming => "Not yet aired",
        }
    }
}

impl std::fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusFilter::Airing => write!(f, "airing"),
            StatusFilter::Complete => write!(f, "complete"),
            StatusFilter::Upcoming => write!(f, "upcoming"),
        }
    }
}

impl std::str::FromStr for StatusFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "airing" => Ok(StatusFilter::Airing),
            "complete" => Ok(StatusFilter::Complete),
            "upcoming" => Ok(StatusFilter::Upcoming),
            _ => Err(anyhow!("Invalid status filter: {}", s)),
        }
    }
}

/// Content rating filter
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RatingFilter {
    G,
    Pg,
    Pg13,
    R17,
    R,
}

impl RatingFilter {
    /// Rating code, the part of the catalog's rating label before " - "
    pub fn code(&self) -> &'static str {
        match self {
            RatingFilter::G => "G",
            RatingFilter::Pg => "PG",
            RatingFilter::Pg13 => "PG-13",
            RatingFilter::R17 => "R",
            RatingFilter::R => "R+",
        }
    }

    fn matches(&self, rating: &str) -> bool {
        let code = rating.split(" - ").next().unwrap_or(rating).trim();
        code.eq_ignore_ascii_case(self.code())
    }
}

impl std::fmt::Display for RatingFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RatingFilter::G => write!(f, "g"),
            RatingFilter::Pg => write!(f, "pg"),
            RatingFilter::Pg13 => write!(f, "pg13"),
            RatingFilter::R17 => write!(f, "r17"),
            RatingFilter::R => write!(f, "r"),
        }
    }
}

impl std::str::FromStr for RatingFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "g" => Ok(RatingFilter::G),
            "pg" => Ok(RatingFilter::Pg),
            "pg13" => Ok(RatingFilter::Pg13),
            "r17" => Ok(RatingFilter::R17),
            "r" => Ok(RatingFilter::R),
            _ => Err(anyhow!("Invalid rating filter: {}", s)),
        }
    }
}

/// Active client-side filters; `None` means "All"
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    pub kind: Option<KindFilter>,
    pub status: Option<StatusFilter>,
    pub rating: Option<RatingFilter>,
    pub min_score: Option<f64>,
}

impl FilterState {
    /// Number of filters that are set
    pub fn active_count(&self) -> usize {
        [
            self.kind.is_some(),
            self.status.is_some(),
            self.rating.is_some(),
            self.min_score.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
    }

    pub fn is_empty(&self) -> bool {
        self.active_count() == 0
    }

    /// Set one filter from a `key=value` pair; an empty value or `all`
    /// clears that filter
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        let clear = value.is_empty() || value.eq_ignore_ascii_case("all");

        match key.trim().to_ascii_lowercase().as_str() {
            "type" | "kind" => self.kind = if clear { None } else { Some(value.parse()?) },
            "status" => self.status = if clear { None } else { Some(value.parse()?) },
            "rating" => self.rating = if clear { None } else { Some(value.parse()?) },
            "score" | "min_score" | "minscore" => {
                self.min_score = if clear {
                    None
                } else {
                    let score: f64 = value
                        .parse()
                        .map_err(|_| anyhow!("Invalid minimum score: {}", value))?;
                    if !(0.0..=10.0).contains(&score) {
                        bail!("Minimum score must be between 0 and 10: {}", value);
                    }
                    Some(score)
                }
            }
            other => bail!("Unknown filter: {}", other),
        }

        Ok(())
    }

    /// Whether an item passes every active filter
    pub fn matches(&self, item: &CatalogItem) -> bool {
        let kind_ok = self.kind.map_or(true, |kind| {
            item.kind
                .as_deref()
                .is_some_and(|k| k.eq_ignore_ascii_case(kind.catalog_value()))
        });
        let status_ok = self.status.map_or(true, |status| {
            item.status
                .as_deref()
                .is_some_and(|s| s.eq_ignore_ascii_case(status.catalog_value()))
        });
        let rating_ok = self
            .rating
            .map_or(true, |rating| item.rating.as_deref().is_some_and(|r| rating.matches(r)));
        let score_ok = self
            .min_score
            .map_or(true, |min| item.score.is_some_and(|score| score >= min));

        kind_ok && status_ok && rating_ok && score_ok
    }
}
