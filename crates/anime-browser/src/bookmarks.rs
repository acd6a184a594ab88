//! Persisted bookmark set.
//!
//! Bookmarks are full catalog records, so the bookmark list renders without
//! a network round-trip. The whole set is serialized as one JSON value under
//! a single storage key and rewritten on every change.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use jikan_client::CatalogItem;
use serde::{Deserialize, Serialize};
use shared::KeyValueStore;
use tracing::{debug, info, warn};

/// A bookmarked catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    pub item: CatalogItem,
    pub saved_at: DateTime<Utc>,
}

impl Bookmark {
    pub fn id(&self) -> u32 {
        self.item.mal_id
    }
}

/// Bookmarks keyed by catalog id, in the order they were saved
pub struct BookmarkSet<S> {
    store: S,
    key: String,
    entries: Vec<Bookmark>,
}

impl<S: KeyValueStore> BookmarkSet<S> {
    /// Load the set from storage.
    ///
    /// Missing or unreadable data yields an empty set; this never fails.
    pub fn load(store: S, key: impl Into<String>) -> Self {
        let key = key.into();

        let entries = match store.get(&key) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Bookmark>>(&raw) {
                Ok(entries) => dedup(entries),
                Err(e) => {
                    warn!(key = %key, error = %e, "Stored bookmarks are unreadable, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to read bookmarks, starting empty");
                Vec::new()
            }
        };

        info!(key = %key, count = entries.len(), "Bookmarks loaded");
        Self {
            store,
            key,
            entries,
        }
    }

    pub fn contains(&self, id: u32) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, id: u32) -> Option<&Bookmark> {
        self.position(id).map(|idx| &self.entries[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bookmark> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bookmark an item; an existing bookmark with the same id is
    /// overwritten in place. Returns whether the id was new.
    pub fn add(&mut self, item: CatalogItem) -> Result<bool> {
        let previous = self.entries.clone();

        let is_new = match self.position(item.mal_id) {
            Some(idx) => {
                self.entries[idx].item = item;
                false
            }
            None => {
                self.entries.push(Bookmark {
                    item,
                    saved_at: Utc::now(),
                });
                true
            }
        };

        self.commit(previous)?;
        Ok(is_new)
    }

    /// Remove a bookmark. Returns whether it existed.
    pub fn remove(&mut self, id: u32) -> Result<bool> {
        let Some(idx) = self.position(id) else {
            return Ok(false);
        };

        let previous = self.entries.clone();
        self.entries.remove(idx);
        self.commit(previous)?;
        Ok(true)
    }

    /// Add the item if absent, remove it if present. Returns whether the
    /// item is bookmarked afterwards.
    pub fn toggle(&mut self, item: CatalogItem) -> Result<bool> {
        if self.contains(item.mal_id) {
            self.remove(item.mal_id)?;
            Ok(false)
        } else {
            self.add(item)?;
            Ok(true)
        }
    }

    fn position(&self, id: u32) -> Option<usize> {
        self.entries.iter().position(|b| b.id() == id)
    }

    /// Persist the current entries, restoring `previous` if the write fails
    fn commit(&mut self, previous: Vec<Bookmark>) -> Result<()> {
        let result = serde_json::to_string(&self.entries)
            .context("Failed to serialize bookmarks")
            .and_then(|raw| {
                self.store
                    .set(&self.key, &raw)
                    .with_context(|| format!("Failed to persist bookmarks under {}", self.key))
            });

        match result {
            Ok(()) => {
                debug!(key = %self.key, count = self.entries.len(), "Bookmarks persisted");
                Ok(())
            }
            Err(e) => {
                self.entries = previous;
                Err(e)
            }
        }
    }
}

/// Keep the first occurrence of every id
fn dedup(entries: Vec<Bookmark>) -> Vec<Bookmark> {
    let mut seen = std::collections::HashSet::new();
    entries.into_iter().filter(|b| seen.insert(b.id())).collect()
}
