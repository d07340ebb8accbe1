//! Accounting item catalog cache.
//!
//! Catalog items come from the accounting system and change rarely. The
//! cache is owned by whoever shows the item picker; it refetches after the
//! TTL or after an explicit [`ItemCache::invalidate`].

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use strsim::{jaro_winkler, normalized_levenshtein};
use thiserror::Error;

use crate::config::ClinicConfig;

pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Minimum score for a search hit.
const MIN_SCORE: f64 = 0.5;

/// A selectable line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub label: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// The accounting connection expired; the user has to reconnect.
    #[error("Accounting connection expired, please reconnect")]
    ReauthRequired,

    #[error("Item catalog unavailable: {0}")]
    Unavailable(String),
}

/// Read-only source of catalog items.
pub trait ItemCatalogProvider {
    fn fetch_items(&self) -> Result<Vec<CatalogItem>, CatalogError>;
}

/// A search hit with its similarity score in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredItem {
    pub item: CatalogItem,
    pub score: f64,
}

struct Entry {
    fetched_at: Instant,
    items: Vec<CatalogItem>,
}

/// TTL cache over an [`ItemCatalogProvider`].
pub struct ItemCache {
    ttl: Duration,
    entry: Option<Entry>,
}

impl Default for ItemCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl ItemCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entry: None }
    }

    /// Cache using the configured `item_cache_ttl_secs`.
    pub fn from_config(config: &ClinicConfig) -> Self {
        Self::new(config.item_cache_ttl())
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn is_fresh(&self) -> bool {
        self.entry
            .as_ref()
            .is_some_and(|e| e.fetched_at.elapsed() < self.ttl)
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    /// Cached items, fetching them when missing or expired.
    ///
    /// `ReauthRequired` also drops what was cached.
    pub fn items<P: ItemCatalogProvider + ?Sized>(
        &mut self,
        provider: &P,
    ) -> Result<&[CatalogItem], CatalogError> {
        if !self.is_fresh() {
            match provider.fetch_items() {
                Ok(mut items) => {
                    items.sort_by(|a, b| a.label.to_lowercase().cmp(&b.label.to_lowercase()));
                    tracing::debug!(count = items.len(), "item catalog refreshed");
                    self.entry = Some(Entry {
                        fetched_at: Instant::now(),
                        items,
                    });
                }
                Err(CatalogError::ReauthRequired) => {
                    tracing::warn!("item catalog requires re-authentication");
                    self.invalidate();
                    return Err(CatalogError::ReauthRequired);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(self
            .entry
            .as_ref()
            .map(|e| e.items.as_slice())
            .unwrap_or_default())
    }

    /// Items ranked by label similarity. An empty query lists items in
    /// label order.
    pub fn search<P: ItemCatalogProvider + ?Sized>(
        &mut self,
        provider: &P,
        query: &str,
        limit: usize,
    ) -> Result<Vec<ScoredItem>, CatalogError> {
        let items = self.items(provider)?;
        Ok(rank(items, query, limit))
    }
}

fn rank(items: &[CatalogItem], query: &str, limit: usize) -> Vec<ScoredItem> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return items
            .iter()
            .take(limit)
            .map(|item| ScoredItem {
                item: item.clone(),
                score: 1.0,
            })
            .collect();
    }

    let mut scored: Vec<ScoredItem> = items
        .iter()
        .map(|item| ScoredItem {
            item: item.clone(),
            score: similarity(&needle, &item.label.to_lowercase()),
        })
        .filter(|s| s.score >= MIN_SCORE)
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored.truncate(limit);
    scored
}

/// Jaro-Winkler for typos and prefixes, Levenshtein for overall shape.
/// Substring hits score at least 0.9.
fn similarity(needle: &str, label: &str) -> f64 {
    let fuzzy = jaro_winkler(needle, label) * 0.6 + normalized_levenshtein(needle, label) * 0.4;
    if label.contains(needle) {
        fuzzy.max(0.9)
    } else {
        fuzzy
    }
}
