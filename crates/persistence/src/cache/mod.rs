//! In-memory caching layer for theme catalog data

use aimi_core::Theme;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Cached item with expiration
struct CacheEntry<T> {
    value: T,
    inserted_at: Instant,
    ttl: Duration,
}

impl<T> CacheEntry<T> {
    fn new(value: T, ttl: Duration) -> Self {
        Self {
            value,
            inserted_at: Instant::now(),
            ttl,
        }
    }

    fn is_expired(&self) -> bool {
        self.inserted_at.elapsed() > self.ttl
    }
}

/// Thread-safe cache for theme rows with TTL and max-entry bounds.
///
/// Holds the full theme list and per-level lookups separately, since the
/// backend serves them from different queries.
pub struct CatalogCache {
    themes: RwLock<Option<CacheEntry<Vec<Theme>>>>,
    by_level: RwLock<HashMap<u32, CacheEntry<Theme>>>,
    default_ttl: Duration,
    max_entries: usize,
}

impl CatalogCache {
    /// Create a new cache with default TTL and max per-level entry count
    pub fn with_capacity(default_ttl: Duration, max_entries: usize) -> Self {
        Self {
            themes: RwLock::new(None),
            by_level: RwLock::new(HashMap::new()),
            default_ttl,
            max_entries,
        }
    }

    /// Cached theme list, if not expired
    pub fn get_themes(&self) -> Option<Vec<Theme>> {
        let guard = self.themes.read().ok()?;
        let entry = guard.as_ref()?;
        if entry.is_expired() {
            None
        } else {
            Some(entry.value.clone())
        }
    }

    /// Replace the cached theme list
    pub fn insert_themes(&self, themes: Vec<Theme>) {
        if let Ok(mut guard) = self.themes.write() {
            *guard = Some(CacheEntry::new(themes, self.default_ttl));
        }
    }

    /// Cached theme for a level.
    ///
    /// Falls back to the cached theme list when it has a range covering the
    /// level.
    pub fn get_level(&self, level: u32) -> Option<Theme> {
        if let Ok(cache) = self.by_level.read() {
            if let Some(entry) = cache.get(&level) {
                if !entry.is_expired() {
                    return Some(entry.value.clone());
                }
            }
        }

        self.get_themes()?.into_iter().find(|t| t.contains(level))
    }

    /// Insert or update a per-level entry.
    /// Evicts expired entries if at capacity.
    pub fn insert_level(&self, level: u32, theme: Theme) {
        if let Ok(mut cache) = self.by_level.write() {
            if cache.len() >= self.max_entries {
                cache.retain(|_, entry| !entry.is_expired());
            }

            // If still at capacity after cleanup, evict oldest
            if cache.len() >= self.max_entries {
                if let Some(oldest) = cache
                    .iter()
                    .min_by_key(|(_, e)| e.inserted_at)
                    .map(|(k, _)| *k)
                {
                    cache.remove(&oldest);
                }
            }

            cache.insert(level, CacheEntry::new(theme, self.default_ttl));
        }
    }

    /// Clear entire cache
    pub fn clear(&self) {
        if let Ok(mut guard) = self.themes.write() {
            *guard = None;
        }
        if let Ok(mut cache) = self.by_level.write() {
            cache.clear();
        }
    }

    /// Number of per-level entries
    pub fn len(&self) -> usize {
        self.by_level.read().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0 && self.get_themes().is_none()
    }
}

impl Default for CatalogCache {
    fn default() -> Self {
        // Themes change rarely; 5 minutes, one entry per level
        Self::with_capacity(Duration::from_secs(300), 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aimi_core::catalog;

    #[test]
    fn test_level_lookup_uses_theme_list() {
        let cache = CatalogCache::default();
        assert!(cache.get_level(15).is_none());

        cache.insert_themes(catalog::themes());
        assert_eq!(cache.get_level(15).unwrap().name, "Carrot Farm");
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_expired_entries_are_misses() {
        let cache = CatalogCache::with_capacity(Duration::from_millis(0), 10);
        cache.insert_themes(catalog::themes());
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get_themes().is_none());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let cache = CatalogCache::with_capacity(Duration::from_secs(60), 2);
        let themes = catalog::themes();
        cache.insert_level(1, themes[0].clone());
        std::thread::sleep(Duration::from_millis(2));
        cache.insert_level(11, themes[1].clone());
        std::thread::sleep(Duration::from_millis(2));
        cache.insert_level(21, themes[2].clone());

        assert_eq!(cache.len(), 2);
        assert!(cache.get_level(1).is_none());
        assert_eq!(cache.get_level(21).unwrap().name, "Cherry Blossom");
    }

    #[test]
    fn test_clear() {
        let cache = CatalogCache::default();
        cache.insert_themes(catalog::themes());
        cache.insert_level(3, catalog::themes()[0].clone());
        cache.clear();
        assert!(cache.is_empty());
    }
}
