use moka::sync::Cache;
use std::time::Duration;
use yatube_models::config::FragmentCacheConfig;

/// Rendered post lists, by cache key. Entries are only dropped when they expire
/// or are explicitly invalidated, so new posts may appear with some delay.
pub struct FragmentCache {
    cache: Cache<String, String>,
}

impl FragmentCache {
    pub fn new(ttl: Duration, capacity: u64) -> FragmentCache {
        FragmentCache {
            cache: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub fn from_config(config: &FragmentCacheConfig) -> FragmentCache {
        FragmentCache::new(config.ttl, config.capacity)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.cache.get(key)
    }

    /// Returns the cached fragment, rendering and storing it on a miss.
    pub fn get_or_render<F>(&self, key: &str, render: F) -> Option<String>
    where
        F: FnOnce() -> Option<String>,
    {
        if let Some(html) = self.get(key) {
            return Some(html);
        }
        let html = render()?;
        self.cache.insert(key.to_owned(), html.clone());
        Some(html)
    }

    pub fn invalidate(&self, key: &str) {
        self.cache.invalidate(key);
    }
}
