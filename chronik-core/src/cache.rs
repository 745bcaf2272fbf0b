//! Short-lived full-response cache for the global feed.
//!
//! Keyed by the exact canonicalized request (path plus query). Entries
//! only ever leave by expiry; there is no explicit invalidation, so a
//! fresh post may stay invisible until the TTL elapses. Callers treat
//! that as an accepted staleness window.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

#[derive(Clone, Debug)]
struct CacheEntry {
    inserted_at: Instant,
    body: String,
}

#[derive(Debug)]
pub struct ResponseCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResponseCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.get_at(Instant::now(), key)
    }

    /// Clock-injected lookup. Expired entries are dropped on the way
    /// out.
    #[must_use]
    pub fn get_at(&self, now: Instant, key: &str) -> Option<String> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if now.duration_since(entry.inserted_at) < self.ttl => {
                Some(entry.body.clone())
            }
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, key: &str, body: String) -> String {
        self.put_at(Instant::now(), key, body)
    }

    /// Every write also sweeps entries that have expired under other
    /// keys. Keys embed caller-supplied input (the page number), so
    /// without the sweep a client requesting ever-new pages would grow
    /// the map without bound.
    pub fn put_at(&self, now: Instant, key: &str, body: String) -> String {
        let mut entries = self.lock();
        entries.retain(|_, entry| now.duration_since(entry.inserted_at) < self.ttl);
        entries.insert(
            key.to_owned(),
            CacheEntry {
                inserted_at: now,
                body: body.clone(),
            },
        );
        body
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::ResponseCache;
    use std::time::{Duration, Instant};

    #[test]
    fn entries_live_until_the_ttl() {
        let cache = ResponseCache::new(Duration::from_secs(20));
        let start = Instant::now();

        cache.put_at(start, "/?page=1", "first body".to_owned());

        let just_before = start + Duration::from_secs(19);
        assert_eq!(
            cache.get_at(just_before, "/?page=1").as_deref(),
            Some("first body")
        );

        let just_after = start + Duration::from_secs(20);
        assert_eq!(cache.get_at(just_after, "/?page=1"), None);
    }

    #[test]
    fn keys_are_independent() {
        let cache = ResponseCache::new(Duration::from_secs(20));
        let now = Instant::now();

        cache.put_at(now, "/?page=1", "page one".to_owned());
        assert_eq!(cache.get_at(now, "/?page=2"), None);
        assert_eq!(cache.get_at(now, "/?page=1").as_deref(), Some("page one"));
    }

    #[test]
    fn writes_sweep_expired_entries_under_other_keys() {
        let cache = ResponseCache::new(Duration::from_secs(20));
        let start = Instant::now();

        // A scan over distinct page numbers fills the map once.
        for page in 1..=50 {
            cache.put_at(start, &format!("/?page={page}"), "body".to_owned());
        }
        assert_eq!(cache.len(), 50);

        // The next write after expiry clears all of them.
        let later = start + Duration::from_secs(30);
        cache.put_at(later, "/?page=1", "fresh".to_owned());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get_at(later, "/?page=1").as_deref(), Some("fresh"));
    }

    #[test]
    fn put_replaces_expired_entries() {
        let cache = ResponseCache::new(Duration::from_secs(20));
        let start = Instant::now();

        cache.put_at(start, "/", "stale".to_owned());
        let later = start + Duration::from_secs(30);
        assert_eq!(cache.get_at(later, "/"), None);

        cache.put_at(later, "/", "fresh".to_owned());
        assert_eq!(cache.get_at(later, "/").as_deref(), Some("fresh"));
    }
}
