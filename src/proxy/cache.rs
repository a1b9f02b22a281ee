//! Forwarded response caching.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::CacheConfig;
use crate::load_balancer::host::Host;
use crate::observability::metrics;
use crate::proxy::Forwarded;

#[derive(Debug, Clone)]
struct CacheEntry {
    response: Forwarded,
    stored_at: Instant,
}

/// A thread-safe cache of forwarding results keyed by host.
///
/// Entries expire after `ttl` (if set) and the oldest entry is evicted once
/// `capacity` hosts are cached. Concurrent first calls for the same host
/// may both store; the last write wins.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    inner: Arc<DashMap<Host, CacheEntry>>,
    ttl: Option<Duration>,
    capacity: usize,
}

impl ResponseCache {
    /// Create a new empty cache.
    pub fn new(ttl: Option<Duration>, capacity: usize) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            ttl,
            capacity: capacity.max(1),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.ttl(), config.capacity)
    }

    fn is_fresh(&self, entry: &CacheEntry, now: Instant) -> bool {
        match self.ttl {
            Some(ttl) => now.duration_since(entry.stored_at) < ttl,
            None => true,
        }
    }

    /// Cached result for `host`, if present and not expired.
    pub fn get(&self, host: &Host) -> Option<Forwarded> {
        let now = Instant::now();
        {
            let entry = self.inner.get(host)?;
            if self.is_fresh(&entry, now) {
                return Some(entry.response.clone());
            }
        }
        // Guard dropped above; DashMap deadlocks on remove while one is held.
        self.inner.remove_if(host, |_, entry| !self.is_fresh(entry, now));
        metrics::record_cache_size(self.inner.len());
        None
    }

    /// Store the result for `host`, evicting the oldest entries when full.
    ///
    /// Every writer trims after its own insert, so once concurrent writers
    /// return the cache holds at most `capacity` entries.
    pub fn put(&self, host: Host, response: Forwarded) {
        self.inner.insert(
            host,
            CacheEntry {
                response,
                stored_at: Instant::now(),
            },
        );

        if self.inner.len() > self.capacity {
            let now = Instant::now();
            self.inner.retain(|_, entry| self.is_fresh(entry, now));
        }
        while self.inner.len() > self.capacity {
            if !self.evict_oldest() {
                break;
            }
        }
        metrics::record_cache_size(self.inner.len());
    }

    /// Remove the oldest entry. False when the cache is empty.
    fn evict_oldest(&self) -> bool {
        let oldest = self
            .inner
            .iter()
            .min_by_key(|entry| entry.value().stored_at)
            .map(|entry| entry.key().clone());
        match oldest {
            Some(host) => {
                tracing::debug!(host = %host, "Evicting oldest cached response");
                self.inner.remove(&host);
                true
            }
            None => false,
        }
    }

    /// Drop the entry for `host`.
    pub fn invalidate(&self, host: &Host) {
        self.inner.remove(host);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::{HeaderMap, StatusCode};

    fn response(body: &'static str) -> Forwarded {
        Forwarded {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    fn host(port: u16) -> Host {
        Host::new("svc", "127.0.0.1", port)
    }

    #[test]
    fn test_cache_operations() {
        let cache = ResponseCache::new(None, 16);
        assert!(cache.get(&host(1)).is_none());

        cache.put(host(1), response("one"));
        assert_eq!(cache.get(&host(1)).unwrap().body, "one");

        // Last write wins.
        cache.put(host(1), response("uno"));
        assert_eq!(cache.get(&host(1)).unwrap().body, "uno");
        assert_eq!(cache.len(), 1);

        cache.invalidate(&host(1));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_entries_expire() {
        let cache = ResponseCache::new(Some(Duration::from_millis(20)), 16);
        cache.put(host(1), response("one"));
        assert!(cache.get(&host(1)).is_some());

        std::thread::sleep(Duration::from_millis(40));
        assert!(cache.get(&host(1)).is_none());
        assert!(cache.is_empty(), "expired entry should be removed on read");
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let cache = ResponseCache::new(None, 2);
        cache.put(host(1), response("one"));
        std::thread::sleep(Duration::from_millis(2));
        cache.put(host(2), response("two"));
        std::thread::sleep(Duration::from_millis(2));
        cache.put(host(3), response("three"));

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&host(1)).is_none());
        assert!(cache.get(&host(2)).is_some());
        assert!(cache.get(&host(3)).is_some());
    }

    #[test]
    fn test_concurrent_writers() {
        let cache = ResponseCache::new(None, 64);
        let handles: Vec<_> = (0..8u16)
            .map(|i| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        cache.put(host(i % 4), response("x"));
                        assert!(cache.get(&host(i % 4)).is_some());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 4);
    }

    #[test]
    fn test_capacity_holds_under_concurrent_writers() {
        let cache = ResponseCache::new(None, 4);
        let handles: Vec<_> = (0..16u16)
            .map(|i| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for j in 0..200u16 {
                        cache.put(host(i * 200 + j), response("x"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(cache.len() <= 4, "cache grew to {} entries", cache.len());
        assert!(!cache.is_empty());
    }
}
