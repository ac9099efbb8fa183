//! CMS response cache for incremental builds.
//!
//! Every Prismic request URL carries the repository ref it reads from, and a
//! publish moves the master ref. A cached response for a URL is therefore
//! content-addressed: it can only go stale by age, never by an edit to the
//! same ref. Entries older than the revalidation interval (`cms.revalidate_secs`,
//! one day by default) are refetched, so a long-lived cache directory still
//! picks up anything the API root reports late.
//!
//! ## Cache keys
//!
//! Keys are the SHA-256 of the full request URL. URLs can contain the access
//! token, so they are never written to disk in clear.
//!
//! ## Storage
//!
//! The cache is a JSON file at `<cache_dir>/.cms-cache.json`. Preview
//! requests never go through it, and `--no-cache` starts from an empty cache.

use chrono::{DateTime, TimeDelta, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Name of the cache file within the cache directory.
const CACHE_FILENAME: &str = ".cms-cache.json";

/// Version of the cache format. Bump this to invalidate all existing caches
/// when the format or key computation changes.
const CACHE_VERSION: u32 = 1;

/// A stored response body.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct CachedResponse {
    pub fetched_at: DateTime<Utc>,
    pub body: serde_json::Value,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ResponseCache {
    pub version: u32,
    pub entries: HashMap<String, CachedResponse>,
    #[serde(skip, default = "default_max_age")]
    max_age: TimeDelta,
    #[serde(skip)]
    stats: CacheStats,
}

impl ResponseCache {
    /// Create an empty cache (used for `--no-cache` or a first build).
    pub fn empty(max_age: TimeDelta) -> Self {
        Self {
            version: CACHE_VERSION,
            entries: HashMap::new(),
            max_age,
            stats: CacheStats::default(),
        }
    }

    /// Load from the cache directory. Returns an empty cache if the file
    /// doesn't exist or can't be parsed (version mismatch, corruption).
    pub fn load(cache_dir: &Path, max_age: TimeDelta) -> Self {
        let content = match std::fs::read_to_string(cache_path(cache_dir)) {
            Ok(c) => c,
            Err(_) => return Self::empty(max_age),
        };
        let mut cache: Self = match serde_json::from_str(&content) {
            Ok(c) => c,
            Err(err) => {
                tracing::warn!(error = %err, "discarding unreadable CMS cache");
                return Self::empty(max_age);
            }
        };
        if cache.version != CACHE_VERSION {
            return Self::empty(max_age);
        }
        cache.max_age = max_age;
        cache
    }

    /// Save to the cache directory, dropping entries that are already stale.
    pub fn save(&mut self, cache_dir: &Path, now: DateTime<Utc>) -> io::Result<()> {
        self.prune(now);
        std::fs::create_dir_all(cache_dir)?;
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(cache_path(cache_dir), json)
    }

    /// The cached body for `url` if it is younger than the revalidation
    /// interval. Counts a hit or a miss.
    pub fn get_fresh(&mut self, url: &str, now: DateTime<Utc>) -> Option<serde_json::Value> {
        let fresh = self
            .entries
            .get(&cache_key(url))
            .filter(|entry| now - entry.fetched_at < self.max_age)
            .map(|entry| entry.body.clone());
        match fresh {
            Some(_) => self.stats.hit(),
            None => self.stats.miss(),
        }
        fresh
    }

    pub fn insert(&mut self, url: &str, body: serde_json::Value, now: DateTime<Utc>) {
        self.entries.insert(
            cache_key(url),
            CachedResponse {
                fetched_at: now,
                body,
            },
        );
    }

    /// Remove every entry older than the revalidation interval.
    pub fn prune(&mut self, now: DateTime<Utc>) {
        let max_age = self.max_age;
        self.entries
            .retain(|_, entry| now - entry.fetched_at < max_age);
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

fn default_max_age() -> TimeDelta {
    TimeDelta::days(1)
}

/// SHA-256 of a request URL, returned as a hex string.
pub fn cache_key(url: &str) -> String {
    format!("{:x}", Sha256::digest(url.as_bytes()))
}

/// Resolve the cache file path for a cache directory.
pub fn cache_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join(CACHE_FILENAME)
}

/// Summary of cache performance for a build run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits > 0 {
            write!(
                f,
                "{} cached, {} fetched ({} total)",
                self.hits,
                self.misses,
                self.total()
            )
        } else {
            write!(f, "{} fetched", self.misses)
        }
    }
}
