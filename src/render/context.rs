//! Render context: shared resources for loading images.
//!
//! One context is built per session (or per CLI run) and shared by every
//! render pass. It owns the HTTP client and the decoded-image cache so
//! repeated passes over the same base image skip the download and decode.
//! The cache holds at most `capacity` images; storing past that drops the
//! least recently used entry.

use image::DynamicImage;
use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use crate::error::{MemeforgeError, Result};

/// Images kept when no capacity is configured.
pub const DEFAULT_CACHE_CAPACITY: usize = 16;

/// Cache key for a reference. Data URLs are keyed by length and hash so the
/// payload itself is not held twice.
pub fn cache_key(reference: &str) -> String {
    if reference.starts_with("data:") {
        let mut hasher = DefaultHasher::new();
        reference.hash(&mut hasher);
        format!("data:{}:{:016x}", reference.len(), hasher.finish())
    } else {
        reference.to_string()
    }
}

/// A decoded image plus the tick of its last access.
#[derive(Debug, Clone)]
pub struct CachedImage {
    pub image: Arc<DynamicImage>,
    pub last_used: u64,
}

/// Shared HTTP client and image cache.
#[derive(Debug, Clone)]
pub struct RenderContext {
    /// HTTP client for downloading images.
    pub http_client: reqwest::Client,
    /// Decoded images keyed by [`cache_key`].
    pub image_cache: Arc<RwLock<HashMap<String, CachedImage>>>,
    /// Most entries the cache keeps.
    pub capacity: usize,
    /// Access counter; orders entries for eviction.
    clock: Arc<AtomicU64>,
}

impl RenderContext {
    pub fn new(http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            image_cache: Arc::new(RwLock::new(HashMap::new())),
            capacity: DEFAULT_CACHE_CAPACITY,
            clock: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Context with a default HTTP client and an empty cache.
    pub fn with_default_client() -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("memeforge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MemeforgeError::ImageLoad(format!("HTTP client error: {}", e)))?;
        Ok(Self::new(http_client))
    }

    /// Set the cache bound (at least one entry).
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    /// Cached image for a reference, refreshing its access tick.
    pub async fn cached(&self, reference: &str) -> Option<Arc<DynamicImage>> {
        let tick = self.tick();
        let mut cache = self.image_cache.write().await;
        cache.get_mut(&cache_key(reference)).map(|entry| {
            entry.last_used = tick;
            Arc::clone(&entry.image)
        })
    }

    /// Insert an image, then evict down to the capacity.
    pub async fn store(&self, reference: &str, image: Arc<DynamicImage>) {
        let entry = CachedImage {
            image,
            last_used: self.tick(),
        };
        let mut cache = self.image_cache.write().await;
        cache.insert(cache_key(reference), entry);
        let evicted = evict_lru(&mut cache, self.capacity);
        if evicted > 0 {
            tracing::debug!(evicted, capacity = self.capacity, "image cache evicted");
        }
    }

    /// Number of cached images.
    pub async fn cached_len(&self) -> usize {
        self.image_cache.read().await.len()
    }

    /// Drop the least recently used entries until at most `keep` remain.
    pub async fn evict_to(&self, keep: usize) {
        let mut cache = self.image_cache.write().await;
        evict_lru(&mut cache, keep);
    }
}

/// Returns how many entries were dropped.
fn evict_lru(cache: &mut HashMap<String, CachedImage>, keep: usize) -> usize {
    let mut evicted = 0;
    while cache.len() > keep {
        let Some(oldest) = cache
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(key, _)| key.clone())
        else {
            break;
        };
        cache.remove(&oldest);
        evicted += 1;
    }
    evicted
}
