// SPDX-License-Identifier: MIT

//! Attraction photo lookup
//!
//! A thin capability over an image search API. Lookups are cached in a
//! bounded in-memory map and batched through a small worker pool; a failed
//! lookup yields a missing URL for that name, never a batch failure.

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::error::ToolError;

const UNSPLASH_URL: &str = "https://api.unsplash.com/search/photos";

/// Batch lookups run at most this many searches at a time
const BATCH_CONCURRENCY: usize = 5;

/// Cache is cleared once it reaches this many entries
const CACHE_CAPACITY: usize = 1024;

/// An image search backend: one query in, at most one URL out.
#[async_trait]
pub trait PhotoSource: Send + Sync {
    async fn search_photo(&self, query: &str) -> Result<Option<String>, ToolError>;
}

/// Unsplash-backed [PhotoSource].
pub struct UnsplashSource {
    client: Client,
    access_key: String,
}

impl UnsplashSource {
    pub fn new(access_key: String) -> Self {
        Self {
            client: Client::new(),
            access_key,
        }
    }
}

#[async_trait]
impl PhotoSource for UnsplashSource {
    async fn search_photo(&self, query: &str) -> Result<Option<String>, ToolError> {
        let resp = self
            .client
            .get(UNSPLASH_URL)
            .query(&[
                ("query", query),
                ("per_page", "1"),
                ("client_id", &self.access_key),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            let text = resp.text().await?;
            return Err(ToolError::api("unsplash", text));
        }

        let body: Value = resp.json().await?;
        let first = body
            .get("results")
            .and_then(|r| r.as_array())
            .and_then(|r| r.first());

        // Prefer the small rendition, it loads faster in list views
        let url = first.and_then(|photo| {
            photo["urls"]["small"]
                .as_str()
                .or_else(|| photo["urls"]["regular"].as_str())
                .map(str::to_string)
        });

        Ok(url)
    }
}

fn cache_key(query: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    query.hash(&mut hasher);
    hasher.finish()
}

/// Caching, batching front over a [PhotoSource].
pub struct PhotoService {
    source: Arc<dyn PhotoSource>,
    cache: Mutex<HashMap<u64, String>>,
}

impl PhotoService {
    pub fn new(source: Arc<dyn PhotoSource>) -> Self {
        Self {
            source,
            cache: Mutex::new(HashMap::new()),
        }
    }

    async fn cached_search(&self, query: &str) -> Option<String> {
        let key = cache_key(query);

        if let Some(hit) = self.cache.lock().await.get(&key) {
            return Some(hit.clone());
        }

        let url = match self.source.search_photo(query).await {
            Ok(url) => url,
            Err(e) => {
                log::warn!("Photo search failed for '{}': {}", query, e);
                None
            }
        };

        if let Some(url) = &url {
            let mut cache = self.cache.lock().await;
            if cache.len() >= CACHE_CAPACITY {
                // Evict one arbitrary entry; keeps the bound without
                // dropping the whole warm cache at once
                if let Some(evict) = cache.keys().next().copied() {
                    cache.remove(&evict);
                }
            }
            cache.insert(key, url.clone());
        }
        url
    }

    #[cfg(test)]
    async fn cache_len(&self) -> usize {
        self.cache.lock().await.len()
    }

    /// Look up one photo URL; tries a landmark-qualified query first, the
    /// bare name second.
    pub async fn photo_url(&self, name: &str) -> Option<String> {
        if let Some(url) = self.cached_search(&format!("{} landmark", name)).await {
            return Some(url);
        }
        self.cached_search(name).await
    }

    /// Look up photo URLs for a batch of names. Always returns exactly one
    /// entry per distinct input name; failed lookups map to `None`.
    pub async fn batch_photo_urls(&self, names: &[String]) -> HashMap<String, Option<String>> {
        // Each lookup owns its name; borrowing from the iterator would tie
        // the future's type to the iteration lifetime
        stream::iter(names.to_vec())
            .map(|name| async move {
                let url = self.photo_url(&name).await;
                (name, url)
            })
            .buffer_unordered(BATCH_CONCURRENCY)
            .collect()
            .await
    }
}
