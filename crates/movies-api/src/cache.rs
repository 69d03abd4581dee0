//! # Output Cache
//!
//! In-process cache of successful anonymous `GET` responses, keyed by path
//! and query string. Every entry carries tags; writes evict by tag so the
//! next read is fresh. Entries also expire after a fixed time-to-live.
//!
//! Requests carrying a [`CallerIdentity`] bypass the cache in both
//! directions, so per-user rating fields are never served to anyone else.
//!
//! A response is only stored if no eviction happened while its handler ran;
//! otherwise a read that started before a write could re-insert stale data.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::{to_bytes, Body, Bytes};
use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use parking_lot::RwLock;

use crate::auth::CallerIdentity;

/// Tag attached to every cached movie response.
pub const MOVIES_TAG: &str = "movies";

pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Entry cap. Unknown query parameters make keys unbounded.
pub const DEFAULT_MAX_ENTRIES: usize = 1024;

/// Responses larger than this are passed through uncached.
const MAX_CACHED_BODY: usize = 1024 * 1024;

const CACHE_STATUS: &str = "x-cache";

#[derive(Debug, Clone)]
struct CachedResponse {
    content_type: Option<HeaderValue>,
    body: Bytes,
    tags: Vec<&'static str>,
    stored_at: Instant,
}

/// Shared tag-evictable response cache.
#[derive(Debug, Clone)]
pub struct OutputCache {
    entries: Arc<RwLock<HashMap<String, CachedResponse>>>,
    /// Bumped by every eviction, under the entries write lock.
    generation: Arc<AtomicU64>,
    ttl: Duration,
    max_entries: usize,
}

impl Default for OutputCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl OutputCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, DEFAULT_MAX_ENTRIES)
    }

    pub fn with_capacity(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            generation: Arc::new(AtomicU64::new(0)),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    fn get(&self, key: &str) -> Option<CachedResponse> {
        let entry = self.entries.read().get(key).cloned()?;
        if entry.stored_at.elapsed() < self.ttl {
            return Some(entry);
        }
        self.entries.write().remove(key);
        None
    }

    /// Store `entry` unless an eviction ran since `generation` was read.
    /// Expired entries are purged first; at capacity the oldest goes.
    fn insert(&self, key: String, entry: CachedResponse, generation: u64) -> bool {
        let mut entries = self.entries.write();
        if self.generation.load(Ordering::Acquire) != generation {
            return false;
        }

        let ttl = self.ttl;
        entries.retain(|_, e| e.stored_at.elapsed() < ttl);
        if entries.len() >= self.max_entries && !entries.contains_key(&key) {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.stored_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
            }
        }
        entries.insert(key, entry);
        true
    }

    /// Drop every entry carrying `tag`. Returns how many were removed.
    ///
    /// Responses still being produced when this runs are not stored.
    pub fn evict_by_tag(&self, tag: &str) -> usize {
        let mut entries = self.entries.write();
        self.generation.fetch_add(1, Ordering::AcqRel);
        let before = entries.len();
        entries.retain(|_, entry| !entry.tags.iter().any(|t| *t == tag));
        let evicted = before - entries.len();
        tracing::debug!(tag, evicted, "output cache evicted by tag");
        evicted
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn cache_key(request: &Request) -> String {
    request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_owned())
        .unwrap_or_else(|| request.uri().path().to_owned())
}

fn build_response(entry: &CachedResponse, cache_status: &'static str) -> Response {
    let mut response = (StatusCode::OK, entry.body.clone()).into_response();
    let headers = response.headers_mut();
    if let Some(content_type) = &entry.content_type {
        headers.insert(header::CONTENT_TYPE, content_type.clone());
    }
    headers.insert(CACHE_STATUS, HeaderValue::from_static(cache_status));
    response
}

/// Serve anonymous `GET`s from the cache and store 200 responses tagged
/// [`MOVIES_TAG`]. Must run inside the auth middleware.
pub async fn output_cache_middleware(
    State(cache): State<OutputCache>,
    request: Request,
    next: Next,
) -> Response {
    if request.method() != Method::GET || request.extensions().get::<CallerIdentity>().is_some() {
        return next.run(request).await;
    }

    let key = cache_key(&request);
    if let Some(entry) = cache.get(&key) {
        metrics::counter!("movies_output_cache_hits_total").increment(1);
        return build_response(&entry, "HIT");
    }
    metrics::counter!("movies_output_cache_misses_total").increment(1);

    let generation = cache.generation();
    let response = next.run(request).await;
    if response.status() != StatusCode::OK {
        return response;
    }

    let (parts, body) = response.into_parts();
    let body = match to_bytes(body, MAX_CACHED_BODY).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, key = %key, "response body not cacheable");
            return (StatusCode::INTERNAL_SERVER_ERROR, "response body could not be read")
                .into_response();
        }
    };

    let entry = CachedResponse {
        content_type: parts.headers.get(header::CONTENT_TYPE).cloned(),
        body: body.clone(),
        tags: vec![MOVIES_TAG],
        stored_at: Instant::now(),
    };
    if !cache.insert(key, entry, generation) {
        tracing::debug!("output cache evicted during request; response not stored");
    }

    let mut response = Response::from_parts(parts, Body::from(body));
    response
        .headers_mut()
        .insert(CACHE_STATUS, HeaderValue::from_static("MISS"));
    response
}
