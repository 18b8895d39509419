//! Single-slot payload cache.
//!
//! Reads are served from an `RwLock`ed [`CacheState`]. Refreshes are
//! serialized through a `tokio` mutex that also remembers when the last
//! attempt finished: a caller that queued behind an in-flight refresh reuses
//! its outcome instead of starting another upstream cycle.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use fuelwatch_core::{empty_payload, CacheMode, Payload, Station};
use fuelwatch_scraper::ScraperError;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Produces a fresh payload on demand.
pub trait PayloadSource: Send + Sync {
    fn load(&self) -> BoxFuture<'_, Result<Payload, ScraperError>>;
}

#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("refresh failed: {0}")]
    Refresh(String),
}

#[derive(Debug, Clone)]
enum CacheState {
    Empty,
    Populated { at: Instant, payload: Arc<Payload> },
}

/// Outcome of the most recent refresh attempt.
#[derive(Debug, Default)]
struct RefreshRecord {
    finished_at: Option<Instant>,
    error: Option<String>,
}

pub struct PriceCache {
    source: Arc<dyn PayloadSource>,
    mode: CacheMode,
    ttl: Duration,
    stations: Vec<Station>,
    state: RwLock<CacheState>,
    last_refresh: Mutex<RefreshRecord>,
}

impl PriceCache {
    /// `stations` is what the zero payload lists in push mode before the
    /// first ingest.
    pub fn new(
        source: Arc<dyn PayloadSource>,
        mode: CacheMode,
        ttl: Duration,
        stations: Vec<Station>,
    ) -> Self {
        Self {
            source,
            mode,
            ttl,
            stations,
            state: RwLock::new(CacheState::Empty),
            last_refresh: Mutex::new(RefreshRecord::default()),
        }
    }

    #[must_use]
    pub fn mode(&self) -> CacheMode {
        self.mode
    }

    /// Current payload, refreshing from upstream when empty (pull mode) or
    /// older than the TTL.
    ///
    /// # Errors
    ///
    /// [`CacheError::Refresh`] when a refresh fails and there is no earlier
    /// payload to fall back on. A refreshed payload without any brand counts
    /// as a failure, so it never replaces a populated cache.
    pub async fn read(&self) -> Result<Arc<Payload>, CacheError> {
        let requested_at = Instant::now();

        match self.current() {
            CacheState::Populated { at, payload } if at.elapsed() <= self.ttl => {
                return Ok(payload);
            }
            CacheState::Empty if self.mode == CacheMode::Push => {
                return Ok(Arc::new(empty_payload(Utc::now(), self.stations.clone())));
            }
            _ => {}
        }

        self.refresh(requested_at).await
    }

    /// Replace the cached payload with one computed elsewhere.
    ///
    /// # Errors
    ///
    /// [`CacheError::InvalidPayload`] if `byBrand` is empty; the cache is
    /// left untouched.
    pub fn ingest(&self, payload: Payload) -> Result<DateTime<Utc>, CacheError> {
        if payload.by_brand.is_empty() {
            return Err(CacheError::InvalidPayload(
                "byBrand must contain at least one brand".to_string(),
            ));
        }

        let brands = payload.by_brand.len();
        self.store(payload);
        let updated = Utc::now();
        tracing::info!(brands, %updated, "payload ingested");
        Ok(updated)
    }

    async fn refresh(&self, requested_at: Instant) -> Result<Arc<Payload>, CacheError> {
        let mut record = self.last_refresh.lock().await;

        if record.finished_at.is_some_and(|finished| finished > requested_at) {
            return match self.current() {
                CacheState::Populated { payload, .. } => Ok(payload),
                CacheState::Empty => Err(CacheError::Refresh(
                    record.error.clone().unwrap_or_else(|| "no payload available".to_string()),
                )),
            };
        }

        // An ingest may have landed while this caller waited for the lock.
        if let CacheState::Populated { at, payload } = self.current() {
            if at.elapsed() <= self.ttl {
                return Ok(payload);
            }
        }

        tracing::info!("refreshing prices from upstream");
        let started = Instant::now();
        let outcome = self
            .source
            .load()
            .await
            .map_err(|e| e.to_string())
            .and_then(|payload| {
                if payload.by_brand.is_empty() {
                    Err("refresh produced no brand prices".to_string())
                } else {
                    Ok(payload)
                }
            });
        record.finished_at = Some(Instant::now());

        match outcome {
            Ok(payload) => {
                record.error = None;
                tracing::info!(
                    brands = payload.by_brand.len(),
                    stations = payload.stations.len(),
                    elapsed_ms = started.elapsed().as_millis(),
                    "refresh finished"
                );
                Ok(self.store(payload))
            }
            Err(message) => {
                record.error = Some(message.clone());
                match self.current() {
                    CacheState::Populated { payload, .. } => {
                        tracing::warn!(error = %message, "refresh failed; serving stale payload");
                        Ok(payload)
                    }
                    CacheState::Empty => {
                        tracing::error!(error = %message, "refresh failed with nothing cached");
                        Err(CacheError::Refresh(message))
                    }
                }
            }
        }
    }

    fn current(&self) -> CacheState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn store(&self, payload: Payload) -> Arc<Payload> {
        let payload = Arc::new(payload);
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = CacheState::Populated {
            at: Instant::now(),
            payload: Arc::clone(&payload),
        };
        payload
    }
}

#[cfg(test)]
#[path = "cache_test.rs"]
pub(crate) mod tests;
