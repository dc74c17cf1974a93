//! Request Handler
//!
//! Orchestrates admission, lookup, dedup, storage and eviction for each
//! intercepted request.
//!
//! All shared bookkeeping (in-flight map, eviction ledger) sits behind one
//! mutex that is only held for map/queue updates, never across an `.await`.
//! The lookup-then-register sequence is not atomic: under adversarial
//! timing two fetches for one key can both reach the transport. Both writes
//! land on the same key and the ledger keeps a single record for it.
//!
//! A key is never written and deleted at the same time. Evicted objects
//! are only deleted when no write of the key is pending and the ledger has
//! not re-recorded it; a write that finds its key's delete still pending
//! serves the response uncached.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::http::Method;
use tracing::{debug, info, warn};
use url::Url;

use crate::cache::{
    AdmissionFilter, BlobStore, Budget, CacheEntry, CacheStats, Completer, EvictionLedger,
    InFlightRegistry, MediaResponse, Registration, StatsReporter,
};
use crate::config::Config;
use crate::error::{FetchError, Result};
use crate::proxy::headers::shared_fetch_headers;
use crate::proxy::transport::{Transport, UpstreamRequest};

// == Cache Status ==
/// How a response was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Served from the blob store
    Hit,
    /// Fetched upstream, either by this request or one it joined
    Miss,
    /// Not eligible for caching; forwarded untouched
    Bypass,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
            CacheStatus::Bypass => "BYPASS",
        }
    }
}

/// A response plus the path it took through the cache.
#[derive(Debug, Clone)]
pub struct Served {
    pub response: MediaResponse,
    pub status: CacheStatus,
}

struct CacheState {
    in_flight: InFlightRegistry,
    ledger: EvictionLedger,
    /// Keys between `put` and their ledger record, with writer counts
    writing: HashMap<String, usize>,
    /// Evicted keys whose store delete has not finished
    deleting: HashSet<String>,
}

impl CacheState {
    fn new(budget: Budget) -> Self {
        Self {
            in_flight: InFlightRegistry::new(),
            ledger: EvictionLedger::new(budget),
            writing: HashMap::new(),
            deleting: HashSet::new(),
        }
    }

    /// Reserves `key` for a store write. False while its delete is pending.
    fn begin_write(&mut self, key: &str) -> bool {
        if self.deleting.contains(key) {
            return false;
        }
        *self.writing.entry(key.to_string()).or_default() += 1;
        true
    }

    fn end_write(&mut self, key: &str) {
        if let Some(writers) = self.writing.get_mut(key) {
            *writers -= 1;
            if *writers == 0 {
                self.writing.remove(key);
            }
        }
    }

    /// Filters eviction victims down to those whose stored object may be
    /// deleted, and marks them as deleting.
    fn claim_victims(&mut self, victims: Vec<CacheEntry>) -> Vec<CacheEntry> {
        victims
            .into_iter()
            .filter(|victim| {
                !self.ledger.contains(&victim.key)
                    && !self.writing.contains_key(&victim.key)
                    && self.deleting.insert(victim.key.clone())
            })
            .collect()
    }

    fn finish_deletes(&mut self, victims: &[CacheEntry]) {
        for victim in victims {
            self.deleting.remove(&victim.key);
        }
    }
}

/// Settles a key in the in-flight registry when dropped, so an owner that
/// unwinds never leaves its key registered.
struct SettleGuard<'a> {
    cache: &'a MediaCache,
    key: &'a str,
}

impl Drop for SettleGuard<'_> {
    fn drop(&mut self) {
        self.cache.lock_state().in_flight.settle(self.key);
    }
}

struct Inner {
    admission: AdmissionFilter,
    store: Arc<dyn BlobStore>,
    transport: Arc<dyn Transport>,
    state: Mutex<CacheState>,
    stats: StatsReporter,
}

// == Media Cache ==
/// The caching engine. One instance per process, cloned into every handler.
#[derive(Clone)]
pub struct MediaCache {
    inner: Arc<Inner>,
}

impl MediaCache {
    // == Constructor ==
    pub fn new(
        admission: AdmissionFilter,
        budget: Budget,
        store: Arc<dyn BlobStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                admission,
                store,
                transport,
                state: Mutex::new(CacheState::new(budget)),
                stats: StatsReporter::new(),
            }),
        }
    }

    /// Builds the engine from configuration around an already-opened store.
    pub fn from_config(
        config: &Config,
        store: Arc<dyn BlobStore>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let budget = Budget::new(config.capacity_bytes, config.eviction_target_ratio)?;
        info!(
            capacity_bytes = budget.capacity_bytes(),
            eviction_target_ratio = budget.eviction_target_ratio(),
            target_bytes = budget.target_bytes(),
            "eviction budget configured"
        );
        let admission = AdmissionFilter::new(&config.drm_license_domains);
        Ok(Self::new(admission, budget, store, transport))
    }

    /// Canonical request identity: the normalized URL without its fragment.
    pub fn canonical_key(url: &Url) -> String {
        let mut url = url.clone();
        url.set_fragment(None);
        url.into()
    }

    // == Stats ==
    /// Current usage snapshot; never waits on writes or evictions.
    pub fn stats(&self) -> CacheStats {
        self.inner.stats.snapshot()
    }

    /// Number of fetches currently registered as in flight.
    pub fn in_flight_count(&self) -> usize {
        self.lock_state().in_flight.len()
    }

    // == Handle ==
    /// Serves one intercepted request.
    ///
    /// Non-GET requests and URLs rejected by admission go straight to the
    /// transport. Fetch failures are returned to every waiter on the key.
    pub async fn handle(&self, request: UpstreamRequest) -> std::result::Result<Served, FetchError> {
        if request.method != Method::GET || !self.inner.admission.admit_by_url(&request.url) {
            return self.passthrough(request).await;
        }

        let key = Self::canonical_key(&request.url);

        match self.inner.store.lookup(&key).await {
            Ok(Some(response)) => {
                self.inner.stats.record_hit();
                debug!(key = %key, "cache hit");
                return Ok(Served {
                    response,
                    status: CacheStatus::Hit,
                });
            }
            Ok(None) => {}
            Err(err) => warn!(key = %key, error = %err, "cache lookup failed, fetching upstream"),
        }

        let registration = self.lock_state().in_flight.register(&key);
        let handle = match registration {
            Registration::Existing { handle } => {
                debug!(key = %key, "joining in-flight fetch");
                handle
            }
            Registration::New { handle, completer } => {
                let upstream = UpstreamRequest::get(request.url)
                    .with_headers(shared_fetch_headers(&request.headers));
                // Runs to completion even if this caller goes away
                let cache = self.clone();
                tokio::spawn(async move {
                    cache.fetch_and_settle(key, upstream, completer).await;
                });
                handle
            }
        };

        handle.await.map(|response| Served {
            response,
            status: CacheStatus::Miss,
        })
    }

    async fn passthrough(
        &self,
        request: UpstreamRequest,
    ) -> std::result::Result<Served, FetchError> {
        debug!(method = %request.method, url = %request.url, "bypassing cache");
        let response = self.inner.transport.send(request).await?;
        Ok(Served {
            response,
            status: CacheStatus::Bypass,
        })
    }

    async fn fetch_and_settle(&self, key: String, request: UpstreamRequest, completer: Completer) {
        let settle = SettleGuard {
            cache: self,
            key: &key,
        };
        let url = request.url.clone();
        let outcome = self.inner.transport.send(request).await;

        match &outcome {
            Ok(response) => self.store_if_admitted(&key, &url, response).await,
            Err(err) => warn!(key = %key, error = %err, "upstream fetch failed"),
        }

        drop(settle);
        completer.complete(outcome);
    }

    async fn store_if_admitted(&self, key: &str, url: &Url, response: &MediaResponse) {
        if !response.is_success() {
            debug!(key, status = response.status, "not caching unsuccessful response");
            return;
        }

        if !self
            .inner
            .admission
            .admit_by_content(url, response.content_type_or_empty())
        {
            debug!(key, content_type = response.content_type_or_empty(), "not caching non-media response");
            return;
        }

        let reserved = self.lock_state().begin_write(key);
        if !reserved {
            debug!(key, "previous copy still being evicted, serving uncached");
            return;
        }

        if let Err(err) = self.inner.store.put(key, response).await {
            self.lock_state().end_write(key);
            warn!(key, error = %err, "cache write failed, serving uncached");
            return;
        }

        let size_bytes = response.size_bytes();
        let (evicted_count, freed, to_delete) = {
            let mut state = self.lock_state();
            state.ledger.record_insertion(key, size_bytes);
            state.end_write(key);
            let evicted = state.ledger.maybe_evict();
            self.inner
                .stats
                .set_usage(state.ledger.usage(), state.ledger.len());
            let freed: u64 = evicted.iter().map(|entry| entry.size_bytes).sum();
            (evicted.len(), freed, state.claim_victims(evicted))
        };
        debug!(key, size_bytes, "cached response");

        if evicted_count == 0 {
            return;
        }

        for victim in &to_delete {
            if let Err(err) = self.inner.store.delete(&victim.key).await {
                warn!(key = %victim.key, error = %err, "evicted entry could not be deleted");
            }
        }
        self.lock_state().finish_deletes(&to_delete);
        info!(
            "Evicted {} entries ({} bytes) to stay within budget",
            evicted_count,
            freed
        );
    }

    fn lock_state(&self) -> MutexGuard<'_, CacheState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
