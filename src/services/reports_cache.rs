// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Read-through cache of the report collection.
//!
//! A single versioned slot under a fixed key. The submission workflow
//! invalidates it after a confirmed insert; views subscribe to it and see
//! the re-fetched collection. Cached data is never edited locally.

use crate::db::{DbError, RecordStore};
use crate::models::Report;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

/// Cache key of the report collection.
pub const REPORTS_QUERY_KEY: &str = "reports";

/// Observable state of the cached query.
#[derive(Debug, Clone, Default)]
pub struct QuerySnapshot {
    /// Last successfully fetched collection
    pub data: Option<Arc<Vec<Report>>>,
    /// Message of the most recent failed fetch (cleared on success)
    pub error: Option<String>,
    /// A fetch is in flight
    pub is_fetching: bool,
    /// Invalidated since `data` was fetched
    pub is_stale: bool,
    /// Number of completed successful fetches
    pub version: u64,
}

impl QuerySnapshot {
    /// First fetch still pending: nothing to show yet.
    pub fn is_loading(&self) -> bool {
        self.data.is_none() && self.error.is_none()
    }

    /// Background fetch while cached data is on screen.
    pub fn is_refreshing(&self) -> bool {
        self.is_fetching && self.data.is_some()
    }

    fn is_fresh(&self) -> bool {
        self.data.is_some() && !self.is_stale
    }
}

struct CacheInner {
    store: Arc<dyn RecordStore>,
    tx: watch::Sender<QuerySnapshot>,
    fetch_lock: Mutex<()>,
    /// Bumped on every invalidation
    generation: AtomicU64,
}

/// Shared reports cache. Clones share the same slot.
#[derive(Clone)]
pub struct ReportsCache {
    inner: Arc<CacheInner>,
}

impl ReportsCache {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        let (tx, _) = watch::channel(QuerySnapshot::default());
        Self {
            inner: Arc::new(CacheInner {
                store,
                tx,
                fetch_lock: Mutex::new(()),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Current state without triggering anything.
    pub fn snapshot(&self) -> QuerySnapshot {
        self.inner.tx.borrow().clone()
    }

    /// Number of invalidations so far.
    pub fn invalidation_count(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    /// Observe the slot. Starts the initial fetch if nothing is cached.
    ///
    /// Must be called from within a tokio runtime.
    pub fn subscribe(&self) -> watch::Receiver<QuerySnapshot> {
        let rx = self.inner.tx.subscribe();
        self.prefetch();
        rx
    }

    /// Start a background fetch when the slot is empty or stale and no
    /// fetch is already running.
    pub fn prefetch(&self) {
        let snapshot = self.snapshot();
        if !snapshot.is_fresh() && !snapshot.is_fetching {
            self.spawn_fetch();
        }
    }

    /// Cached collection if fresh, otherwise fetch it now.
    pub async fn read(&self) -> Result<Arc<Vec<Report>>, DbError> {
        if let Some(data) = self.fresh_data() {
            return Ok(data);
        }
        self.fetch().await
    }

    /// Mark the collection stale. Subscribers get a background re-fetch;
    /// without subscribers the next read fetches.
    pub fn invalidate(&self) {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.tx.send_modify(|s| s.is_stale = true);

        let subscribers = self.inner.tx.receiver_count();
        tracing::debug!(
            key = REPORTS_QUERY_KEY,
            generation,
            subscribers,
            "Invalidated reports cache"
        );

        if subscribers > 0 {
            self.spawn_fetch();
        }
    }

    fn fresh_data(&self) -> Option<Arc<Vec<Report>>> {
        let snapshot = self.inner.tx.borrow();
        if snapshot.is_fresh() {
            snapshot.data.clone()
        } else {
            None
        }
    }

    fn spawn_fetch(&self) {
        let cache = self.clone();
        tokio::spawn(async move {
            if let Err(e) = cache.fetch().await {
                tracing::warn!(error = %e, key = REPORTS_QUERY_KEY, "Background fetch failed");
            }
        });
    }

    /// Fetch from the store and publish the result. Fetches are serialized;
    /// a caller that waited behind a fetch reuses its result when still fresh.
    async fn fetch(&self) -> Result<Arc<Vec<Report>>, DbError> {
        let _guard = self.inner.fetch_lock.lock().await;

        if let Some(data) = self.fresh_data() {
            return Ok(data);
        }

        let started_generation = self.inner.generation.load(Ordering::SeqCst);
        self.inner.tx.send_modify(|s| s.is_fetching = true);

        let result = self.inner.store.list_reports().await;

        // An invalidation during the fetch leaves the slot stale.
        let still_current = self.inner.generation.load(Ordering::SeqCst) == started_generation;

        match result {
            Ok(rows) => {
                let data = Arc::new(rows);
                self.inner.tx.send_modify(|s| {
                    s.data = Some(data.clone());
                    s.error = None;
                    s.is_fetching = false;
                    s.is_stale = !still_current;
                    s.version += 1;
                });
                Ok(data)
            }
            Err(e) => {
                let message = e.to_string();
                self.inner.tx.send_modify(|s| {
                    s.error = Some(message);
                    s.is_fetching = false;
                });
                Err(e)
            }
        }
    }
}
