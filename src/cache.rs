//! Path handle cache
//!
//! One [`KvHandle`] per mount path, created on first use and kept for the
//! lifetime of the service. Concurrent first calls for the same mount
//! converge on a single handle; calls for different mounts do not wait on
//! each other.

use crate::{handle::KvHandle, transport::Transport};
use moka::sync::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Handle cache statistics
#[derive(Debug, Clone)]
pub struct HandleStats {
    inner: Arc<HandleStatsInner>,
}

#[derive(Debug, Default)]
struct HandleStatsInner {
    hits: AtomicU64,
    created: AtomicU64,
}

impl HandleStats {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(HandleStatsInner::default()),
        }
    }

    /// Number of lookups served by an existing handle
    pub fn hits(&self) -> u64 {
        self.inner.hits.load(Ordering::Relaxed)
    }

    /// Number of handles constructed
    pub fn created(&self) -> u64 {
        self.inner.created.load(Ordering::Relaxed)
    }

    pub(crate) fn record_hit(&self) {
        let _ = self.inner.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_creation(&self) {
        let _ = self.inner.created.fetch_add(1, Ordering::Relaxed);
    }
}

/// Thread-safe map from mount path to its [`KvHandle`]
///
/// Backed by an unbounded `moka` cache without TTL, so entries are never
/// evicted. `moka` runs the init closure of `or_insert_with` once per key
/// even under concurrent callers; the others wait for and share its result.
#[derive(Clone)]
pub struct HandleCache {
    handles: Cache<String, Arc<KvHandle>>,
    transport: Arc<dyn Transport>,
    stats: HandleStats,
}

impl std::fmt::Debug for HandleCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandleCache")
            .field("created", &self.stats.created())
            .field("hits", &self.stats.hits())
            .finish()
    }
}

impl HandleCache {
    /// Create an empty cache whose handles issue calls through `transport`
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            handles: Cache::builder().name("vault-kv-handles").build(),
            transport,
            stats: HandleStats::new(),
        }
    }

    /// Return the handle for `mount`, creating it on first access
    ///
    /// `mount` must already be validated and normalized by the caller.
    pub fn get_or_create(&self, mount: &str) -> Arc<KvHandle> {
        let entry = self.handles.entry_by_ref(mount).or_insert_with(|| {
            debug!("Creating KV handle for mount: {}", mount);
            self.stats.record_creation();
            if let Some(metrics) = crate::telemetry::telemetry() {
                metrics.record_handle_created(mount);
            }
            Arc::new(KvHandle::new(mount, self.transport.clone()))
        });

        if !entry.is_fresh() {
            self.stats.record_hit();
        }
        entry.into_value()
    }

    /// Whether a handle for `mount` exists
    pub fn contains(&self, mount: &str) -> bool {
        self.handles.contains_key(mount)
    }

    /// Cache statistics
    pub fn stats(&self) -> &HandleStats {
        &self.stats
    }
}
