//! Live-query store
//!
//! The store maps invalidation keys to the live queries depending on them.
//! Writers call [`LiveQueryStore::invalidate`]; live queries register their
//! dependency keys with [`InMemoryLiveQueryStore::watch`] and re-run whenever
//! their [`LiveQueryWatch`] fires.
//!
//! # Example
//!
//! ```rust,no_run
//! use live_posts::invalidation::InvalidationKey;
//! use live_posts::live_query::{InMemoryLiveQueryStore, LiveQueryStore};
//!
//! # async fn example() {
//! let store = InMemoryLiveQueryStore::new(16);
//! let mut watch = store.watch([InvalidationKey::collection("posts")]);
//!
//! store.invalidate(&[InvalidationKey::collection("posts")]).await.unwrap();
//! assert!(watch.changed().await);
//! # }
//! ```

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::invalidation::InvalidationKey;

/// Errors raised by a live-query store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LiveQueryError {
    #[error("Live query store unavailable: {0}")]
    Unavailable(String),
}

/// Sink for invalidation keys
///
/// Implementations must accept keys nobody depends on and must be safe to
/// call concurrently from many requests.
#[async_trait]
pub trait LiveQueryStore: Send + Sync {
    /// Mark every live query depending on any of `keys` as stale
    async fn invalidate(&self, keys: &[InvalidationKey]) -> Result<(), LiveQueryError>;
}

/// Identifier of a registered live query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(Uuid);

impl WatchId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for WatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct Watcher {
    keys: HashSet<InvalidationKey>,
    sender: mpsc::Sender<()>,
}

/// Process-wide in-memory live-query store
pub struct InMemoryLiveQueryStore {
    watchers: Arc<DashMap<WatchId, Watcher>>,
    // Bumped before every invalidation is routed.
    generation: Arc<AtomicU64>,
    buffer: usize,
}

impl InMemoryLiveQueryStore {
    /// Create a store whose watchers buffer up to `buffer` pending re-runs
    pub fn new(buffer: usize) -> Self {
        Self {
            watchers: Arc::new(DashMap::new()),
            generation: Arc::new(AtomicU64::new(0)),
            buffer: buffer.max(1),
        }
    }

    /// Register a live query depending on `keys`
    ///
    /// The registration is removed when the returned watch is dropped.
    pub fn watch<I>(&self, keys: I) -> LiveQueryWatch
    where
        I: IntoIterator<Item = InvalidationKey>,
    {
        let id = WatchId::new();
        let (sender, receiver) = mpsc::channel(self.buffer);
        let keys: HashSet<InvalidationKey> = keys.into_iter().collect();

        self.watchers.insert(id, Watcher { keys, sender });
        tracing::debug!(watch_id = %id, watchers = self.watcher_count(), "live query registered");

        LiveQueryWatch {
            id,
            receiver,
            watchers: Arc::clone(&self.watchers),
            generation: Arc::clone(&self.generation),
        }
    }

    /// Number of registered live queries
    pub fn watcher_count(&self) -> usize {
        self.watchers.len()
    }

    /// Drop every registration
    ///
    /// Outstanding watches stop firing: [`LiveQueryWatch::changed`] returns `false`.
    pub fn reset(&self) {
        self.watchers.clear();
    }
}

impl Default for InMemoryLiveQueryStore {
    fn default() -> Self {
        Self::new(16)
    }
}

#[async_trait]
impl LiveQueryStore for InMemoryLiveQueryStore {
    async fn invalidate(&self, keys: &[InvalidationKey]) -> Result<(), LiveQueryError> {
        self.generation.fetch_add(1, Ordering::SeqCst);

        let mut closed = Vec::new();
        let mut notified = 0usize;

        for entry in self.watchers.iter() {
            if !keys.iter().any(|key| entry.keys.contains(key)) {
                continue;
            }
            match entry.sender.try_send(()) {
                Ok(()) => notified += 1,
                // A re-run is already queued for this watcher.
                Err(mpsc::error::TrySendError::Full(())) => {}
                Err(mpsc::error::TrySendError::Closed(())) => closed.push(*entry.key()),
            }
        }

        for id in closed {
            self.watchers.remove(&id);
        }

        tracing::debug!(keys = ?keys, notified, "live queries invalidated");
        Ok(())
    }
}

/// Handle to a registered live query
pub struct LiveQueryWatch {
    id: WatchId,
    receiver: mpsc::Receiver<()>,
    watchers: Arc<DashMap<WatchId, Watcher>>,
    generation: Arc<AtomicU64>,
}

impl LiveQueryWatch {
    /// Store-wide invalidation generation, read before re-running the query
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Wait until one of the watched keys is invalidated
    ///
    /// Returns `false` once the store no longer tracks this watch.
    pub async fn changed(&mut self) -> bool {
        if self.receiver.recv().await.is_none() {
            return false;
        }
        // Collapse invalidations that piled up while the query was re-running.
        while self.receiver.try_recv().is_ok() {}
        true
    }

    /// Replace the dependency keys after a query run that started at generation `since`
    ///
    /// Keys added by the run were not watched while it executed. If anything
    /// was invalidated since `since` the watch fires again, so an invalidation
    /// of a newly added key is never lost.
    pub fn retarget<I>(&self, keys: I, since: u64)
    where
        I: IntoIterator<Item = InvalidationKey>,
    {
        let Some(mut watcher) = self.watchers.get_mut(&self.id) else {
            return;
        };

        let keys: HashSet<InvalidationKey> = keys.into_iter().collect();
        let added = keys.iter().any(|key| !watcher.keys.contains(key));
        watcher.keys = keys;

        // Checked under the entry lock: a later invalidation routes against the new keys.
        if added && self.generation() != since {
            tracing::debug!(watch_id = %self.id, "keys invalidated during run, re-running");
            let _ = watcher.sender.try_send(());
        }
    }
}

impl Drop for LiveQueryWatch {
    fn drop(&mut self) {
        self.watchers.remove(&self.id);
    }
}
