//! Keyed debounce.
//!
//! Each key owns at most one pending timer. Calling [`Debouncer::call`] for a
//! key that already has a pending timer aborts that timer and starts a new one,
//! so only the last action in a burst runs, one window after the burst ends.

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::trace;

#[cfg(test)]
#[path = "debounce_tests.rs"]
mod tests;

struct Pending {
    generation: u64,
    handle: JoinHandle<()>,
}

/// Coalescing primitive keyed by stream.
pub struct Debouncer<K>
where
    K: Eq + Hash,
{
    window: Duration,
    pending: Arc<DashMap<K, Pending>>,
    generation: AtomicU64,
}

impl<K> Debouncer<K>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
{
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: Arc::new(DashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// The quiescence window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Schedule `action` for `key`, replacing any pending action for that key.
    ///
    /// Must be called from inside a tokio runtime.
    pub fn call<F>(&self, key: K, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let window = self.window;
        let pending = Arc::clone(&self.pending);
        let task_key = key.clone();

        // The entry guard makes cancel-and-replace atomic for this key.
        match self.pending.entry(key) {
            Entry::Occupied(mut slot) => {
                slot.get().handle.abort();
                trace!("Debounce {:?}: superseded pending timer", slot.key());
                let handle = spawn_timer(pending, task_key, generation, window, action);
                slot.insert(Pending { generation, handle });
            }
            Entry::Vacant(slot) => {
                let handle = spawn_timer(pending, task_key, generation, window, action);
                slot.insert(Pending { generation, handle });
            }
        }
    }

    /// Drop the pending action for `key`. Returns `true` if one was pending.
    pub fn cancel(&self, key: &K) -> bool {
        match self.pending.remove(key) {
            Some((_, pending)) => {
                pending.handle.abort();
                true
            }
            None => false,
        }
    }

    /// Drop every pending action.
    pub fn cancel_all(&self) {
        self.pending.retain(|_, pending| {
            pending.handle.abort();
            false
        });
    }

    /// Number of keys with a pending action.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.contains_key(key)
    }
}

impl<K> Drop for Debouncer<K>
where
    K: Eq + Hash,
{
    fn drop(&mut self) {
        self.pending.retain(|_, pending| {
            pending.handle.abort();
            false
        });
    }
}

fn spawn_timer<K, F>(
    pending: Arc<DashMap<K, Pending>>,
    key: K,
    generation: u64,
    window: Duration,
    action: F,
) -> JoinHandle<()>
where
    K: Eq + Hash + Send + Sync + 'static,
    F: FnOnce() + Send + 'static,
{
    tokio::spawn(async move {
        tokio::time::sleep(window).await;
        // A superseding call may have replaced this timer after it woke.
        let current = pending
            .remove_if(&key, |_, p| p.generation == generation)
            .is_some();
        if current {
            action();
        }
    })
}
