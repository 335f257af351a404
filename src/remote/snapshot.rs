//! Dynamic snapshots and their atomically swapped holder.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime};

use arc_swap::ArcSwapOption;

use crate::source::{PropertyMap, SourceOrigin};

/// Immutable result of one successful remote fetch.
#[derive(Debug, Clone)]
pub struct DynamicSnapshot {
    sequence: u64,
    origin: SourceOrigin,
    fetched_at: SystemTime,
    values: PropertyMap,
}

impl DynamicSnapshot {
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Where the values came from, normally [`SourceOrigin::Remote`].
    pub fn origin(&self) -> &SourceOrigin {
        &self.origin
    }

    pub fn fetched_at(&self) -> SystemTime {
        self.fetched_at
    }

    /// Time since the snapshot was fetched, zero if the clock went backwards.
    pub fn age(&self) -> Duration {
        self.fetched_at.elapsed().unwrap_or_default()
    }

    pub fn values(&self) -> &PropertyMap {
        &self.values
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn keys(&self) -> BTreeSet<String> {
        self.values.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Holder of the latest snapshot.
///
/// Readers load the current `Arc` without locking and keep a consistent
/// view for as long as they hold it. The writer replaces the whole snapshot
/// in one swap; the old one is freed when its last reader lets go.
///
/// Writers serialize on `sealed`. Once [`SnapshotStore::seal`] returns, no
/// later [`SnapshotStore::try_publish`] can become visible.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    current: ArcSwapOption<DynamicSnapshot>,
    sequence: AtomicU64,
    sealed: Mutex<bool>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest published snapshot, if any.
    pub fn load(&self) -> Option<Arc<DynamicSnapshot>> {
        self.current.load_full()
    }

    /// Sequence number of the latest snapshot, zero before the first publish.
    pub fn sequence(&self) -> u64 {
        self.load().map(|s| s.sequence()).unwrap_or(0)
    }

    /// Wrap `values` in a new snapshot and make it visible to readers,
    /// sealed or not.
    pub fn publish(&self, origin: SourceOrigin, values: PropertyMap) -> Arc<DynamicSnapshot> {
        let _guard = self.sealed.lock().unwrap_or_else(PoisonError::into_inner);
        self.swap_in(origin, values)
    }

    /// Like [`SnapshotStore::publish`], but does nothing once sealed.
    ///
    /// The seal check and the swap happen under the same lock.
    pub fn try_publish(
        &self,
        origin: SourceOrigin,
        values: PropertyMap,
    ) -> Option<Arc<DynamicSnapshot>> {
        let sealed = self.sealed.lock().unwrap_or_else(PoisonError::into_inner);
        if *sealed {
            return None;
        }
        Some(self.swap_in(origin, values))
    }

    /// Refuse every later [`SnapshotStore::try_publish`]. The current
    /// snapshot stays visible.
    pub fn seal(&self) {
        *self.sealed.lock().unwrap_or_else(PoisonError::into_inner) = true;
    }

    pub fn is_sealed(&self) -> bool {
        *self.sealed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn swap_in(&self, origin: SourceOrigin, values: PropertyMap) -> Arc<DynamicSnapshot> {
        let snapshot = Arc::new(DynamicSnapshot {
            sequence: self.sequence.fetch_add(1, Ordering::SeqCst) + 1,
            origin,
            fetched_at: SystemTime::now(),
            values,
        });
        self.current.store(Some(snapshot.clone()));
        snapshot
    }
}
