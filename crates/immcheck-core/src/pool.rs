//! Recycling of snapshot containers.

use std::mem;
use std::ops::{Deref, DerefMut};
use std::sync::OnceLock;

use parking_lot::Mutex;

use crate::snapshot::Snapshot;

/// Bounded free list of [`Snapshot`]s.
///
/// Safe to use from any thread without external locking. Every snapshot
/// handed out by [`SnapshotPool::acquire`] is empty.
pub struct SnapshotPool {
    idle: Mutex<Vec<Snapshot>>,
    capacity: usize,
}

impl SnapshotPool {
    /// Idle snapshots kept by the global pool.
    pub const DEFAULT_CAPACITY: usize = 64;

    pub fn new(capacity: usize) -> Self {
        Self {
            idle: Mutex::new(Vec::new()),
            capacity,
        }
    }

    /// The process-wide pool.
    pub fn global() -> &'static SnapshotPool {
        static GLOBAL: OnceLock<SnapshotPool> = OnceLock::new();
        GLOBAL.get_or_init(|| SnapshotPool::new(Self::DEFAULT_CAPACITY))
    }

    /// Take an empty snapshot, recycled when one is idle.
    pub fn acquire(&self) -> Snapshot {
        let recycled = self.idle.lock().pop();
        match recycled {
            Some(mut snapshot) => {
                snapshot.reset();
                snapshot
            }
            None => Snapshot::new(),
        }
    }

    /// Like [`acquire`](Self::acquire), but released again on drop.
    pub fn acquire_guard(&self) -> PooledSnapshot<'_> {
        PooledSnapshot {
            snapshot: self.acquire(),
            pool: Some(self),
        }
    }

    /// Return a snapshot the caller is done with.
    pub fn release(&self, mut snapshot: Snapshot) {
        snapshot.reset();
        let mut idle = self.idle.lock();
        if idle.len() < self.capacity {
            idle.push(snapshot);
        } else {
            tracing::debug!(capacity = self.capacity, "snapshot pool full, dropping snapshot");
        }
    }

    /// Number of idle snapshots.
    pub fn idle(&self) -> usize {
        self.idle.lock().len()
    }
}

impl Default for SnapshotPool {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

/// A snapshot that returns to its pool when dropped.
pub struct PooledSnapshot<'p> {
    snapshot: Snapshot,
    pool: Option<&'p SnapshotPool>,
}

impl PooledSnapshot<'_> {
    /// Detach the snapshot from the pool.
    pub fn into_inner(mut self) -> Snapshot {
        self.pool = None;
        mem::take(&mut self.snapshot)
    }
}

impl Deref for PooledSnapshot<'_> {
    type Target = Snapshot;

    fn deref(&self) -> &Snapshot {
        &self.snapshot
    }
}

impl DerefMut for PooledSnapshot<'_> {
    fn deref_mut(&mut self) -> &mut Snapshot {
        &mut self.snapshot
    }
}

impl Drop for PooledSnapshot<'_> {
    fn drop(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.release(mem::take(&mut self.snapshot));
        }
    }
}
