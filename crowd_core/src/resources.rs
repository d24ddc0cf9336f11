//! Pooled cluster resources and the count synchronizer.
//!
//! The sink owns a fixed number of cluster visuals. [`ResourceArena`] hands
//! out their handles; [`ClusterSync`] keeps one handle per emitted cluster,
//! matched by list position only. Cluster `i` this tick and cluster `i` last
//! tick share a handle even if they are unrelated groups.

use crate::sink::TrackSink;
use crate::types::{Cluster, ClusterHandle};
use tracing::debug;

/// Fixed-capacity handle arena with LIFO reuse.
#[derive(Clone, Debug)]
pub struct ResourceArena {
    free: Vec<ClusterHandle>,
    in_use: Vec<bool>,
}

impl ResourceArena {
    pub fn new(capacity: usize) -> Self {
        // Reverse so handle 0 is popped first.
        let free = (0..capacity as u32).rev().map(ClusterHandle).collect();
        Self {
            free,
            in_use: vec![false; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.in_use.len()
    }

    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Take a free handle, or `None` when the pool is exhausted.
    pub fn acquire(&mut self) -> Option<ClusterHandle> {
        let h = self.free.pop()?;
        self.in_use[h.as_usize()] = true;
        Some(h)
    }

    /// Return a handle. Releasing an unknown or already-free handle is ignored.
    pub fn release(&mut self, handle: ClusterHandle) {
        match self.in_use.get_mut(handle.as_usize()) {
            Some(used) if *used => {
                *used = false;
                self.free.push(handle);
            }
            _ => {}
        }
    }
}

/// Reconciles live cluster handles with the latest cluster list.
#[derive(Clone, Debug)]
pub struct ClusterSync {
    arena: ResourceArena,
    live: Vec<ClusterHandle>,
}

impl ClusterSync {
    pub fn new(capacity: usize) -> Self {
        Self {
            arena: ResourceArena::new(capacity),
            live: Vec::new(),
        }
    }

    /// Handles in list-position order.
    pub fn live(&self) -> &[ClusterHandle] {
        &self.live
    }

    pub fn arena(&self) -> &ResourceArena {
        &self.arena
    }

    /// Grow or shrink to `clusters.len()` handles, then push every covered
    /// cluster center to its handle.
    pub fn sync<S: TrackSink + ?Sized>(&mut self, clusters: &[Cluster], sink: &mut S) {
        let needed = clusters.len();

        while self.live.len() < needed {
            match self.arena.acquire() {
                Some(h) => {
                    self.live.push(h);
                    sink.on_cluster_appear(h);
                }
                None => {
                    debug!(
                        needed,
                        have = self.live.len(),
                        "cluster resources exhausted, skipping extra clusters"
                    );
                    break;
                }
            }
        }

        while self.live.len() > needed {
            if let Some(h) = self.live.pop() {
                self.arena.release(h);
                sink.on_cluster_disappear(h);
            }
        }

        for (cluster, &h) in clusters.iter().zip(&self.live) {
            sink.on_cluster_update(h, cluster.center);
        }
    }

    /// Release every live handle.
    pub fn release_all<S: TrackSink + ?Sized>(&mut self, sink: &mut S) {
        self.sync(&[], sink);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
