//! Slot lifecycle management: match registration, spawn, eviction, timeout.
//!
//! # Lifecycle policy
//! - **Match**: a slot that won a detection remembers it as its target;
//!   the position update happens later in the smoothing step.
//! - **Spawn**: each unmatched detection takes the first free slot, or evicts
//!   the active slot unseen for longest when the pool is full. If that slot
//!   spawned less than `spawn_cooldown` ago the detection is skipped for this
//!   tick and nothing is evicted.
//! - **Warp**: a spawned slot jumps straight to its detection with zero
//!   velocity. Every spawn fires `on_track_appear`.
//! - **Timeout**: the periodic sweep retires slots unseen for more than
//!   `timeout_sec`.

use crate::{
    slot_pool::SlotPool,
    sink::TrackSink,
    types::{SlotIndex, Vec2},
};
use tracing::debug;

/// Timing parameters for the lifecycle.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackManagerConfig {
    pub spawn_cooldown: f64,
    pub timeout_sec: f64,
}

impl Default for TrackManagerConfig {
    fn default() -> Self {
        Self {
            spawn_cooldown: 0.15,
            timeout_sec: 0.5,
        }
    }
}

/// Result of a spawn attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpawnOutcome {
    /// Detection now owns `index`; `evicted` is set when it displaced an active slot.
    Spawned {
        index: SlotIndex,
        evicted: Option<SlotIndex>,
    },
    /// The candidate slot spawned too recently; detection dropped this tick.
    CoolingDown(SlotIndex),
}

/// Applies lifecycle rules to a [`SlotPool`].
#[derive(Clone, Debug, Default)]
pub struct TrackManager {
    pub config: TrackManagerConfig,
}

impl TrackManager {
    pub fn new(config: TrackManagerConfig) -> Self {
        Self { config }
    }

    /// Record that `index` won `target` in this ingest.
    pub fn register_match(&self, pool: &mut SlotPool, index: SlotIndex, target: Vec2) {
        if let Some(slot) = pool.slot_mut(index) {
            slot.matched_this_tick = true;
            slot.matched_target = target;
        }
    }

    /// Try to place an unmatched detection into the pool.
    ///
    /// Slots already claimed in this ingest are never evicted. Returns `None`
    /// when every slot is claimed.
    pub fn try_spawn<S: TrackSink + ?Sized>(
        &self,
        pool: &mut SlotPool,
        position: Vec2,
        now: f64,
        sink: &mut S,
    ) -> Option<SpawnOutcome> {
        let Some(index) = pool.first_free().or_else(|| pool.oldest_active(now)) else {
            debug!("spawn skipped, every slot claimed this tick");
            return None;
        };
        let slot = pool.slot_mut(index)?;

        if slot.cooling_down(now, self.config.spawn_cooldown) {
            debug!(slot = %index, "spawn skipped, slot cooling down");
            return Some(SpawnOutcome::CoolingDown(index));
        }

        let evicted = if slot.active {
            debug!(slot = %index, age = slot.age(now), "evicting oldest slot");
            slot.active = false;
            sink.on_track_disappear(index);
            Some(index)
        } else {
            None
        };

        slot.position = position;
        slot.matched_target = position;
        slot.velocity = Vec2::zeros();
        slot.last_seen = Some(now);
        slot.last_spawn = Some(now);
        slot.active = true;
        slot.matched_this_tick = true;
        debug!(slot = %index, x = position.x, z = position.y, "slot spawned");
        sink.on_track_appear(index);

        Some(SpawnOutcome::Spawned { index, evicted })
    }

    /// Retire every active slot unseen for more than `timeout_sec`.
    pub fn sweep_timeouts<S: TrackSink + ?Sized>(
        &self,
        pool: &mut SlotPool,
        now: f64,
        sink: &mut S,
    ) -> Vec<SlotIndex> {
        let mut retired = Vec::new();
        for slot in pool.iter_mut() {
            if slot.active && slot.age(now) > self.config.timeout_sec {
                slot.active = false;
                slot.matched_this_tick = false;
                debug!(slot = %slot.index, "slot timed out");
                sink.on_track_disappear(slot.index);
                retired.push(slot.index);
            }
        }
        retired
    }

    /// Deactivate everything.
    pub fn retire_all<S: TrackSink + ?Sized>(&self, pool: &mut SlotPool, sink: &mut S) -> usize {
        let mut count = 0;
        for slot in pool.iter_mut().filter(|s| s.active) {
            slot.active = false;
            slot.matched_this_tick = false;
            sink.on_track_disappear(slot.index);
            count += 1;
        }
        count
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
