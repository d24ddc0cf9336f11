//! Slot pool: fixed-capacity storage of track slots.
//!
//! Slots are allocated once and never reallocated; only their activity flag
//! and kinematic fields change. A slot's index is a pool identity, not an
//! entity identity: after retire + respawn the same index may follow a
//! different person.

use crate::types::{SlotIndex, TrackView, Vec2};

/// A single pool entry.
#[derive(Clone, Debug)]
pub struct TrackSlot {
    /// Stable pool identity
    pub index: SlotIndex,
    /// Smoothed position
    pub position: Vec2,
    /// Damped-spring velocity state
    pub velocity: Vec2,
    /// Time of the last match or spawn (`None` = never)
    pub last_seen: Option<f64>,
    /// Time of the last spawn (`None` = never)
    pub last_spawn: Option<f64>,
    pub active: bool,
    /// Set while a detection is assigned in the current ingest
    pub matched_this_tick: bool,
    /// Detection the slot is moving toward
    pub matched_target: Vec2,
}

impl TrackSlot {
    pub fn new(index: SlotIndex) -> Self {
        Self {
            index,
            position: Vec2::zeros(),
            velocity: Vec2::zeros(),
            last_seen: None,
            last_spawn: None,
            active: false,
            matched_this_tick: false,
            matched_target: Vec2::zeros(),
        }
    }

    /// Seconds since the last match. Never-seen slots are infinitely old.
    pub fn age(&self, now: f64) -> f64 {
        self.last_seen.map_or(f64::INFINITY, |t| now - t)
    }

    /// True while `now` is inside the spawn cooldown window.
    pub fn cooling_down(&self, now: f64, cooldown: f64) -> bool {
        self.last_spawn.is_some_and(|t| now - t < cooldown)
    }

    pub fn view(&self) -> TrackView {
        TrackView {
            index: self.index,
            position: self.position,
            velocity: self.velocity,
        }
    }
}

/// Fixed-size array of [`TrackSlot`]s.
#[derive(Clone, Debug)]
pub struct SlotPool {
    slots: Vec<TrackSlot>,
}

impl SlotPool {
    pub fn new(capacity: usize) -> Self {
        let slots = (0..capacity)
            .map(|i| TrackSlot::new(SlotIndex(i as u32)))
            .collect();
        Self { slots }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn slot(&self, index: SlotIndex) -> Option<&TrackSlot> {
        self.slots.get(index.as_usize())
    }

    pub fn slot_mut(&mut self, index: SlotIndex) -> Option<&mut TrackSlot> {
        self.slots.get_mut(index.as_usize())
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackSlot> {
        self.slots.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut TrackSlot> {
        self.slots.iter_mut()
    }

    pub fn active(&self) -> impl Iterator<Item = &TrackSlot> {
        self.slots.iter().filter(|s| s.active)
    }

    pub fn active_count(&self) -> usize {
        self.active().count()
    }

    /// Active slot indices in ascending order.
    pub fn active_indices(&self) -> Vec<SlotIndex> {
        self.active().map(|s| s.index).collect()
    }

    /// Lowest-index inactive slot.
    pub fn first_free(&self) -> Option<SlotIndex> {
        self.slots.iter().find(|s| !s.active).map(|s| s.index)
    }

    /// Active slot with the largest `now - last_seen`, skipping slots already
    /// claimed by a detection in the current ingest. Ties go to the lower index.
    pub fn oldest_active(&self, now: f64) -> Option<SlotIndex> {
        let mut best: Option<(&TrackSlot, f64)> = None;
        for slot in self.active().filter(|s| !s.matched_this_tick) {
            let age = slot.age(now);
            if best.map_or(true, |(_, best_age)| age > best_age) {
                best = Some((slot, age));
            }
        }
        best.map(|(s, _)| s.index)
    }

    pub fn clear_matches(&mut self) {
        for slot in &mut self.slots {
            slot.matched_this_tick = false;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
