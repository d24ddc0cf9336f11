//! Side-effect interface toward the visual/resource sink.
//!
//! The engine never renders. It reports lifecycle changes through
//! [`TrackSink`]; every callback defaults to a no-op so a sink only
//! implements what it cares about.

use crate::types::{ClusterHandle, SlotIndex, Vec2};
use serde::{Deserialize, Serialize};

/// Receiver of engine side effects.
pub trait TrackSink {
    /// A slot was spawned for a new detection.
    fn on_track_appear(&mut self, _index: SlotIndex) {}

    /// A matched slot moved to `position` (already smoothed and clamped).
    fn on_track_update(&mut self, _index: SlotIndex, _position: Vec2) {}

    /// A slot was retired by timeout, eviction or reset.
    fn on_track_disappear(&mut self, _index: SlotIndex) {}

    /// A cluster resource was acquired for a new list position.
    fn on_cluster_appear(&mut self, _handle: ClusterHandle) {}

    /// The cluster at this handle's list position has a (new) center.
    fn on_cluster_update(&mut self, _handle: ClusterHandle, _center: Vec2) {}

    /// A cluster resource was released back to the pool.
    fn on_cluster_disappear(&mut self, _handle: ClusterHandle) {}
}

/// Sink that ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl TrackSink for NullSink {}

impl<T: TrackSink + ?Sized> TrackSink for &mut T {
    fn on_track_appear(&mut self, index: SlotIndex) {
        (**self).on_track_appear(index)
    }
    fn on_track_update(&mut self, index: SlotIndex, position: Vec2) {
        (**self).on_track_update(index, position)
    }
    fn on_track_disappear(&mut self, index: SlotIndex) {
        (**self).on_track_disappear(index)
    }
    fn on_cluster_appear(&mut self, handle: ClusterHandle) {
        (**self).on_cluster_appear(handle)
    }
    fn on_cluster_update(&mut self, handle: ClusterHandle, center: Vec2) {
        (**self).on_cluster_update(handle, center)
    }
    fn on_cluster_disappear(&mut self, handle: ClusterHandle) {
        (**self).on_cluster_disappear(handle)
    }
}

/// One recorded side effect.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum SinkEvent {
    TrackAppear(SlotIndex),
    TrackUpdate(SlotIndex, Vec2),
    TrackDisappear(SlotIndex),
    ClusterAppear(ClusterHandle),
    ClusterUpdate(ClusterHandle, Vec2),
    ClusterDisappear(ClusterHandle),
}

/// Sink that records every event in order.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    pub events: Vec<SinkEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return everything recorded so far.
    pub fn drain(&mut self) -> Vec<SinkEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn appeared(&self) -> Vec<SlotIndex> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::TrackAppear(i) => Some(*i),
                _ => None,
            })
            .collect()
    }

    pub fn disappeared(&self) -> Vec<SlotIndex> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::TrackDisappear(i) => Some(*i),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&SinkEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl TrackSink for EventLog {
    fn on_track_appear(&mut self, index: SlotIndex) {
        self.events.push(SinkEvent::TrackAppear(index));
    }
    fn on_track_update(&mut self, index: SlotIndex, position: Vec2) {
        self.events.push(SinkEvent::TrackUpdate(index, position));
    }
    fn on_track_disappear(&mut self, index: SlotIndex) {
        self.events.push(SinkEvent::TrackDisappear(index));
    }
    fn on_cluster_appear(&mut self, handle: ClusterHandle) {
        self.events.push(SinkEvent::ClusterAppear(handle));
    }
    fn on_cluster_update(&mut self, handle: ClusterHandle, center: Vec2) {
        self.events.push(SinkEvent::ClusterUpdate(handle, center));
    }
    fn on_cluster_disappear(&mut self, handle: ClusterHandle) {
        self.events.push(SinkEvent::ClusterDisappear(handle));
    }
}
