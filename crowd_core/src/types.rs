//! Fundamental types used across the entire workspace.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Scalar type: f32 positions on the (x, z) ground plane, f64 timestamps.
// ---------------------------------------------------------------------------

/// 2D world-plane vector `[x, z]`.
pub type Vec2 = Vector2<f32>;

// ---------------------------------------------------------------------------
// Identifier types - newtype wrappers so IDs are never confused at compile time
// ---------------------------------------------------------------------------

/// Permanent index of a slot in the pool. Maps 1:1 onto a sink-side visual.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SlotIndex(pub u32);

/// Handle of a pooled cluster resource owned by the sink.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ClusterHandle(pub u32);

impl SlotIndex {
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl ClusterHandle {
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

impl fmt::Display for ClusterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// A single observed position for one tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub x: f32,
    pub z: f32,
}

impl Detection {
    pub fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.z)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.z.is_finite()
    }
}

/// Detections decoded from a flat `[x0, z0, x1, z1, ...]` payload.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionBatch {
    pub detections: Vec<Detection>,
    /// True when a dangling trailing value had to be dropped.
    pub truncated: bool,
}

impl DetectionBatch {
    /// Pair up consecutive values. An odd trailing value is discarded.
    pub fn from_flat(payload: &[f32]) -> Self {
        let detections = payload
            .chunks_exact(2)
            .map(|pair| Detection::new(pair[0], pair[1]))
            .collect();
        Self {
            detections,
            truncated: payload.len() % 2 != 0,
        }
    }

    pub fn len(&self) -> usize {
        self.detections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Engine outputs
// ---------------------------------------------------------------------------

/// A dense grouping of active slots. Recomputed from scratch every tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub center: Vec2,
    /// Member count (accumulated density in overlapping mode)
    pub size: u32,
}

/// Ranked, capped cluster output of one clustering pass.
pub type ClusterList = Vec<Cluster>;

/// Read-only view of an active slot, handed to the sink for repositioning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackView {
    pub index: SlotIndex,
    pub position: Vec2,
    pub velocity: Vec2,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
