//! Engine configuration and validation.
//!
//! Every tunable lives in one explicit [`EngineConfig`] that is validated
//! once and then handed to the engine. Out-of-range values are rejected
//! with [`EngineError::InvalidConfig`] instead of being coerced, because they
//! change what the algorithms compute.

use crate::geometry::WorldBounds;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by the engine. Only configuration can fail.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// A configuration value is out of range.
    #[error("invalid configuration `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },
}

impl EngineError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

/// How raw detection coordinates are interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMapping {
    /// Coordinates are already world units.
    #[default]
    World,
    /// Coordinates are in `[0, 1]` and get mapped onto the world bounds.
    Normalized,
}

/// Which clustering algorithm runs each tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterMode {
    /// Each point belongs to at most one cluster.
    #[default]
    ExclusivePartition,
    /// Density candidates per point, merged and ranked.
    Overlapping,
}

/// Clustering parameters. Editable at run time via
/// [`crate::Engine::reconfigure_clustering`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Neighbourhood radius (world units)
    pub radius: f32,
    /// Minimum members for a cluster to be emitted
    pub min_members: u32,
    /// Cap on emitted clusters per tick
    pub max_clusters: usize,
    pub mode: ClusterMode,
    /// Merge distance for overlapping-mode candidates
    pub merge_eps: f32,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            radius: 1.5,
            min_members: 3,
            max_clusters: 8,
            mode: ClusterMode::ExclusivePartition,
            merge_eps: 0.75,
        }
    }
}

impl ClusterConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(EngineError::invalid("clustering.radius", "must be positive"));
        }
        if self.min_members < 2 {
            return Err(EngineError::invalid(
                "clustering.min_members",
                "a cluster needs at least 2 members",
            ));
        }
        if self.max_clusters == 0 {
            return Err(EngineError::invalid(
                "clustering.max_clusters",
                "must be at least 1",
            ));
        }
        if !(self.merge_eps.is_finite() && self.merge_eps >= 0.0) {
            return Err(EngineError::invalid(
                "clustering.merge_eps",
                "must be finite and non-negative",
            ));
        }
        Ok(())
    }
}

/// Full engine configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Slot pool capacity. Fixed for the session.
    pub max_players: usize,
    /// Gate for detection ↔ slot association (world units)
    pub assign_max_distance: f32,
    /// Minimum seconds between two spawns of the same slot
    pub spawn_cooldown: f64,
    /// Seconds without a match before a slot is retired
    pub timeout_sec: f64,
    /// Characteristic time of the damped smoothing (seconds)
    pub smooth_time: f32,
    pub world_bounds: WorldBounds,
    pub input_mapping: InputMapping,
    pub clustering: ClusterConfig,
    /// Number of pooled cluster resources the sink provides
    pub cluster_resources: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_players: 20,
            assign_max_distance: 1.2,
            spawn_cooldown: 0.15,
            timeout_sec: 0.5,
            smooth_time: 0.08,
            world_bounds: WorldBounds::default(),
            input_mapping: InputMapping::World,
            clustering: ClusterConfig::default(),
            cluster_resources: 8,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.max_players == 0 {
            return Err(EngineError::invalid("max_players", "pool needs at least one slot"));
        }
        if self.max_players > u32::MAX as usize {
            return Err(EngineError::invalid("max_players", "exceeds slot index range"));
        }
        if !(self.assign_max_distance.is_finite() && self.assign_max_distance > 0.0) {
            return Err(EngineError::invalid("assign_max_distance", "must be positive"));
        }
        if !(self.spawn_cooldown.is_finite() && self.spawn_cooldown >= 0.0) {
            return Err(EngineError::invalid(
                "spawn_cooldown",
                "must be finite and non-negative",
            ));
        }
        if !(self.timeout_sec.is_finite() && self.timeout_sec > 0.0) {
            return Err(EngineError::invalid("timeout_sec", "must be positive"));
        }
        if !(self.smooth_time.is_finite() && self.smooth_time > 0.0) {
            return Err(EngineError::invalid("smooth_time", "must be positive"));
        }
        let b = &self.world_bounds;
        let finite = [b.min_x, b.max_x, b.min_z, b.max_z]
            .iter()
            .all(|v| v.is_finite());
        if !finite || b.min_x >= b.max_x || b.min_z >= b.max_z {
            return Err(EngineError::invalid(
                "world_bounds",
                format!(
                    "need finite min < max on both axes, got x [{}, {}] z [{}, {}]",
                    b.min_x, b.max_x, b.min_z, b.max_z
                ),
            ));
        }
        self.clustering.validate()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
