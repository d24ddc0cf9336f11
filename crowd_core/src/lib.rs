//! `crowd_core` - Crowd tracking and clustering engine.
//!
//! Turns noisy, unlabeled position batches into a bounded set of stable,
//! smoothed tracks and groups them into clusters each tick.
//!
//! # Module layout
//! - [`types`]        - Fundamental types (slot/cluster handles, detections, clusters)
//! - [`config`]       - Engine configuration, validation, errors
//! - [`geometry`]     - Distances, centroids, critically damped smoothing, world bounds
//! - [`slot_pool`]    - Fixed-capacity track slot storage
//! - [`association`]  - Gated bipartite graph, greedy nearest-first solver
//! - [`track_manager`] - Spawn / eviction / cooldown / timeout logic
//! - [`clustering`]   - Exclusive-partition and overlapping-density strategies
//! - [`sink`]         - Side-effect callbacks toward the renderer
//! - [`resources`]    - Pooled cluster resources and count synchronizer
//! - [`pipeline`]     - Engine orchestrator (ingest + tick)
//! - [`metrics`]      - RMSE, ID-switch, precision/recall against ground truth

pub mod association;
pub mod clustering;
pub mod config;
pub mod geometry;
pub mod metrics;
pub mod pipeline;
pub mod resources;
pub mod sink;
pub mod slot_pool;
pub mod track_manager;
pub mod types;

pub use clustering::{ClusterStrategy, ExclusivePartition, OverlappingDensity};
pub use config::{ClusterConfig, ClusterMode, EngineConfig, EngineError, InputMapping};
pub use geometry::WorldBounds;
pub use pipeline::{Engine, IngestReport};
pub use sink::{EventLog, NullSink, SinkEvent, TrackSink};
pub use types::{
    Cluster, ClusterHandle, ClusterList, Detection, DetectionBatch, SlotIndex, TrackView, Vec2,
};
