//! Engine orchestrator: one ingest and one tick per logical step.
//!
//! # Ingest (`submit_detections`)
//! 1. Decode / map / filter detections (non-finite dropped, capped at pool size)
//! 2. Clear per-tick match flags
//! 3. Gate active slots × detections, solve greedily
//! 4. Register matches
//! 5. Spawn slots for unmatched detections (cooldown + eviction)
//! 6. Smooth matched slots toward their targets, clamp to world bounds
//! 7. Notify the sink of every moved slot
//!
//! # Tick (`advance`)
//! 1. Retire timed-out slots
//! 2. Cluster active positions (slot-index order)
//! 3. Synchronize pooled cluster resources
//!
//! Everything runs synchronously on the caller's thread; the engine is the
//! sole owner of its slot pool.

use crate::{
    association::{build_graph, greedy_solve},
    clustering::{strategy_for, ClusterStrategy},
    config::{ClusterConfig, EngineConfig, EngineError, InputMapping},
    geometry::smooth_damp,
    resources::ClusterSync,
    sink::{NullSink, TrackSink},
    slot_pool::SlotPool,
    track_manager::{SpawnOutcome, TrackManager, TrackManagerConfig},
    types::{Cluster, ClusterList, Detection, DetectionBatch, SlotIndex, TrackView, Vec2},
};
use std::time::Instant;
use tracing::{debug, trace, warn};

/// Diagnostics for one ingest call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IngestReport {
    /// Detections handed in
    pub received: usize,
    /// Detections that entered association
    pub accepted: usize,
    /// Payload had a dangling odd value
    pub truncated_payload: bool,
    /// Detections beyond pool capacity
    pub over_capacity: usize,
    /// Detections with NaN / infinite coordinates
    pub dropped_non_finite: usize,
    pub matched: usize,
    pub spawned: usize,
    pub evicted: usize,
    /// Unmatched detections skipped because their slot was cooling down
    pub cooling_down: usize,
    pub elapsed_us: u64,
}

/// The tracking + clustering engine.
pub struct Engine<S: TrackSink = NullSink> {
    config: EngineConfig,
    pool: SlotPool,
    track_manager: TrackManager,
    strategy: Box<dyn ClusterStrategy + Send + Sync>,
    cluster_sync: ClusterSync,
    clusters: ClusterList,
    last_ingest: Option<f64>,
    sink: S,
}

impl Engine<NullSink> {
    /// Engine without side effects; query results with [`Engine::active_tracks`].
    pub fn headless(config: EngineConfig) -> Result<Self, EngineError> {
        Self::new(config, NullSink)
    }
}

impl<S: TrackSink> Engine<S> {
    /// Validate `config` and allocate the slot pool.
    pub fn new(config: EngineConfig, sink: S) -> Result<Self, EngineError> {
        config.validate()?;
        let strategy = strategy_for(config.clustering.mode);
        Ok(Self {
            pool: SlotPool::new(config.max_players),
            track_manager: TrackManager::new(manager_config(&config)),
            strategy,
            cluster_sync: ClusterSync::new(config.cluster_resources),
            clusters: ClusterList::new(),
            last_ingest: None,
            sink,
            config,
        })
    }

    /// Replace the clustering algorithm with a custom one. Reconfiguring the
    /// cluster mode afterwards switches back to a built-in strategy.
    pub fn with_strategy(mut self, strategy: Box<dyn ClusterStrategy + Send + Sync>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn pool(&self) -> &SlotPool {
        &self.pool
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Clusters computed by the most recent [`Engine::advance`].
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    // -----------------------------------------------------------------------
    // Configuration
    // -----------------------------------------------------------------------

    /// Swap in a new configuration. The pool size is fixed for the session.
    pub fn reconfigure(&mut self, config: EngineConfig) -> Result<(), EngineError> {
        config.validate()?;
        if config.max_players != self.config.max_players {
            return Err(EngineError::InvalidConfig {
                field: "max_players",
                reason: format!(
                    "pool size is fixed for the session ({} -> {})",
                    self.config.max_players, config.max_players
                ),
            });
        }
        if config.cluster_resources != self.config.cluster_resources {
            self.cluster_sync.release_all(&mut self.sink);
            self.cluster_sync = ClusterSync::new(config.cluster_resources);
        }
        if config.clustering.mode != self.config.clustering.mode {
            self.strategy = strategy_for(config.clustering.mode);
        }
        self.track_manager = TrackManager::new(manager_config(&config));
        debug!(?config, "engine reconfigured");
        self.config = config;
        Ok(())
    }

    /// Update only the clustering parameters.
    pub fn reconfigure_clustering(&mut self, clustering: ClusterConfig) -> Result<(), EngineError> {
        let config = EngineConfig {
            clustering,
            ..self.config.clone()
        };
        self.reconfigure(config)
    }

    // -----------------------------------------------------------------------
    // Ingest
    // -----------------------------------------------------------------------

    /// Decode a flat `[x0, z0, x1, z1, ...]` payload and ingest it.
    pub fn submit_flat(&mut self, payload: &[f32], now: f64) -> IngestReport {
        let batch = DetectionBatch::from_flat(payload);
        if batch.truncated {
            warn!(len = payload.len(), "odd-length detection payload, trailing value dropped");
        }
        let mut report = self.submit_detections(&batch.detections, now);
        report.truncated_payload = batch.truncated;
        report
    }

    /// Associate a detection batch with the pool, spawn, and smooth.
    ///
    /// A batch stamped with a non-finite time is ignored.
    pub fn submit_detections(&mut self, batch: &[Detection], now: f64) -> IngestReport {
        if !now.is_finite() {
            warn!(now, len = batch.len(), "non-finite ingest time, batch ignored");
            return IngestReport {
                received: batch.len(),
                ..Default::default()
            };
        }
        let start = Instant::now();
        let mut report = IngestReport {
            received: batch.len(),
            ..Default::default()
        };

        // Step 1: map + filter
        let capacity = self.pool.capacity();
        if batch.len() > capacity {
            report.over_capacity = batch.len() - capacity;
        }
        let detections: Vec<Vec2> = batch
            .iter()
            .take(capacity)
            .filter(|d| {
                let ok = d.is_finite();
                if !ok {
                    report.dropped_non_finite += 1;
                }
                ok
            })
            .map(|d| self.map_detection(d))
            .collect();
        report.accepted = detections.len();

        // Step 2
        self.pool.clear_matches();

        // Step 3: association
        let active = self.pool.active_indices();
        let positions: Vec<Vec2> = active
            .iter()
            .filter_map(|&i| self.pool.slot(i).map(|s| s.position))
            .collect();
        let graph = build_graph(&positions, &detections, self.config.assign_max_distance);
        let assignment = greedy_solve(&graph);

        // Step 4
        for &(ti, mi) in &assignment.pairs {
            self.track_manager
                .register_match(&mut self.pool, active[ti], detections[mi]);
        }
        report.matched = assignment.pairs.len();

        // Step 5: spawn for leftovers, in detection order
        for &mi in &assignment.unmatched_meas {
            match self
                .track_manager
                .try_spawn(&mut self.pool, detections[mi], now, &mut self.sink)
            {
                Some(SpawnOutcome::Spawned { evicted, .. }) => {
                    report.spawned += 1;
                    if evicted.is_some() {
                        report.evicted += 1;
                    }
                }
                Some(SpawnOutcome::CoolingDown(_)) => report.cooling_down += 1,
                None => {}
            }
        }

        // Step 6-7: smoothing
        let dt = self
            .last_ingest
            .map_or(0.0, |prev| (now - prev).max(0.0)) as f32;
        self.last_ingest = Some(now);
        let smooth_time = self.config.smooth_time;
        let bounds = self.config.world_bounds;
        for slot in self.pool.iter_mut() {
            if !(slot.active && slot.matched_this_tick) {
                continue;
            }
            let next = smooth_damp(
                slot.position,
                slot.matched_target,
                &mut slot.velocity,
                smooth_time,
                dt,
            );
            slot.position = bounds.clamp(next);
            slot.last_seen = Some(now);
            self.sink.on_track_update(slot.index, slot.position);
        }

        report.elapsed_us = start.elapsed().as_micros() as u64;
        trace!(?report, "ingest done");
        report
    }

    fn map_detection(&self, d: &Detection) -> Vec2 {
        match self.config.input_mapping {
            InputMapping::World => d.position(),
            InputMapping::Normalized => self.config.world_bounds.map_normalized(d.x, d.z),
        }
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Timeout sweep + clustering + cluster resource sync. A non-finite `now`
    /// skips the tick and returns the previous clusters.
    pub fn advance(&mut self, now: f64) -> ClusterList {
        if !now.is_finite() {
            warn!(now, "non-finite tick time, tick skipped");
            return self.clusters.clone();
        }
        let retired = self
            .track_manager
            .sweep_timeouts(&mut self.pool, now, &mut self.sink);

        let points: Vec<Vec2> = self.pool.active().map(|s| s.position).collect();
        self.clusters = self
            .strategy
            .find_clusters(&points, &self.config.clustering);
        self.cluster_sync.sync(&self.clusters, &mut self.sink);

        trace!(
            now,
            active = points.len(),
            retired = retired.len(),
            clusters = self.clusters.len(),
            "tick"
        );
        self.clusters.clone()
    }

    // -----------------------------------------------------------------------
    // Query
    // -----------------------------------------------------------------------

    /// Active slots in index order.
    pub fn active_tracks(&self) -> Vec<TrackView> {
        self.pool.active().map(|s| s.view()).collect()
    }

    pub fn track(&self, index: SlotIndex) -> Option<TrackView> {
        self.pool.slot(index).filter(|s| s.active).map(|s| s.view())
    }

    pub fn active_count(&self) -> usize {
        self.pool.active_count()
    }

    /// Deactivate every slot and release all cluster resources.
    pub fn reset(&mut self) {
        let retired = self.track_manager.retire_all(&mut self.pool, &mut self.sink);
        for slot in self.pool.iter_mut() {
            slot.last_seen = None;
            slot.last_spawn = None;
            slot.velocity = Vec2::zeros();
        }
        self.cluster_sync.release_all(&mut self.sink);
        self.clusters.clear();
        self.last_ingest = None;
        debug!(retired, "engine reset");
    }
}

fn manager_config(config: &EngineConfig) -> TrackManagerConfig {
    TrackManagerConfig {
        spawn_cooldown: config.spawn_cooldown,
        timeout_sec: config.timeout_sec,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClusterMode;
    use crate::geometry::WorldBounds;
    use crate::sink::{EventLog, SinkEvent};
    use approx::assert_abs_diff_eq;

    fn dets(points: &[(f32, f32)]) -> Vec<Detection> {
        points.iter().map(|&(x, z)| Detection::new(x, z)).collect()
    }

    fn wide_config() -> EngineConfig {
        EngineConfig {
            world_bounds: WorldBounds {
                min_x: -20.0,
                max_x: 20.0,
                min_z: -20.0,
                max_z: 20.0,
            },
            ..Default::default()
        }
    }

    #[test]
    fn single_detection_spawns_one_slot() {
        let cfg = EngineConfig {
            max_players: 4,
            ..Default::default()
        };
        let mut engine = Engine::new(cfg, EventLog::new()).unwrap();
        let report = engine.submit_detections(&dets(&[(0.0, 0.0)]), 0.0);
        assert_eq!(report.spawned, 1);

        let clusters = engine.advance(0.0);
        assert!(clusters.is_empty());
        let tracks = engine.active_tracks();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].position, Vec2::zeros());
        assert_eq!(engine.sink().appeared(), vec![SlotIndex(0)]);
    }

    #[test]
    fn dense_group_emits_one_partition_cluster() {
        let mut engine = Engine::headless(EngineConfig::default()).unwrap();
        let pts = [(0.0, 0.0), (0.5, 0.0), (0.0, 0.5), (0.5, 0.5), (0.25, 0.25)];
        engine.submit_detections(&dets(&pts), 0.0);
        let clusters = engine.advance(0.0);
        assert_eq!(clusters.len(), 1);

        let center = clusters[0].center;
        let r2 = engine.config().clustering.radius.powi(2);
        let within = engine
            .active_tracks()
            .iter()
            .filter(|t| (t.position - center).norm_squared() <= r2)
            .count();
        assert_eq!(clusters[0].size as usize, within);
        assert_eq!(within, 5);
    }

    #[test]
    fn unmatched_slot_survives_until_timeout() {
        let mut engine = Engine::new(wide_config(), EventLog::new()).unwrap();
        engine.submit_detections(&dets(&[(10.0, 10.0)]), 0.0);
        engine.submit_detections(&dets(&[(-10.0, -10.0)]), 0.1);

        engine.advance(0.3);
        assert!(engine.track(SlotIndex(0)).is_some());
        engine.advance(0.5);
        assert!(engine.track(SlotIndex(0)).is_some(), "retires only after > timeout");
        engine.advance(0.51);
        assert!(engine.track(SlotIndex(0)).is_none());
        assert!(engine.track(SlotIndex(1)).is_some());
        assert_eq!(engine.sink().disappeared(), vec![SlotIndex(0)]);
    }

    #[test]
    fn overlapping_mode_merges_close_candidates() {
        let cfg = EngineConfig {
            clustering: ClusterConfig {
                radius: 0.7,
                min_members: 2,
                max_clusters: 8,
                mode: ClusterMode::Overlapping,
                merge_eps: 0.7,
            },
            ..Default::default()
        };
        let mut engine = Engine::headless(cfg).unwrap();
        engine.submit_detections(&dets(&[(0.0, 0.0), (0.4, 0.0)]), 0.0);
        let clusters = engine.advance(0.0);
        // Two candidates of density 2 at (0.2, 0): weighted mean is unchanged.
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].size, 4);
        assert_abs_diff_eq!(clusters[0].center.x, 0.2, epsilon = 1e-6);
    }

    #[test]
    fn tracks_follow_moving_detection() {
        let mut engine = Engine::new(EngineConfig::default(), EventLog::new()).unwrap();
        engine.submit_detections(&dets(&[(0.0, 0.0)]), 0.0);
        for step in 1..=30 {
            let t = step as f64 * 0.02;
            engine.submit_detections(&dets(&[(0.5, 0.0)]), t);
        }
        let track = engine.track(SlotIndex(0)).unwrap();
        assert_abs_diff_eq!(track.position.x, 0.5, epsilon = 1e-2);
        assert_eq!(engine.active_count(), 1);
        assert_eq!(engine.sink().appeared().len(), 1);
    }

    #[test]
    fn matched_slot_keeps_identity_under_reordering() {
        let mut engine = Engine::headless(EngineConfig::default()).unwrap();
        engine.submit_detections(&dets(&[(-3.0, 0.0), (3.0, 0.0)]), 0.0);
        engine.submit_detections(&dets(&[(3.1, 0.0), (-3.1, 0.0)]), 0.05);
        let tracks = engine.active_tracks();
        assert_eq!(tracks.len(), 2);
        assert!(tracks[0].position.x < 0.0);
        assert!(tracks[1].position.x > 0.0);
    }

    #[test]
    fn positions_clamped_to_bounds() {
        let mut engine = Engine::headless(EngineConfig::default()).unwrap();
        engine.submit_detections(&dets(&[(9.0, -9.0)]), 0.0);
        let t = engine.active_tracks()[0];
        assert_eq!(t.position, Vec2::new(5.0, -5.0));

        engine.submit_detections(&dets(&[(5.8, -5.8)]), 0.1);
        let bounds = engine.config().world_bounds;
        for t in engine.active_tracks() {
            assert!(bounds.contains(&t.position));
        }
    }

    #[test]
    fn capacity_never_exceeded() {
        let cfg = EngineConfig {
            max_players: 3,
            spawn_cooldown: 0.0,
            ..Default::default()
        };
        let mut engine = Engine::headless(cfg).unwrap();
        for step in 0..20 {
            let t = step as f64 * 0.1;
            let off = step as f32 * 0.01;
            let batch: Vec<Detection> = (0..6)
                .map(|i| Detection::new(-4.0 + i as f32 * 1.6 + off, off))
                .collect();
            let report = engine.submit_detections(&batch, t);
            assert_eq!(report.over_capacity, 3);
            engine.advance(t);
            assert!(engine.active_count() <= 3);
        }
    }

    #[test]
    fn eviction_replaces_stalest_slot() {
        let cfg = EngineConfig {
            max_players: 2,
            ..Default::default()
        };
        let mut engine = Engine::new(cfg, EventLog::new()).unwrap();
        engine.submit_detections(&dets(&[(-4.0, 0.0), (4.0, 0.0)]), 0.0);
        // Keep slot 1 fresh.
        engine.submit_detections(&dets(&[(4.0, 0.0)]), 0.2);
        engine.sink_mut().drain();

        let report = engine.submit_detections(&dets(&[(4.0, 0.0), (0.0, 4.0)]), 0.3);
        assert_eq!(report.evicted, 1);
        assert_eq!(
            engine.sink().events[..2],
            [
                SinkEvent::TrackDisappear(SlotIndex(0)),
                SinkEvent::TrackAppear(SlotIndex(0)),
            ]
        );
        assert_eq!(engine.track(SlotIndex(0)).unwrap().position, Vec2::new(0.0, 4.0));
    }

    #[test]
    fn spawn_cooldown_blocks_respawn() {
        let cfg = EngineConfig {
            max_players: 1,
            ..Default::default()
        };
        let mut engine = Engine::headless(cfg).unwrap();
        engine.submit_detections(&dets(&[(-4.0, 0.0)]), 0.0);
        let report = engine.submit_detections(&dets(&[(4.0, 0.0)]), 0.1);
        assert_eq!(report.cooling_down, 1);
        assert_eq!(report.spawned, 0);
        assert_eq!(engine.active_tracks()[0].position, Vec2::new(-4.0, 0.0));

        let report = engine.submit_detections(&dets(&[(4.0, 0.0)]), 0.2);
        assert_eq!(report.spawned, 1);
        assert_eq!(report.evicted, 1);
    }

    #[test]
    fn malformed_input_never_fails() {
        let mut engine = Engine::headless(EngineConfig::default()).unwrap();
        let report = engine.submit_flat(&[0.0, 0.0, f32::NAN, 1.0, 2.0], 0.0);
        assert!(report.truncated_payload);
        assert_eq!(report.received, 2);
        assert_eq!(report.dropped_non_finite, 1);
        assert_eq!(report.accepted, 1);

        // Time going backwards is treated as zero elapsed.
        let report = engine.submit_flat(&[0.1, 0.0], -1.0);
        assert_eq!(report.matched, 1);
        engine.advance(-1.0);
    }

    #[test]
    fn normalized_input_maps_onto_bounds() {
        let cfg = EngineConfig {
            input_mapping: InputMapping::Normalized,
            ..Default::default()
        };
        let mut engine = Engine::headless(cfg).unwrap();
        engine.submit_flat(&[0.5, 1.0], 0.0);
        assert_eq!(engine.active_tracks()[0].position, Vec2::new(0.0, 5.0));
    }

    #[test]
    fn clusters_drive_sink_resources() {
        let cfg = EngineConfig {
            cluster_resources: 1,
            ..wide_config()
        };
        let mut engine = Engine::new(cfg, EventLog::new()).unwrap();
        let mut pts: Vec<(f32, f32)> = (0..3).map(|i| (i as f32 * 0.2, 0.0)).collect();
        pts.extend((0..3).map(|i| (10.0 + i as f32 * 0.2, 0.0)));
        engine.submit_detections(&dets(&pts), 0.0);
        engine.sink_mut().drain();

        let clusters = engine.advance(0.0);
        assert_eq!(clusters.len(), 2);
        let log = engine.sink();
        assert_eq!(log.count(|e| matches!(e, SinkEvent::ClusterAppear(_))), 1);
        assert_eq!(log.count(|e| matches!(e, SinkEvent::ClusterUpdate(..))), 1);

        // Everyone goes silent: clusters vanish and the resource is released.
        engine.sink_mut().drain();
        assert!(engine.advance(1.0).is_empty());
        assert_eq!(
            engine
                .sink()
                .count(|e| matches!(e, SinkEvent::ClusterDisappear(_))),
            1
        );
    }

    #[test]
    fn cluster_bounds_hold() {
        let cfg = EngineConfig {
            clustering: ClusterConfig {
                max_clusters: 2,
                min_members: 2,
                ..Default::default()
            },
            ..wide_config()
        };
        for mode in [ClusterMode::ExclusivePartition, ClusterMode::Overlapping] {
            let mut cfg = cfg.clone();
            cfg.clustering.mode = mode;
            let mut engine = Engine::headless(cfg).unwrap();
            let pts: Vec<(f32, f32)> = (0..5)
                .flat_map(|g| (0..2).map(move |i| (g as f32 * 5.0 - 10.0, i as f32 * 0.3)))
                .collect();
            engine.submit_detections(&dets(&pts), 0.0);
            let clusters = engine.advance(0.0);
            assert_eq!(clusters.len(), 2, "{mode:?}");
            assert!(clusters.iter().all(|c| c.size >= 2));
        }
    }

    #[test]
    fn reconfigure_validates_and_keeps_pool_size() {
        let mut engine = Engine::headless(EngineConfig::default()).unwrap();
        let bad = ClusterConfig {
            radius: 0.0,
            ..Default::default()
        };
        assert!(engine.reconfigure_clustering(bad).is_err());

        let grow = EngineConfig {
            max_players: 40,
            ..Default::default()
        };
        assert!(engine.reconfigure(grow).is_err());

        let overlap = ClusterConfig {
            mode: ClusterMode::Overlapping,
            ..Default::default()
        };
        engine.reconfigure_clustering(overlap).unwrap();
        assert_eq!(engine.strategy_name(), "overlapping");
    }

    #[test]
    fn non_finite_time_is_ignored() {
        let mut engine = Engine::new(EngineConfig::default(), EventLog::new()).unwrap();
        let report = engine.submit_detections(&dets(&[(0.0, 0.0)]), f64::NAN);
        assert_eq!(report.received, 1);
        assert_eq!(report.accepted, 0);
        assert_eq!(engine.active_count(), 0);
        assert!(engine.sink().events.is_empty());

        engine.submit_detections(&dets(&[(0.0, 0.0)]), 0.0);
        assert!(engine.advance(f64::INFINITY).is_empty());
        assert_eq!(engine.active_count(), 1);
        engine.advance(1.0);
        assert_eq!(engine.active_count(), 0, "slot still retires on a valid tick");
    }

    #[test]
    fn slot_matched_this_tick_is_never_evicted() {
        let cfg = EngineConfig {
            max_players: 2,
            spawn_cooldown: 0.0,
            ..Default::default()
        };
        let mut engine = Engine::new(cfg, EventLog::new()).unwrap();
        engine.submit_detections(&dets(&[(-4.0, 0.0), (4.0, 0.0)]), 0.0);
        // Only slot 1 refreshed, so slot 0 is the stalest...
        engine.submit_detections(&dets(&[(4.0, 0.0)]), 0.4);
        // ...but slot 0 wins (-4, 0) here and must keep it.
        let report = engine.submit_detections(&dets(&[(-4.0, 0.0), (0.0, 4.0)]), 0.45);
        assert_eq!(report.matched, 1);
        assert_eq!(report.evicted, 1);

        let tracks = engine.active_tracks();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].index, SlotIndex(0));
        assert_eq!(tracks[0].position, Vec2::new(-4.0, 0.0));
        assert_eq!(tracks[1].index, SlotIndex(1));
        assert_eq!(tracks[1].position, Vec2::new(0.0, 4.0));
    }

    struct EveryoneTogether;

    impl ClusterStrategy for EveryoneTogether {
        fn find_clusters(&self, points: &[Vec2], _params: &ClusterConfig) -> ClusterList {
            let all: Vec<usize> = (0..points.len()).collect();
            crate::geometry::centroid(points, &all)
                .map(|center| Cluster {
                    center,
                    size: points.len() as u32,
                })
                .into_iter()
                .collect()
        }

        fn name(&self) -> &'static str {
            "everyone_together"
        }
    }

    #[test]
    fn custom_strategy_plugs_in() {
        let mut engine = Engine::headless(EngineConfig::default())
            .unwrap()
            .with_strategy(Box::new(EveryoneTogether));
        engine.submit_detections(&dets(&[(-4.0, 0.0), (4.0, 2.0)]), 0.0);
        let clusters = engine.advance(0.0);
        assert_eq!(engine.strategy_name(), "everyone_together");
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].center, Vec2::new(0.0, 1.0));
    }

    #[test]
    fn invalid_config_rejected_at_construction() {
        let cfg = EngineConfig {
            timeout_sec: -1.0,
            ..Default::default()
        };
        assert!(Engine::headless(cfg).is_err());
    }

    #[test]
    fn reset_clears_everything() {
        let mut engine = Engine::new(EngineConfig::default(), EventLog::new()).unwrap();
        let pts = [(0.0, 0.0), (0.3, 0.0), (0.0, 0.3)];
        engine.submit_detections(&dets(&pts), 0.0);
        engine.advance(0.0);
        engine.sink_mut().drain();

        engine.reset();
        assert_eq!(engine.active_count(), 0);
        assert!(engine.clusters().is_empty());
        assert_eq!(engine.sink().disappeared().len(), 3);
        assert_eq!(
            engine
                .sink()
                .count(|e| matches!(e, SinkEvent::ClusterDisappear(_))),
            1
        );
    }
}
