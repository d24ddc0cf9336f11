//! Tracking metrics against simulator ground truth: position RMSE,
//! precision/recall, identity switches.

use crate::association::greedy_assign;
use crate::types::{SlotIndex, TrackView, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// True position of one walker at a given time.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroundTruth {
    /// Walker ID (from simulator)
    pub target_id: u64,
    pub position: Vec2,
}

/// Accumulated metric statistics.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TrackingMetrics {
    /// Number of frames evaluated
    pub n_frames: u64,
    /// Total matched (track, truth) pairs
    pub n_matched: u64,
    /// Sum of squared position errors (for RMSE)
    pub sum_sq_pos_err: f64,
    pub true_positives: u64,
    /// Active tracks with no truth nearby
    pub false_positives: u64,
    /// Truth targets with no track nearby
    pub false_negatives: u64,
    /// A target matched to a different slot than on its previous match
    pub id_switches: u64,
    #[serde(skip)]
    last_slot: HashMap<u64, SlotIndex>,
}

impl TrackingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Root-mean-square position error (world units).
    pub fn rmse_position(&self) -> f64 {
        if self.n_matched == 0 {
            return 0.0;
        }
        (self.sum_sq_pos_err / self.n_matched as f64).sqrt()
    }

    /// Precision = TP / (TP + FP)
    pub fn precision(&self) -> f64 {
        let denom = (self.true_positives + self.false_positives) as f64;
        if denom == 0.0 { 1.0 } else { self.true_positives as f64 / denom }
    }

    /// Recall = TP / (TP + FN)
    pub fn recall(&self) -> f64 {
        let denom = (self.true_positives + self.false_negatives) as f64;
        if denom == 0.0 { 1.0 } else { self.true_positives as f64 / denom }
    }

    /// Score one frame. Tracks are matched to truth with the same greedy
    /// nearest-first assignment the engine uses.
    pub fn accumulate(
        &mut self,
        tracks: &[TrackView],
        ground_truths: &[GroundTruth],
        match_distance: f32,
    ) {
        self.n_frames += 1;

        let track_pos: Vec<Vec2> = tracks.iter().map(|t| t.position).collect();
        let truth_pos: Vec<Vec2> = ground_truths.iter().map(|g| g.position).collect();
        let assignment = greedy_assign(&track_pos, &truth_pos, match_distance);

        for &(ti, gi) in &assignment.pairs {
            let track = &tracks[ti];
            let truth = &ground_truths[gi];
            let err = track.position - truth.position;
            self.sum_sq_pos_err += err.norm_squared() as f64;
            self.n_matched += 1;
            self.true_positives += 1;

            if let Some(prev) = self.last_slot.insert(truth.target_id, track.index) {
                if prev != track.index {
                    self.id_switches += 1;
                }
            }
        }

        self.false_positives += assignment.unmatched_tracks.len() as u64;
        self.false_negatives += assignment.unmatched_meas.len() as u64;
    }
}
