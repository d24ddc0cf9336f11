//! Detection sensor simulator.
//!
//! Generates unlabeled position frames at a fixed refresh rate with:
//! - Uniform position noise
//! - Miss probability (1 - P_D)
//! - Poisson clutter (false detections anywhere in the bounds)
//! - Optional shuffling, so detection order carries no identity
//! - Optional normalized `[0, 1]` output

use crate::target::Walker;
use crowd_core::geometry::WorldBounds;
use crowd_core::types::Vec2;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Sensor characteristics.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorParams {
    /// Frames per second
    pub refresh_rate: f64,
    /// Probability each present walker is detected in a frame
    pub p_detection: f64,
    /// Half-width of the uniform position noise (world units)
    pub noise: f32,
    /// Mean number of false detections per frame
    pub lambda_clutter: f64,
    pub shuffle: bool,
    /// Emit coordinates normalized to the world bounds
    pub normalized: bool,
}

impl Default for SensorParams {
    fn default() -> Self {
        Self {
            refresh_rate: 30.0,
            p_detection: 0.95,
            noise: 0.05,
            lambda_clutter: 0.0,
            shuffle: true,
            normalized: false,
        }
    }
}

/// One sensor frame: a flat `[x0, z0, x1, z1, ...]` payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensorFrame {
    pub time: f64,
    pub payload: Vec<f32>,
}

impl SensorFrame {
    pub fn detection_count(&self) -> usize {
        self.payload.len() / 2
    }
}

/// Generates detection frames from a set of walkers.
pub struct DetectionSimulator {
    pub params: SensorParams,
    pub bounds: WorldBounds,
    next_frame_time: f64,
    rng: ChaCha8Rng,
}

impl DetectionSimulator {
    pub fn new(params: SensorParams, bounds: WorldBounds, seed: u64) -> Self {
        Self {
            params,
            bounds,
            next_frame_time: 0.0,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Check if the sensor should fire at the current simulation time.
    pub fn should_fire(&self, t: f64) -> bool {
        t >= self.next_frame_time
    }

    fn advance_schedule(&mut self) {
        self.next_frame_time += 1.0 / self.params.refresh_rate;
    }

    /// Produce the frame due at or before `sim_time`, if any.
    pub fn generate(&mut self, walkers: &[Walker], sim_time: f64) -> Option<SensorFrame> {
        if !self.should_fire(sim_time) {
            return None;
        }
        self.advance_schedule();

        let mut points: Vec<Vec2> = Vec::new();

        // True detections
        for walker in walkers {
            if !walker.is_active(sim_time) {
                continue;
            }
            if self.rng.gen::<f64>() > self.params.p_detection {
                continue;
            }
            let n = self.params.noise;
            let jitter = Vec2::new(
                self.rng.gen::<f32>() * n * 2.0 - n,
                self.rng.gen::<f32>() * n * 2.0 - n,
            );
            points.push(walker.position + jitter);
        }

        // Clutter: Poisson count by multiplying uniforms until below e^{-lambda}
        let lambda = self.params.lambda_clutter;
        let n_clutter = if lambda <= 0.0 {
            0usize
        } else {
            let mut n = 0usize;
            let threshold = (-lambda).exp();
            let mut prod = self.rng.gen::<f64>();
            while prod > threshold && n < 50 {
                prod *= self.rng.gen::<f64>();
                n += 1;
            }
            n
        };
        for _ in 0..n_clutter {
            let x = self.bounds.min_x + self.rng.gen::<f32>() * self.bounds.width();
            let z = self.bounds.min_z + self.rng.gen::<f32>() * self.bounds.depth();
            points.push(Vec2::new(x, z));
        }

        if self.params.shuffle {
            points.shuffle(&mut self.rng);
        }

        let payload = points
            .iter()
            .flat_map(|p| {
                if self.params.normalized {
                    [
                        (p.x - self.bounds.min_x) / self.bounds.width(),
                        (p.y - self.bounds.min_z) / self.bounds.depth(),
                    ]
                } else {
                    [p.x, p.y]
                }
            })
            .collect();

        Some(SensorFrame {
            time: sim_time,
            payload,
        })
    }
}
