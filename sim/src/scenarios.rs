//! Scenario definitions.
//!
//! Each scenario is a named set of walkers plus a sensor configuration,
//! laid out for the default ±5 world bounds. All scenarios are
//! deterministic given the same seed.

use crate::{
    sensor::SensorParams,
    target::{MotionSpec, Walker},
};
use crowd_core::geometry::WorldBounds;
use crowd_core::metrics::GroundTruth;
use crowd_core::types::Vec2;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Which pre-defined scenario to load.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
pub enum ScenarioKind {
    /// 6 people wandering, clean sensor
    Lobby,
    /// 12 people converging into two groups, then dispersing
    Gathering,
    /// 32 people: more than the default slot pool holds
    Overcrowd,
    /// 10 people with a poor sensor: misses, clutter, staggered entries and exits
    Flicker,
}

/// A fully configured simulation scenario.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub seed: u64,
    pub duration: f64, // seconds
    pub sim_dt: f64,   // simulation step (s), also the engine tick period
    pub bounds: WorldBounds,
    pub walkers: Vec<Walker>,
    pub sensor: SensorParams,
}

impl Scenario {
    /// Build the named scenario. Uses `seed` for repeatability.
    pub fn build(kind: ScenarioKind, seed: u64) -> Self {
        match kind {
            ScenarioKind::Lobby => Self::lobby(seed),
            ScenarioKind::Gathering => Self::gathering(seed),
            ScenarioKind::Overcrowd => Self::overcrowd(seed),
            ScenarioKind::Flicker => Self::flicker(seed),
        }
    }

    /// Step every walker by `dt`.
    pub fn step(&mut self, dt: f64) {
        for walker in &mut self.walkers {
            walker.step(dt, &self.bounds);
        }
    }

    /// True positions of the walkers present at `t`.
    pub fn ground_truth(&self, t: f64) -> Vec<GroundTruth> {
        self.walkers
            .iter()
            .filter(|w| w.is_active(t))
            .map(|w| GroundTruth {
                target_id: w.id,
                position: w.position,
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Scenario 1: Lobby
    // -----------------------------------------------------------------------
    fn lobby(seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let walkers = (0..6)
            .map(|i| {
                let pos = random_point(&mut rng, 4.0);
                let vel = random_velocity(&mut rng, 0.3, 1.0);
                Walker::new(i, pos, vel, MotionSpec::ConstantVelocity)
            })
            .collect();

        Scenario {
            name: "lobby".into(),
            seed,
            duration: 30.0,
            sim_dt: 0.02,
            bounds: WorldBounds::default(),
            walkers,
            sensor: SensorParams::default(),
        }
    }

    // -----------------------------------------------------------------------
    // Scenario 2: Gathering
    // -----------------------------------------------------------------------
    fn gathering(seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(1));
        let spots = [[-2.0f32, -1.0], [2.5, 1.5]];
        let mut walkers: Vec<Walker> = (0..10)
            .map(|i| {
                let start = random_point(&mut rng, 4.5);
                let spot = spots[i % 2];
                let offset = random_point(&mut rng, 0.4);
                let meet = [spot[0] + offset.x, spot[1] + offset.y];
                let home = random_point(&mut rng, 4.5);
                Walker::new(
                    i as u64,
                    start,
                    Vec2::zeros(),
                    MotionSpec::Waypoints {
                        waypoints: vec![meet, meet, [home.x, home.y]],
                        speed: rng.gen_range(0.6..1.2),
                        cycle: false,
                        next: 0,
                    },
                )
            })
            .collect();

        // Two people circling the first group
        for (k, phase) in [0.0f32, std::f32::consts::PI].into_iter().enumerate() {
            walkers.push(Walker::new(
                10 + k as u64,
                Vec2::zeros(),
                Vec2::zeros(),
                MotionSpec::Orbit {
                    center: spots[0],
                    radius: 0.8,
                    omega: 0.5,
                    phase,
                },
            ));
        }

        Scenario {
            name: "gathering".into(),
            seed,
            duration: 40.0,
            sim_dt: 0.02,
            bounds: WorldBounds::default(),
            walkers,
            sensor: SensorParams {
                lambda_clutter: 0.2,
                ..Default::default()
            },
        }
    }

    // -----------------------------------------------------------------------
    // Scenario 3: Overcrowd
    // -----------------------------------------------------------------------
    fn overcrowd(seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(2));
        let walkers = (0..32)
            .map(|i| {
                let pos = random_point(&mut rng, 4.8);
                if i % 4 == 0 {
                    Walker::new(i, pos, Vec2::zeros(), MotionSpec::Stationary)
                } else {
                    let vel = random_velocity(&mut rng, 0.2, 0.8);
                    Walker::new(i, pos, vel, MotionSpec::ConstantVelocity)
                }
            })
            .collect();

        Scenario {
            name: "overcrowd".into(),
            seed,
            duration: 20.0,
            sim_dt: 0.02,
            bounds: WorldBounds::default(),
            walkers,
            sensor: SensorParams {
                p_detection: 0.9,
                lambda_clutter: 0.5,
                ..Default::default()
            },
        }
    }

    // -----------------------------------------------------------------------
    // Scenario 4: Flicker
    // -----------------------------------------------------------------------
    fn flicker(seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(3));
        let walkers = (0..10)
            .map(|i| {
                let pos = random_point(&mut rng, 4.0);
                let vel = random_velocity(&mut rng, 0.1, 0.6);
                let appear = rng.gen_range(0.0..10.0);
                let stay = rng.gen_range(5.0..15.0);
                Walker::new(i, pos, vel, MotionSpec::ConstantVelocity)
                    .visible_between(Some(appear), Some(appear + stay))
            })
            .collect();

        Scenario {
            name: "flicker".into(),
            seed,
            duration: 30.0,
            sim_dt: 0.02,
            bounds: WorldBounds::default(),
            walkers,
            sensor: SensorParams {
                refresh_rate: 15.0,
                p_detection: 0.6,
                noise: 0.15,
                lambda_clutter: 1.5,
                ..Default::default()
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Builder helpers
// ---------------------------------------------------------------------------

fn random_point(rng: &mut ChaCha8Rng, half_extent: f32) -> Vec2 {
    Vec2::new(
        rng.gen_range(-half_extent..half_extent),
        rng.gen_range(-half_extent..half_extent),
    )
}

fn random_velocity(rng: &mut ChaCha8Rng, min_speed: f32, max_speed: f32) -> Vec2 {
    let heading = rng.gen::<f32>() * std::f32::consts::TAU;
    let speed = rng.gen_range(min_speed..max_speed);
    Vec2::new(speed * heading.cos(), speed * heading.sin())
}
