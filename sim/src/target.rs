//! Walker trajectory models and state propagation.
//!
//! Each walker has a true ground-plane position/velocity and a `MotionSpec`
//! describing how it moves. The simulator steps every walker forward in time
//! and keeps it inside the world bounds.

use crowd_core::geometry::WorldBounds;
use crowd_core::types::Vec2;
use serde::{Deserialize, Serialize};

/// Describes how a walker moves.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum MotionSpec {
    /// Stands still.
    Stationary,
    /// Straight line, velocity reflected at the world bounds.
    ConstantVelocity,
    /// Circle around `center`. `omega` = angular rate (rad/s), `phase` advances
    /// every step.
    Orbit {
        center: [f32; 2],
        radius: f32,
        omega: f32,
        phase: f32,
    },
    /// Walk toward each waypoint in turn at `speed`; wraps around if `cycle`.
    Waypoints {
        waypoints: Vec<[f32; 2]>,
        speed: f32,
        cycle: bool,
        #[serde(default)]
        next: usize,
    },
}

/// A simulated person with ground-truth state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Walker {
    /// Unique walker ID (used for metrics)
    pub id: u64,
    pub position: Vec2,
    pub velocity: Vec2,
    pub motion: MotionSpec,
    /// Optional: walker leaves the scene at this time
    pub disappear_at: Option<f64>,
    /// Optional: walker enters the scene at this time (no detections before)
    pub appear_at: Option<f64>,
}

impl Walker {
    pub fn new(id: u64, position: Vec2, velocity: Vec2, motion: MotionSpec) -> Self {
        let mut walker = Self {
            id,
            position,
            velocity,
            motion,
            appear_at: None,
            disappear_at: None,
        };
        if let MotionSpec::Orbit {
            center,
            radius,
            phase,
            ..
        } = &walker.motion
        {
            walker.position = orbit_point(center, *radius, *phase);
        }
        walker
    }

    /// Restrict the walker to `[appear_at, disappear_at)`.
    pub fn visible_between(mut self, appear_at: Option<f64>, disappear_at: Option<f64>) -> Self {
        self.appear_at = appear_at;
        self.disappear_at = disappear_at;
        self
    }

    /// Propagate true state by `dt` seconds according to `motion`.
    pub fn step(&mut self, dt: f64, bounds: &WorldBounds) {
        let dt = dt as f32;
        match &mut self.motion {
            MotionSpec::Stationary => {
                self.velocity = Vec2::zeros();
            }
            MotionSpec::ConstantVelocity => {
                self.position += self.velocity * dt;
                reflect(&mut self.position, &mut self.velocity, bounds);
            }
            MotionSpec::Orbit {
                center,
                radius,
                omega,
                phase,
            } => {
                *phase += *omega * dt;
                let next = orbit_point(center, *radius, *phase);
                if dt > 0.0 {
                    self.velocity = (next - self.position) / dt;
                }
                self.position = bounds.clamp(next);
            }
            MotionSpec::Waypoints {
                waypoints,
                speed,
                cycle,
                next,
            } => {
                let Some(wp) = waypoints.get(*next) else {
                    self.velocity = Vec2::zeros();
                    return;
                };
                let goal = Vec2::new(wp[0], wp[1]);
                let to_goal = goal - self.position;
                let dist = to_goal.norm();
                let reach = *speed * dt;
                if dist <= reach {
                    self.position = goal;
                    self.velocity = Vec2::zeros();
                    *next += 1;
                    if *cycle && *next >= waypoints.len() {
                        *next = 0;
                    }
                } else {
                    self.velocity = to_goal / dist * *speed;
                    self.position += self.velocity * dt;
                }
                self.position = bounds.clamp(self.position);
            }
        }
    }

    /// True if the walker is in the scene at time `t`.
    pub fn is_active(&self, t: f64) -> bool {
        if let Some(appear) = self.appear_at {
            if t < appear {
                return false;
            }
        }
        if let Some(disappear) = self.disappear_at {
            if t >= disappear {
                return false;
            }
        }
        true
    }
}

fn orbit_point(center: &[f32; 2], radius: f32, phase: f32) -> Vec2 {
    Vec2::new(
        center[0] + radius * phase.cos(),
        center[1] + radius * phase.sin(),
    )
}

/// Mirror position and velocity back into the rectangle.
fn reflect(position: &mut Vec2, velocity: &mut Vec2, bounds: &WorldBounds) {
    if position.x < bounds.min_x {
        position.x = 2.0 * bounds.min_x - position.x;
        velocity.x = velocity.x.abs();
    } else if position.x > bounds.max_x {
        position.x = 2.0 * bounds.max_x - position.x;
        velocity.x = -velocity.x.abs();
    }
    if position.y < bounds.min_z {
        position.y = 2.0 * bounds.min_z - position.y;
        velocity.y = velocity.y.abs();
    } else if position.y > bounds.max_z {
        position.y = 2.0 * bounds.max_z - position.y;
        velocity.y = -velocity.y.abs();
    }
    *position = bounds.clamp(*position);
}
