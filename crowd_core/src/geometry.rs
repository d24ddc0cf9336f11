//! Geometry helpers: distances, centroids, world bounds and damped smoothing.
//!
//! # Smoothing model
//! Positions follow their matched target through a critically damped spring:
//!
//! ω = 2 / smooth_time,  x = ω·dt,  e ≈ 1 / (1 + x + 0.48x² + 0.235x³)
//!
//! Δ = p − target
//! t = (v + ω·Δ)·dt
//! v' = (v − ω·t)·e
//! p' = target + (Δ + t)·e
//!
//! The polynomial is a Padé-style approximation of e^(−x), so the step is
//! stable for any `dt` and never overshoots once the overshoot guard snaps to
//! the target.

use crate::types::Vec2;
use serde::{Deserialize, Serialize};

/// Lower bound applied to the smoothing time to keep ω finite.
pub const MIN_SMOOTH_TIME: f32 = 1e-4;

/// Squared euclidean distance.
#[inline]
pub fn distance_sq(a: &Vec2, b: &Vec2) -> f32 {
    (a - b).norm_squared()
}

/// Mean of the points selected by `indices`. Returns `None` for an empty set.
pub fn centroid(points: &[Vec2], indices: &[usize]) -> Option<Vec2> {
    if indices.is_empty() {
        return None;
    }
    let sum = indices
        .iter()
        .fold(Vec2::zeros(), |acc, &i| acc + points[i]);
    Some(sum / indices.len() as f32)
}

/// One critically damped step from `current` toward `target`.
///
/// `velocity` carries the spring state between calls. A non-positive `dt`
/// leaves both position and velocity untouched.
pub fn smooth_damp(
    current: Vec2,
    target: Vec2,
    velocity: &mut Vec2,
    smooth_time: f32,
    dt: f32,
) -> Vec2 {
    if dt <= 0.0 || !dt.is_finite() {
        return current;
    }
    let smooth_time = smooth_time.max(MIN_SMOOTH_TIME);
    let omega = 2.0 / smooth_time;
    let x = omega * dt;
    let exp = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let change = current - target;
    let temp = (*velocity + change * omega) * dt;
    *velocity = (*velocity - temp * omega) * exp;
    let mut output = target + (change + temp) * exp;

    // Passed the target: snap and stop.
    if (target - current).dot(&(output - target)) > 0.0 {
        output = target;
        *velocity = Vec2::zeros();
    }
    output
}

// ---------------------------------------------------------------------------
// World bounds
// ---------------------------------------------------------------------------

/// Axis-aligned rectangle on the ground plane.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldBounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_z: f32,
    pub max_z: f32,
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self {
            min_x: -5.0,
            max_x: 5.0,
            min_z: -5.0,
            max_z: 5.0,
        }
    }
}

impl WorldBounds {
    /// Clamp each axis independently.
    pub fn clamp(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            p.x.clamp(self.min_x, self.max_x),
            p.y.clamp(self.min_z, self.max_z),
        )
    }

    pub fn contains(&self, p: &Vec2) -> bool {
        (self.min_x..=self.max_x).contains(&p.x) && (self.min_z..=self.max_z).contains(&p.y)
    }

    /// Map sensor coordinates in `[0, 1]` (clamped) onto the rectangle.
    pub fn map_normalized(&self, sx: f32, sz: f32) -> Vec2 {
        Vec2::new(
            lerp(self.min_x, self.max_x, sx.clamp(0.0, 1.0)),
            lerp(self.min_z, self.max_z, sz.clamp(0.0, 1.0)),
        )
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn depth(&self) -> f32 {
        self.max_z - self.min_z
    }
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn centroid_of_square() {
        let pts = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(0.0, 2.0),
            Vec2::new(2.0, 2.0),
        ];
        let c = centroid(&pts, &[0, 1, 2, 3]).unwrap();
        assert_abs_diff_eq!(c.x, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(c.y, 1.0, epsilon = 1e-6);
        assert!(centroid(&pts, &[]).is_none());
    }

    #[test]
    fn smooth_damp_converges_without_overshoot() {
        let target = Vec2::new(1.0, 0.0);
        let mut pos = Vec2::zeros();
        let mut vel = Vec2::zeros();
        for _ in 0..100 {
            pos = smooth_damp(pos, target, &mut vel, 0.08, 0.01);
            assert!(pos.x <= 1.0 + 1e-6, "overshoot: {}", pos.x);
        }
        assert_abs_diff_eq!(pos.x, 1.0, epsilon = 1e-3);
        assert_abs_diff_eq!(pos.y, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn smooth_damp_mostly_arrives_within_smooth_time() {
        let target = Vec2::new(10.0, 0.0);
        let mut pos = Vec2::zeros();
        let mut vel = Vec2::zeros();
        // 8 steps of 10 ms = one smooth_time of 80 ms
        for _ in 0..8 {
            pos = smooth_damp(pos, target, &mut vel, 0.08, 0.01);
        }
        assert!(pos.x > 5.0 && pos.x < 10.0, "got {}", pos.x);
    }

    #[test]
    fn smooth_damp_zero_dt_is_identity() {
        let mut vel = Vec2::new(3.0, 3.0);
        let out = smooth_damp(Vec2::new(1.0, 2.0), Vec2::zeros(), &mut vel, 0.1, 0.0);
        assert_eq!(out, Vec2::new(1.0, 2.0));
        assert_eq!(vel, Vec2::new(3.0, 3.0));
    }

    #[test]
    fn smooth_damp_large_dt_reaches_target() {
        let mut vel = Vec2::zeros();
        let out = smooth_damp(Vec2::zeros(), Vec2::new(4.0, -2.0), &mut vel, 0.08, 10.0);
        assert_abs_diff_eq!(out.x, 4.0, epsilon = 1e-3);
        assert_abs_diff_eq!(out.y, -2.0, epsilon = 1e-3);
    }

    #[test]
    fn bounds_clamp_per_axis() {
        let b = WorldBounds::default();
        let p = b.clamp(Vec2::new(7.0, -1.0));
        assert_eq!(p, Vec2::new(5.0, -1.0));
        assert!(b.contains(&p));
    }

    #[test]
    fn normalized_mapping_clamps_input() {
        let b = WorldBounds::default();
        assert_eq!(b.map_normalized(0.5, 0.0), Vec2::new(0.0, -5.0));
        assert_eq!(b.map_normalized(1.5, -0.2), Vec2::new(5.0, -5.0));
    }
}
