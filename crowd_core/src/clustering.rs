//! Spatial clustering of active slot positions.
//!
//! Two interchangeable strategies behind [`ClusterStrategy`]:
//!
//! - [`ExclusivePartition`]: single seeded pass with one centroid refinement.
//!   Every point ends up in at most one cluster. Results depend on point
//!   order, so callers pass points in slot-index order.
//! - [`OverlappingDensity`]: one candidate per point from its nearest
//!   neighbours, candidates merged by distance, ranked by density. A point may
//!   feed several candidates.
//!
//! Both are pure functions of `(points, params)`.

use crate::config::{ClusterConfig, ClusterMode};
use crate::geometry::{centroid, distance_sq};
use crate::types::{Cluster, ClusterList, Vec2};

/// A clustering algorithm.
pub trait ClusterStrategy {
    fn find_clusters(&self, points: &[Vec2], params: &ClusterConfig) -> ClusterList;

    fn name(&self) -> &'static str;
}

/// Boxed strategy for the configured mode.
pub fn strategy_for(mode: ClusterMode) -> Box<dyn ClusterStrategy + Send + Sync> {
    match mode {
        ClusterMode::ExclusivePartition => Box::new(ExclusivePartition),
        ClusterMode::Overlapping => Box::new(OverlappingDensity),
    }
}

// ---------------------------------------------------------------------------
// Exclusive partition
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default)]
pub struct ExclusivePartition;

impl ClusterStrategy for ExclusivePartition {
    fn find_clusters(&self, points: &[Vec2], params: &ClusterConfig) -> ClusterList {
        let mut clusters = ClusterList::new();
        let n = points.len();
        let min = params.min_members as usize;
        if n == 0 || params.max_clusters == 0 {
            return clusters;
        }
        let r2 = params.radius * params.radius;
        let mut visited = vec![false; n];

        for i in 0..n {
            if visited[i] {
                continue;
            }
            let mut members = vec![i];
            members.extend(
                (0..n).filter(|&j| j != i && !visited[j] && distance_sq(&points[i], &points[j]) <= r2),
            );
            if members.len() < min {
                visited[i] = true;
                continue;
            }
            let Some(seed_center) = centroid(points, &members) else {
                continue;
            };

            // Refine once: everything near the seed centroid, visited or not.
            let refined: Vec<usize> = (0..n)
                .filter(|&j| distance_sq(&points[j], &seed_center) <= r2)
                .collect();
            if refined.len() < min {
                continue;
            }
            let Some(center) = centroid(points, &refined) else {
                continue;
            };
            for &j in &refined {
                visited[j] = true;
            }
            clusters.push(Cluster {
                center,
                size: refined.len() as u32,
            });
            if clusters.len() >= params.max_clusters {
                break;
            }
        }
        clusters
    }

    fn name(&self) -> &'static str {
        "exclusive_partition"
    }
}

// ---------------------------------------------------------------------------
// Overlapping density
// ---------------------------------------------------------------------------

/// A per-point cluster proposal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    pub center: Vec2,
    /// 1 + number of neighbours inside the radius
    pub density: u32,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct OverlappingDensity;

impl OverlappingDensity {
    /// One candidate per point that has at least `min_members - 1` neighbours.
    pub fn candidates(points: &[Vec2], params: &ClusterConfig) -> Vec<Candidate> {
        let r2 = params.radius * params.radius;
        let k = (params.min_members as usize).saturating_sub(1);
        let mut out = Vec::new();

        for (i, p) in points.iter().enumerate() {
            let mut neighbours: Vec<(usize, f32)> = points
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(j, q)| (j, distance_sq(p, q)))
                .filter(|&(_, d2)| d2 <= r2)
                .collect();
            if neighbours.len() < k {
                continue;
            }
            let density = 1 + neighbours.len() as u32;
            neighbours.sort_by(|a, b| a.1.total_cmp(&b.1));

            let mut members = Vec::with_capacity(k + 1);
            members.push(i);
            members.extend(neighbours.iter().take(k).map(|&(j, _)| j));
            if let Some(center) = centroid(points, &members) {
                out.push(Candidate { center, density });
            }
        }
        out
    }

    /// Fold candidates into the output list, merging each into the first
    /// existing cluster within `eps`. Single pass: a merge moves a center,
    /// and earlier decisions are not revisited.
    pub fn merge(candidates: &[Candidate], eps: f32) -> ClusterList {
        let eps2 = eps * eps;
        let mut merged = ClusterList::new();
        for cand in candidates {
            match merged
                .iter_mut()
                .find(|c| distance_sq(&c.center, &cand.center) <= eps2)
            {
                Some(c) => {
                    let total = c.size + cand.density;
                    c.center = (c.center * c.size as f32 + cand.center * cand.density as f32)
                        / total as f32;
                    c.size = total;
                }
                None => merged.push(Cluster {
                    center: cand.center,
                    size: cand.density,
                }),
            }
        }
        merged
    }
}

impl ClusterStrategy for OverlappingDensity {
    fn find_clusters(&self, points: &[Vec2], params: &ClusterConfig) -> ClusterList {
        if points.is_empty() {
            return ClusterList::new();
        }
        let candidates = Self::candidates(points, params);
        let mut clusters = Self::merge(&candidates, params.merge_eps);
        // Stable: equal densities keep merge order.
        clusters.sort_by(|a, b| b.size.cmp(&a.size));
        clusters.truncate(params.max_clusters);
        clusters
    }

    fn name(&self) -> &'static str {
        "overlapping"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn v(x: f32, z: f32) -> Vec2 {
        Vec2::new(x, z)
    }

    fn params(radius: f32, min_members: u32, max_clusters: usize) -> ClusterConfig {
        ClusterConfig {
            radius,
            min_members,
            max_clusters,
            ..Default::default()
        }
    }

    #[test]
    fn empty_input_gives_no_clusters() {
        let p = ClusterConfig::default();
        assert!(ExclusivePartition.find_clusters(&[], &p).is_empty());
        assert!(OverlappingDensity.find_clusters(&[], &p).is_empty());
    }

    #[test]
    fn tight_group_forms_one_cluster() {
        let pts = [v(0.0, 0.0), v(0.5, 0.0), v(0.0, 0.5), v(0.5, 0.5), v(0.25, 0.25)];
        let clusters = ExclusivePartition.find_clusters(&pts, &params(1.5, 3, 8));
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].size, 5);
        assert_abs_diff_eq!(clusters[0].center.x, 0.25, epsilon = 1e-6);
        assert_abs_diff_eq!(clusters[0].center.y, 0.25, epsilon = 1e-6);
    }

    #[test]
    fn sparse_points_below_threshold() {
        let pts = [v(0.0, 0.0), v(3.0, 0.0), v(0.0, 3.0)];
        assert!(ExclusivePartition
            .find_clusters(&pts, &params(1.5, 2, 8))
            .is_empty());
        assert!(OverlappingDensity
            .find_clusters(&pts, &params(1.5, 2, 8))
            .is_empty());
    }

    #[test]
    fn refinement_can_absorb_outer_points() {
        // Point 3 is 1.4 from the seed but within 1.0 of the seed centroid.
        let pts = [v(0.0, 0.0), v(0.8, 0.0), v(0.8, 0.3), v(1.4, 0.0)];
        let clusters = ExclusivePartition.find_clusters(&pts, &params(1.0, 3, 8));
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].size, 4);
        assert_abs_diff_eq!(clusters[0].center.x, 0.75, epsilon = 1e-5);
        assert_abs_diff_eq!(clusters[0].center.y, 0.075, epsilon = 1e-5);
    }

    #[test]
    fn refinement_can_drop_below_threshold() {
        // Seed gathers all five points, but its centroid (0.34, 0) is 1.34
        // from the outlier, so the refined set only has four.
        let pts = [
            v(0.0, 0.0),
            v(-1.0, 0.0),
            v(0.9, 0.0),
            v(0.9, 0.05),
            v(0.9, -0.05),
        ];
        assert!(ExclusivePartition
            .find_clusters(&pts, &params(1.0, 5, 8))
            .is_empty());

        let clusters = ExclusivePartition.find_clusters(&pts, &params(1.0, 4, 8));
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].size, 4);
        assert_abs_diff_eq!(clusters[0].center.x, 0.675, epsilon = 1e-5);
        assert_abs_diff_eq!(clusters[0].center.y, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn partition_members_not_reused() {
        let mut pts = Vec::new();
        for i in 0..3 {
            pts.push(v(i as f32 * 0.2, 0.0));
        }
        for i in 0..3 {
            pts.push(v(10.0 + i as f32 * 0.2, 0.0));
        }
        let clusters = ExclusivePartition.find_clusters(&pts, &params(1.0, 3, 8));
        assert_eq!(clusters.len(), 2);
        let total: u32 = clusters.iter().map(|c| c.size).sum();
        assert_eq!(total, 6);
    }

    #[test]
    fn partition_stops_at_max_clusters() {
        let pts: Vec<Vec2> = (0..4)
            .flat_map(|g| (0..3).map(move |i| v(g as f32 * 10.0 + i as f32 * 0.1, 0.0)))
            .collect();
        let clusters = ExclusivePartition.find_clusters(&pts, &params(1.0, 3, 2));
        assert_eq!(clusters.len(), 2);
        assert!(clusters[0].center.x < 1.0);
        assert!(clusters[1].center.x > 9.0 && clusters[1].center.x < 11.0);
    }

    #[test]
    fn merge_is_density_weighted() {
        let cands = [
            Candidate {
                center: v(0.0, 0.0),
                density: 3,
            },
            Candidate {
                center: v(0.2, 0.0),
                density: 1,
            },
        ];
        let merged = OverlappingDensity::merge(&cands, 0.5);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].size, 4);
        assert_abs_diff_eq!(merged[0].center.x, 0.05, epsilon = 1e-6);
    }

    #[test]
    fn merge_keeps_distant_candidates_apart() {
        let cands = [
            Candidate {
                center: v(0.0, 0.0),
                density: 3,
            },
            Candidate {
                center: v(2.0, 0.0),
                density: 3,
            },
        ];
        assert_eq!(OverlappingDensity::merge(&cands, 0.5).len(), 2);
    }

    #[test]
    fn overlapping_chain_merges_into_one() {
        // Candidates: p0 → (0.3,0) d2, p1 → (0.3,0) d3, p2 → (0.9,0) d2
        let pts = [v(0.0, 0.0), v(0.6, 0.0), v(1.2, 0.0)];
        let p = ClusterConfig {
            radius: 0.7,
            min_members: 2,
            max_clusters: 8,
            mode: ClusterMode::Overlapping,
            merge_eps: 0.7,
        };
        let cands = OverlappingDensity::candidates(&pts, &p);
        assert_eq!(cands.iter().map(|c| c.density).collect::<Vec<_>>(), vec![2, 3, 2]);

        let clusters = OverlappingDensity.find_clusters(&pts, &p);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].size, 7);
        assert_abs_diff_eq!(clusters[0].center.x, 3.3 / 7.0, epsilon = 1e-5);
    }

    #[test]
    fn overlapping_ranks_densest_first_and_caps() {
        let mut pts = vec![v(0.0, 0.0), v(0.1, 0.0)];
        pts.extend((0..4).map(|i| v(10.0 + i as f32 * 0.1, 0.0)));
        let p = ClusterConfig {
            radius: 1.0,
            min_members: 2,
            max_clusters: 1,
            mode: ClusterMode::Overlapping,
            merge_eps: 0.5,
        };
        let clusters = OverlappingDensity.find_clusters(&pts, &p);
        assert_eq!(clusters.len(), 1);
        assert!(clusters[0].center.x > 9.0);
        assert!(clusters[0].size >= p.min_members);
    }

    #[test]
    fn strategy_for_matches_mode() {
        assert_eq!(strategy_for(ClusterMode::Overlapping).name(), "overlapping");
        assert_eq!(
            strategy_for(ClusterMode::ExclusivePartition).name(),
            "exclusive_partition"
        );
    }
}
