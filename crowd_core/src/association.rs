//! Data association: candidate graph construction and greedy assignment.
//!
//! # Algorithm
//! 1. For each (track, detection) pair within the gate, add an edge to the
//!    sparse bipartite graph with the squared distance as cost.
//! 2. Stable-sort all edges ascending by cost.
//! 3. Scan once, committing an edge only if neither endpoint has been
//!    committed yet.
//!
//! This is greedy nearest-neighbour matching, not a min-cost assignment.
//! It runs in O(n·m·log(n·m)) and equal-cost edges keep insertion order, so
//! results are reproducible for a given input order.

use crate::geometry::distance_sq;
use crate::types::Vec2;

// ---------------------------------------------------------------------------
// Bipartite graph
// ---------------------------------------------------------------------------

/// A candidate pairing between a track and a detection.
#[derive(Clone, Debug, PartialEq)]
pub struct AssignEdge {
    pub track_idx: usize,
    pub meas_idx: usize,
    /// Squared distance (used as cost)
    pub cost: f32,
}

/// Sparse bipartite graph: edges between track indices and detection indices.
#[derive(Clone, Debug, Default)]
pub struct BipartiteGraph {
    pub edges: Vec<AssignEdge>,
    pub n_tracks: usize,
    pub n_meas: usize,
}

impl BipartiteGraph {
    pub fn new(n_tracks: usize, n_meas: usize) -> Self {
        Self {
            edges: Vec::new(),
            n_tracks,
            n_meas,
        }
    }

    /// Add an edge (gate-passed association candidate).
    pub fn add_edge(&mut self, track_idx: usize, meas_idx: usize, cost: f32) {
        self.edges.push(AssignEdge {
            track_idx,
            meas_idx,
            cost,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Build the candidate graph from track and detection positions.
///
/// Edges are added in (track, detection) order so that stable sorting breaks
/// ties toward lower track indices, then lower detection indices.
pub fn build_graph(tracks: &[Vec2], detections: &[Vec2], max_distance: f32) -> BipartiteGraph {
    let gate = max_distance * max_distance;
    let mut graph = BipartiteGraph::new(tracks.len(), detections.len());
    for (ti, t) in tracks.iter().enumerate() {
        for (mi, d) in detections.iter().enumerate() {
            let d2 = distance_sq(t, d);
            if d2 <= gate {
                graph.add_edge(ti, mi, d2);
            }
        }
    }
    graph
}

// ---------------------------------------------------------------------------
// Greedy solver
// ---------------------------------------------------------------------------

/// Assignment result: (track_idx, meas_idx) matched pairs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Assignment {
    pub pairs: Vec<(usize, usize)>,
    /// Track indices that were NOT matched
    pub unmatched_tracks: Vec<usize>,
    /// Detection indices not matched, ascending
    pub unmatched_meas: Vec<usize>,
}

/// Commit the globally shortest edges first, one per track and per detection.
pub fn greedy_solve(graph: &BipartiteGraph) -> Assignment {
    let mut order: Vec<&AssignEdge> = graph.edges.iter().collect();
    // `sort_by` is stable: equal costs keep insertion order.
    order.sort_by(|a, b| a.cost.total_cmp(&b.cost));

    let mut track_used = vec![false; graph.n_tracks];
    let mut meas_used = vec![false; graph.n_meas];
    let mut pairs = Vec::new();

    for e in order {
        if track_used[e.track_idx] || meas_used[e.meas_idx] {
            continue;
        }
        track_used[e.track_idx] = true;
        meas_used[e.meas_idx] = true;
        pairs.push((e.track_idx, e.meas_idx));
    }

    let unmatched_tracks = (0..graph.n_tracks).filter(|&t| !track_used[t]).collect();
    let unmatched_meas = (0..graph.n_meas).filter(|&m| !meas_used[m]).collect();

    Assignment {
        pairs,
        unmatched_tracks,
        unmatched_meas,
    }
}

/// Convenience: gate + solve in one call.
pub fn greedy_assign(tracks: &[Vec2], detections: &[Vec2], max_distance: f32) -> Assignment {
    greedy_solve(&build_graph(tracks, detections, max_distance))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
