//! Median trajectory and per-curve distance estimation.
//!
//! For every interior skeleton node, the cross-section plane passes through
//! the node with normal `node[i−1] − node[i+1]`. Crossings survive the
//! window-consistency gate against the bracketing node planes and the
//! center-of-mass gate (suppressing curves that re-enter the slab from the
//! far side). The per-axis median of the survivors is the robust trajectory
//! point; optionally, each surviving curve's Euclidean distance to that
//! median is recorded.
//!
//! Planes are defined entirely from the input skeleton and medians are
//! written to a copy, so the per-node computations are independent and run
//! in parallel.

use crate::curves::CurveSet;
use crate::geometry::Plane;
use crate::skeleton::crossing::{plane_crossings, Crossing, CrossingGates, WindowGate};
use crate::skeleton::Skeleton;
use crate::stats::component_median;
use crate::types::NodeCurveMap;
use nalgebra::Vector3;
use rayon::prelude::*;

/// Result of the median/distance pass.
#[derive(Clone, Debug)]
pub struct MedianOutcome {
    /// Input skeleton with interior nodes moved to their cross-section
    /// medians (normals unchanged).
    pub skeleton: Skeleton,
    /// Per (interior node, curve) distance to the node median; zero where a
    /// curve does not cross. Zero-filled when `compute_dist` is false.
    pub distances: NodeCurveMap,
}

/// Robust median trajectory, optionally with per-curve distances.
///
/// A node whose plane collects no surviving crossing keeps its input
/// position and contributes no distances. When one curve crosses a plane
/// more than once, the distance of the crossing latest in curve traversal
/// order is kept.
pub fn median_distance(curves: &CurveSet, skeleton: &Skeleton, compute_dist: bool) -> MedianOutcome {
    let center_of_mass = curves.occupancy().center_of_mass();
    let n_curves = curves.num_curves();

    let per_node: Vec<(usize, Option<Vector3<f32>>, Option<Vec<f32>>)> = skeleton
        .interior()
        .collect::<Vec<_>>()
        .into_par_iter()
        .map(|i| {
            let crossings = node_crossings(curves, skeleton, i, center_of_mass);
            if crossings.is_empty() {
                return (i, None, None);
            }
            let positions: Vec<Vector3<f32>> = crossings.iter().map(|c| c.position).collect();
            let median = component_median(&positions);
            let row = compute_dist.then(|| {
                let mut row = vec![0.0f32; n_curves];
                for c in &crossings {
                    row[c.curve] = (c.position - median).norm();
                }
                row
            });
            (i, Some(median), row)
        })
        .collect();

    let mut nodes = skeleton.nodes().to_vec();
    let mut distances = NodeCurveMap::new(skeleton.len(), n_curves);
    for (i, median, row) in per_node {
        if let Some(median) = median {
            nodes[i] = median;
        }
        if let Some(row) = row {
            distances.set_row(i, row);
        }
    }

    MedianOutcome {
        skeleton: skeleton.with_nodes(nodes),
        distances,
    }
}

fn node_crossings(
    curves: &CurveSet,
    skeleton: &Skeleton,
    i: usize,
    center_of_mass: Option<Vector3<f32>>,
) -> Vec<Crossing> {
    let midpoint = skeleton.node(i);
    let normal = skeleton.node(i - 1) - skeleton.node(i + 1);
    let gates = CrossingGates {
        window: Some(WindowGate {
            start: Plane::new(skeleton.node(i - 1), skeleton.normal(i - 1)),
            end: Plane::new(skeleton.node(i + 1), skeleton.normal(i + 1)),
            reference: midpoint,
        }),
        center_of_mass,
    };
    plane_crossings(curves, &Plane::new(midpoint, normal), &gates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::{extract_skeleton, SkeletonParams};

    fn jittered_bundle(n: usize, outlier_every: usize) -> CurveSet {
        let mut points = Vec::new();
        let mut offsets = Vec::new();
        for i in 0..n {
            offsets.push(points.len());
            let outlier = outlier_every != 0 && i % outlier_every == 0;
            let x = if outlier { 12.0 } else { 4.0 + (i % 4) as f32 * 0.2 };
            let y = 4.0 + (i % 3) as f32 * 0.2;
            let mut curve: Vec<Vector3<f32>> =
                (0..21).map(|k| Vector3::new(x, y, k as f32 * 0.5)).collect();
            if i % 2 == 1 {
                curve.reverse();
            }
            points.extend(curve);
        }
        CurveSet::new(points, offsets, [16, 9, 11]).expect("valid bundle")
    }

    #[test]
    fn distance_map_shape_and_sign() {
        let set = jittered_bundle(12, 0);
        let params = SkeletonParams {
            level: 2,
            smooth: false,
        };
        let skeleton = extract_skeleton(&set, &params).expect("skeleton");
        let outcome = median_distance(&set, &skeleton, true);

        assert_eq!(outcome.distances.rows(), skeleton.len() - 2);
        assert_eq!(outcome.distances.curves(), set.num_curves());
        for node in outcome.distances.interior_nodes() {
            for curve in 0..set.num_curves() {
                assert!(outcome.distances.get(node, curve) >= 0.0);
            }
        }
    }

    #[test]
    fn median_is_robust_to_lateral_outliers() {
        let set = jittered_bundle(20, 10);
        let params = SkeletonParams {
            level: 2,
            smooth: false,
        };
        let skeleton = extract_skeleton(&set, &params).expect("skeleton");
        let outcome = median_distance(&set, &skeleton, false);

        // Curves 0 and 10 sit at x=12; the raw crossing means are pulled
        // toward them, the medians must not be.
        for i in outcome.skeleton.interior() {
            let x = outcome.skeleton.node(i)[0];
            assert!(
                (4.0..5.0).contains(&x),
                "median node {i} pulled to x={x} by outliers"
            );
        }
    }

    #[test]
    fn distances_measure_lateral_spread() {
        let set = jittered_bundle(12, 0);
        let params = SkeletonParams {
            level: 2,
            smooth: false,
        };
        let skeleton = extract_skeleton(&set, &params).expect("skeleton");
        let outcome = median_distance(&set, &skeleton, true);

        for node in outcome.distances.interior_nodes() {
            let row: Vec<f32> = (0..set.num_curves())
                .map(|c| outcome.distances.get(node, c))
                .collect();
            let max = row.iter().cloned().fold(0.0f32, f32::max);
            assert!(
                max > 0.2,
                "node {node}: expected some lateral spread, max distance {max}"
            );
            assert!(
                max < 2.0,
                "node {node}: distances exceed the bundle radius, max {max}"
            );
        }
    }

    #[test]
    fn median_only_mode_leaves_distances_zero() {
        let set = jittered_bundle(12, 0);
        let params = SkeletonParams {
            level: 2,
            smooth: false,
        };
        let skeleton = extract_skeleton(&set, &params).expect("skeleton");
        let outcome = median_distance(&set, &skeleton, false);
        for node in outcome.distances.interior_nodes() {
            for curve in 0..set.num_curves() {
                assert_eq!(outcome.distances.get(node, curve), 0.0);
            }
        }
    }
}
