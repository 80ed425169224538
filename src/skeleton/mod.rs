//! Skeleton builder: the bundle's medial trajectory as an ordered node
//! sequence produced by recursive plane bisection.
//!
//! Overview
//! - Resolve the bundle orientation (the `orientation` module) to seed the
//!   first and last nodes with the global start/end centers.
//! - Recursively bisect each window between two placed nodes: the new node
//!   is the mean of all curve points crossing the window's midplane, after
//!   the window-consistency gate; a window with no surviving crossing falls
//!   back to the geometric midpoint.
//! - Optionally smooth the result by replacing every interior node with the
//!   robust per-axis median of its cross-section (the median estimator in
//!   median-only mode).
//!
//! A node at one bisection level only reads its two bracketing nodes (and
//! their normals) from the previous level, so the recursion preserves the
//! level-order dependency without an explicit level loop.

pub mod crossing;

use crate::cluster::{BinaryClustering, TwoMeans};
use crate::curves::CurveSet;
use crate::geometry::Plane;
use crate::median::median_distance;
use crate::orientation::{resolve_orientation_with, OrientationError};
use crossing::{plane_crossings, CrossingGates, WindowGate};
use log::debug;
use nalgebra::Vector3;
use serde::Deserialize;

/// Skeleton construction parameters.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct SkeletonParams {
    /// Bisection depth; the skeleton has `2^level + 1` nodes.
    pub level: u32,
    /// Replace raw crossing means with robust medians after construction.
    pub smooth: bool,
}

impl Default for SkeletonParams {
    fn default() -> Self {
        Self {
            level: 3,
            smooth: true,
        }
    }
}

/// Ordered medial node sequence with per-node plane normals.
#[derive(Clone, Debug)]
pub struct Skeleton {
    nodes: Vec<Vector3<f32>>,
    normals: Vec<Vector3<f32>>,
}

impl Skeleton {
    pub(crate) fn from_parts(nodes: Vec<Vector3<f32>>, normals: Vec<Vector3<f32>>) -> Self {
        assert_eq!(nodes.len(), normals.len());
        assert!(nodes.len() >= 2, "a skeleton has at least 2 nodes");
        Self { nodes, normals }
    }

    /// Number of nodes (`2^level + 1`).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Node position.
    #[inline]
    pub fn node(&self, i: usize) -> Vector3<f32> {
        self.nodes[i]
    }

    /// Plane normal associated with node `i` (not necessarily unit length).
    #[inline]
    pub fn normal(&self, i: usize) -> Vector3<f32> {
        self.normals[i]
    }

    /// All node positions in order.
    pub fn nodes(&self) -> &[Vector3<f32>] {
        &self.nodes
    }

    /// Interior node indices (everything but the two endpoints).
    pub fn interior(&self) -> std::ops::Range<usize> {
        1..self.nodes.len() - 1
    }

    /// Copy with the given interior node positions replaced; normals are
    /// kept as built.
    pub(crate) fn with_nodes(&self, nodes: Vec<Vector3<f32>>) -> Self {
        assert_eq!(nodes.len(), self.nodes.len());
        Self {
            nodes,
            normals: self.normals.clone(),
        }
    }
}

/// Extract the bundle skeleton with the default orientation clustering.
pub fn extract_skeleton(
    curves: &CurveSet,
    params: &SkeletonParams,
) -> Result<Skeleton, OrientationError> {
    extract_skeleton_with(curves, params, &TwoMeans::default())
}

/// Extract the bundle skeleton with a caller-supplied orientation clustering.
pub fn extract_skeleton_with(
    curves: &CurveSet,
    params: &SkeletonParams,
    clustering: &dyn BinaryClustering,
) -> Result<Skeleton, OrientationError> {
    let orientation = resolve_orientation_with(curves, clustering)?;

    let count = (1usize << params.level) + 1;
    let axis = orientation.start - orientation.end;
    let mut nodes = vec![Vector3::zeros(); count];
    let mut normals = vec![axis; count];
    nodes[0] = orientation.start;
    nodes[count - 1] = orientation.end;

    subdivide(curves, &mut nodes, &mut normals, 0, count - 1);

    let mut skeleton = Skeleton::from_parts(nodes, normals);
    if params.smooth {
        skeleton = median_distance(curves, &skeleton, false).skeleton;
    }
    Ok(skeleton)
}

/// Place the midpoint node of the window `(lo, hi)`, then recurse into both
/// halves. Windows of width 1 carry no midpoint.
fn subdivide(
    curves: &CurveSet,
    nodes: &mut [Vector3<f32>],
    normals: &mut [Vector3<f32>],
    lo: usize,
    hi: usize,
) {
    let mid = (lo + hi) / 2;
    if mid == lo {
        return;
    }

    let m_start = nodes[lo];
    let m_end = nodes[hi];
    let midpoint = (m_start + m_end) * 0.5;
    let normal = m_start - m_end;
    normals[mid] = normal;

    let gates = CrossingGates {
        window: Some(WindowGate {
            start: Plane::new(m_start, normals[lo]),
            end: Plane::new(m_end, normals[hi]),
            reference: midpoint,
        }),
        center_of_mass: None,
    };
    let crossings = plane_crossings(curves, &Plane::new(midpoint, normal), &gates);

    nodes[mid] = if crossings.is_empty() {
        // Degenerate window: no curve point passes the gates. Keep the
        // geometric midpoint and continue.
        debug!("window ({lo}, {hi}): no surviving crossing, midpoint fallback");
        midpoint
    } else {
        let sum: Vector3<f32> = crossings.iter().map(|c| c.position).sum();
        sum / crossings.len() as f32
    };

    subdivide(curves, nodes, normals, lo, mid);
    subdivide(curves, nodes, normals, mid, hi);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight_bundle(n: usize) -> CurveSet {
        let mut points = Vec::new();
        let mut offsets = Vec::new();
        for i in 0..n {
            offsets.push(points.len());
            let x = 2.0 + (i % 5) as f32 * 0.2;
            let y = 3.0 + (i % 3) as f32 * 0.2;
            let mut curve: Vec<Vector3<f32>> =
                (0..17).map(|k| Vector3::new(x, y, k as f32 * 0.5)).collect();
            if i % 2 == 1 {
                curve.reverse();
            }
            points.extend(curve);
        }
        CurveSet::new(points, offsets, [8, 8, 9]).expect("valid bundle")
    }

    #[test]
    fn node_count_is_two_to_level_plus_one() {
        let set = straight_bundle(12);
        for level in 0..5 {
            let params = SkeletonParams {
                level,
                smooth: false,
            };
            let skeleton = extract_skeleton(&set, &params).expect("skeleton");
            assert_eq!(skeleton.len(), (1 << level) + 1, "level {level}");
        }
    }

    #[test]
    fn endpoints_equal_resolved_centers() {
        let set = straight_bundle(12);
        let orientation = crate::orientation::resolve_orientation(&set).expect("orientation");
        let params = SkeletonParams {
            level: 3,
            smooth: false,
        };
        let skeleton = extract_skeleton(&set, &params).expect("skeleton");
        assert_eq!(skeleton.node(0), orientation.start);
        assert_eq!(skeleton.node(skeleton.len() - 1), orientation.end);
    }

    #[test]
    fn nodes_advance_monotonically_along_the_bundle() {
        let set = straight_bundle(12);
        let params = SkeletonParams {
            level: 3,
            smooth: false,
        };
        let skeleton = extract_skeleton(&set, &params).expect("skeleton");
        for i in 1..skeleton.len() {
            assert!(
                skeleton.node(i)[2] > skeleton.node(i - 1)[2],
                "node {i} does not advance along z"
            );
        }
    }

    #[test]
    fn single_curve_is_rejected() {
        let set = straight_bundle(1);
        let result = extract_skeleton(&set, &SkeletonParams::default());
        assert!(matches!(
            result,
            Err(OrientationError::InsufficientCurves { .. })
        ));
    }
}
