//! Density-based curve outlier filter.
//!
//! Overview
//! - For every interior skeleton node, project the gate-surviving plane
//!   crossings onto the cross-section's in-plane basis and score them with a
//!   2D Gaussian KDE (bandwidth pre-scaled by the neighbor-count target).
//!   When a curve crosses one plane more than once, its worst (lowest)
//!   density survives.
//! - A crossing is flagged outlier when its density is positive, at or below
//!   the threshold `k/(2πb²)`, and does not exceed the node's mean density
//!   (curves denser than the node average are never flagged, which guards
//!   degenerate single-cluster nodes).
//! - A curve is removed when it is flagged at more than `outlier_ratio` of
//!   the nodes where it records any crossing. If that would remove more than
//!   `keep_ratio` of the bundle, only the worst `keep_ratio` fraction by
//!   flagged-node count is removed.
//! - Optionally, a direction pass re-resolves the bundle orientation, maps
//!   each curve's direction to spherical-angle deviations from the mean
//!   direction (in degrees), KDE-scores those, and unions the low-density
//!   curves into the removal set.
//!
//! Removal happens strictly after all per-node statistics, as one atomic
//! rebuild of the curve set.

use crate::curves::CurveSet;
use crate::density::{DensityModel, GaussianKde};
use crate::diagnostics::OutlierFilterReport;
use crate::geometry::{cartesian_to_spherical, in_plane_basis, Plane};
use crate::orientation::{resolve_orientation, OrientationError};
use crate::skeleton::crossing::{plane_crossings, CrossingGates, WindowGate};
use crate::skeleton::Skeleton;
use crate::types::NodeCurveMap;
use log::{debug, info, warn};
use nalgebra::Vector3;
use rayon::prelude::*;
use serde::Deserialize;
use std::f32::consts::{PI, TAU};
use std::time::Instant;

/// Normals shorter than this are degenerate and fall back to the previous
/// valid cross-section normal.
const NORMAL_EPS: f32 = 1e-6;

/// Outlier filter tunables.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct OutlierOptions {
    /// Fraction of a curve's crossed nodes allowed to be outliers before the
    /// curve is removed, in `(0, 1]`.
    pub outlier_ratio: f32,
    /// Also remove curves whose main direction is a density outlier.
    pub remove_outlier_dir: bool,
    /// Positional KDE bandwidth (scaled internally by `neighbors_required`).
    pub bandwidth: f32,
    /// Approximate neighbor count required to survive a cross-section.
    pub neighbors_required: usize,
    /// Direction KDE bandwidth in degrees (scaled by
    /// `neighbors_required_dir`).
    pub bandwidth_dir: f32,
    /// Approximate neighbor count required in direction space.
    pub neighbors_required_dir: usize,
    /// Maximum fraction of the bundle the filter may remove.
    pub keep_ratio: f32,
}

impl Default for OutlierOptions {
    fn default() -> Self {
        Self {
            outlier_ratio: 0.5,
            remove_outlier_dir: false,
            bandwidth: 0.2,
            neighbors_required: 5,
            bandwidth_dir: 1.0,
            neighbors_required_dir: 10,
            keep_ratio: 0.5,
        }
    }
}

/// Result of the outlier filter.
#[derive(Clone, Debug)]
pub struct OutlierOutcome {
    /// The bundle with every flagged curve dropped.
    pub kept: CurveSet,
    /// Removed curve indices (ascending, in the input set's numbering).
    pub removed: Vec<usize>,
    /// Per (interior node, curve) density scores; zero where a curve does
    /// not cross.
    pub densities: NodeCurveMap,
    /// Removal counts and timings.
    pub report: OutlierFilterReport,
}

/// Run the outlier filter with the default Gaussian KDE.
pub fn remove_outliers(
    curves: &CurveSet,
    skeleton: &Skeleton,
    options: &OutlierOptions,
) -> Result<OutlierOutcome, OrientationError> {
    remove_outliers_with(curves, skeleton, options, &GaussianKde)
}

/// Run the outlier filter with a caller-supplied density model.
pub fn remove_outliers_with(
    curves: &CurveSet,
    skeleton: &Skeleton,
    options: &OutlierOptions,
    model: &(dyn DensityModel + Sync),
) -> Result<OutlierOutcome, OrientationError> {
    let filter_start = Instant::now();
    let n_curves = curves.num_curves();
    let bandwidth = options.bandwidth * options.neighbors_required as f32;

    let unit_normals = unit_plane_normals(skeleton);
    let rows: Vec<(usize, Vec<f32>)> = skeleton
        .interior()
        .collect::<Vec<_>>()
        .into_par_iter()
        .map(|i| {
            (
                i,
                node_density_row(curves, skeleton, i, unit_normals[i], bandwidth, model),
            )
        })
        .collect();
    let mut densities = NodeCurveMap::new(skeleton.len(), n_curves);
    for (i, row) in rows {
        densities.set_row(i, row);
    }

    let (flagged, observed) = flag_counts(&densities, options, bandwidth);
    let (mut removed, cap_applied) = select_removals(&flagged, &observed, options);
    let flagged_position = removed.len();
    if cap_applied {
        warn!(
            "outlier filter capped at {} of {} flagged curves (keep_ratio {})",
            removed.len(),
            flagged.iter().filter(|&&f| f > 0).count(),
            options.keep_ratio
        );
    }

    let mut flagged_direction = 0usize;
    if options.remove_outlier_dir {
        let dir_flags = direction_outliers(curves, options, model)?;
        flagged_direction = dir_flags.len();
        info!("{flagged_direction} curves flagged on direction");
        for idx in dir_flags {
            if !removed.contains(&idx) {
                removed.push(idx);
            }
        }
    }
    removed.sort_unstable();

    let kept = curves.without_curves(&removed);
    info!("{} of {n_curves} curves removed from bundle", removed.len());

    let report = OutlierFilterReport {
        curves_total: n_curves,
        flagged_position,
        flagged_direction,
        removed_total: removed.len(),
        cap_applied,
        elapsed_ms: filter_start.elapsed().as_secs_f64() * 1000.0,
    };
    Ok(OutlierOutcome {
        kept,
        removed,
        densities,
        report,
    })
}

/// Unit cross-section normals per node (`None` for the endpoints). A
/// degenerate interior normal reuses the previous valid one.
fn unit_plane_normals(skeleton: &Skeleton) -> Vec<Option<Vector3<f32>>> {
    let axis = skeleton.normal(0);
    let mut last_valid = (axis.norm() > NORMAL_EPS).then(|| axis.normalize());
    let mut normals = vec![None; skeleton.len()];
    for i in skeleton.interior() {
        let raw = skeleton.node(i - 1) - skeleton.node(i + 1);
        let norm = raw.norm();
        if norm > NORMAL_EPS {
            last_valid = Some(raw / norm);
        } else {
            debug!("node {i}: degenerate plane normal, reusing previous");
        }
        normals[i] = last_valid;
    }
    normals
}

/// Density of every curve's worst crossing at one interior node.
fn node_density_row(
    curves: &CurveSet,
    skeleton: &Skeleton,
    i: usize,
    unit_normal: Option<Vector3<f32>>,
    bandwidth: f32,
    model: &(dyn DensityModel + Sync),
) -> Vec<f32> {
    let mut row = vec![0.0f32; curves.num_curves()];
    let Some(normal) = unit_normal else {
        return row;
    };
    let midpoint = skeleton.node(i);
    let gates = CrossingGates {
        window: Some(WindowGate {
            start: Plane::new(skeleton.node(i - 1), skeleton.normal(i - 1)),
            end: Plane::new(skeleton.node(i + 1), skeleton.normal(i + 1)),
            reference: midpoint,
        }),
        center_of_mass: None,
    };
    let crossings = plane_crossings(curves, &Plane::new(midpoint, normal), &gates);
    if crossings.is_empty() {
        return row;
    }

    let (x_axis, y_axis) = in_plane_basis(&normal);
    let projected: Vec<[f32; 2]> = crossings
        .iter()
        .map(|c| {
            let q = c.position - midpoint;
            [q.dot(&x_axis), q.dot(&y_axis)]
        })
        .collect();
    let scores = model.fit_and_score(&projected, bandwidth);

    for (c, score) in crossings.iter().zip(scores) {
        let current = row[c.curve];
        // Worst observed density survives multiple crossings.
        row[c.curve] = if current == 0.0 {
            score
        } else {
            current.min(score)
        };
    }
    row
}

/// Per-curve counts of flagged and observed nodes.
fn flag_counts(
    densities: &NodeCurveMap,
    options: &OutlierOptions,
    bandwidth: f32,
) -> (Vec<usize>, Vec<usize>) {
    let threshold = options.neighbors_required as f32 / (TAU * bandwidth * bandwidth);
    let mut flagged = vec![0usize; densities.curves()];
    let mut observed = vec![0usize; densities.curves()];
    for node in densities.interior_nodes() {
        let row = densities.row(node);
        let mut sum = 0.0f32;
        let mut count = 0usize;
        for &d in row {
            if d > 0.0 {
                sum += d;
                count += 1;
            }
        }
        if count == 0 {
            continue;
        }
        let mean = sum / count as f32;
        for (curve, &d) in row.iter().enumerate() {
            if d > 0.0 {
                observed[curve] += 1;
                if d <= threshold && d <= mean {
                    flagged[curve] += 1;
                }
            }
        }
    }
    (flagged, observed)
}

/// Removal set: curves flagged at more than `outlier_ratio` of their
/// observed nodes, capped at the worst `keep_ratio` fraction of the bundle.
fn select_removals(
    flagged: &[usize],
    observed: &[usize],
    options: &OutlierOptions,
) -> (Vec<usize>, bool) {
    let mut removed: Vec<usize> = (0..flagged.len())
        .filter(|&i| flagged[i] as f32 > observed[i] as f32 * options.outlier_ratio)
        .collect();
    let limit = flagged.len() as f32 * options.keep_ratio;
    if removed.len() as f32 > limit {
        removed.sort_by(|&a, &b| flagged[b].cmp(&flagged[a]).then(a.cmp(&b)));
        removed.truncate(limit as usize);
        removed.sort_unstable();
        (removed, true)
    } else {
        (removed, false)
    }
}

/// Curves whose direction is a density outlier in spherical-angle space.
fn direction_outliers(
    curves: &CurveSet,
    options: &OutlierOptions,
    model: &(dyn DensityModel + Sync),
) -> Result<Vec<usize>, OrientationError> {
    let orientation = resolve_orientation(curves)?;
    let (_, theta_mean, phi_mean) = cartesian_to_spherical(&orientation.mean_direction());

    let deviations: Vec<[f32; 2]> = (0..curves.num_curves())
        .map(|i| {
            let dir = orientation.curve_direction(curves, i);
            let (_, theta, phi) = cartesian_to_spherical(&dir);
            let mut dt = theta - theta_mean;
            let mut dp = phi - phi_mean;
            if dt < -PI {
                dt += TAU;
            }
            if dp < -PI {
                dp += TAU;
            }
            [dt.to_degrees(), dp.to_degrees()]
        })
        .collect();

    let bandwidth = options.bandwidth_dir * options.neighbors_required_dir as f32;
    let scores = model.fit_and_score(&deviations, bandwidth);
    let threshold = options.neighbors_required_dir as f32 / (TAU * bandwidth * bandwidth);
    Ok(scores
        .iter()
        .enumerate()
        .filter(|&(_, &s)| s < threshold)
        .map(|(i, _)| i)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::{extract_skeleton, SkeletonParams};

    fn options() -> OutlierOptions {
        OutlierOptions::default()
    }

    /// Eight tightly packed curves plus one isolated curve at x=7.
    fn bundle_with_stray() -> CurveSet {
        let mut points = Vec::new();
        let mut offsets = Vec::new();
        for i in 0..9 {
            offsets.push(points.len());
            let x = if i == 8 { 7.0 } else { 2.0 + (i % 4) as f32 * 0.2 };
            let y = if i == 8 { 2.0 } else { 2.0 + (i / 4) as f32 * 0.2 };
            let mut curve: Vec<Vector3<f32>> =
                (0..21).map(|k| Vector3::new(x, y, k as f32 * 0.5)).collect();
            if i % 2 == 1 {
                curve.reverse();
            }
            points.extend(curve);
        }
        CurveSet::new(points, offsets, [9, 5, 11]).expect("valid bundle")
    }

    #[test]
    fn stray_curve_is_removed() {
        let set = bundle_with_stray();
        let params = SkeletonParams {
            level: 2,
            smooth: false,
        };
        let skeleton = extract_skeleton(&set, &params).expect("skeleton");
        let outcome = remove_outliers(&set, &skeleton, &options()).expect("filter");
        assert_eq!(outcome.removed, vec![8]);
        assert_eq!(outcome.kept.num_curves(), 8);
        assert!(!outcome.report.cap_applied);
        assert_eq!(outcome.report.removed_total, 1);
    }

    #[test]
    fn densities_are_zero_where_curves_do_not_cross() {
        // Eight full-length curves plus one short curve (index 8) that ends
        // at z=4 and therefore never reaches the upper cross-sections.
        let mut points = Vec::new();
        let mut offsets = Vec::new();
        for i in 0..8 {
            offsets.push(points.len());
            let x = 2.0 + (i % 4) as f32 * 0.2;
            let y = 2.0 + (i / 4) as f32 * 0.2;
            let mut curve: Vec<Vector3<f32>> =
                (0..21).map(|k| Vector3::new(x, y, k as f32 * 0.5)).collect();
            if i % 2 == 1 {
                curve.reverse();
            }
            points.extend(curve);
        }
        offsets.push(points.len());
        points.extend((0..9).map(|k| Vector3::new(2.3, 2.1, k as f32 * 0.5)));
        let set = CurveSet::new(points, offsets, [9, 5, 11]).expect("valid bundle");

        let params = SkeletonParams {
            level: 2,
            smooth: false,
        };
        let skeleton = extract_skeleton(&set, &params).expect("skeleton");
        let outcome = remove_outliers(&set, &skeleton, &options()).expect("filter");

        assert!(
            outcome.densities.get(1, 8) > 0.0,
            "short curve crosses the first interior node"
        );
        assert_eq!(outcome.densities.get(2, 8), 0.0);
        assert_eq!(outcome.densities.get(3, 8), 0.0);
        // Absent nodes must not count against the curve.
        assert!(!outcome.removed.contains(&8), "short curve penalized for absence");
    }

    #[test]
    fn ratio_selection_requires_majority_of_observed_nodes() {
        let opts = options();
        // Curve 0: flagged at 2 of 4 observed nodes, not a majority.
        // Curve 1: flagged at 3 of 4. Curve 2: never observed.
        let (removed, capped) = select_removals(&[2, 3, 0], &[4, 4, 0], &opts);
        assert_eq!(removed, vec![1]);
        assert!(!capped);
    }

    #[test]
    fn cap_keeps_the_worst_fraction_only() {
        let mut opts = options();
        opts.outlier_ratio = 0.01;
        opts.keep_ratio = 0.4;
        // All five curves qualify for removal; only the worst two survive
        // the cap.
        let (removed, capped) = select_removals(&[1, 5, 3, 4, 2], &[5, 5, 5, 5, 5], &opts);
        assert!(capped);
        assert_eq!(removed, vec![1, 3]);
    }

    #[test]
    fn direction_pass_flags_misaligned_curves() {
        // Twelve curves along +Z, one along +X. Twelve aligned deviations
        // score 12/(2πb²) against a threshold of 10/(2πb²), a comfortable
        // margin above it.
        let mut points = Vec::new();
        let mut offsets = Vec::new();
        for i in 0..12 {
            offsets.push(points.len());
            let x = 2.0 + (i % 3) as f32 * 0.3;
            let mut curve: Vec<Vector3<f32>> =
                (0..11).map(|k| Vector3::new(x, 2.0, k as f32)).collect();
            if i % 2 == 1 {
                curve.reverse();
            }
            points.extend(curve);
        }
        offsets.push(points.len());
        points.extend((0..11).map(|k| Vector3::new(k as f32 * 0.8, 4.0, 5.0)));
        let set = CurveSet::new(points, offsets, [9, 6, 11]).expect("valid bundle");

        let flagged =
            direction_outliers(&set, &options(), &GaussianKde).expect("direction pass");
        assert!(
            flagged.contains(&12),
            "perpendicular curve not flagged: {flagged:?}"
        );
        assert!(
            !flagged.iter().any(|&i| i < 12),
            "aligned curves flagged: {flagged:?}"
        );
    }

    #[test]
    fn degenerate_normals_reuse_previous() {
        // Coincident neighbors around node 2 make its normal zero length.
        let nodes = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, 2.0),
            Vector3::new(0.0, 0.0, 2.0),
            Vector3::new(0.0, 0.0, 2.0),
            Vector3::new(0.0, 0.0, 8.0),
        ];
        let normals = vec![Vector3::new(0.0, 0.0, -8.0); 5];
        let skeleton = Skeleton::from_parts(nodes, normals);
        let units = unit_plane_normals(&skeleton);
        assert!(units[0].is_none());
        assert!(units[4].is_none());
        let expected = Vector3::new(0.0, 0.0, -1.0);
        for i in 1..4 {
            let n = units[i].expect("interior normal");
            assert!((n - expected).norm() < 1e-5, "node {i}: {n:?}");
        }
    }
}
