//! Orientation resolver: a consistent start/end assignment for every curve
//! and a single global bundle direction.
//!
//! Overview
//! - Cluster the raw endpoint direction vectors (`last − first` per curve)
//!   into two groups; curves in the second group are treated as stored in
//!   reverse, so their endpoints are swapped.
//! - Average the start and end points of the long, non-outlier curves
//!   (point count inside the closed window `[Q3, Q3 + 1.5·IQR]`) into global
//!   `start`/`end` centers.
//! - Resolve the remaining global flip ambiguity with a three-way rule:
//!   dominant-axis ordering, secondary-axis ordering, or a componentwise
//!   majority vote over all curves.

use crate::cluster::{BinaryClustering, TwoMeans};
use crate::curves::CurveSet;
use crate::stats::percentile;
use nalgebra::Vector3;

/// Minimum curves the resolver needs after length filtering.
pub const MIN_CURVES: usize = 2;

/// Resolved bundle orientation.
#[derive(Clone, Debug)]
pub struct Orientation {
    /// Mean start point of the selected long curves.
    pub start: Vector3<f32>,
    /// Mean end point of the selected long curves.
    pub end: Vector3<f32>,
    /// Per-curve flag: `true` means the stored point order runs end → start.
    pub flipped: Vec<bool>,
}

impl Orientation {
    /// Resolved direction vector of curve `i` (semantic end − start).
    pub fn curve_direction(&self, curves: &CurveSet, i: usize) -> Vector3<f32> {
        let (first, last) = curves.endpoints(i);
        if self.flipped[i] {
            first - last
        } else {
            last - first
        }
    }

    /// Global bundle direction (end − start).
    pub fn mean_direction(&self) -> Vector3<f32> {
        self.end - self.start
    }
}

/// Reasons why orientation resolution may fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrientationError {
    InsufficientCurves { found: usize, minimum: usize },
}

impl std::fmt::Display for OrientationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrientationError::InsufficientCurves { found, minimum } => {
                write!(f, "insufficient curves ({found} < {minimum})")
            }
        }
    }
}

impl std::error::Error for OrientationError {}

/// Resolve the bundle orientation with the default clustering.
pub fn resolve_orientation(curves: &CurveSet) -> Result<Orientation, OrientationError> {
    resolve_orientation_with(curves, &TwoMeans::default())
}

/// Resolve the bundle orientation with a caller-supplied clustering.
pub fn resolve_orientation_with(
    curves: &CurveSet,
    clustering: &dyn BinaryClustering,
) -> Result<Orientation, OrientationError> {
    let n = curves.num_curves();
    if n < MIN_CURVES {
        return Err(OrientationError::InsufficientCurves {
            found: n,
            minimum: MIN_CURVES,
        });
    }

    let dirs: Vec<Vector3<f32>> = (0..n)
        .map(|i| {
            let (first, last) = curves.endpoints(i);
            last - first
        })
        .collect();
    let mut flipped = clustering.split(&dirs);

    let (mut start, mut end) = selected_endpoint_means(curves, &flipped)?;

    if resolve_global_flip(curves, &flipped, &start, &end) {
        std::mem::swap(&mut start, &mut end);
        for f in flipped.iter_mut() {
            *f = !*f;
        }
    }

    Ok(Orientation {
        start,
        end,
        flipped,
    })
}

/// Mean start/end over curves whose point count lies in `[Q3, Q3 + 1.5·IQR]`.
fn selected_endpoint_means(
    curves: &CurveSet,
    flipped: &[bool],
) -> Result<(Vector3<f32>, Vector3<f32>), OrientationError> {
    let lengths: Vec<f32> = (0..curves.num_curves())
        .map(|i| curves.curve_len(i) as f32)
        .collect();
    let q1 = percentile(&lengths, 25.0);
    let q3 = percentile(&lengths, 75.0);
    let upper = q3 + 1.5 * (q3 - q1);

    let mut sum_start = Vector3::zeros();
    let mut sum_end = Vector3::zeros();
    let mut selected = 0usize;
    for (i, &len) in lengths.iter().enumerate() {
        if len < q3 || len > upper {
            continue;
        }
        let (start, end) = resolved_endpoints(curves, flipped, i);
        sum_start += start;
        sum_end += end;
        selected += 1;
    }
    if selected < MIN_CURVES {
        return Err(OrientationError::InsufficientCurves {
            found: selected,
            minimum: MIN_CURVES,
        });
    }
    Ok((sum_start / selected as f32, sum_end / selected as f32))
}

fn resolved_endpoints(
    curves: &CurveSet,
    flipped: &[bool],
    i: usize,
) -> (Vector3<f32>, Vector3<f32>) {
    let (first, last) = curves.endpoints(i);
    if flipped[i] {
        (last, first)
    } else {
        (first, last)
    }
}

/// Whether the global start/end assignment must be swapped.
///
/// Applied once, globally: if one axis dominates the start→end difference,
/// that axis must increase from start to end; otherwise, if the weakest axis
/// is nearly flat, the ordering falls to the lower-indexed of the two
/// remaining axes; otherwise a componentwise majority vote over all curves
/// decides.
fn resolve_global_flip(
    curves: &CurveSet,
    flipped: &[bool],
    start: &Vector3<f32>,
    end: &Vector3<f32>,
) -> bool {
    let d = (start - end).abs();
    let total = d.sum();
    let main = d.imax();
    let small = d.imin();

    if d[main] > total - d[main] {
        return start[main] > end[main];
    }
    if d[small] < (total - d[small]) / 4.0 {
        let axis = if small == 0 { 1 } else { 0 };
        return start[axis] > end[axis];
    }

    let mut vote = 0i64;
    for i in 0..curves.num_curves() {
        let (s, e) = resolved_endpoints(curves, flipped, i);
        for k in 0..3 {
            vote += if s[k] - e[k] > 0.0 { 1 } else { -1 };
        }
    }
    vote > 0
}
