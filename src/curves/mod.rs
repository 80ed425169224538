//! Curve-set container and accessors.
//!
//! A [`CurveSet`] stores every curve point in one flattened array plus a
//! strictly-increasing offset table, mirroring the layout the rest of the
//! pipeline indexes into: crossing detection walks the flat array, and
//! per-curve statistics map flattened point indices back to their owning
//! curve via [`CurveSet::curve_of`].
//!
//! Coordinates live in a normalized voxel space anchored at voxel corners;
//! the reference volume dimensions travel with the set so occupancy volumes
//! can be rasterized without external metadata.

pub mod io;

use crate::volume::MaskVolume;
use nalgebra::Vector3;
use std::ops::Range;

/// Errors produced when building or exchanging curve sets.
#[derive(Debug)]
pub enum CurveSetError {
    /// Filesystem failure while reading or writing.
    Io { path: String, source: std::io::Error },
    /// The on-disk payload is not valid JSON for the interchange schema.
    Parse { path: String, message: String },
    /// The payload violates a structural invariant.
    Malformed(String),
}

impl std::fmt::Display for CurveSetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CurveSetError::Io { path, source } => write!(f, "i/o failure on {path}: {source}"),
            CurveSetError::Parse { path, message } => {
                write!(f, "failed to parse {path}: {message}")
            }
            CurveSetError::Malformed(msg) => write!(f, "malformed curve set: {msg}"),
        }
    }
}

impl std::error::Error for CurveSetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CurveSetError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// An ordered set of 3D curves over a shared reference volume.
#[derive(Clone, Debug)]
pub struct CurveSet {
    points: Vec<Vector3<f32>>,
    offsets: Vec<usize>,
    dims: [usize; 3],
}

impl CurveSet {
    /// Build a curve set, validating the offset invariants: offsets strictly
    /// increasing and starting at 0, every curve at least 2 points, and the
    /// last curve ending exactly at the total point count.
    pub fn new(
        points: Vec<Vector3<f32>>,
        offsets: Vec<usize>,
        dims: [usize; 3],
    ) -> Result<Self, CurveSetError> {
        if offsets.is_empty() {
            return Err(CurveSetError::Malformed("no curves".into()));
        }
        if offsets[0] != 0 {
            return Err(CurveSetError::Malformed(format!(
                "first offset must be 0, got {}",
                offsets[0]
            )));
        }
        for w in offsets.windows(2) {
            if w[1] <= w[0] {
                return Err(CurveSetError::Malformed(format!(
                    "offsets must be strictly increasing ({} then {})",
                    w[0], w[1]
                )));
            }
            if w[1] - w[0] < 2 {
                return Err(CurveSetError::Malformed(format!(
                    "curve starting at {} has fewer than 2 points",
                    w[0]
                )));
            }
        }
        let last = *offsets.last().expect("non-empty offsets");
        if points.len() < last + 2 {
            return Err(CurveSetError::Malformed(format!(
                "last curve starting at {last} has fewer than 2 points (total {})",
                points.len()
            )));
        }
        Ok(Self {
            points,
            offsets,
            dims,
        })
    }

    /// Number of curves.
    pub fn num_curves(&self) -> usize {
        self.offsets.len()
    }

    /// Total number of points across all curves.
    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    /// Reference volume dimensions.
    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    /// The flattened point array.
    pub fn points(&self) -> &[Vector3<f32>] {
        &self.points
    }

    /// The offset table (start index of each curve).
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Flattened index range of curve `i`.
    pub fn curve_range(&self, i: usize) -> Range<usize> {
        let start = self.offsets[i];
        let end = self
            .offsets
            .get(i + 1)
            .copied()
            .unwrap_or(self.points.len());
        start..end
    }

    /// Points of curve `i`.
    pub fn curve(&self, i: usize) -> &[Vector3<f32>] {
        &self.points[self.curve_range(i)]
    }

    /// Number of points in curve `i`.
    pub fn curve_len(&self, i: usize) -> usize {
        self.curve_range(i).len()
    }

    /// Owning curve of a flattened point index.
    pub fn curve_of(&self, point_index: usize) -> usize {
        debug_assert!(point_index < self.points.len());
        self.offsets.partition_point(|&o| o <= point_index) - 1
    }

    /// Batch form of [`CurveSet::curve_of`].
    pub fn curves_of(&self, point_indices: &[usize]) -> Vec<usize> {
        point_indices.iter().map(|&i| self.curve_of(i)).collect()
    }

    /// Whether a flattened index is the first point of its curve.
    pub fn is_curve_start(&self, point_index: usize) -> bool {
        self.offsets.binary_search(&point_index).is_ok()
    }

    /// First and last stored point of curve `i`.
    pub fn endpoints(&self, i: usize) -> (Vector3<f32>, Vector3<f32>) {
        let range = self.curve_range(i);
        (self.points[range.start], self.points[range.end - 1])
    }

    /// Occupancy mask: voxels touched by at least one curve point. Points
    /// outside the reference dims are skipped.
    pub fn occupancy(&self) -> MaskVolume {
        let mut mask = MaskVolume::new(self.dims);
        for p in &self.points {
            if p[0] < 0.0 || p[1] < 0.0 || p[2] < 0.0 {
                continue;
            }
            let (x, y, z) = (
                p[0].floor() as usize,
                p[1].floor() as usize,
                p[2].floor() as usize,
            );
            if mask.contains(x, y, z) {
                mask.set(x, y, z, 1);
            }
        }
        mask
    }

    /// New curve set with the curves at `remove` (sorted, deduplicated by
    /// the caller or not) dropped. This is the pipeline's single atomic
    /// mutation point.
    pub fn without_curves(&self, remove: &[usize]) -> CurveSet {
        let drop: std::collections::HashSet<usize> = remove.iter().copied().collect();
        let mut points = Vec::new();
        let mut offsets = Vec::new();
        for i in 0..self.num_curves() {
            if drop.contains(&i) {
                continue;
            }
            offsets.push(points.len());
            points.extend_from_slice(self.curve(i));
        }
        CurveSet {
            points,
            offsets,
            dims: self.dims,
        }
    }

    /// Light smoothing: every non-endpoint point becomes the 3-point moving
    /// average of itself and its curve neighbors. Endpoints are preserved;
    /// the step size is no longer uniform afterwards.
    pub fn smoothed(&self) -> CurveSet {
        let mut points = self.points.clone();
        for i in 0..self.num_curves() {
            let range = self.curve_range(i);
            for j in range.start + 1..range.end - 1 {
                points[j] = (self.points[j - 1] + self.points[j] + self.points[j + 1]) / 3.0;
            }
        }
        CurveSet {
            points,
            offsets: self.offsets.clone(),
            dims: self.dims,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_curve_set() -> CurveSet {
        let points = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, 1.0),
            Vector3::new(0.0, 0.0, 2.0),
            Vector3::new(1.0, 1.0, 0.0),
            Vector3::new(1.0, 1.0, 1.0),
        ];
        CurveSet::new(points, vec![0, 3], [4, 4, 4]).expect("valid set")
    }

    #[test]
    fn rejects_non_increasing_offsets() {
        let points = vec![Vector3::zeros(); 6];
        assert!(matches!(
            CurveSet::new(points, vec![0, 3, 3], [4, 4, 4]),
            Err(CurveSetError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_single_point_curves() {
        let points = vec![Vector3::zeros(); 4];
        assert!(CurveSet::new(points.clone(), vec![0, 1], [4, 4, 4]).is_err());
        assert!(CurveSet::new(points, vec![0, 3], [4, 4, 4]).is_err());
    }

    #[test]
    fn owner_lookup_respects_offsets() {
        let set = two_curve_set();
        assert_eq!(set.curve_of(0), 0);
        assert_eq!(set.curve_of(2), 0);
        assert_eq!(set.curve_of(3), 1);
        assert_eq!(set.curve_of(4), 1);
        assert_eq!(set.curves_of(&[0, 3, 4]), vec![0, 1, 1]);
        assert!(set.is_curve_start(3));
        assert!(!set.is_curve_start(4));
    }

    #[test]
    fn removal_is_an_atomic_rebuild() {
        let set = two_curve_set();
        let kept = set.without_curves(&[0]);
        assert_eq!(kept.num_curves(), 1);
        assert_eq!(kept.num_points(), 2);
        assert_eq!(kept.curve(0)[0], Vector3::new(1.0, 1.0, 0.0));
        assert_eq!(kept.dims(), set.dims());
    }

    #[test]
    fn smoothing_preserves_endpoints() {
        let set = two_curve_set();
        let smooth = set.smoothed();
        assert_eq!(smooth.curve(0)[0], set.curve(0)[0]);
        assert_eq!(smooth.curve(0)[2], set.curve(0)[2]);
        // Straight curves are fixed points of the moving average.
        assert_eq!(smooth.curve(0)[1], set.curve(0)[1]);
    }

    #[test]
    fn occupancy_marks_touched_voxels_only() {
        let set = two_curve_set();
        let mask = set.occupancy();
        assert_eq!(mask.get(0, 0, 0), 1);
        assert_eq!(mask.get(0, 0, 2), 1);
        assert_eq!(mask.get(1, 1, 1), 1);
        assert_eq!(mask.get(3, 3, 3), 0);
        assert_eq!(mask.support(), 5);
    }
}
