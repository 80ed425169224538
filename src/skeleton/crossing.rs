//! Cross-section evaluator: where curves cross a plane, under the pipeline's
//! consistency gates.
//!
//! A crossing is an adjacent pair of points of one curve whose signed plane
//! sides differ; the later point of the pair is the recorded crossing
//! position. Pairs that straddle a curve boundary are never crossings.
//!
//! Two optional gates restrict the survivors:
//! - **window gate**: the crossing must lie on the same side of the window's
//!   bracketing start/end planes as a reference point (the window midpoint),
//!   which rejects points topologically outside the current window, e.g.
//!   where the bundle loops back through the slab.
//! - **center-of-mass gate**: the crossing must lie on the same side of the
//!   bundle's center of mass as the plane origin, which rejects spurious
//!   crossings from curves re-entering the slab from the far side.

use crate::curves::CurveSet;
use crate::geometry::Plane;
use nalgebra::Vector3;

/// A recorded plane crossing.
#[derive(Clone, Copy, Debug)]
pub struct Crossing {
    /// Flattened index of the crossing point.
    pub point_index: usize,
    /// Owning curve.
    pub curve: usize,
    /// Position of the crossing point.
    pub position: Vector3<f32>,
}

/// Side-consistency gate against a window's bracketing planes.
#[derive(Clone, Copy, Debug)]
pub struct WindowGate {
    pub start: Plane,
    pub end: Plane,
    /// Point whose plane sides define the admissible region (the midpoint).
    pub reference: Vector3<f32>,
}

impl WindowGate {
    fn admits(&self, p: &Vector3<f32>) -> bool {
        self.start.is_positive(p) == self.start.is_positive(&self.reference)
            && self.end.is_positive(p) == self.end.is_positive(&self.reference)
    }
}

/// Optional filters applied to detected crossings.
#[derive(Clone, Copy, Debug, Default)]
pub struct CrossingGates {
    pub window: Option<WindowGate>,
    /// Bundle center of mass; crossings on the far side of it are dropped.
    pub center_of_mass: Option<Vector3<f32>>,
}

impl CrossingGates {
    fn admits(&self, plane: &Plane, p: &Vector3<f32>) -> bool {
        if let Some(window) = &self.window {
            if !window.admits(p) {
                return false;
            }
        }
        if let Some(com) = &self.center_of_mass {
            if (plane.origin - com).dot(&(p - com)) < 0.0 {
                return false;
            }
        }
        true
    }
}

/// All gate-surviving crossings of `curves` through `plane`, in flattened
/// point order.
pub fn plane_crossings(curves: &CurveSet, plane: &Plane, gates: &CrossingGates) -> Vec<Crossing> {
    let points = curves.points();
    let mut crossings = Vec::new();
    for curve in 0..curves.num_curves() {
        let range = curves.curve_range(curve);
        let mut prev_side = plane.is_positive(&points[range.start]);
        for i in range.start + 1..range.end {
            let side = plane.is_positive(&points[i]);
            if side != prev_side && gates.admits(plane, &points[i]) {
                crossings.push(Crossing {
                    point_index: i,
                    curve,
                    position: points[i],
                });
            }
            prev_side = side;
        }
    }
    crossings
}
