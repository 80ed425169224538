//! Oriented planes, in-plane bases and spherical coordinates.
//!
//! A [`Plane`] is a point plus a (not necessarily unit) normal; half-space
//! membership is the sign of the dot product of `(point − origin)` with the
//! normal. All cross-section logic in the crate goes through these helpers.

use nalgebra::Vector3;

/// Threshold below which a basis seed is considered parallel to the normal.
const BASIS_SEED_EPS: f32 = 1e-4;

/// Oriented plane through `origin` with normal `normal`.
#[derive(Clone, Copy, Debug)]
pub struct Plane {
    pub origin: Vector3<f32>,
    pub normal: Vector3<f32>,
}

impl Plane {
    pub fn new(origin: Vector3<f32>, normal: Vector3<f32>) -> Self {
        Self { origin, normal }
    }

    /// Signed side of `p`: positive half-space iff the result is `> 0`.
    #[inline]
    pub fn side(&self, p: &Vector3<f32>) -> f32 {
        (p - self.origin).dot(&self.normal)
    }

    /// Whether `p` lies strictly in the positive half-space.
    #[inline]
    pub fn is_positive(&self, p: &Vector3<f32>) -> bool {
        self.side(p) > 0.0
    }
}

/// Orthonormal in-plane axes for a unit plane normal.
///
/// The second axis is the global +Z axis Gram-Schmidt-orthogonalized against
/// the normal; for near-vertical normals the seed falls back to +Y. The first
/// axis completes the frame via the cross product.
pub fn in_plane_basis(unit_normal: &Vector3<f32>) -> (Vector3<f32>, Vector3<f32>) {
    let z = Vector3::z();
    let mut seed = z - z.dot(unit_normal) * unit_normal;
    if seed.norm() < BASIS_SEED_EPS {
        let y = Vector3::y();
        seed = y - y.dot(unit_normal) * unit_normal;
    }
    let y_axis = seed.normalize();
    let x_axis = y_axis.cross(unit_normal);
    (x_axis, y_axis)
}

/// Cartesian to spherical: radius, polar angle from +Z, azimuth in the XY
/// plane. A zero vector maps to all-zero angles.
pub fn cartesian_to_spherical(v: &Vector3<f32>) -> (f32, f32, f32) {
    let r = v.norm();
    if r == 0.0 {
        return (0.0, 0.0, 0.0);
    }
    let theta = (v[2] / r).clamp(-1.0, 1.0).acos();
    let phi = v[1].atan2(v[0]);
    (r, theta, phi)
}
