use nalgebra::Vector3;
use tract_skeleton::CurveSet;

/// Center of the main population in the XY plane.
pub const MAIN_CENTER: [f32; 2] = [8.0, 8.0];

/// Deterministic jitter in `[-0.5, 0.5)` derived from a seed.
fn jitter(seed: u32) -> f32 {
    let mut s = seed.wrapping_mul(2654435761).wrapping_add(1);
    s ^= s >> 13;
    s = s.wrapping_mul(0x5bd1_e995);
    s ^= s >> 15;
    (s % 1000) as f32 / 1000.0 - 0.5
}

/// Straight bundle along +Z: `n_main` curves jittered around
/// [`MAIN_CENTER`], plus `n_outliers` curves offset far in +X (appended
/// after the main population). Every odd curve is stored in reverse order,
/// so orientation resolution is genuinely exercised.
pub fn parallel_bundle(n_main: usize, n_outliers: usize) -> CurveSet {
    let mut points = Vec::new();
    let mut offsets = Vec::new();
    let mut push_curve = |index: usize, x: f32, y: f32| {
        offsets.push(points.len());
        let mut curve: Vec<Vector3<f32>> = (0..21)
            .map(|k| Vector3::new(x, y, k as f32 * 0.5))
            .collect();
        if index % 2 == 1 {
            curve.reverse();
        }
        points.extend(curve);
    };

    for i in 0..n_main {
        let x = MAIN_CENTER[0] + 2.0 * jitter(i as u32);
        let y = MAIN_CENTER[1] + 2.0 * jitter(i as u32 + 10_000);
        push_curve(i, x, y);
    }
    // Outliers are spread apart so they do not support each other's density.
    for j in 0..n_outliers {
        let x = 15.0 + 1.2 * j as f32;
        let y = 4.0 + 2.0 * j as f32;
        push_curve(n_main + j, x, y);
    }

    CurveSet::new(points, offsets, [24, 16, 12]).expect("valid synthetic bundle")
}
