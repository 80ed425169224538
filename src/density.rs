//! 2D kernel density estimation for cross-section crossing points.
//!
//! The outlier filter only needs `fit_and_score`: the density of each input
//! point under a model fitted to the whole input set. The default model is a
//! direct-sum Gaussian KDE; the score at `x` is
//! `Σ_j (2πb²)^{-1}·exp(−‖x−x_j‖²/(2b²))`, i.e. the un-averaged kernel sum,
//! so a threshold of `k/(2πb²)` reads as "roughly k neighbors within one
//! bandwidth".

/// Density model over 2D samples.
pub trait DensityModel {
    /// Fit to `points` and return the density of each input point.
    fn fit_and_score(&self, points: &[[f32; 2]], bandwidth: f32) -> Vec<f32>;
}

/// Direct-sum Gaussian kernel density estimate.
#[derive(Clone, Copy, Debug, Default)]
pub struct GaussianKde;

impl DensityModel for GaussianKde {
    fn fit_and_score(&self, points: &[[f32; 2]], bandwidth: f32) -> Vec<f32> {
        assert!(bandwidth > 0.0, "KDE bandwidth must be positive");
        let norm = 1.0 / (std::f32::consts::TAU * bandwidth * bandwidth);
        let inv_two_b2 = 1.0 / (2.0 * bandwidth * bandwidth);
        points
            .iter()
            .map(|p| {
                let mut sum = 0.0f32;
                for q in points {
                    let dx = p[0] - q[0];
                    let dy = p[1] - q[1];
                    sum += (-(dx * dx + dy * dy) * inv_two_b2).exp();
                }
                sum * norm
            })
            .collect()
    }
}
