//! Binary clustering of endpoint direction vectors.
//!
//! The orientation resolver only needs a partition of N direction vectors
//! into two near-opposite groups, so the algorithm is kept behind a trait.
//! The default is a deterministic Lloyd 2-means: centers are seeded from the
//! most-separated pair of inputs, then alternately reassigned and re-averaged
//! for a fixed number of iterations (with early exit once assignments are
//! stable).

use nalgebra::Vector3;

/// Partition a set of vectors into two groups.
pub trait BinaryClustering {
    /// One flag per input vector; `true` assigns it to the second group.
    fn split(&self, vectors: &[Vector3<f32>]) -> Vec<bool>;
}

/// Deterministic Lloyd 2-means.
#[derive(Clone, Copy, Debug)]
pub struct TwoMeans {
    pub max_iters: usize,
}

impl Default for TwoMeans {
    fn default() -> Self {
        Self { max_iters: 30 }
    }
}

impl BinaryClustering for TwoMeans {
    fn split(&self, vectors: &[Vector3<f32>]) -> Vec<bool> {
        if vectors.len() < 2 {
            return vec![false; vectors.len()];
        }

        let mean: Vector3<f32> = vectors.iter().sum::<Vector3<f32>>() / vectors.len() as f32;
        let seed_a = farthest_from(vectors, &mean);
        let seed_b = farthest_from(vectors, &vectors[seed_a]);
        let mut centers = [vectors[seed_a], vectors[seed_b]];

        let mut labels = vec![false; vectors.len()];
        for _ in 0..self.max_iters {
            let mut changed = false;
            for (i, v) in vectors.iter().enumerate() {
                let second = (v - centers[1]).norm_squared() < (v - centers[0]).norm_squared();
                if labels[i] != second {
                    labels[i] = second;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
            let mut sums = [Vector3::zeros(), Vector3::zeros()];
            let mut counts = [0usize; 2];
            for (i, v) in vectors.iter().enumerate() {
                let c = labels[i] as usize;
                sums[c] += v;
                counts[c] += 1;
            }
            for c in 0..2 {
                // An emptied cluster keeps its previous center.
                if counts[c] > 0 {
                    centers[c] = sums[c] / counts[c] as f32;
                }
            }
        }
        labels
    }
}

fn farthest_from(vectors: &[Vector3<f32>], anchor: &Vector3<f32>) -> usize {
    let mut best = 0usize;
    let mut best_d = -1.0f32;
    for (i, v) in vectors.iter().enumerate() {
        let d = (v - anchor).norm_squared();
        if d > best_d {
            best_d = d;
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separates_antipodal_direction_blobs() {
        let mut dirs = Vec::new();
        for i in 0..10 {
            let jitter = (i as f32 - 5.0) * 0.02;
            dirs.push(Vector3::new(jitter, -jitter, 10.0));
            dirs.push(Vector3::new(-jitter, jitter, -10.0));
        }
        let labels = TwoMeans::default().split(&dirs);
        // Alternating inputs must land in alternating clusters.
        let first = labels[0];
        for (i, &label) in labels.iter().enumerate() {
            let expected = if i % 2 == 0 { first } else { !first };
            assert_eq!(label, expected, "vector {i} misassigned");
        }
    }

    #[test]
    fn degenerate_inputs_do_not_panic() {
        assert_eq!(TwoMeans::default().split(&[]), Vec::<bool>::new());
        assert_eq!(TwoMeans::default().split(&[Vector3::z()]), vec![false]);
    }
}
