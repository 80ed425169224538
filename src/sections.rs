//! Section partitioner: label every occupied voxel with the skeleton
//! segment it belongs to.
//!
//! For each node `i ≥ 1` the segment `(node[i−1], node[i])` is bounded by
//! two planes built from the neighboring nodes (index-clamped at the
//! sequence ends). A voxel belongs to the slab when it lies on the same side
//! of both bounding planes as the segment midpoint, and to the section when
//! it additionally lies on the midpoint's side of the bundle center of
//! mass. With `simplify` enabled, the labeled region is reduced to the
//! 6-connected component of the occupied slab that contains the midpoint
//! voxel, discarding disconnected fragments.
//!
//! Sections are computed per node in parallel and written back in ascending
//! node order, so overlapping sections resolve to the higher label.

use crate::curves::CurveSet;
use crate::skeleton::Skeleton;
use crate::volume::{LabelVolume, MaskVolume};
use nalgebra::Vector3;
use rayon::prelude::*;
use std::collections::VecDeque;

/// Partition the bundle's occupancy volume into labeled sections.
pub fn partition_sections(curves: &CurveSet, skeleton: &Skeleton, simplify: bool) -> LabelVolume {
    let mask = curves.occupancy();
    partition_mask(&mask, skeleton, simplify)
}

/// Partition an explicit occupancy mask (the mask defines both the voxel
/// support and the center of mass).
pub fn partition_mask(mask: &MaskVolume, skeleton: &Skeleton, simplify: bool) -> LabelVolume {
    let mut labels = LabelVolume::new(mask.dims);
    let Some(center) = mask.center_of_mass() else {
        return labels;
    };

    let sections: Vec<(usize, Vec<usize>)> = (1..skeleton.len())
        .into_par_iter()
        .map(|i| (i, section_voxels(mask, skeleton, i, &center, simplify)))
        .collect();

    for (i, voxels) in sections {
        for v in voxels {
            labels.data[v] = i as u16;
        }
    }
    labels
}

/// Voxel indices belonging to the section ending at node `i`.
fn section_voxels(
    mask: &MaskVolume,
    skeleton: &Skeleton,
    i: usize,
    center: &Vector3<f32>,
    simplify: bool,
) -> Vec<usize> {
    let n = skeleton.len();
    let m_previous = skeleton.node(if i >= 2 { i - 2 } else { i - 1 });
    let m_start = skeleton.node(i - 1);
    let m_end = skeleton.node(i);
    let m_next = skeleton.node(if i + 1 < n { i + 1 } else { i });
    let midpoint = (m_start + m_end) * 0.5;

    let n_start = m_previous - m_end;
    let n_end = m_start - m_next;
    // Side of each bounding plane the segment midpoint occupies.
    let mp_start_side = n_start.dot(&(m_start - midpoint)) > 0.0;
    let mp_end_side = n_end.dot(&(midpoint - m_end)) > 0.0;
    let com_dir = midpoint - center;

    let slab_test = |v: &Vector3<f32>| -> bool {
        (n_start.dot(&(m_start - v)) > 0.0) == mp_start_side
            && (n_end.dot(&(v - m_end)) > 0.0) == mp_end_side
    };
    let com_test = |v: &Vector3<f32>| -> bool { com_dir.dot(&(v - center)) > 0.0 };

    let [nx, ny, nz] = mask.dims;
    let mut slab = vec![false; mask.data.len()];
    let mut selected = Vec::new();
    for x in 0..nx {
        for y in 0..ny {
            for z in 0..nz {
                if mask.get(x, y, z) == 0 {
                    continue;
                }
                let v = Vector3::new(x as f32 + 0.5, y as f32 + 0.5, z as f32 + 0.5);
                if !slab_test(&v) {
                    continue;
                }
                let idx = mask.idx(x, y, z);
                slab[idx] = true;
                if com_test(&v) {
                    selected.push(idx);
                }
            }
        }
    }

    if simplify {
        if let Some(seed) = voxel_of(mask, &midpoint) {
            let seed_idx = mask.idx(seed[0], seed[1], seed[2]);
            if slab[seed_idx] && selected.contains(&seed_idx) {
                return flood_region(&slab, mask.dims, seed);
            }
        }
    }
    selected
}

/// Integer voxel containing a point, if inside the volume.
fn voxel_of(mask: &MaskVolume, p: &Vector3<f32>) -> Option<[usize; 3]> {
    if p[0] < 0.0 || p[1] < 0.0 || p[2] < 0.0 {
        return None;
    }
    let v = [
        p[0].floor() as usize,
        p[1].floor() as usize,
        p[2].floor() as usize,
    ];
    mask.contains(v[0], v[1], v[2]).then_some(v)
}

/// 6-connected region of `grid` containing `seed`, as linear voxel indices.
fn flood_region(grid: &[bool], dims: [usize; 3], seed: [usize; 3]) -> Vec<usize> {
    let [nx, ny, nz] = dims;
    let idx = |x: usize, y: usize, z: usize| (x * ny + y) * nz + z;

    let mut visited = vec![false; grid.len()];
    let mut region = Vec::new();
    let mut queue = VecDeque::new();
    let seed_idx = idx(seed[0], seed[1], seed[2]);
    visited[seed_idx] = true;
    queue.push_back(seed);

    while let Some([x, y, z]) = queue.pop_front() {
        region.push(idx(x, y, z));
        let mut visit = |x: usize, y: usize, z: usize| {
            let i = idx(x, y, z);
            if grid[i] && !visited[i] {
                visited[i] = true;
                queue.push_back([x, y, z]);
            }
        };
        if x > 0 {
            visit(x - 1, y, z);
        }
        if x + 1 < nx {
            visit(x + 1, y, z);
        }
        if y > 0 {
            visit(x, y - 1, z);
        }
        if y + 1 < ny {
            visit(x, y + 1, z);
        }
        if z > 0 {
            visit(x, y, z - 1);
        }
        if z + 1 < nz {
            visit(x, y, z + 1);
        }
    }
    region
}
