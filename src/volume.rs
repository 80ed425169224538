//! Owned 3D voxel containers in C order (`z` fastest).
//!
//! `MaskVolume` holds the bundle occupancy (0/1), `LabelVolume` the section
//! labels produced by the partitioner. Both store a flat buffer with explicit
//! dims and inline index helpers.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Binary occupancy volume: voxel value 1 where at least one curve passes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MaskVolume {
    /// Volume dimensions (nx, ny, nz)
    pub dims: [usize; 3],
    /// Backing storage, C order (z fastest)
    pub data: Vec<u8>,
}

impl MaskVolume {
    /// Construct a zero-initialized volume.
    pub fn new(dims: [usize; 3]) -> Self {
        Self {
            dims,
            data: vec![0; dims[0] * dims[1] * dims[2]],
        }
    }

    #[inline]
    /// Convert (x, y, z) to a linear index into `data`.
    pub fn idx(&self, x: usize, y: usize, z: usize) -> usize {
        (x * self.dims[1] + y) * self.dims[2] + z
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> u8 {
        self.data[self.idx(x, y, z)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, z: usize, v: u8) {
        let i = self.idx(x, y, z);
        self.data[i] = v;
    }

    #[inline]
    pub fn contains(&self, x: usize, y: usize, z: usize) -> bool {
        x < self.dims[0] && y < self.dims[1] && z < self.dims[2]
    }

    /// Number of occupied voxels.
    pub fn support(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }

    /// Mean of the occupied integer voxel indices, or `None` for an empty
    /// mask.
    pub fn center_of_mass(&self) -> Option<Vector3<f32>> {
        let mut sum = Vector3::zeros();
        let mut count = 0usize;
        for x in 0..self.dims[0] {
            for y in 0..self.dims[1] {
                for z in 0..self.dims[2] {
                    if self.get(x, y, z) != 0 {
                        sum += Vector3::new(x as f32, y as f32, z as f32);
                        count += 1;
                    }
                }
            }
        }
        (count > 0).then(|| sum / count as f32)
    }
}

/// Labeled section volume: voxel value is a skeleton section index, 0 means
/// outside every section.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LabelVolume {
    /// Volume dimensions (nx, ny, nz)
    pub dims: [usize; 3],
    /// Backing storage, C order (z fastest)
    pub data: Vec<u16>,
}

impl LabelVolume {
    /// Construct a zero-initialized volume.
    pub fn new(dims: [usize; 3]) -> Self {
        Self {
            dims,
            data: vec![0; dims[0] * dims[1] * dims[2]],
        }
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize, z: usize) -> usize {
        (x * self.dims[1] + y) * self.dims[2] + z
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> u16 {
        self.data[self.idx(x, y, z)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, z: usize, v: u16) {
        let i = self.idx(x, y, z);
        self.data[i] = v;
    }
}
