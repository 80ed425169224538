//! JSON interchange for curve sets and report files.
//!
//! - `load_curve_set` / `save_curve_set`: `{dims, offsets, points}` payloads
//!   in the normalized voxel coordinate system (corner-anchored).
//! - `write_json_file`: pretty-print any serializable report to disk.

use super::{CurveSet, CurveSetError};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// On-disk schema for a curve set.
#[derive(Serialize, Deserialize)]
struct CurveSetFile {
    dims: [usize; 3],
    offsets: Vec<usize>,
    points: Vec<[f32; 3]>,
}

/// Load a curve set from a JSON file.
pub fn load_curve_set(path: &Path) -> Result<CurveSet, CurveSetError> {
    let contents = fs::read_to_string(path).map_err(|e| CurveSetError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let file: CurveSetFile =
        serde_json::from_str(&contents).map_err(|e| CurveSetError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
    let points = file
        .points
        .iter()
        .map(|p| Vector3::new(p[0], p[1], p[2]))
        .collect();
    CurveSet::new(points, file.offsets, file.dims)
}

/// Save a curve set as JSON, creating parent directories.
pub fn save_curve_set(set: &CurveSet, path: &Path) -> Result<(), CurveSetError> {
    ensure_parent_dir(path)?;
    let file = CurveSetFile {
        dims: set.dims(),
        offsets: set.offsets().to_vec(),
        points: set.points().iter().map(|p| [p[0], p[1], p[2]]).collect(),
    };
    let json = serde_json::to_string(&file).map_err(|e| CurveSetError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    fs::write(path, json).map_err(|e| CurveSetError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
        }
    }
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize JSON for {}: {e}", path.display()))?;
    fs::write(path, json).map_err(|e| format!("Failed to write JSON {}: {e}", path.display()))
}

fn ensure_parent_dir(path: &Path) -> Result<(), CurveSetError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| CurveSetError::Io {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
    }
    Ok(())
}
