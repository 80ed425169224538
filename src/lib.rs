#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod curves;
pub mod diagnostics;
pub mod median;
pub mod orientation;
pub mod outliers;
pub mod sections;
pub mod skeleton;
pub mod types;
pub mod volume;

// Building blocks – still public, but considered unstable internals.
pub mod cluster;
pub mod config;
pub mod density;
pub mod geometry;
pub mod stats;

// --- High-level re-exports -------------------------------------------------

// Main entry points of the pipeline.
pub use crate::curves::CurveSet;
pub use crate::median::{median_distance, MedianOutcome};
pub use crate::outliers::{remove_outliers, OutlierOptions, OutlierOutcome};
pub use crate::sections::partition_sections;
pub use crate::skeleton::{extract_skeleton, Skeleton, SkeletonParams};

// Orientation is also useful standalone (e.g. to inspect the resolved
// start/end before committing to a skeleton level).
pub use crate::orientation::{resolve_orientation, Orientation, OrientationError};

/// Small prelude for quick experiments.
pub mod prelude {
    pub use crate::curves::CurveSet;
    pub use crate::outliers::OutlierOptions;
    pub use crate::skeleton::SkeletonParams;
    pub use crate::{extract_skeleton, median_distance, partition_sections, remove_outliers};
}
