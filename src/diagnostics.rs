//! Structured reports emitted by the pipeline stages.

use serde::Serialize;

/// Counts and timing of one outlier-filter run.
#[derive(Clone, Debug, Serialize)]
pub struct OutlierFilterReport {
    pub curves_total: usize,
    /// Curves removed by the positional density pass (after the cap).
    pub flagged_position: usize,
    /// Curves flagged by the optional direction pass (before the union).
    pub flagged_direction: usize,
    pub removed_total: usize,
    /// Whether the keep-ratio safety cap truncated the removal set.
    pub cap_applied: bool,
    pub elapsed_ms: f64,
}

/// Skeleton construction summary.
#[derive(Clone, Debug, Serialize)]
pub struct SkeletonReport {
    pub level: u32,
    pub node_count: usize,
    pub smoothed: bool,
    pub nodes: Vec<[f32; 3]>,
    pub elapsed_ms: f64,
}

/// Section partitioning summary.
#[derive(Clone, Debug, Serialize)]
pub struct SectionReport {
    pub sections: usize,
    pub labeled_voxels: usize,
    pub elapsed_ms: f64,
}

/// End-to-end report assembled by the demo pipeline.
#[derive(Clone, Debug, Serialize)]
pub struct PipelineReport {
    pub input_curves: usize,
    pub skeleton: SkeletonReport,
    pub outliers: OutlierFilterReport,
    pub sections: Option<SectionReport>,
}
