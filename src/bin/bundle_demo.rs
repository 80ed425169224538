//! End-to-end demo: load a curve set, extract the skeleton, filter outliers,
//! partition sections and write JSON outputs per the runtime config.

use std::env;
use std::path::Path;
use std::time::Instant;

use tract_skeleton::config::{load_config, RuntimeConfig};
use tract_skeleton::curves::io::{load_curve_set, save_curve_set, write_json_file};
use tract_skeleton::diagnostics::{PipelineReport, SectionReport, SkeletonReport};
use tract_skeleton::{extract_skeleton, partition_sections, remove_outliers};

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args()
        .nth(1)
        .ok_or_else(|| "usage: bundle_demo <config.json>".to_string())?;
    let config = load_config(Path::new(&config_path))?;

    let curves = load_curve_set(&config.input_path).map_err(|e| e.to_string())?;
    println!(
        "loaded {} curves ({} points) from {}",
        curves.num_curves(),
        curves.num_points(),
        config.input_path.display()
    );

    let skeleton_start = Instant::now();
    let skeleton =
        extract_skeleton(&curves, &config.skeleton).map_err(|e| e.to_string())?;
    let skeleton_report = SkeletonReport {
        level: config.skeleton.level,
        node_count: skeleton.len(),
        smoothed: config.skeleton.smooth,
        nodes: skeleton.nodes().iter().map(|n| [n[0], n[1], n[2]]).collect(),
        elapsed_ms: skeleton_start.elapsed().as_secs_f64() * 1000.0,
    };
    println!(
        "skeleton: {} nodes in {:.2} ms",
        skeleton_report.node_count, skeleton_report.elapsed_ms
    );

    let outcome =
        remove_outliers(&curves, &skeleton, &config.outliers).map_err(|e| e.to_string())?;
    println!(
        "outliers: removed {} of {} curves{}",
        outcome.report.removed_total,
        outcome.report.curves_total,
        if outcome.report.cap_applied {
            " (capped)"
        } else {
            ""
        }
    );

    let filtered_path = config
        .output
        .filtered_out
        .clone()
        .unwrap_or_else(|| config.input_path.clone());
    save_curve_set(&outcome.kept, &filtered_path).map_err(|e| e.to_string())?;
    println!("filtered bundle written to {}", filtered_path.display());

    let sections_report = write_sections(&config, &outcome.kept, &skeleton)?;

    if let Some(report_path) = &config.output.report_out {
        let report = PipelineReport {
            input_curves: curves.num_curves(),
            skeleton: skeleton_report,
            outliers: outcome.report.clone(),
            sections: sections_report,
        };
        write_json_file(report_path, &report)?;
        println!("report written to {}", report_path.display());
    }
    Ok(())
}

fn write_sections(
    config: &RuntimeConfig,
    curves: &tract_skeleton::CurveSet,
    skeleton: &tract_skeleton::Skeleton,
) -> Result<Option<SectionReport>, String> {
    let Some(path) = &config.output.sections_out else {
        return Ok(None);
    };
    let sections_start = Instant::now();
    let labels = partition_sections(curves, skeleton, config.simplify_sections);
    let report = SectionReport {
        sections: skeleton.len() - 1,
        labeled_voxels: labels.data.iter().filter(|&&v| v != 0).count(),
        elapsed_ms: sections_start.elapsed().as_secs_f64() * 1000.0,
    };
    write_json_file(path, &labels)?;
    println!(
        "sections: {} labels over {} voxels in {:.2} ms -> {}",
        report.sections,
        report.labeled_voxels,
        report.elapsed_ms,
        path.display()
    );
    Ok(Some(report))
}
