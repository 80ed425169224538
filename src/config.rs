//! Runtime configuration for the demo pipeline.

use crate::outliers::OutlierOptions;
use crate::skeleton::SkeletonParams;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Filtered curve set destination (in-place when omitted).
    pub filtered_out: Option<PathBuf>,
    /// Labeled section volume destination (JSON).
    pub sections_out: Option<PathBuf>,
    /// Pipeline report destination (JSON).
    pub report_out: Option<PathBuf>,
}

#[derive(Clone, Deserialize)]
pub struct RuntimeConfig {
    pub input_path: PathBuf,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub skeleton: SkeletonParams,
    #[serde(default)]
    pub outliers: OutlierOptions,
    /// Flood-fill cleanup of the section volume.
    #[serde(default = "default_simplify")]
    pub simplify_sections: bool,
}

fn default_simplify() -> bool {
    true
}

pub fn load_config(path: &Path) -> Result<RuntimeConfig, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    let config: RuntimeConfig = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let config: RuntimeConfig =
            serde_json::from_str(r#"{"input_path": "bundle.json"}"#).expect("parse");
        assert_eq!(config.skeleton.level, 3);
        assert!(config.skeleton.smooth);
        assert_eq!(config.outliers.neighbors_required, 5);
        assert!(config.simplify_sections);
        assert!(config.output.report_out.is_none());
    }

    #[test]
    fn nested_overrides_are_honored() {
        let config: RuntimeConfig = serde_json::from_str(
            r#"{
                "input_path": "bundle.json",
                "skeleton": {"level": 2, "smooth": false},
                "outliers": {"outlier_ratio": 0.3, "remove_outlier_dir": true},
                "simplify_sections": false
            }"#,
        )
        .expect("parse");
        assert_eq!(config.skeleton.level, 2);
        assert!(!config.skeleton.smooth);
        assert_eq!(config.outliers.outlier_ratio, 0.3);
        assert!(config.outliers.remove_outlier_dir);
        assert_eq!(config.outliers.keep_ratio, 0.5);
        assert!(!config.simplify_sections);
    }
}
