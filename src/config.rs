use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ClimateError, Result};
use crate::stats::BaselineWindow;

/// Dashboard settings, loaded from a JSON file. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DashboardConfig {
    /// Workbook to load.
    #[serde(default = "default_input")]
    pub input: PathBuf,

    /// Worksheet name; the first sheet when absent.
    #[serde(default)]
    pub sheet: Option<String>,

    /// First year of the baseline period (inclusive).
    #[serde(default = "default_baseline_start")]
    pub baseline_start: i64,

    /// Last year of the baseline period (inclusive).
    #[serde(default = "default_baseline_end")]
    pub baseline_end: i64,

    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,

    #[serde(default = "default_export_width")]
    pub export_width: u32,

    #[serde(default = "default_export_height")]
    pub export_height: u32,
}

fn default_input() -> PathBuf {
    PathBuf::from("MINANGKABAU.xlsx")
}
fn default_baseline_start() -> i64 {
    1985
}
fn default_baseline_end() -> i64 {
    2023
}
fn default_title() -> String {
    "Dashboard Analisis Iklim Provinsi Sumatera Barat".to_string()
}
fn default_histogram_bins() -> usize {
    20
}
fn default_export_width() -> u32 {
    1200
}
fn default_export_height() -> u32 {
    700
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            sheet: None,
            baseline_start: default_baseline_start(),
            baseline_end: default_baseline_end(),
            title: default_title(),
            histogram_bins: default_histogram_bins(),
            export_width: default_export_width(),
            export_height: default_export_height(),
        }
    }
}

impl DashboardConfig {
    /// Read and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: DashboardConfig =
            serde_json::from_str(&text).map_err(|e| ClimateError::Config {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        let invalid = |reason: String| ClimateError::Config {
            path: path.to_path_buf(),
            reason,
        };
        if self.baseline_start > self.baseline_end {
            return Err(invalid(format!(
                "baseline_start {} is after baseline_end {}",
                self.baseline_start, self.baseline_end
            )));
        }
        if self.histogram_bins == 0 {
            return Err(invalid("histogram_bins must be at least 1".to_string()));
        }
        if self.export_width < 200 || self.export_height < 200 {
            return Err(invalid("export size must be at least 200x200".to_string()));
        }
        Ok(())
    }

    pub fn baseline_window(&self) -> BaselineWindow {
        BaselineWindow {
            start: self.baseline_start,
            end: self.baseline_end,
        }
    }
}
