//! Climate Dashboard - annual climate spreadsheet analysis
//!
//! Loads a yearly climate table, normalizes its column names, derives the
//! baseline anomaly and decade aggregates, and lays the results out as an
//! ordered list of dashboard sections.

pub mod charts;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod gui;
pub mod logging;
pub mod stats;

use std::path::PathBuf;

use charts::{build_sections, Section};
use config::DashboardConfig;
use data::{present_optionals, Normalizer, WorkbookLoader};
use error::Result;
use stats::{derive, DerivedTable};
use tracing::{debug, info};

/// One fully computed dashboard page.
#[derive(Debug)]
pub struct Dashboard {
    pub source: PathBuf,
    /// Column headers as they appeared in the file, before renaming.
    pub source_columns: Vec<String>,
    pub derived: DerivedTable,
    pub sections: Vec<Section>,
}

impl Dashboard {
    /// Load, normalize, derive, then build every section.
    ///
    /// Errors here are session-level; per-chart failures are kept inside the
    /// individual sections.
    pub fn load(config: &DashboardConfig) -> Result<Self> {
        let mut loader = WorkbookLoader::new();
        let raw = loader.load(&config.input, config.sheet.as_deref())?.clone();
        let source_columns = loader.get_columns();
        let source = loader
            .get_file_path()
            .cloned()
            .unwrap_or_else(|| config.input.clone());

        let normalized = Normalizer::normalize(raw)?;
        let optionals = present_optionals(&normalized);
        debug!(?optionals, "optional variables present");

        let derived = derive(normalized, config.baseline_window())?;
        let sections = build_sections(&derived, config);

        info!(
            path = %source.display(),
            rows = loader.get_row_count(),
            sections = sections.len(),
            "dashboard ready"
        );

        Ok(Self {
            source,
            source_columns,
            derived,
            sections,
        })
    }

    /// Sections that could not be built, with their reasons.
    pub fn failed_sections(&self) -> impl Iterator<Item = (&Section, String)> {
        self.sections
            .iter()
            .filter_map(|s| s.content.as_ref().err().map(|e| (s, e.to_string())))
    }
}
