//! Climate Dashboard - annual climate spreadsheet viewer
//!
//! Opens the interactive dashboard window, or with `--export` renders every
//! chart to PNG files without a window.

use std::path::Path;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use eframe::egui;

use climate_dashboard::charts::StaticChartRenderer;
use climate_dashboard::cli::Cli;
use climate_dashboard::config::DashboardConfig;
use climate_dashboard::gui::ClimateApp;
use climate_dashboard::{logging, Dashboard};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => DashboardConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => DashboardConfig::default(),
    };
    if let Some(input) = cli.input {
        config.input = input;
    }
    if let Some(sheet) = cli.sheet {
        config.sheet = Some(sheet);
    }

    match cli.export {
        Some(dir) => export(&config, &dir, cli.open),
        None => run_window(config),
    }
}

fn export(config: &DashboardConfig, dir: &Path, open_dir: bool) -> Result<()> {
    let dashboard = Dashboard::load(config)?;
    for (section, reason) in dashboard.failed_sections() {
        eprintln!("{}: {}", section.title, reason);
    }

    let written = StaticChartRenderer::export_all(
        &dashboard.sections,
        dir,
        config.export_width,
        config.export_height,
    )?;
    println!("Exported {} charts to {}", written.len(), dir.display());

    if open_dir {
        open::that(dir).with_context(|| format!("opening {}", dir.display()))?;
    }
    Ok(())
}

fn run_window(config: DashboardConfig) -> Result<()> {
    let title = config.title.clone();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([1000.0, 700.0])
            .with_title(&title),
        ..Default::default()
    };

    eframe::run_native(
        &title,
        options,
        Box::new(|cc| Ok(Box::new(ClimateApp::new(cc, config)))),
    )
    .map_err(|e| anyhow::anyhow!("dashboard window failed: {e}"))
}
