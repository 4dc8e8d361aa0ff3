use std::path::PathBuf;

use clap::Parser;

/// Annual climate dashboard.
#[derive(Parser, Debug)]
#[command(
    name = "climate_dashboard",
    version,
    about = "Interactive dashboard for annual climate spreadsheets"
)]
pub struct Cli {
    /// Path to JSON configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the workbook path from config.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Override the worksheet name from config.
    #[arg(short, long)]
    pub sheet: Option<String>,

    /// Render every chart to PNG files in this directory instead of opening
    /// the dashboard window.
    #[arg(short, long)]
    pub export: Option<PathBuf>,

    /// Open the export directory when done.
    #[arg(long, requires = "export")]
    pub open: bool,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
