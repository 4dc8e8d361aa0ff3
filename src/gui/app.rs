//! Climate Dashboard Main Application
//! Main window with control panel and dashboard viewer.

use crate::charts::StaticChartRenderer;
use crate::config::DashboardConfig;
use crate::gui::{
    ControlPanel, ControlPanelAction, DashboardViewer, StatusKind, UserSettings, ViewerState,
};
use crate::Dashboard;
use egui::SidePanel;
use std::sync::mpsc::{channel, Receiver};
use std::thread;
use tracing::{error, info, warn};

/// Loading result from background thread
enum LoadResult {
    Complete(Box<Dashboard>),
    Error(String),
}

/// Main application window.
pub struct ClimateApp {
    config: DashboardConfig,
    control_panel: ControlPanel,
    viewer: DashboardViewer,

    // Async loading
    load_rx: Option<Receiver<LoadResult>>,
}

impl ClimateApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: DashboardConfig) -> Self {
        let mut app = Self::with_config(config);
        app.start_loading();
        app
    }

    fn with_config(config: DashboardConfig) -> Self {
        let settings = UserSettings {
            input: Some(config.input.clone()),
            sheet: config.sheet.clone().unwrap_or_default(),
            baseline_start: config.baseline_start,
            baseline_end: config.baseline_end,
        };
        Self {
            viewer: DashboardViewer::new(config.title.clone()),
            control_panel: ControlPanel::new(settings),
            config,
            load_rx: None,
        }
    }

    /// Fold the panel settings back into the config used for the next load.
    fn apply_settings(&mut self) {
        let settings = &self.control_panel.settings;
        if let Some(input) = &settings.input {
            self.config.input = input.clone();
        }
        let sheet = settings.sheet.trim();
        self.config.sheet = (!sheet.is_empty()).then(|| sheet.to_string());
        self.config.baseline_start = settings.baseline_start;
        self.config.baseline_end = settings.baseline_end;
    }

    fn handle_browse(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Spreadsheets", &["xlsx", "xlsm", "xlsb", "xls", "ods", "csv"])
            .pick_file()
        {
            self.control_panel.settings.input = Some(path);
            self.start_loading();
        }
    }

    /// Run the whole pipeline in a background thread.
    fn start_loading(&mut self) {
        if self.load_rx.is_some() {
            return; // Already loading
        }
        self.apply_settings();

        let config = self.config.clone();
        let (tx, rx) = channel();
        self.load_rx = Some(rx);
        self.control_panel.busy = true;
        self.control_panel.export_enabled = false;
        self.control_panel.set_status(
            StatusKind::Info,
            format!("Loading {}...", config.input.display()),
        );

        thread::spawn(move || {
            let result = match Dashboard::load(&config) {
                Ok(dashboard) => LoadResult::Complete(Box::new(dashboard)),
                Err(e) => {
                    error!(error = %e, "dashboard could not be loaded");
                    LoadResult::Error(e.to_string())
                }
            };
            let _ = tx.send(result);
        });
    }

    /// Check for loading results
    fn check_load_results(&mut self) {
        let Some(rx) = self.load_rx.take() else {
            return;
        };

        match rx.try_recv() {
            Ok(LoadResult::Complete(dashboard)) => {
                let failed = dashboard.failed_sections().count();
                let total = dashboard.sections.len();
                self.control_panel.columns = dashboard.source_columns.clone();
                self.control_panel.set_status(
                    StatusKind::Done,
                    format!(
                        "Complete! {} sections ready, {} unavailable",
                        total - failed,
                        failed
                    ),
                );
                self.control_panel.export_enabled = true;
                self.control_panel.busy = false;
                self.viewer.state = ViewerState::Loaded(dashboard);
            }
            Ok(LoadResult::Error(message)) => {
                self.control_panel.columns.clear();
                self.control_panel
                    .set_status(StatusKind::Error, format!("Error: {}", message));
                self.control_panel.busy = false;
                self.viewer.state = ViewerState::Failed(message);
            }
            Err(std::sync::mpsc::TryRecvError::Empty) => self.load_rx = Some(rx),
            Err(std::sync::mpsc::TryRecvError::Disconnected) => {
                let message = "loader thread stopped".to_string();
                self.control_panel.columns.clear();
                self.control_panel
                    .set_status(StatusKind::Error, format!("Error: {}", message));
                self.control_panel.busy = false;
                self.viewer.state = ViewerState::Failed(message);
            }
        }
    }

    /// Render every chart to PNG files in a folder picked by the user.
    fn handle_export_png(&mut self) {
        let Some(dashboard) = self.viewer.dashboard() else {
            self.control_panel
                .set_status(StatusKind::Error, "No charts to export");
            return;
        };

        let Some(dir) = rfd::FileDialog::new().pick_folder() else {
            return; // User cancelled
        };

        match StaticChartRenderer::export_all(
            &dashboard.sections,
            &dir,
            self.config.export_width,
            self.config.export_height,
        ) {
            Ok(written) => {
                info!(count = written.len(), dir = %dir.display(), "exported charts");
                self.control_panel.set_status(
                    StatusKind::Done,
                    format!("Exported {} charts to {}", written.len(), dir.display()),
                );
                if let Err(e) = open::that(&dir) {
                    warn!(error = %e, "could not open export directory");
                }
            }
            Err(e) => {
                self.control_panel
                    .set_status(StatusKind::Error, format!("Export error: {:#}", e));
            }
        }
    }
}

impl eframe::App for ClimateApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_load_results();

        // Request repaint while loading
        if self.load_rx.is_some() {
            ctx.request_repaint();
        }

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(280.0)
            .max_width(330.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    match self.control_panel.show(ui) {
                        ControlPanelAction::Browse => self.handle_browse(),
                        ControlPanelAction::Reload => self.start_loading(),
                        ControlPanelAction::ExportPng => self.handle_export_png(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - Dashboard
        egui::CentralPanel::default().show(ctx, |ui| {
            self.viewer.show(ui);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stopped_loader_replaces_dashboard() {
        let mut app = ClimateApp::with_config(DashboardConfig::default());
        let (tx, rx) = channel::<LoadResult>();
        drop(tx);
        app.load_rx = Some(rx);
        app.control_panel.busy = true;
        app.control_panel.columns = vec!["Tahun".to_string()];

        app.check_load_results();

        assert!(app.load_rx.is_none());
        assert!(!app.control_panel.busy);
        assert!(app.control_panel.columns.is_empty());
        assert_eq!(app.control_panel.status_kind, StatusKind::Error);
        assert!(matches!(app.viewer.state, ViewerState::Failed(ref m) if m.contains("stopped")));
    }

    #[test]
    fn test_load_error_replaces_dashboard() {
        let mut app = ClimateApp::with_config(DashboardConfig::default());
        let (tx, rx) = channel();
        tx.send(LoadResult::Error("Missing column 'Tahun'".to_string()))
            .unwrap();
        app.load_rx = Some(rx);

        app.check_load_results();

        assert!(matches!(app.viewer.state, ViewerState::Failed(ref m) if m.contains("Tahun")));
        assert_eq!(app.control_panel.status_kind, StatusKind::Error);
    }
}
