//! Control Panel Widget
//! Left side panel with data source, baseline settings and export controls.

use egui::{Color32, RichText, ScrollArea};
use std::path::PathBuf;

const ERROR_STATUS: Color32 = Color32::from_rgb(220, 53, 69);
const DONE_STATUS: Color32 = Color32::from_rgb(40, 167, 69);

/// User-editable settings, applied on the next reload.
#[derive(Debug, Clone, PartialEq)]
pub struct UserSettings {
    pub input: Option<PathBuf>,
    pub sheet: String,
    pub baseline_start: i64,
    pub baseline_end: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Done,
    Error,
}

/// Left side control panel.
pub struct ControlPanel {
    pub settings: UserSettings,
    pub columns: Vec<String>,
    pub status: String,
    pub status_kind: StatusKind,
    pub busy: bool,
    pub export_enabled: bool,
}

impl ControlPanel {
    pub fn new(settings: UserSettings) -> Self {
        Self {
            settings,
            columns: Vec::new(),
            status: "Ready".to_string(),
            status_kind: StatusKind::Info,
            busy: false,
            export_enabled: false,
        }
    }

    pub fn set_status(&mut self, kind: StatusKind, status: impl Into<String>) {
        self.status_kind = kind;
        self.status = status.into();
    }

    /// Whether the baseline inputs describe a usable window.
    pub fn baseline_is_valid(&self) -> bool {
        self.settings.baseline_start <= self.settings.baseline_end
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("🌦 Climate Dashboard")
                    .size(20.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let path_text = self
                        .settings
                        .input
                        .as_ref()
                        .and_then(|p| p.file_name())
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| "No file selected".to_string());

                    ui.label(RichText::new(&path_text).size(12.0).color(
                        if self.settings.input.is_some() {
                            Color32::WHITE
                        } else {
                            Color32::GRAY
                        },
                    ));

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.add_enabled_ui(!self.busy, |ui| {
                            if ui.button("📂 Browse").clicked() {
                                action = ControlPanelAction::Browse;
                            }
                        });
                    });
                });
            });

        ui.add_space(5.0);
        ui.horizontal(|ui| {
            ui.add_sized([90.0, 20.0], egui::Label::new("Sheet:"));
            ui.add(
                egui::TextEdit::singleline(&mut self.settings.sheet)
                    .hint_text("first sheet")
                    .desired_width(150.0),
            );
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Baseline =====
        ui.label(RichText::new("📐 Baseline Period").size(14.0).strong());
        ui.add_space(5.0);

        ui.horizontal(|ui| {
            ui.add_sized([90.0, 20.0], egui::Label::new("From:"));
            ui.add(egui::DragValue::new(&mut self.settings.baseline_start).range(1800..=2200));
        });
        ui.horizontal(|ui| {
            ui.add_sized([90.0, 20.0], egui::Label::new("To:"));
            ui.add(egui::DragValue::new(&mut self.settings.baseline_end).range(1800..=2200));
        });
        if !self.baseline_is_valid() {
            ui.label(
                RichText::new("Start year is after end year")
                    .size(11.0)
                    .color(ERROR_STATUS),
            );
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Actions =====
        ui.vertical_centered(|ui| {
            let can_reload = !self.busy && self.settings.input.is_some() && self.baseline_is_valid();
            ui.add_enabled_ui(can_reload, |ui| {
                let button = egui::Button::new(RichText::new("🔄 Reload").size(16.0))
                    .min_size(egui::vec2(200.0, 35.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::Reload;
                }
            });

            ui.add_space(8.0);

            ui.add_enabled_ui(!self.busy && self.export_enabled, |ui| {
                let button = egui::Button::new(RichText::new("🖼 Export PNG").size(14.0))
                    .min_size(egui::vec2(150.0, 30.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::ExportPng;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Columns =====
        if !self.columns.is_empty() {
            ui.label(RichText::new("🔧 Source Columns").size(14.0).strong());
            ui.add_space(5.0);
            egui::Frame::none()
                .fill(ui.visuals().widgets.noninteractive.bg_fill)
                .rounding(5.0)
                .inner_margin(5.0)
                .show(ui, |ui| {
                    ScrollArea::vertical()
                        .id_salt("source_columns")
                        .max_height(160.0)
                        .show(ui, |ui| {
                            for col in &self.columns {
                                ui.label(RichText::new(col).monospace().size(11.0));
                            }
                        });
                });
            ui.add_space(10.0);
        }

        // ===== Status =====
        ui.horizontal(|ui| {
            if self.busy {
                ui.spinner();
            }
            let color = match self.status_kind {
                StatusKind::Info => Color32::GRAY,
                StatusKind::Done => DONE_STATUS,
                StatusKind::Error => ERROR_STATUS,
            };
            ui.label(RichText::new(&self.status).size(11.0).color(color));
        });

        action
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlPanelAction {
    None,
    Browse,
    Reload,
    ExportPng,
}
