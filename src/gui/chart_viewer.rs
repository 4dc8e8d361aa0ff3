//! Dashboard Viewer Widget
//! Central scrollable panel showing the page header and every section in order.

use crate::charts::ChartPlotter;
use crate::Dashboard;
use egui::{Color32, RichText, ScrollArea};

const SECTION_SPACING: f32 = 18.0;
const BANNER_COLOR: Color32 = Color32::from_rgb(100, 149, 237);
const FATAL_COLOR: Color32 = Color32::from_rgb(220, 53, 69);

const DESCRIPTION: &str = "Ringkasan data iklim tahunan: suhu, curah hujan, \
anomali terhadap periode baseline, agregat per dekade, nilai ekstrem dan korelasi \
antar variabel.";

/// What the central panel currently shows.
#[derive(Default)]
pub enum ViewerState {
    #[default]
    Empty,
    Loaded(Box<Dashboard>),
    /// A session-level error replaces the whole page.
    Failed(String),
}

pub struct DashboardViewer {
    pub title: String,
    pub state: ViewerState,
}

impl DashboardViewer {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            state: ViewerState::Empty,
        }
    }

    pub fn dashboard(&self) -> Option<&Dashboard> {
        match &self.state {
            ViewerState::Loaded(dashboard) => Some(dashboard),
            _ => None,
        }
    }

    pub fn show(&self, ui: &mut egui::Ui) {
        match &self.state {
            ViewerState::Empty => {
                ui.centered_and_justified(|ui| {
                    ui.label(RichText::new("No Data").size(20.0));
                });
            }
            ViewerState::Failed(message) => {
                ui.vertical_centered(|ui| {
                    ui.add_space(40.0);
                    ui.label(RichText::new(&self.title).size(24.0).strong());
                    ui.add_space(20.0);
                    egui::Frame::none()
                        .rounding(8.0)
                        .stroke(egui::Stroke::new(2.0, FATAL_COLOR))
                        .inner_margin(16.0)
                        .show(ui, |ui| {
                            ui.label(
                                RichText::new(format!("⚠ {}", message))
                                    .size(16.0)
                                    .color(FATAL_COLOR),
                            );
                        });
                });
            }
            ViewerState::Loaded(dashboard) => self.show_dashboard(ui, dashboard),
        }
    }

    fn show_dashboard(&self, ui: &mut egui::Ui, dashboard: &Dashboard) {
        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.label(RichText::new(&self.title).size(24.0).strong());
                ui.label(RichText::new(DESCRIPTION).size(13.0).color(Color32::GRAY));
                ui.add_space(8.0);

                let derived = &dashboard.derived;
                let banner = match derived.baseline() {
                    Ok(value) => format!(
                        "Baseline {}: {:.2} °C",
                        derived.window().label(),
                        value
                    ),
                    Err(e) => e.to_string(),
                };
                egui::Frame::none()
                    .rounding(6.0)
                    .fill(ui.visuals().widgets.noninteractive.bg_fill)
                    .stroke(egui::Stroke::new(1.0, BANNER_COLOR))
                    .inner_margin(10.0)
                    .show(ui, |ui| {
                        ui.label(RichText::new(banner).size(14.0).color(BANNER_COLOR));
                    });

                ui.add_space(SECTION_SPACING);

                for (i, section) in dashboard.sections.iter().enumerate() {
                    ChartPlotter::draw_section(ui, section, i);
                    ui.add_space(SECTION_SPACING);
                }
            });
    }
}
