//! Chart Plotter Module
//! Draws dashboard sections interactively using egui_plot.

use crate::charts::{Section, SectionContent, SeriesData, TableView};
use crate::stats::{CorrelationMatrix, DecadeSummary, Histogram, LinearFit};
use egui::{Color32, RichText};
use egui_plot::{Bar, BarChart, HLine, Legend, Line, LineStyle, Plot, PlotPoints, Points};

pub const TEMPERATURE_COLOR: Color32 = Color32::from_rgb(231, 76, 60); // Red
pub const RAINFALL_COLOR: Color32 = Color32::from_rgb(52, 152, 219); // Blue
pub const ERROR_COLOR: Color32 = Color32::from_rgb(220, 53, 69);

pub const PALETTE: [Color32; 6] = [
    Color32::from_rgb(46, 204, 113), // Green
    Color32::from_rgb(155, 89, 182), // Purple
    Color32::from_rgb(243, 156, 18), // Orange
    Color32::from_rgb(26, 188, 156), // Teal
    Color32::from_rgb(0, 188, 212),  // Cyan
    Color32::from_rgb(96, 125, 139), // Blue Grey
];

// Diverging "coolwarm" anchors.
const COOL: (f64, f64, f64) = (59.0, 76.0, 192.0);
const NEUTRAL: (f64, f64, f64) = (221.0, 221.0, 221.0);
const WARM: (f64, f64, f64) = (180.0, 4.0, 38.0);

const PLOT_HEIGHT: f32 = 260.0;

/// Draws dashboard sections with egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Map a value in [-1, 1] onto the diverging palette. NaN is gray.
    pub fn heat_color(value: f64) -> Color32 {
        if value.is_nan() {
            return Color32::GRAY;
        }
        let v = value.clamp(-1.0, 1.0);
        let (from, to, t) = if v < 0.0 {
            (NEUTRAL, COOL, -v)
        } else {
            (NEUTRAL, WARM, v)
        };
        let mix = |a: f64, b: f64| (a + (b - a) * t).round() as u8;
        Color32::from_rgb(mix(from.0, to.0), mix(from.1, to.1), mix(from.2, to.2))
    }

    /// Colour for a series by column name.
    pub fn series_color(label: &str, index: usize) -> Color32 {
        if label.starts_with("Suhu") || label == "Rentang_Suhu" {
            TEMPERATURE_COLOR
        } else if label == "Curah_Hujan" {
            RAINFALL_COLOR
        } else {
            PALETTE[index % PALETTE.len()]
        }
    }

    /// Draw one section: heading plus chart, table, text, or the error that
    /// kept it from being built.
    pub fn draw_section(ui: &mut egui::Ui, section: &Section, index: usize) {
        ui.label(RichText::new(&section.title).size(18.0).strong());
        ui.add_space(6.0);

        match &section.content {
            Ok(content) => Self::draw_content(ui, &section.slug, content, index),
            Err(e) => {
                ui.label(
                    RichText::new(format!("Chart unavailable: {}", e))
                        .color(ERROR_COLOR)
                        .size(13.0),
                );
            }
        }
    }

    fn draw_content(ui: &mut egui::Ui, id: &str, content: &SectionContent, index: usize) {
        match content {
            SectionContent::Table(table) => Self::draw_table(ui, id, table),
            SectionContent::Line(series) => Self::draw_line_chart(ui, id, series, index),
            SectionContent::Bars(series) => Self::draw_bar_chart(ui, id, series, index),
            SectionContent::Anomaly { series, baseline } => {
                ui.label(
                    RichText::new(format!("Baseline: {:.2} °C", baseline))
                        .size(12.0)
                        .color(Color32::GRAY),
                );
                Self::draw_anomaly_chart(ui, id, series);
            }
            SectionContent::Scatter {
                x_label,
                y_label,
                points,
                fit,
            } => Self::draw_scatter_chart(ui, id, x_label, y_label, points, fit.as_ref()),
            SectionContent::DecadeBars { table, summary } => {
                Self::draw_table(ui, &format!("{}_table", id), table);
                ui.add_space(8.0);
                Self::draw_decade_chart(ui, id, summary);
            }
            SectionContent::Extremes(lines) => Self::draw_extremes(ui, lines),
            SectionContent::Histogram {
                label,
                histogram,
                kde,
            } => Self::draw_histogram(ui, id, label, histogram, kde),
            SectionContent::Heatmap(matrix) => Self::draw_heatmap(ui, id, matrix),
        }
    }

    pub fn draw_line_chart(ui: &mut egui::Ui, id: &str, series: &SeriesData, index: usize) {
        let color = Self::series_color(&series.label, index);
        Plot::new(id)
            .height(PLOT_HEIGHT)
            .allow_scroll(false)
            .x_axis_label("Tahun")
            .y_axis_label(format!("{} ({})", series.label, series.unit))
            .show(ui, |plot_ui| {
                plot_ui.line(
                    Line::new(PlotPoints::from(series.points.clone()))
                        .color(color)
                        .width(2.0)
                        .name(&series.label),
                );
                plot_ui.points(
                    Points::new(PlotPoints::from(series.points.clone()))
                        .radius(2.5)
                        .color(color),
                );
            });
    }

    pub fn draw_bar_chart(ui: &mut egui::Ui, id: &str, series: &SeriesData, index: usize) {
        let color = Self::series_color(&series.label, index);
        let bars: Vec<Bar> = series
            .points
            .iter()
            .map(|&[year, value]| Bar::new(year, value).width(0.8).fill(color))
            .collect();

        Plot::new(id)
            .height(PLOT_HEIGHT)
            .allow_scroll(false)
            .x_axis_label("Tahun")
            .y_axis_label(format!("{} ({})", series.label, series.unit))
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).color(color).name(&series.label));
            });
    }

    /// Bars coloured by sign and magnitude, dashed line at zero.
    pub fn draw_anomaly_chart(ui: &mut egui::Ui, id: &str, series: &SeriesData) {
        let max_abs = series
            .points
            .iter()
            .map(|p| p[1].abs())
            .fold(0.0_f64, f64::max)
            .max(f64::EPSILON);
        let bars: Vec<Bar> = series
            .points
            .iter()
            .map(|&[year, value]| {
                Bar::new(year, value)
                    .width(0.8)
                    .fill(Self::heat_color(value / max_abs))
            })
            .collect();

        Plot::new(id)
            .height(PLOT_HEIGHT)
            .allow_scroll(false)
            .x_axis_label("Tahun")
            .y_axis_label("Anomali (°C)")
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).name(&series.label));
                plot_ui.hline(
                    HLine::new(0.0)
                        .color(Color32::BLACK)
                        .style(LineStyle::dashed_loose()),
                );
            });
    }

    pub fn draw_scatter_chart(
        ui: &mut egui::Ui,
        id: &str,
        x_label: &str,
        y_label: &str,
        points: &[[f64; 2]],
        fit: Option<&LinearFit>,
    ) {
        if let Some(fit) = fit {
            ui.label(
                RichText::new(format!(
                    "y = {:.2} + {:.2}x   (r = {:.3})",
                    fit.intercept, fit.slope, fit.r
                ))
                .size(12.0)
                .color(Color32::GRAY),
            );
        }

        let x_min = points.iter().map(|p| p[0]).fold(f64::INFINITY, f64::min);
        let x_max = points.iter().map(|p| p[0]).fold(f64::NEG_INFINITY, f64::max);

        Plot::new(id)
            .height(PLOT_HEIGHT)
            .allow_scroll(false)
            .legend(Legend::default())
            .x_axis_label(x_label)
            .y_axis_label(y_label)
            .show(ui, |plot_ui| {
                plot_ui.points(
                    Points::new(PlotPoints::from(points.to_vec()))
                        .radius(3.5)
                        .color(RAINFALL_COLOR)
                        .name("Tahun"),
                );
                if let Some(fit) = fit {
                    let trend = vec![[x_min, fit.predict(x_min)], [x_max, fit.predict(x_max)]];
                    plot_ui.line(
                        Line::new(PlotPoints::from(trend))
                            .color(Color32::RED)
                            .width(2.0)
                            .name("Tren linear"),
                    );
                }
            });
    }

    /// Grouped bars: temperature and rainfall side by side per decade.
    pub fn draw_decade_chart(ui: &mut egui::Ui, id: &str, summary: &DecadeSummary) {
        let temperature: Vec<Bar> = summary
            .rows
            .iter()
            .map(|row| {
                Bar::new(row.decade as f64 - 2.0, row.mean_temperature)
                    .width(4.0)
                    .name(format!("{}", row.decade))
            })
            .collect();
        let rainfall: Vec<Bar> = summary
            .rows
            .iter()
            .map(|row| {
                Bar::new(row.decade as f64 + 2.0, row.mean_rainfall)
                    .width(4.0)
                    .name(format!("{}", row.decade))
            })
            .collect();

        Plot::new(id)
            .height(PLOT_HEIGHT)
            .allow_scroll(false)
            .legend(Legend::default())
            .x_axis_label("Dekade")
            .y_axis_label("Rata-rata")
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(
                    BarChart::new(temperature)
                        .color(TEMPERATURE_COLOR)
                        .name("Suhu"),
                );
                plot_ui.bar_chart(
                    BarChart::new(rainfall)
                        .color(RAINFALL_COLOR)
                        .name("Curah_Hujan"),
                );
            });
    }

    pub fn draw_histogram(
        ui: &mut egui::Ui,
        id: &str,
        label: &str,
        histogram: &Histogram,
        kde: &[[f64; 2]],
    ) {
        let width = histogram.bin_width();
        let bars: Vec<Bar> = histogram
            .centers()
            .into_iter()
            .zip(&histogram.counts)
            .map(|(center, &count)| Bar::new(center, count as f64).width(width))
            .collect();
        let sky_blue = Color32::from_rgb(135, 206, 235);

        Plot::new(id)
            .height(PLOT_HEIGHT)
            .allow_scroll(false)
            .x_axis_label(label)
            .y_axis_label("Count")
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).color(sky_blue).name(label));
                if !kde.is_empty() {
                    plot_ui.line(
                        Line::new(PlotPoints::from(kde.to_vec()))
                            .color(Color32::from_rgb(30, 110, 160))
                            .width(2.0)
                            .name("KDE"),
                    );
                }
            });
    }

    /// Correlation matrix as a coloured grid with the coefficient in each cell.
    pub fn draw_heatmap(ui: &mut egui::Ui, id: &str, matrix: &CorrelationMatrix) {
        egui::ScrollArea::horizontal()
            .id_salt(format!("{}_scroll", id))
            .show(ui, |ui| {
                egui::Grid::new(id)
                    .spacing([2.0, 2.0])
                    .min_col_width(60.0)
                    .show(ui, |ui| {
                        ui.label("");
                        for label in &matrix.labels {
                            ui.label(RichText::new(label).strong().size(11.0));
                        }
                        ui.end_row();

                        for (label, row) in matrix.labels.iter().zip(&matrix.values) {
                            ui.label(RichText::new(label).strong().size(11.0));
                            for &r in row {
                                let fill = Self::heat_color(r);
                                let text = if r.is_nan() {
                                    "-".to_string()
                                } else {
                                    format!("{:.2}", r)
                                };
                                let text_color = if r.abs() > 0.6 {
                                    Color32::WHITE
                                } else {
                                    Color32::BLACK
                                };
                                egui::Frame::none()
                                    .fill(fill)
                                    .inner_margin(6.0)
                                    .show(ui, |ui| {
                                        ui.label(RichText::new(text).size(11.0).color(text_color));
                                    });
                            }
                            ui.end_row();
                        }
                    });
            });
    }

    pub fn draw_table(ui: &mut egui::Ui, id: &str, table: &TableView) {
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                egui::ScrollArea::both()
                    .id_salt(format!("{}_scroll", id))
                    .max_height(320.0)
                    .show(ui, |ui| {
                        egui::Grid::new(id)
                            .striped(true)
                            .min_col_width(55.0)
                            .spacing([8.0, 4.0])
                            .show(ui, |ui| {
                                for header in &table.headers {
                                    ui.label(RichText::new(header).strong().size(11.0));
                                }
                                ui.end_row();

                                for row in &table.rows {
                                    for cell in row {
                                        ui.label(RichText::new(cell).size(11.0));
                                    }
                                    ui.end_row();
                                }
                            });
                    });
            });
    }

    pub fn draw_extremes(ui: &mut egui::Ui, lines: &[String]) {
        for line in lines {
            ui.label(RichText::new(format!("• {}", line)).size(14.0));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heat_color_anchors() {
        assert_eq!(ChartPlotter::heat_color(-1.0), Color32::from_rgb(59, 76, 192));
        assert_eq!(ChartPlotter::heat_color(0.0), Color32::from_rgb(221, 221, 221));
        assert_eq!(ChartPlotter::heat_color(1.0), Color32::from_rgb(180, 4, 38));
        assert_eq!(ChartPlotter::heat_color(3.0), ChartPlotter::heat_color(1.0));
        assert_eq!(ChartPlotter::heat_color(f64::NAN), Color32::GRAY);
    }

    #[test]
    fn test_series_color() {
        assert_eq!(ChartPlotter::series_color("Suhu", 0), TEMPERATURE_COLOR);
        assert_eq!(ChartPlotter::series_color("Curah_Hujan", 3), RAINFALL_COLOR);
        assert_eq!(ChartPlotter::series_color("Tekanan", 7), PALETTE[1]);
    }
}
