//! Static Chart Renderer
//! Writes each chart section to a PNG file with plotters.
//!
//! Tables and text sections have no image form and are skipped, as are
//! sections that failed to build. A chart that fails to render is logged and
//! the export carries on with the next one.

use crate::charts::{ChartPlotter, Section, SectionContent, SeriesData};
use crate::stats::{CorrelationMatrix, DecadeSummary, Histogram, LinearFit};
use anyhow::{Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const TEMPERATURE: RGBColor = RGBColor(231, 76, 60);
const RAINFALL: RGBColor = RGBColor(52, 152, 219);
const SKY_BLUE: RGBColor = RGBColor(135, 206, 235);
const KDE_LINE: RGBColor = RGBColor(30, 110, 160);

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render every chart section into `dir` as `<slug>.png`.
    pub fn export_all(
        sections: &[Section],
        dir: &Path,
        width: u32,
        height: u32,
    ) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating export directory {}", dir.display()))?;

        let mut written = Vec::new();
        for section in sections {
            let content = match &section.content {
                Ok(content) if content.is_chart() => content,
                Ok(_) => continue,
                Err(e) => {
                    warn!(section = %section.slug, error = %e, "not exporting failed section");
                    continue;
                }
            };

            let path = dir.join(format!("{}.png", section.slug));
            match Self::render_content(&path, &section.title, content, (width, height)) {
                Ok(()) => {
                    info!(path = %path.display(), "wrote chart");
                    written.push(path);
                }
                Err(e) => warn!(section = %section.slug, error = %format!("{:#}", e), "failed to render chart"),
            }
        }

        Ok(written)
    }

    pub fn render_content(
        path: &Path,
        title: &str,
        content: &SectionContent,
        size: (u32, u32),
    ) -> Result<()> {
        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE)?;

        match content {
            SectionContent::Line(series) => Self::draw_line(&root, title, series)?,
            SectionContent::Bars(series) => Self::draw_bars(&root, title, series)?,
            SectionContent::Anomaly { series, .. } => Self::draw_anomaly(&root, title, series)?,
            SectionContent::Scatter {
                x_label,
                y_label,
                points,
                fit,
            } => Self::draw_scatter(&root, title, x_label, y_label, points, fit.as_ref())?,
            SectionContent::DecadeBars { summary, .. } => {
                Self::draw_decades(&root, title, summary)?
            }
            SectionContent::Histogram {
                label,
                histogram,
                kde,
            } => Self::draw_histogram(&root, title, label, histogram, kde)?,
            SectionContent::Heatmap(matrix) => Self::draw_heatmap(&root, title, matrix)?,
            SectionContent::Table(_) | SectionContent::Extremes(_) => {
                anyhow::bail!("section '{}' has no chart form", title)
            }
        }

        root.present()
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    /// Value range with 5% padding on both ends.
    pub fn padded_range(values: impl Iterator<Item = f64>, include_zero: bool) -> Range<f64> {
        let (mut lo, mut hi) = values
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        if lo > hi {
            return 0.0..1.0;
        }
        if include_zero {
            lo = lo.min(0.0);
            hi = hi.max(0.0);
        }
        if lo == hi {
            return (lo - 1.0)..(hi + 1.0);
        }
        let pad = (hi - lo) * 0.05;
        (lo - pad)..(hi + pad)
    }

    fn year_range(points: &[[f64; 2]]) -> Range<f64> {
        let range = Self::padded_range(points.iter().map(|p| p[0]), false);
        (range.start - 0.5)..(range.end + 0.5)
    }

    fn draw_line(root: &Area, title: &str, series: &SeriesData) -> Result<()> {
        let color = Self::to_rgb(ChartPlotter::series_color(&series.label, 0));
        let mut chart = ChartBuilder::on(root)
            .caption(title, ("sans-serif", 24))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(
                Self::year_range(&series.points),
                Self::padded_range(series.points.iter().map(|p| p[1]), false),
            )?;

        chart
            .configure_mesh()
            .x_desc("Tahun")
            .y_desc(format!("{} ({})", series.label, series.unit))
            .x_label_formatter(&|x| format!("{:.0}", x))
            .draw()?;

        chart.draw_series(LineSeries::new(
            series.points.iter().map(|p| (p[0], p[1])),
            color.stroke_width(2),
        ))?;
        chart.draw_series(
            series
                .points
                .iter()
                .map(|p| Circle::new((p[0], p[1]), 3, color.filled())),
        )?;
        Ok(())
    }

    fn draw_bars(root: &Area, title: &str, series: &SeriesData) -> Result<()> {
        let color = Self::to_rgb(ChartPlotter::series_color(&series.label, 0));
        let mut chart = ChartBuilder::on(root)
            .caption(title, ("sans-serif", 24))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(
                Self::year_range(&series.points),
                Self::padded_range(series.points.iter().map(|p| p[1]), true),
            )?;

        chart
            .configure_mesh()
            .x_desc("Tahun")
            .y_desc(format!("{} ({})", series.label, series.unit))
            .x_label_formatter(&|x| format!("{:.0}", x))
            .draw()?;

        chart.draw_series(series.points.iter().map(|p| {
            Rectangle::new([(p[0] - 0.4, 0.0), (p[0] + 0.4, p[1])], color.filled())
        }))?;
        Ok(())
    }

    fn draw_anomaly(root: &Area, title: &str, series: &SeriesData) -> Result<()> {
        let x_range = Self::year_range(&series.points);
        let max_abs = series
            .points
            .iter()
            .map(|p| p[1].abs())
            .fold(0.0_f64, f64::max)
            .max(f64::EPSILON);

        let mut chart = ChartBuilder::on(root)
            .caption(title, ("sans-serif", 24))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(
                x_range.clone(),
                Self::padded_range(series.points.iter().map(|p| p[1]), true),
            )?;

        chart
            .configure_mesh()
            .x_desc("Tahun")
            .y_desc("Anomali (°C)")
            .x_label_formatter(&|x| format!("{:.0}", x))
            .draw()?;

        chart.draw_series(series.points.iter().map(|p| {
            let color = Self::to_rgb(ChartPlotter::heat_color(p[1] / max_abs));
            Rectangle::new([(p[0] - 0.4, 0.0), (p[0] + 0.4, p[1])], color.filled())
        }))?;
        chart.draw_series(LineSeries::new(
            vec![(x_range.start, 0.0), (x_range.end, 0.0)],
            BLACK.stroke_width(1),
        ))?;
        Ok(())
    }

    fn draw_scatter(
        root: &Area,
        title: &str,
        x_label: &str,
        y_label: &str,
        points: &[[f64; 2]],
        fit: Option<&LinearFit>,
    ) -> Result<()> {
        let x_range = Self::padded_range(points.iter().map(|p| p[0]), false);
        let mut chart = ChartBuilder::on(root)
            .caption(title, ("sans-serif", 24))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(
                x_range.clone(),
                Self::padded_range(points.iter().map(|p| p[1]), false),
            )?;

        chart
            .configure_mesh()
            .x_desc(x_label)
            .y_desc(y_label)
            .draw()?;

        chart.draw_series(
            points
                .iter()
                .map(|p| Circle::new((p[0], p[1]), 4, RAINFALL.filled())),
        )?;

        if let Some(fit) = fit {
            chart
                .draw_series(LineSeries::new(
                    vec![
                        (x_range.start, fit.predict(x_range.start)),
                        (x_range.end, fit.predict(x_range.end)),
                    ],
                    RED.stroke_width(2),
                ))?
                .label(format!("r = {:.3}", fit.r))
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.stroke_width(2)));

            chart
                .configure_series_labels()
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .draw()?;
        }
        Ok(())
    }

    fn draw_decades(root: &Area, title: &str, summary: &DecadeSummary) -> Result<()> {
        let first = summary.rows.first().map(|r| r.decade).unwrap_or(0) as f64;
        let last = summary.rows.last().map(|r| r.decade).unwrap_or(0) as f64;
        let values = summary
            .rows
            .iter()
            .flat_map(|r| [r.mean_temperature, r.mean_rainfall]);

        let mut chart = ChartBuilder::on(root)
            .caption(title, ("sans-serif", 24))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d((first - 2.0)..(last + 12.0), Self::padded_range(values, true))?;

        chart
            .configure_mesh()
            .x_desc("Dekade")
            .y_desc("Rata-rata")
            .x_label_formatter(&|x| format!("{:.0}", x))
            .draw()?;

        chart
            .draw_series(summary.rows.iter().map(|r| {
                let x = r.decade as f64;
                Rectangle::new([(x + 1.0, 0.0), (x + 5.0, r.mean_temperature)], TEMPERATURE.filled())
            }))?
            .label("Suhu")
            .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], TEMPERATURE.filled()));
        chart
            .draw_series(summary.rows.iter().map(|r| {
                let x = r.decade as f64;
                Rectangle::new([(x + 5.0, 0.0), (x + 9.0, r.mean_rainfall)], RAINFALL.filled())
            }))?
            .label("Curah_Hujan")
            .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], RAINFALL.filled()));

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
        Ok(())
    }

    fn draw_histogram(
        root: &Area,
        title: &str,
        label: &str,
        histogram: &Histogram,
        kde: &[[f64; 2]],
    ) -> Result<()> {
        let x_range = Self::padded_range(histogram.edges.iter().copied(), false);
        let peak = histogram
            .counts
            .iter()
            .map(|&c| c as f64)
            .chain(kde.iter().map(|p| p[1]))
            .fold(0.0_f64, f64::max);

        let mut chart = ChartBuilder::on(root)
            .caption(title, ("sans-serif", 24))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(x_range, 0.0..(peak * 1.1).max(1.0))?;

        chart
            .configure_mesh()
            .x_desc(label)
            .y_desc("Count")
            .draw()?;

        chart.draw_series(
            histogram
                .edges
                .windows(2)
                .zip(&histogram.counts)
                .map(|(w, &count)| {
                    Rectangle::new([(w[0], 0.0), (w[1], count as f64)], SKY_BLUE.filled())
                }),
        )?;
        if !kde.is_empty() {
            chart.draw_series(LineSeries::new(
                kde.iter().map(|p| (p[0], p[1])),
                KDE_LINE.stroke_width(2),
            ))?;
        }
        Ok(())
    }

    fn draw_heatmap(root: &Area, title: &str, matrix: &CorrelationMatrix) -> Result<()> {
        let n = matrix.labels.len() as f64;
        let mut chart = ChartBuilder::on(root)
            .caption(title, ("sans-serif", 24))
            .margin(15)
            .build_cartesian_2d(-2.5..n, -1.0..n)?;

        // Row i is drawn top-down.
        let cells = matrix.values.iter().enumerate().flat_map(|(i, row)| {
            let y = n - 1.0 - i as f64;
            row.iter().enumerate().map(move |(j, &r)| (j as f64, y, r))
        });

        chart.draw_series(cells.clone().map(|(x, y, r)| {
            let color = Self::to_rgb(ChartPlotter::heat_color(r));
            Rectangle::new([(x, y), (x + 1.0, y + 1.0)], color.filled())
        }))?;
        chart.draw_series(cells.map(|(x, y, r)| {
            let text = if r.is_nan() {
                "-".to_string()
            } else {
                format!("{:.2}", r)
            };
            Text::new(text, (x + 0.2, y + 0.65), ("sans-serif", 13).into_font())
        }))?;

        chart.draw_series(matrix.labels.iter().enumerate().map(|(i, label)| {
            let y = n - 1.0 - i as f64;
            Text::new(label.clone(), (-2.4, y + 0.65), ("sans-serif", 13).into_font())
        }))?;
        chart.draw_series(matrix.labels.iter().enumerate().map(|(j, label)| {
            Text::new(label.clone(), (j as f64 + 0.05, -0.3), ("sans-serif", 11).into_font())
        }))?;
        Ok(())
    }

    fn to_rgb(color: egui::Color32) -> RGBColor {
        RGBColor(color.r(), color.g(), color.b())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padded_range() {
        let range = StaticChartRenderer::padded_range([10.0, 20.0].into_iter(), false);
        assert!((range.start - 9.5).abs() < 1e-9);
        assert!((range.end - 20.5).abs() < 1e-9);

        let with_zero = StaticChartRenderer::padded_range([10.0, 20.0].into_iter(), true);
        assert!(with_zero.start < 0.0);
    }

    #[test]
    fn test_padded_range_degenerate() {
        assert_eq!(
            StaticChartRenderer::padded_range([f64::NAN].into_iter(), false),
            0.0..1.0
        );
        assert_eq!(
            StaticChartRenderer::padded_range([5.0, 5.0].into_iter(), false),
            4.0..6.0
        );
    }

    #[test]
    fn test_export_skips_tables_and_failures() {
        use crate::charts::TableView;
        use crate::error::ClimateError;

        let dir = tempfile::TempDir::new().unwrap();
        let sections = vec![
            Section {
                slug: "01_data".to_string(),
                title: "Data".to_string(),
                content: Ok(SectionContent::Table(TableView {
                    headers: vec![],
                    rows: vec![],
                })),
            },
            Section {
                slug: "02_tekanan_trend".to_string(),
                title: "Tekanan".to_string(),
                content: Err(ClimateError::missing_column("Tekanan")),
            },
        ];
        let written =
            StaticChartRenderer::export_all(&sections, dir.path(), 400, 300).unwrap();
        assert!(written.is_empty());
    }
}
