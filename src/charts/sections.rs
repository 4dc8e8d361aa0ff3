//! Dashboard Section Model
//! Turns a derived climate table into the ordered list of page sections.
//!
//! Each section is a (predicate, builder) pair. A false predicate omits the
//! section; a builder error stays on that section and the others still build.

use crate::config::DashboardConfig;
use crate::data::{
    float_values, numeric_column_names, OptionalVariable, ANOMALY, RAINFALL, TEMPERATURE,
    TEMPERATURE_RANGE, YEAR,
};
use crate::error::{ClimateError, Result};
use crate::stats::{
    CorrelationMatrix, DecadeSummary, DerivedTable, Extreme, Extremes, Histogram, LinearFit,
    StatsCalculator,
};
use polars::prelude::*;
use tracing::{debug, info, warn};

const KDE_POINTS: usize = 100;

/// Values of one variable against year.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesData {
    pub label: String,
    pub unit: String,
    /// `[year, value]`, missing values dropped.
    pub points: Vec<[f64; 2]>,
}

/// Plain-text rendering of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableView {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableView {
    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        let headers: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let columns: Vec<Vec<String>> = df
            .get_columns()
            .iter()
            .map(|col| {
                let series = col.as_materialized_series();
                (0..series.len())
                    .map(|i| {
                        series
                            .get(i)
                            .map(|val| Self::format_cell(&val))
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect();

        let rows = (0..df.height())
            .map(|i| columns.iter().map(|col| col[i].clone()).collect())
            .collect();

        Ok(Self { headers, rows })
    }

    fn format_cell(val: &AnyValue) -> String {
        match val {
            AnyValue::Null => String::new(),
            AnyValue::Float64(v) => Self::format_float(*v),
            AnyValue::Float32(v) => Self::format_float(*v as f64),
            other => other.to_string().trim_matches('"').to_string(),
        }
    }

    /// Shortest text that reads back as the same value; no rounding.
    fn format_float(v: f64) -> String {
        if v.is_nan() {
            "NaN".to_string()
        } else {
            v.to_string()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SectionContent {
    Table(TableView),
    Line(SeriesData),
    Bars(SeriesData),
    /// Anomaly bars with a reference line at zero.
    Anomaly { series: SeriesData, baseline: f64 },
    /// Scatter of rainfall against temperature with its regression line.
    Scatter {
        x_label: String,
        y_label: String,
        points: Vec<[f64; 2]>,
        fit: Option<LinearFit>,
    },
    DecadeBars {
        table: TableView,
        summary: DecadeSummary,
    },
    Extremes(Vec<String>),
    Histogram {
        label: String,
        histogram: Histogram,
        /// KDE scaled to histogram counts.
        kde: Vec<[f64; 2]>,
    },
    Heatmap(CorrelationMatrix),
}

impl SectionContent {
    /// Whether the content is a chart (as opposed to a table or text).
    pub fn is_chart(&self) -> bool {
        !matches!(
            self,
            SectionContent::Table(_) | SectionContent::Extremes(_)
        )
    }
}

#[derive(Debug)]
pub struct Section {
    pub slug: String,
    pub title: String,
    pub content: Result<SectionContent>,
}

type Predicate = Box<dyn Fn(&DerivedTable) -> bool>;
type Builder = Box<dyn Fn(&DerivedTable) -> Result<SectionContent>>;

struct SectionSpec {
    slug: String,
    title: String,
    predicate: Predicate,
    build: Builder,
}

impl SectionSpec {
    fn always(slug: &str, title: &str, build: Builder) -> Self {
        Self {
            slug: slug.to_string(),
            title: title.to_string(),
            predicate: Box::new(|_: &DerivedTable| true),
            build,
        }
    }

    fn when_present(slug: &str, title: &str, column: &'static str, build: Builder) -> Self {
        Self {
            slug: slug.to_string(),
            title: title.to_string(),
            predicate: Box::new(move |derived: &DerivedTable| derived.has_column(column)),
            build,
        }
    }
}

/// Year/value pairs for a column. Absent or all-missing columns are errors.
pub fn series(derived: &DerivedTable, column: &str, unit: &str) -> Result<SeriesData> {
    let values = derived.values(column)?;
    let points: Vec<[f64; 2]> = derived
        .years()
        .iter()
        .zip(values)
        .filter(|(_, v)| !v.is_nan())
        .map(|(&year, v)| [year as f64, v])
        .collect();

    if points.is_empty() {
        return Err(ClimateError::missing_column(column));
    }

    Ok(SeriesData {
        label: column.to_string(),
        unit: unit.to_string(),
        points,
    })
}

fn anomaly_content(derived: &DerivedTable) -> Result<SectionContent> {
    let baseline = derived.baseline()?;
    Ok(SectionContent::Anomaly {
        series: series(derived, ANOMALY, "°C")?,
        baseline,
    })
}

fn scatter_content(derived: &DerivedTable) -> Result<SectionContent> {
    let temperature = derived.values(TEMPERATURE)?;
    let rainfall = derived.values(RAINFALL)?;
    let points: Vec<[f64; 2]> = temperature
        .iter()
        .zip(&rainfall)
        .filter(|(t, r)| !t.is_nan() && !r.is_nan())
        .map(|(&t, &r)| [t, r])
        .collect();
    if points.is_empty() {
        return Err(ClimateError::missing_column(TEMPERATURE));
    }

    Ok(SectionContent::Scatter {
        x_label: TEMPERATURE.to_string(),
        y_label: RAINFALL.to_string(),
        fit: StatsCalculator::linear_fit(&temperature, &rainfall),
        points,
    })
}

fn decade_content(derived: &DerivedTable) -> Result<SectionContent> {
    let summary = derived.decade_summary().clone();
    Ok(SectionContent::DecadeBars {
        table: TableView::from_frame(&summary.to_frame()?)?,
        summary,
    })
}

fn format_extreme(extreme: Option<Extreme>, decimals: usize, unit: &str) -> String {
    match extreme {
        Some(e) => format!("{} ({:.*} {})", e.year, decimals, e.value, unit),
        None => "-".to_string(),
    }
}

/// One line per extreme: year paired with its literal value.
pub fn describe_extremes(extremes: &Extremes) -> Vec<String> {
    vec![
        format!(
            "Tahun Terpanas: {}",
            format_extreme(extremes.hottest, 2, "°C")
        ),
        format!(
            "Tahun Terdingin: {}",
            format_extreme(extremes.coldest, 2, "°C")
        ),
        format!(
            "Hujan Terbanyak: {}",
            format_extreme(extremes.wettest, 1, "mm")
        ),
        format!(
            "Hujan Terkering: {}",
            format_extreme(extremes.driest, 1, "mm")
        ),
    ]
}

fn histogram_content(derived: &DerivedTable, column: &str, bins: usize) -> Result<SectionContent> {
    let values = derived.values(column)?;
    let histogram = StatsCalculator::histogram(&values, bins)
        .ok_or_else(|| ClimateError::missing_column(column))?;

    let (lo, hi) = match (histogram.edges.first(), histogram.edges.last()) {
        (Some(&lo), Some(&hi)) => (lo, hi),
        _ => return Err(ClimateError::missing_column(column)),
    };
    let grid: Vec<f64> = (0..KDE_POINTS)
        .map(|i| lo + (hi - lo) * i as f64 / (KDE_POINTS - 1) as f64)
        .collect();
    let scale = histogram.total() as f64 * histogram.bin_width();
    let kde = StatsCalculator::gaussian_kde(&values, &grid)
        .into_iter()
        .zip(&grid)
        .map(|(density, &x)| [x, density * scale])
        .collect();

    Ok(SectionContent::Histogram {
        label: column.to_string(),
        histogram,
        kde,
    })
}

fn heatmap_content(derived: &DerivedTable) -> Result<SectionContent> {
    let names = numeric_column_names(derived.df());
    let columns = names
        .into_iter()
        .map(|name| {
            let values = float_values(derived.df(), &name)?;
            Ok((name, values))
        })
        .collect::<Result<Vec<_>>>()?;
    if columns.is_empty() {
        return Err(ClimateError::missing_column(YEAR));
    }
    Ok(SectionContent::Heatmap(StatsCalculator::correlation_matrix(
        &columns,
    )))
}

fn section_specs(config: &DashboardConfig, window_label: &str) -> Vec<SectionSpec> {
    let bins = config.histogram_bins;
    let mut specs = vec![
        SectionSpec::always(
            "data",
            "Data Iklim Tahunan",
            Box::new(|d: &DerivedTable| Ok(SectionContent::Table(TableView::from_frame(d.df())?))),
        ),
        SectionSpec::always(
            "temperature",
            "Tren Suhu Rata-rata Tahunan",
            Box::new(|d: &DerivedTable| Ok(SectionContent::Line(series(d, TEMPERATURE, "°C")?))),
        ),
        SectionSpec::always(
            "rainfall",
            "Curah Hujan Tahunan",
            Box::new(|d: &DerivedTable| Ok(SectionContent::Bars(series(d, RAINFALL, "mm")?))),
        ),
        SectionSpec::always(
            "temperature_range",
            "Rentang Suhu (Max - Min)",
            Box::new(|d: &DerivedTable| Ok(SectionContent::Line(series(d, TEMPERATURE_RANGE, "°C")?))),
        ),
        SectionSpec::always(
            "anomaly",
            &format!("Anomali Suhu terhadap Rata-rata {}", window_label),
            Box::new(anomaly_content),
        ),
        SectionSpec::always(
            "temperature_vs_rainfall",
            "Korelasi Suhu vs Curah Hujan",
            Box::new(scatter_content),
        ),
        SectionSpec::always(
            "decades",
            "Rata-rata Suhu & Curah Hujan per Dekade",
            Box::new(decade_content),
        ),
        SectionSpec::always(
            "extremes",
            "Tahun Ekstrem",
            Box::new(|d: &DerivedTable| Ok(SectionContent::Extremes(describe_extremes(&d.extremes()?)))),
        ),
    ];

    for var in OptionalVariable::ALL {
        let column = var.column();
        let unit = var.unit();
        if var == OptionalVariable::Humidity {
            specs.push(SectionSpec::when_present(
                "humidity_distribution",
                "Distribusi Kelembaban Tahunan",
                column,
                Box::new(move |d: &DerivedTable| histogram_content(d, column, bins)),
            ));
        }
        specs.push(SectionSpec::when_present(
            &format!("{}_trend", column.to_lowercase()),
            &format!("Tren {} Tahunan", var.label()),
            column,
            Box::new(move |d: &DerivedTable| Ok(SectionContent::Line(series(d, column, unit)?))),
        ));
    }

    specs.push(SectionSpec::always(
        "correlation",
        "Korelasi Antar Variabel Iklim",
        Box::new(heatmap_content),
    ));
    specs
}

/// Build every applicable section, in page order.
pub fn build_sections(derived: &DerivedTable, config: &DashboardConfig) -> Vec<Section> {
    let window_label = derived.window().label();
    let mut sections = Vec::new();

    for (i, spec) in section_specs(config, &window_label).into_iter().enumerate() {
        if !(spec.predicate)(derived) {
            debug!(section = %spec.slug, "skipped section, column not present");
            continue;
        }

        let content = (spec.build)(derived);
        if let Err(e) = &content {
            warn!(section = %spec.slug, error = %e, "section could not be built");
        }

        sections.push(Section {
            slug: format!("{:02}_{}", i + 1, spec.slug),
            title: spec.title,
            content,
        });
    }

    info!(sections = sections.len(), "built dashboard sections");
    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{TEMPERATURE_MAX, TEMPERATURE_MIN};
    use crate::stats::{derive, BaselineWindow};

    fn derived(extra: Vec<Column>, years: Vec<i64>) -> DerivedTable {
        let n = years.len();
        let temps: Vec<f64> = (0..n).map(|i| 26.0 + i as f64 * 0.1).collect();
        let rains: Vec<f64> = (0..n).map(|i| 3000.0 - i as f64 * 10.0).collect();
        let mut columns = vec![
            Column::new(YEAR.into(), years),
            Column::new(TEMPERATURE.into(), temps.clone()),
            Column::new(RAINFALL.into(), rains),
            Column::new(
                TEMPERATURE_MAX.into(),
                temps.iter().map(|t| t + 5.0).collect::<Vec<_>>(),
            ),
            Column::new(
                TEMPERATURE_MIN.into(),
                temps.iter().map(|t| t - 4.0).collect::<Vec<_>>(),
            ),
        ];
        columns.extend(extra);
        derive(DataFrame::new(columns).unwrap(), BaselineWindow::default()).unwrap()
    }

    fn slugs(sections: &[Section]) -> Vec<String> {
        sections.iter().map(|s| s.slug.clone()).collect()
    }

    #[test]
    fn test_sections_without_optionals() {
        let d = derived(vec![], vec![1990, 1991, 1992]);
        let sections = build_sections(&d, &DashboardConfig::default());

        assert_eq!(
            slugs(&sections),
            vec![
                "01_data",
                "02_temperature",
                "03_rainfall",
                "04_temperature_range",
                "05_anomaly",
                "06_temperature_vs_rainfall",
                "07_decades",
                "08_extremes",
                "14_correlation",
            ]
        );
        assert!(sections.iter().all(|s| s.content.is_ok()));
    }

    #[test]
    fn test_humidity_adds_two_sections() {
        let humidity = Column::new("kelembaban".into(), vec![84.0, 86.0, 85.0]);
        let d = derived(vec![humidity], vec![1990, 1991, 1992]);
        let sections = build_sections(&d, &DashboardConfig::default());
        let names = slugs(&sections);

        assert!(names.contains(&"09_humidity_distribution".to_string()));
        assert!(names.contains(&"10_kelembaban_trend".to_string()));
        assert!(!names.iter().any(|s| s.contains("matahari")));

        let hist = sections
            .iter()
            .find(|s| s.slug == "09_humidity_distribution")
            .unwrap();
        match hist.content.as_ref().unwrap() {
            SectionContent::Histogram { histogram, kde, .. } => {
                assert_eq!(histogram.counts.len(), 20);
                assert_eq!(histogram.total(), 3);
                assert_eq!(kde.len(), KDE_POINTS);
            }
            other => panic!("unexpected content {:?}", other),
        }
    }

    #[test]
    fn test_empty_optional_column_fails_locally() {
        let pressure = Column::new("Tekanan".into(), vec![None::<f64>, None, None]);
        let d = derived(vec![pressure], vec![1990, 1991, 1992]);
        let sections = build_sections(&d, &DashboardConfig::default());

        let failed: Vec<&Section> = sections.iter().filter(|s| s.content.is_err()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].slug, "13_tekanan_trend");
        let err = failed[0].content.as_ref().unwrap_err();
        assert!(matches!(err, ClimateError::MissingColumn { required: false, .. }));
        assert!(!err.is_fatal());

        // The heatmap after it still renders.
        assert!(sections.last().unwrap().content.is_ok());
    }

    #[test]
    fn test_undefined_baseline_only_breaks_anomaly() {
        let d = derived(vec![], vec![1950, 1951]);
        let sections = build_sections(&d, &DashboardConfig::default());
        let anomaly = sections.iter().find(|s| s.slug == "05_anomaly").unwrap();
        assert!(matches!(
            anomaly.content,
            Err(ClimateError::UndefinedValue { .. })
        ));
        assert_eq!(sections.iter().filter(|s| s.content.is_err()).count(), 1);
    }

    #[test]
    fn test_describe_extremes() {
        let extremes = Extremes {
            hottest: Some(Extreme {
                year: 1991,
                value: 27.5,
            }),
            coldest: Some(Extreme {
                year: 1990,
                value: 25.0,
            }),
            wettest: Some(Extreme {
                year: 1998,
                value: 4012.34,
            }),
            driest: None,
        };
        let lines = describe_extremes(&extremes);
        assert_eq!(lines[0], "Tahun Terpanas: 1991 (27.50 °C)");
        assert_eq!(lines[1], "Tahun Terdingin: 1990 (25.00 °C)");
        assert_eq!(lines[2], "Hujan Terbanyak: 1998 (4012.3 mm)");
        assert_eq!(lines[3], "Hujan Terkering: -");
    }

    #[test]
    fn test_heatmap_covers_all_numeric_columns() {
        let station = Column::new("Stasiun".into(), vec!["A", "B", "C"]);
        let d = derived(vec![station], vec![1990, 1991, 1992]);
        let sections = build_sections(&d, &DashboardConfig::default());
        match sections.last().unwrap().content.as_ref().unwrap() {
            SectionContent::Heatmap(matrix) => {
                assert!(matrix.labels.contains(&"Anomali_Suhu".to_string()));
                assert!(matrix.labels.contains(&"Dekade".to_string()));
                assert!(!matrix.labels.contains(&"Stasiun".to_string()));
            }
            other => panic!("unexpected content {:?}", other),
        }
    }

    #[test]
    fn test_table_view_formats_cells() {
        let df = DataFrame::new(vec![
            Column::new(YEAR.into(), vec![1990i64]),
            Column::new(TEMPERATURE.into(), vec![f64::NAN]),
            Column::new("Stasiun".into(), vec![Some("Padang")]),
        ])
        .unwrap();
        let table = TableView::from_frame(&df).unwrap();
        assert_eq!(table.headers, vec!["Tahun", "Suhu", "Stasiun"]);
        assert_eq!(table.rows, vec![vec!["1990", "NaN", "Padang"]]);
    }

    #[test]
    fn test_table_view_keeps_full_precision() {
        let df = DataFrame::new(vec![
            Column::new(TEMPERATURE.into(), vec![26.125]),
            Column::new(ANOMALY.into(), vec![-0.004]),
            Column::new(RAINFALL.into(), vec![3012.34567]),
        ])
        .unwrap();
        let table = TableView::from_frame(&df).unwrap();
        assert_eq!(table.rows, vec![vec!["26.125", "-0.004", "3012.34567"]]);
    }
}
