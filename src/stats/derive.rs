//! Derivation Engine
//! Attaches temperature range, anomaly and decade columns to a normalized
//! climate table and computes the per-decade summary.

use super::calculator::{Extreme, ExtremeKind, StatsCalculator};
use crate::data::{
    float_values, numeric_values, require_columns, ANOMALY, DECADE, RAINFALL, TEMPERATURE,
    TEMPERATURE_MAX, TEMPERATURE_MIN, TEMPERATURE_RANGE, YEAR,
};
use crate::error::{ClimateError, Result};
use polars::prelude::*;
use std::collections::{BTreeMap, HashSet};
use tracing::{info, warn};

/// Inclusive range of years used as the reference period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaselineWindow {
    pub start: i64,
    pub end: i64,
}

impl Default for BaselineWindow {
    fn default() -> Self {
        Self {
            start: 1985,
            end: 2023,
        }
    }
}

impl BaselineWindow {
    pub fn contains(&self, year: i64) -> bool {
        (self.start..=self.end).contains(&year)
    }

    pub fn label(&self) -> String {
        format!("{}–{}", self.start, self.end)
    }
}

/// Decade bucket of a year (floor division).
pub fn decade_of(year: i64) -> i64 {
    year.div_euclid(10) * 10
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecadeRow {
    pub decade: i64,
    pub mean_temperature: f64,
    pub mean_rainfall: f64,
    /// Number of member years.
    pub count: usize,
}

/// Per-decade means of temperature and rainfall, ascending by decade.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecadeSummary {
    pub rows: Vec<DecadeRow>,
}

impl DecadeSummary {
    /// Group rows by decade. Means are taken over the raw values and only
    /// the final mean is rounded to 2 decimals.
    pub fn compute(years: &[i64], temperature: &[f64], rainfall: &[f64]) -> Self {
        let mut groups: BTreeMap<i64, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
        for ((&year, &temp), &rain) in years.iter().zip(temperature).zip(rainfall) {
            let entry = groups.entry(decade_of(year)).or_default();
            entry.0.push(temp);
            entry.1.push(rain);
        }

        let rows = groups
            .into_iter()
            .map(|(decade, (temps, rains))| DecadeRow {
                decade,
                mean_temperature: StatsCalculator::round_to(StatsCalculator::mean(&temps), 2),
                mean_rainfall: StatsCalculator::round_to(StatsCalculator::mean(&rains), 2),
                count: temps.len(),
            })
            .collect();

        Self { rows }
    }

    pub fn total_count(&self) -> usize {
        self.rows.iter().map(|r| r.count).sum()
    }

    pub fn to_frame(&self) -> Result<DataFrame> {
        let decades: Vec<i64> = self.rows.iter().map(|r| r.decade).collect();
        let temps: Vec<f64> = self.rows.iter().map(|r| r.mean_temperature).collect();
        let rains: Vec<f64> = self.rows.iter().map(|r| r.mean_rainfall).collect();
        Ok(DataFrame::new(vec![
            Column::new(DECADE.into(), decades),
            Column::new(TEMPERATURE.into(), temps),
            Column::new(RAINFALL.into(), rains),
        ])?)
    }
}

/// Years of the hottest/coldest mean temperature and wettest/driest rainfall.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extremes {
    pub hottest: Option<Extreme>,
    pub coldest: Option<Extreme>,
    pub wettest: Option<Extreme>,
    pub driest: Option<Extreme>,
}

/// The climate table after derivation. Immutable from here on.
#[derive(Debug, Clone)]
pub struct DerivedTable {
    df: DataFrame,
    years: Vec<i64>,
    baseline: f64,
    window: BaselineWindow,
    decades: DecadeSummary,
}

impl DerivedTable {
    pub fn df(&self) -> &DataFrame {
        &self.df
    }

    pub fn years(&self) -> &[i64] {
        &self.years
    }

    pub fn window(&self) -> BaselineWindow {
        self.window
    }

    /// Baseline mean temperature, or `UndefinedValue` when the window held
    /// no usable rows.
    pub fn baseline(&self) -> Result<f64> {
        if self.baseline.is_nan() {
            Err(ClimateError::UndefinedValue {
                what: format!("Baseline {}", self.window.label()),
            })
        } else {
            Ok(self.baseline)
        }
    }

    pub fn decade_summary(&self) -> &DecadeSummary {
        &self.decades
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.df.column(name).is_ok()
    }

    /// Column values as floats, missing cells as NaN.
    pub fn values(&self, name: &str) -> Result<Vec<f64>> {
        float_values(&self.df, name)
    }

    pub fn extremes(&self) -> Result<Extremes> {
        let temperature = self.values(TEMPERATURE)?;
        let rainfall = self.values(RAINFALL)?;
        Ok(Extremes {
            hottest: StatsCalculator::extreme(&self.years, &temperature, ExtremeKind::Max),
            coldest: StatsCalculator::extreme(&self.years, &temperature, ExtremeKind::Min),
            wettest: StatsCalculator::extreme(&self.years, &rainfall, ExtremeKind::Max),
            driest: StatsCalculator::extreme(&self.years, &rainfall, ExtremeKind::Min),
        })
    }
}

/// Years as integers; empty or fractional cells are rejected.
pub fn year_values(df: &DataFrame) -> Result<Vec<i64>> {
    numeric_values(df, YEAR)?
        .into_iter()
        .enumerate()
        .map(|(i, value)| match value {
            Some(v) if v.fract() == 0.0 => Ok(v as i64),
            Some(v) => Err(ClimateError::InvalidYear {
                row: i + 1,
                value: v.to_string(),
            }),
            None => Err(ClimateError::InvalidYear {
                row: i + 1,
                value: String::new(),
            }),
        })
        .collect()
}

/// Run the derivation pass over a normalized table.
pub fn derive(mut df: DataFrame, window: BaselineWindow) -> Result<DerivedTable> {
    require_columns(&df)?;

    let years = year_values(&df)?;
    let mut seen = HashSet::new();
    for year in &years {
        if !seen.insert(*year) {
            warn!(year, "duplicate year in climate table");
        }
    }

    let temperature = float_values(&df, TEMPERATURE)?;
    let temperature_max = float_values(&df, TEMPERATURE_MAX)?;
    let temperature_min = float_values(&df, TEMPERATURE_MIN)?;
    let rainfall = float_values(&df, RAINFALL)?;

    let range: Vec<f64> = temperature_max
        .iter()
        .zip(&temperature_min)
        .map(|(max, min)| max - min)
        .collect();

    let in_window: Vec<f64> = years
        .iter()
        .zip(&temperature)
        .filter(|(year, _)| window.contains(**year))
        .map(|(_, &temp)| temp)
        .collect();
    let baseline = StatsCalculator::mean(&in_window);
    if baseline.is_nan() {
        warn!(window = %window.label(), "no rows in baseline window, anomaly is undefined");
    } else {
        info!(window = %window.label(), baseline, "computed baseline temperature");
    }

    let anomaly: Vec<f64> = temperature.iter().map(|temp| temp - baseline).collect();
    let decades: Vec<i64> = years.iter().map(|&year| decade_of(year)).collect();

    df.with_column(Column::new(TEMPERATURE_RANGE.into(), range))?;
    df.with_column(Column::new(ANOMALY.into(), anomaly))?;
    df.with_column(Column::new(DECADE.into(), decades))?;

    let summary = DecadeSummary::compute(&years, &temperature, &rainfall);
    info!(
        rows = df.height(),
        decades = summary.rows.len(),
        "derived climate table"
    );

    Ok(DerivedTable {
        df,
        years,
        baseline,
        window,
        decades: summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn table(years: &[i64], temps: &[f64], rains: &[f64]) -> DataFrame {
        let tmax: Vec<f64> = temps.iter().map(|t| t + 5.0).collect();
        let tmin: Vec<f64> = temps.iter().map(|t| t - 4.0).collect();
        DataFrame::new(vec![
            Column::new(YEAR.into(), years.to_vec()),
            Column::new(TEMPERATURE.into(), temps.to_vec()),
            Column::new(RAINFALL.into(), rains.to_vec()),
            Column::new(TEMPERATURE_MAX.into(), tmax),
            Column::new(TEMPERATURE_MIN.into(), tmin),
        ])
        .unwrap()
    }

    #[test]
    fn test_decade_of() {
        assert_eq!(decade_of(1987), 1980);
        assert_eq!(decade_of(1990), 1990);
        assert_eq!(decade_of(1999), 1990);
        assert_eq!(decade_of(2000), 2000);
    }

    #[test]
    fn test_window_contains_is_inclusive() {
        let window = BaselineWindow::default();
        assert!(window.contains(1985));
        assert!(window.contains(2023));
        assert!(!window.contains(1984));
        assert!(!window.contains(2024));
    }

    #[test]
    fn test_range_anomaly_and_decade() {
        let df = table(&[1984, 1985, 2023, 2024], &[20.0, 26.0, 28.0, 40.0], &[1.0; 4]);
        let derived = derive(df, BaselineWindow::default()).unwrap();

        assert!((derived.baseline().unwrap() - 27.0).abs() < EPS);

        let range = derived.values(TEMPERATURE_RANGE).unwrap();
        assert!(range.iter().all(|r| (r - 9.0).abs() < EPS));

        let anomaly = derived.values(ANOMALY).unwrap();
        assert!((anomaly[0] + 7.0).abs() < EPS);
        assert!((anomaly[3] - 13.0).abs() < EPS);

        let decades = derived.values(DECADE).unwrap();
        assert_eq!(decades, vec![1980.0, 1980.0, 2020.0, 2020.0]);
    }

    #[test]
    fn test_baseline_ignores_rows_outside_window() {
        let a = derive(
            table(&[1980, 1990, 2000], &[10.0, 26.0, 27.0], &[1.0; 3]),
            BaselineWindow::default(),
        )
        .unwrap();
        let b = derive(
            table(&[1980, 1990, 2000], &[99.0, 26.0, 27.0], &[1.0; 3]),
            BaselineWindow::default(),
        )
        .unwrap();
        assert_eq!(a.baseline().unwrap(), b.baseline().unwrap());
        assert!((a.baseline().unwrap() - 26.5).abs() < EPS);
    }

    #[test]
    fn test_empty_window_is_undefined() {
        let derived = derive(
            table(&[1950, 1960], &[25.0, 26.0], &[1.0, 2.0]),
            BaselineWindow::default(),
        )
        .unwrap();
        assert!(matches!(
            derived.baseline(),
            Err(ClimateError::UndefinedValue { .. })
        ));
        let anomaly = derived.values(ANOMALY).unwrap();
        assert!(anomaly.iter().all(|a| a.is_nan()));
    }

    #[test]
    fn test_decade_summary_rounds_after_averaging() {
        let df = table(
            &[1987, 1988, 1990, 1991, 1992],
            &[26.111, 26.114, 27.0, 27.5, 28.0],
            &[2000.004, 2000.0, 3000.0, 3100.0, 3200.0],
        );
        let derived = derive(df, BaselineWindow::default()).unwrap();
        let summary = derived.decade_summary();

        assert_eq!(summary.rows.len(), 2);
        assert_eq!(summary.rows[0].decade, 1980);
        assert_eq!(summary.rows[0].mean_temperature, 26.11);
        assert_eq!(summary.rows[0].mean_rainfall, 2000.0);
        assert_eq!(summary.rows[1].decade, 1990);
        assert_eq!(summary.rows[1].mean_temperature, 27.5);
        assert_eq!(summary.rows[1].mean_rainfall, 3100.0);
        assert_eq!(summary.total_count(), 5);

        let frame = summary.to_frame().unwrap();
        assert_eq!(frame.height(), 2);
    }

    #[test]
    fn test_extremes_first_occurrence() {
        let df = table(&[1990, 1991, 1992], &[25.0, 27.5, 27.5], &[100.0, 50.0, 50.0]);
        let extremes = derive(df, BaselineWindow::default())
            .unwrap()
            .extremes()
            .unwrap();
        assert_eq!(extremes.hottest.unwrap().year, 1991);
        assert_eq!(extremes.coldest.unwrap().year, 1990);
        assert_eq!(extremes.wettest.unwrap().year, 1990);
        assert_eq!(extremes.driest.unwrap().year, 1991);
    }

    #[test]
    fn test_missing_year_column_is_fatal() {
        let df = table(&[1990], &[25.0], &[1.0]).drop(YEAR).unwrap();
        let err = derive(df, BaselineWindow::default()).unwrap_err();
        assert!(matches!(err, ClimateError::MissingColumn { ref column, required: true } if column == YEAR));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_fractional_year_rejected() {
        let df = DataFrame::new(vec![
            Column::new(YEAR.into(), vec![1990.0, 1990.5]),
            Column::new(TEMPERATURE.into(), vec![25.0, 26.0]),
            Column::new(RAINFALL.into(), vec![1.0, 2.0]),
            Column::new(TEMPERATURE_MAX.into(), vec![30.0, 31.0]),
            Column::new(TEMPERATURE_MIN.into(), vec![20.0, 21.0]),
        ])
        .unwrap();
        let err = derive(df, BaselineWindow::default()).unwrap_err();
        assert!(matches!(err, ClimateError::InvalidYear { row: 2, .. }));
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let df = table(&[1985, 1995, 2005], &[26.0, 26.5, 27.1], &[2900.0, 3000.0, 3100.0]);
        let a = derive(df.clone(), BaselineWindow::default()).unwrap();
        let b = derive(df, BaselineWindow::default()).unwrap();
        assert!(a.df().equals_missing(b.df()));
        assert_eq!(a.decade_summary(), b.decade_summary());
    }
}
