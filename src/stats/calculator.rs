//! Statistics Calculator Module
//! Descriptive statistics, correlation, regression, histogram and KDE helpers.
//!
//! Missing values are represented as NaN and skipped, the way a dataframe
//! library does with `skipna`.

use rayon::prelude::*;
use statrs::statistics::Statistics;

/// Which end of a distribution to look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtremeKind {
    Max,
    Min,
}

/// The year at which a variable reaches an extreme, with the value itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extreme {
    pub year: i64,
    pub value: f64,
}

/// Least-squares line `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Pearson correlation of the fitted pairs.
    pub r: f64,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Equal-width histogram. `edges` has one more entry than `counts`.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn bin_width(&self) -> f64 {
        match (self.edges.first(), self.edges.last()) {
            (Some(first), Some(last)) if !self.counts.is_empty() => {
                (last - first) / self.counts.len() as f64
            }
            _ => 0.0,
        }
    }

    pub fn centers(&self) -> Vec<f64> {
        self.edges.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect()
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Pairwise Pearson correlations between named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub labels: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, row: &str, col: &str) -> Option<f64> {
        let i = self.labels.iter().position(|l| l == row)?;
        let j = self.labels.iter().position(|l| l == col)?;
        Some(self.values[i][j])
    }
}

/// Handles statistical calculations.
pub struct StatsCalculator;

impl StatsCalculator {
    fn finite(values: &[f64]) -> Vec<f64> {
        values.iter().copied().filter(|v| !v.is_nan()).collect()
    }

    fn complete_pairs(x: &[f64], y: &[f64]) -> (Vec<f64>, Vec<f64>) {
        x.iter()
            .zip(y.iter())
            .filter(|(a, b)| !a.is_nan() && !b.is_nan())
            .map(|(&a, &b)| (a, b))
            .unzip()
    }

    /// Arithmetic mean ignoring NaN. NaN when nothing is left.
    pub fn mean(values: &[f64]) -> f64 {
        Self::finite(values).iter().mean()
    }

    /// Round half away from zero to `decimals` places.
    pub fn round_to(value: f64, decimals: i32) -> f64 {
        let factor = 10f64.powi(decimals);
        (value * factor).round() / factor
    }

    /// Pearson correlation over pairwise-complete observations.
    pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
        let (xs, ys) = Self::complete_pairs(x, y);
        if xs.len() < 2 {
            return f64::NAN;
        }

        let sx = xs.iter().std_dev();
        let sy = ys.iter().std_dev();
        if sx == 0.0 || sy == 0.0 {
            return f64::NAN;
        }

        let cov = xs.iter().covariance(ys.iter());
        (cov / (sx * sy)).clamp(-1.0, 1.0)
    }

    /// Ordinary least squares fit of `y` on `x`.
    pub fn linear_fit(x: &[f64], y: &[f64]) -> Option<LinearFit> {
        let (xs, ys) = Self::complete_pairs(x, y);
        if xs.len() < 2 {
            return None;
        }

        let var_x = xs.iter().variance();
        if var_x == 0.0 || var_x.is_nan() {
            return None;
        }

        let cov = xs.iter().covariance(ys.iter());
        let slope = cov / var_x;
        let intercept = ys.iter().mean() - slope * xs.iter().mean();

        Some(LinearFit {
            slope,
            intercept,
            r: Self::pearson(&xs, &ys),
        })
    }

    /// Equal-width histogram over `[min, max]`; the last bin is closed.
    /// A constant sample is spread over `[v - 0.5, v + 0.5]`.
    pub fn histogram(values: &[f64], bins: usize) -> Option<Histogram> {
        let values = Self::finite(values);
        if values.is_empty() || bins == 0 {
            return None;
        }

        let mut min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let mut max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if min == max {
            min -= 0.5;
            max += 0.5;
        }

        let width = (max - min) / bins as f64;
        let edges: Vec<f64> = (0..=bins).map(|i| min + i as f64 * width).collect();
        let mut counts = vec![0usize; bins];
        for v in values {
            let idx = (((v - min) / width).floor() as usize).min(bins - 1);
            counts[idx] += 1;
        }

        Some(Histogram { edges, counts })
    }

    /// Gaussian kernel density estimate at each grid point, Scott's rule
    /// bandwidth. Empty when the sample has fewer than two distinct values.
    pub fn gaussian_kde(values: &[f64], grid: &[f64]) -> Vec<f64> {
        let values = Self::finite(values);
        let n = values.len();
        if n < 2 {
            return Vec::new();
        }

        let sd = values.iter().std_dev();
        if sd == 0.0 || sd.is_nan() {
            return Vec::new();
        }

        let bandwidth = sd * (n as f64).powf(-0.2);
        let norm = 1.0 / (n as f64 * bandwidth * (2.0 * std::f64::consts::PI).sqrt());

        grid.iter()
            .map(|&x| {
                let sum: f64 = values
                    .iter()
                    .map(|&xi| {
                        let z = (x - xi) / bandwidth;
                        (-0.5 * z * z).exp()
                    })
                    .sum();
                sum * norm
            })
            .collect()
    }

    /// Year of the maximum or minimum value. Ties resolve to the first
    /// occurrence in table order; NaN values never win.
    pub fn extreme(years: &[i64], values: &[f64], kind: ExtremeKind) -> Option<Extreme> {
        let mut best: Option<Extreme> = None;
        for (&year, &value) in years.iter().zip(values.iter()) {
            if value.is_nan() {
                continue;
            }
            let better = match (best, kind) {
                (None, _) => true,
                (Some(b), ExtremeKind::Max) => value > b.value,
                (Some(b), ExtremeKind::Min) => value < b.value,
            };
            if better {
                best = Some(Extreme { year, value });
            }
        }
        best
    }

    /// Correlation matrix over named columns, one row per column.
    pub fn correlation_matrix(columns: &[(String, Vec<f64>)]) -> CorrelationMatrix {
        let values: Vec<Vec<f64>> = columns
            .par_iter()
            .enumerate()
            .map(|(i, (_, x))| {
                columns
                    .iter()
                    .enumerate()
                    .map(|(j, (_, y))| {
                        let r = Self::pearson(x, y);
                        if i == j && !r.is_nan() {
                            1.0
                        } else {
                            r
                        }
                    })
                    .collect()
            })
            .collect();

        CorrelationMatrix {
            labels: columns.iter().map(|(name, _)| name.clone()).collect(),
            values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_mean_skips_nan() {
        assert!((StatsCalculator::mean(&[1.0, f64::NAN, 3.0]) - 2.0).abs() < EPS);
        assert!(StatsCalculator::mean(&[]).is_nan());
        assert!(StatsCalculator::mean(&[f64::NAN]).is_nan());
    }

    #[test]
    fn test_round_to() {
        assert_eq!(StatsCalculator::round_to(26.456, 2), 26.46);
        assert_eq!(StatsCalculator::round_to(-0.004, 2), -0.0);
        assert!(StatsCalculator::round_to(f64::NAN, 2).is_nan());
    }

    #[test]
    fn test_pearson_perfect_and_inverse() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [2.0, 4.0, 6.0, 8.0];
        let z = [8.0, 6.0, 4.0, 2.0];
        assert!((StatsCalculator::pearson(&x, &y) - 1.0).abs() < EPS);
        assert!((StatsCalculator::pearson(&x, &z) + 1.0).abs() < EPS);
    }

    #[test]
    fn test_pearson_degenerate() {
        assert!(StatsCalculator::pearson(&[1.0], &[2.0]).is_nan());
        assert!(StatsCalculator::pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).is_nan());
        // Only the complete pairs (1,2) and (3,6) survive.
        let r = StatsCalculator::pearson(&[1.0, f64::NAN, 3.0], &[2.0, 5.0, 6.0]);
        assert!((r - 1.0).abs() < EPS);
    }

    #[test]
    fn test_linear_fit() {
        let x = [25.0, 26.0, 27.0, 28.0];
        let y = [3000.0, 2800.0, 2600.0, 2400.0];
        let fit = StatsCalculator::linear_fit(&x, &y).unwrap();
        assert!((fit.slope + 200.0).abs() < 1e-6);
        assert!((fit.predict(26.5) - 2700.0).abs() < 1e-6);
        assert!((fit.r + 1.0).abs() < EPS);

        assert!(StatsCalculator::linear_fit(&[1.0, 1.0], &[2.0, 3.0]).is_none());
    }

    #[test]
    fn test_histogram_bins() {
        let values = [0.0, 1.0, 2.0, 3.0, 4.0, f64::NAN];
        let hist = StatsCalculator::histogram(&values, 4).unwrap();
        assert_eq!(hist.edges, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        // Max value lands in the closed last bin.
        assert_eq!(hist.counts, vec![1, 1, 1, 2]);
        assert_eq!(hist.total(), 5);
        assert!((hist.bin_width() - 1.0).abs() < EPS);
    }

    #[test]
    fn test_histogram_constant_sample() {
        let hist = StatsCalculator::histogram(&[80.0, 80.0], 2).unwrap();
        assert_eq!(hist.edges, vec![79.5, 80.0, 80.5]);
        assert_eq!(hist.counts, vec![0, 2]);
        assert!(StatsCalculator::histogram(&[f64::NAN], 5).is_none());
    }

    #[test]
    fn test_kde_is_symmetric_and_positive() {
        let values = [1.0, 2.0, 3.0];
        let density = StatsCalculator::gaussian_kde(&values, &[1.0, 2.0, 3.0]);
        assert_eq!(density.len(), 3);
        assert!(density.iter().all(|d| *d > 0.0));
        assert!((density[0] - density[2]).abs() < EPS);
        assert!(density[1] > density[0]);

        assert!(StatsCalculator::gaussian_kde(&[5.0, 5.0], &[5.0]).is_empty());
    }

    #[test]
    fn test_extreme_first_occurrence() {
        let years = [1990, 1991, 1992];
        let temps = [25.0, 27.5, 27.5];
        let hottest = StatsCalculator::extreme(&years, &temps, ExtremeKind::Max).unwrap();
        assert_eq!(hottest.year, 1991);
        assert_eq!(hottest.value, 27.5);

        let coldest = StatsCalculator::extreme(&years, &temps, ExtremeKind::Min).unwrap();
        assert_eq!(coldest.year, 1990);
    }

    #[test]
    fn test_extreme_skips_nan() {
        let years = [2000, 2001];
        let rain = [f64::NAN, 1200.0];
        let wettest = StatsCalculator::extreme(&years, &rain, ExtremeKind::Max).unwrap();
        assert_eq!(wettest.year, 2001);
        assert!(StatsCalculator::extreme(&years, &[f64::NAN, f64::NAN], ExtremeKind::Min).is_none());
    }

    #[test]
    fn test_correlation_matrix() {
        let columns = vec![
            ("a".to_string(), vec![1.0, 2.0, 3.0]),
            ("b".to_string(), vec![3.0, 2.0, 1.0]),
            ("c".to_string(), vec![5.0, 5.0, 5.0]),
        ];
        let matrix = StatsCalculator::correlation_matrix(&columns);
        assert_eq!(matrix.labels, vec!["a", "b", "c"]);
        assert_eq!(matrix.get("a", "a"), Some(1.0));
        assert!((matrix.get("a", "b").unwrap() + 1.0).abs() < EPS);
        assert!(matrix.get("c", "c").unwrap().is_nan());
        assert!(matrix.get("a", "zzz").is_none());
    }
}
