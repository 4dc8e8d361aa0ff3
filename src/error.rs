//! Error types shared by the whole pipeline.

use polars::prelude::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClimateError {
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("Cannot read {} as a table: {reason}", path.display())]
    Format { path: PathBuf, reason: String },

    #[error("Duplicate column '{column}' after normalization")]
    DuplicateColumn { column: String },

    /// `required` marks columns the whole pipeline depends on.
    #[error("Missing column '{column}'")]
    MissingColumn { column: String, required: bool },

    #[error("{what} is undefined")]
    UndefinedValue { what: String },

    #[error("Invalid year in row {row}: '{value}'")]
    InvalidYear { row: usize, value: String },

    #[error("Table error: {0}")]
    Table(#[from] PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration in {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, ClimateError>;

impl ClimateError {
    /// A column one chart needs is absent or empty.
    pub fn missing_column(column: impl Into<String>) -> Self {
        ClimateError::MissingColumn {
            column: column.into(),
            required: false,
        }
    }

    /// A column every downstream step needs is absent.
    pub fn required_column(column: impl Into<String>) -> Self {
        ClimateError::MissingColumn {
            column: column.into(),
            required: true,
        }
    }

    pub fn format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ClimateError::Format {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error aborts the whole session rather than a single chart.
    pub fn is_fatal(&self) -> bool {
        match self {
            ClimateError::MissingColumn { required, .. } => *required,
            ClimateError::UndefinedValue { .. } => false,
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_column_display() {
        let err = ClimateError::missing_column("kelembaban");
        assert_eq!(err.to_string(), "Missing column 'kelembaban'");
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_required_column_is_fatal() {
        let err = ClimateError::required_column("Tahun");
        assert_eq!(err.to_string(), "Missing column 'Tahun'");
        assert!(err.is_fatal());
    }

    #[test]
    fn test_file_not_found_is_fatal() {
        let err = ClimateError::FileNotFound {
            path: PathBuf::from("MINANGKABAU.xlsx"),
        };
        assert!(err.to_string().contains("MINANGKABAU.xlsx"));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_format_display() {
        let err = ClimateError::format("data.txt", "unsupported extension 'txt'");
        let msg = err.to_string();
        assert!(msg.contains("data.txt"));
        assert!(msg.contains("unsupported extension"));
    }

    #[test]
    fn test_undefined_value_not_fatal() {
        let err = ClimateError::UndefinedValue {
            what: "Baseline 1985-2023".to_string(),
        };
        assert_eq!(err.to_string(), "Baseline 1985-2023 is undefined");
        assert!(!err.is_fatal());
    }
}
