//! Workbook Loader Module
//! Reads a spreadsheet (or CSV export of one) into a Polars DataFrame.

use crate::error::{ClimateError, Result};
use calamine::{open_workbook_auto, Data, Reader};
use polars::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const SPREADSHEET_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// A single spreadsheet cell after type sniffing.
#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::Int(v) => Cell::Number(*v as f64),
            Data::Float(v) => Cell::Number(*v),
            Data::Bool(v) => Cell::Number(if *v { 1.0 } else { 0.0 }),
            Data::String(s) if s.trim().is_empty() => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            other => Cell::Text(other.to_string()),
        }
    }
}

/// Handles workbook loading; keeps the last loaded table around for the UI.
pub struct WorkbookLoader {
    df: Option<DataFrame>,
    file_path: Option<PathBuf>,
}

impl Default for WorkbookLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkbookLoader {
    pub fn new() -> Self {
        Self {
            df: None,
            file_path: None,
        }
    }

    /// Load a workbook or CSV file. `sheet` selects a worksheet by name;
    /// the first sheet is used when it is `None`.
    pub fn load(&mut self, file_path: &Path, sheet: Option<&str>) -> Result<&DataFrame> {
        self.file_path = Some(file_path.to_path_buf());
        self.df = None;

        let df = Self::read_table(file_path, sheet)?;
        info!(
            path = %file_path.display(),
            rows = df.height(),
            columns = df.width(),
            "loaded climate table"
        );

        Ok(&*self.df.insert(df))
    }

    /// Read a table without keeping it.
    pub fn read_table(file_path: &Path, sheet: Option<&str>) -> Result<DataFrame> {
        if !file_path.exists() {
            return Err(ClimateError::FileNotFound {
                path: file_path.to_path_buf(),
            });
        }

        let extension = file_path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if extension == "csv" {
            Self::read_csv(file_path)
        } else if SPREADSHEET_EXTENSIONS.contains(&extension.as_str()) {
            Self::read_spreadsheet(file_path, sheet)
        } else {
            Err(ClimateError::format(
                file_path,
                format!("unsupported extension '{}'", extension),
            ))
        }
    }

    fn read_csv(file_path: &Path) -> Result<DataFrame> {
        debug!(path = %file_path.display(), "reading CSV");
        let df = LazyCsvReader::new(file_path)
            .with_infer_schema_length(Some(10000))
            .finish()
            .and_then(|lazy| lazy.collect())
            .map_err(|e| ClimateError::format(file_path, e.to_string()))?;

        if df.width() == 0 {
            return Err(ClimateError::format(file_path, "no header row"));
        }
        Ok(df)
    }

    fn read_spreadsheet(file_path: &Path, sheet: Option<&str>) -> Result<DataFrame> {
        // The workbook handle is dropped at the end of this scope.
        let mut workbook = open_workbook_auto(file_path)
            .map_err(|e| ClimateError::format(file_path, e.to_string()))?;

        let sheet_name = match sheet {
            Some(name) => name.to_string(),
            None => workbook
                .sheet_names()
                .first()
                .cloned()
                .ok_or_else(|| ClimateError::format(file_path, "workbook has no sheets"))?,
        };
        debug!(path = %file_path.display(), sheet = %sheet_name, "reading worksheet");

        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| ClimateError::format(file_path, e.to_string()))?;

        let mut rows = range.rows();
        let header = rows
            .next()
            .ok_or_else(|| ClimateError::format(file_path, "no header row"))?;

        let names = Self::header_names(header);
        let mut cells: Vec<Vec<Cell>> = vec![Vec::new(); names.len()];
        for row in rows {
            for (i, column) in cells.iter_mut().enumerate() {
                column.push(row.get(i).map(Cell::from).unwrap_or(Cell::Empty));
            }
        }

        Self::build_frame(file_path, names, cells)
    }

    fn header_names(header: &[Data]) -> Vec<String> {
        header
            .iter()
            .enumerate()
            .map(|(i, cell)| match Cell::from(cell) {
                Cell::Empty => format!("column_{}", i + 1),
                Cell::Number(v) => Self::format_number(v),
                Cell::Text(s) => s,
            })
            .collect()
    }

    fn build_frame(file_path: &Path, names: Vec<String>, cells: Vec<Vec<Cell>>) -> Result<DataFrame> {
        let mut seen = HashSet::new();
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(ClimateError::format(
                    file_path,
                    format!("duplicate column name '{}'", name),
                ));
            }
        }

        let columns: Vec<Column> = names
            .into_iter()
            .zip(cells)
            .map(|(name, values)| Self::build_column(&name, values))
            .collect();

        Ok(DataFrame::new(columns)?)
    }

    /// Numeric columns become Int64 when every value is integral, Float64
    /// otherwise. Any text cell makes the whole column a string column.
    fn build_column(name: &str, cells: Vec<Cell>) -> Column {
        let has_text = cells.iter().any(|c| matches!(c, Cell::Text(_)));
        if has_text {
            let values: Vec<Option<String>> = cells
                .into_iter()
                .map(|c| match c {
                    Cell::Empty => None,
                    Cell::Number(v) => Some(Self::format_number(v)),
                    Cell::Text(s) => Some(s),
                })
                .collect();
            return Column::new(name.into(), values);
        }

        let numbers: Vec<Option<f64>> = cells
            .into_iter()
            .map(|c| match c {
                Cell::Number(v) => Some(v),
                _ => None,
            })
            .collect();

        let any_value = numbers.iter().any(|v| v.is_some());
        let integral = numbers
            .iter()
            .flatten()
            .all(|v| v.fract() == 0.0 && v.abs() < 9.0e15);

        if any_value && integral {
            let ints: Vec<Option<i64>> = numbers.iter().map(|v| v.map(|x| x as i64)).collect();
            Column::new(name.into(), ints)
        } else {
            Column::new(name.into(), numbers)
        }
    }

    fn format_number(v: f64) -> String {
        if v.fract() == 0.0 {
            format!("{}", v as i64)
        } else {
            v.to_string()
        }
    }

    /// Get list of column names from loaded DataFrame.
    pub fn get_columns(&self) -> Vec<String> {
        self.df
            .as_ref()
            .map(|df| {
                df.get_column_names()
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get the number of rows in the DataFrame.
    pub fn get_row_count(&self) -> usize {
        self.df.as_ref().map(|df| df.height()).unwrap_or(0)
    }

    /// Get file path.
    pub fn get_file_path(&self) -> Option<&PathBuf> {
        self.file_path.as_ref()
    }
}
