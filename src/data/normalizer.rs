//! Column Normalizer Module
//! Trims header whitespace and maps station codes to canonical column names.

use super::{OptionalVariable, REQUIRED_COLUMNS};
use crate::error::{ClimateError, Result};
use polars::prelude::*;
use std::collections::HashSet;
use tracing::debug;

/// Source code -> canonical name.
pub const RENAME_MAP: [(&str, &str); 4] = [
    ("Tavg", "Suhu"),
    ("RR", "Curah_Hujan"),
    ("Tx", "Suhu_Max"),
    ("Tn", "Suhu_Min"),
];

pub struct Normalizer;

impl Normalizer {
    /// Canonical name for a raw header cell.
    pub fn canonical_name(raw: &str) -> String {
        let trimmed = raw.trim();
        RENAME_MAP
            .iter()
            .find(|(source, _)| *source == trimmed)
            .map(|(_, target)| target.to_string())
            .unwrap_or_else(|| trimmed.to_string())
    }

    /// Rename every column to its canonical name. Columns without a mapping
    /// keep their (trimmed) name. Normalizing twice is the same as once.
    pub fn normalize(mut df: DataFrame) -> Result<DataFrame> {
        let old_names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        let new_names: Vec<String> = old_names
            .iter()
            .map(|name| Self::canonical_name(name))
            .collect();

        let mut seen = HashSet::new();
        for name in &new_names {
            if !seen.insert(name.as_str()) {
                return Err(ClimateError::DuplicateColumn {
                    column: name.clone(),
                });
            }
        }

        for (old, new) in old_names.iter().zip(&new_names) {
            if old != new {
                debug!(from = %old, to = %new, "renamed column");
            }
        }

        df.set_column_names(new_names.iter().map(String::as_str))?;
        Ok(df)
    }
}

/// Fail with the first required column that is absent.
pub fn require_columns(df: &DataFrame) -> Result<()> {
    for name in REQUIRED_COLUMNS {
        if df.column(name).is_err() {
            return Err(ClimateError::required_column(name));
        }
    }
    Ok(())
}

/// Optional variables present in the table, in display order.
pub fn present_optionals(df: &DataFrame) -> Vec<OptionalVariable> {
    OptionalVariable::ALL
        .into_iter()
        .filter(|var| df.column(var.column()).is_ok())
        .collect()
}
