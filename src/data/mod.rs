//! Data module - workbook loading and column normalization

mod loader;
mod normalizer;

pub use loader::WorkbookLoader;
pub use normalizer::{present_optionals, require_columns, Normalizer, RENAME_MAP};

use crate::error::{ClimateError, Result};
use polars::prelude::*;

/// Year column, never renamed.
pub const YEAR: &str = "Tahun";
/// Mean temperature (renamed from `Tavg`).
pub const TEMPERATURE: &str = "Suhu";
/// Rainfall (renamed from `RR`).
pub const RAINFALL: &str = "Curah_Hujan";
/// Max temperature (renamed from `Tx`).
pub const TEMPERATURE_MAX: &str = "Suhu_Max";
/// Min temperature (renamed from `Tn`).
pub const TEMPERATURE_MIN: &str = "Suhu_Min";

pub const TEMPERATURE_RANGE: &str = "Rentang_Suhu";
pub const ANOMALY: &str = "Anomali_Suhu";
pub const DECADE: &str = "Dekade";

/// Columns every downstream step relies on.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    YEAR,
    TEMPERATURE,
    RAINFALL,
    TEMPERATURE_MAX,
    TEMPERATURE_MIN,
];

/// Climate variables that may or may not be present in a workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionalVariable {
    Humidity,
    Sunshine,
    WindSpeed,
    Pressure,
}

impl OptionalVariable {
    pub const ALL: [OptionalVariable; 4] = [
        OptionalVariable::Humidity,
        OptionalVariable::Sunshine,
        OptionalVariable::WindSpeed,
        OptionalVariable::Pressure,
    ];

    pub fn column(self) -> &'static str {
        match self {
            OptionalVariable::Humidity => "kelembaban",
            OptionalVariable::Sunshine => "matahari",
            OptionalVariable::WindSpeed => "kecepatan_angin",
            OptionalVariable::Pressure => "Tekanan",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OptionalVariable::Humidity => "Kelembaban",
            OptionalVariable::Sunshine => "Durasi Penyinaran Matahari",
            OptionalVariable::WindSpeed => "Kecepatan Angin",
            OptionalVariable::Pressure => "Tekanan Udara",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            OptionalVariable::Humidity => "%",
            OptionalVariable::Sunshine => "jam",
            OptionalVariable::WindSpeed => "m/s",
            OptionalVariable::Pressure => "mb",
        }
    }
}

/// Values of a column as floats; non-numeric cells become `None`.
pub fn numeric_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df
        .column(name)
        .map_err(|_| ClimateError::missing_column(name))?;
    let values = column.cast(&DataType::Float64)?;
    let values: Vec<Option<f64>> = values.f64()?.into_iter().collect();
    Ok(values)
}

/// Values of a column as floats with missing cells mapped to NaN.
pub fn float_values(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    Ok(numeric_values(df, name)?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

/// Names of every numeric column, in table order.
pub fn numeric_column_names(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|col| {
            matches!(
                col.dtype(),
                DataType::Float32
                    | DataType::Float64
                    | DataType::Int8
                    | DataType::Int16
                    | DataType::Int32
                    | DataType::Int64
                    | DataType::UInt8
                    | DataType::UInt16
                    | DataType::UInt32
                    | DataType::UInt64
            )
        })
        .map(|col| col.name().to_string())
        .collect()
}
