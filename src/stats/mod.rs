//! Stats module - derivation engine and statistical calculations

mod calculator;
mod derive;

pub use calculator::{
    CorrelationMatrix, Extreme, ExtremeKind, Histogram, LinearFit, StatsCalculator,
};
pub use derive::{
    decade_of, derive, year_values, BaselineWindow, DecadeRow, DecadeSummary, DerivedTable,
    Extremes,
};
