//! Charts module - dashboard sections and their renderers

mod plotter;
mod renderer;
mod sections;

pub use plotter::ChartPlotter;
pub use renderer::StaticChartRenderer;
pub use sections::{build_sections, Section, SectionContent, SeriesData, TableView};
