//! Chart registry, theme palettes and rasterization.

mod chart;
pub mod registry;
pub mod styles;

#[cfg(test)]
mod tests;

pub use chart::{draw_chart, format_axis_value, render_chart, value_range, ChartImage};
pub use registry::{ChartHandle, ChartId, ChartKind, ChartRegistry, Dataset, Selector};
pub use styles::{ChartStyle, ChartTheme, StyleAttrs};
