pub mod animation;
pub mod format;

pub use animation::{ease_out_cubic, CounterAnimation};
pub use format::{format_decimal, format_integer, KpiFormat};
