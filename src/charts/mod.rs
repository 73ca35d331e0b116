//! Charts module - PNG chart rendering

mod renderer;

pub use renderer::StaticChartRenderer;
