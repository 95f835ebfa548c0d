//! Charts module - Interactive and static bar chart rendering

mod plotter;
mod renderer;

pub use plotter::ChartPlotter;
pub use renderer::{RenderError, StaticChartRenderer, DEFAULT_HEIGHT, DEFAULT_WIDTH};

/// Bar colors, cycled when there are more bars than entries.
pub const PALETTE: [(u8, u8, u8); 5] = [
    (31, 119, 180),  // Blue
    (255, 127, 14),  // Orange
    (44, 160, 44),   // Green
    (148, 103, 189), // Purple
    (140, 86, 75),   // Brown
];
