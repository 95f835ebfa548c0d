//! GUI module - User interface components

mod app;
mod chart_viewer;
mod control_panel;

pub use app::{export_png, export_table, JudiciaryApp};
pub use chart_viewer::{ChartViewer, ViewerState};
pub use control_panel::{CatalogMode, ControlPanel, ControlPanelAction};
