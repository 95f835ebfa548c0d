//! Judiciary Chart - State judiciary expense explorer
//!
//! Loads a CSV of Brazilian state judiciary expenses, resolves its year and
//! state columns, filters by year and states, and charts one expense metric
//! per state.

pub mod charts;
pub mod config;
pub mod data;
pub mod gui;
pub mod pipeline;
pub mod stats;

pub use config::PipelineConfig;
pub use pipeline::{BarDatum, FilterSelection, Pipeline, PipelineError, RenderResult};
