//! Chart Viewer Widget
//! Central panel showing the chart, table and summary of the last run, or
//! the message explaining why there is no chart.

use crate::charts::ChartPlotter;
use crate::data::processor::cell_text;
use crate::pipeline::{PipelineError, RenderResult};
use egui::{Color32, RichText, ScrollArea};

const CHART_HEIGHT: f32 = 380.0;

/// What the viewer currently displays
#[derive(Default)]
pub enum ViewerState {
    #[default]
    Idle,
    Chart(Box<RenderResult>),
    /// The last run produced no rows
    Empty(String),
    Error(String),
}

/// Display area for the outcome of the latest pipeline run.
#[derive(Default)]
pub struct ChartViewer {
    pub state: ViewerState,
}

impl ChartViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.state = ViewerState::Idle;
    }

    /// Store a run outcome; a new run always supersedes the previous one
    pub fn set_outcome(&mut self, outcome: Result<RenderResult, PipelineError>) {
        self.state = match outcome {
            Ok(result) => ViewerState::Chart(Box::new(result)),
            Err(e @ PipelineError::EmptySelection { .. }) => ViewerState::Empty(e.to_string()),
            Err(e) => ViewerState::Error(e.to_string()),
        };
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.state = ViewerState::Error(message.into());
    }

    pub fn result(&self) -> Option<&RenderResult> {
        match &self.state {
            ViewerState::Chart(result) => Some(result.as_ref()),
            _ => None,
        }
    }

    pub fn show(&mut self, ui: &mut egui::Ui) {
        match &self.state {
            ViewerState::Idle => {
                ui.centered_and_justified(|ui| {
                    ui.label(RichText::new("⬆ Upload a CSV file to start").size(20.0));
                });
            }
            ViewerState::Empty(message) => {
                ui.centered_and_justified(|ui| {
                    ui.label(
                        RichText::new(format!("⚠ {}", message))
                            .size(18.0)
                            .color(Color32::from_rgb(255, 193, 7)),
                    );
                });
            }
            ViewerState::Error(message) => {
                ui.centered_and_justified(|ui| {
                    ui.label(
                        RichText::new(format!("❌ {}", message))
                            .size(18.0)
                            .color(Color32::from_rgb(220, 53, 69)),
                    );
                });
            }
            ViewerState::Chart(result) => {
                ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        ChartPlotter::draw_bar_chart(ui, result, CHART_HEIGHT);
                        ui.add_space(12.0);
                        Self::draw_table(ui, result);
                        ui.add_space(8.0);
                        Self::draw_summary(ui, result);
                    });
            }
        }
    }

    fn draw_table(ui: &mut egui::Ui, result: &RenderResult) {
        let table = &result.table;
        egui::Grid::new("filtered_table")
            .striped(true)
            .min_col_width(90.0)
            .show(ui, |ui| {
                for name in table.get_column_names() {
                    ui.label(RichText::new(name.as_str()).strong());
                }
                ui.end_row();

                for row in 0..table.height() {
                    for col in table.get_columns() {
                        let text = col
                            .get(row)
                            .ok()
                            .and_then(|v| cell_text(&v))
                            .unwrap_or_else(|| "-".to_string());
                        ui.label(text);
                    }
                    ui.end_row();
                }
            });
    }

    fn draw_summary(ui: &mut egui::Ui, result: &RenderResult) {
        let Some(summary) = &result.summary else {
            return;
        };
        let fmt = ChartPlotter::format_axis_value;
        let std = summary.std.map(fmt).unwrap_or_else(|| "-".to_string());
        ui.label(
            RichText::new(format!(
                "n = {}   mean = {}   median = {}   min = {}   max = {}   std = {}",
                summary.count,
                fmt(summary.mean),
                fmt(summary.median),
                fmt(summary.min),
                fmt(summary.max),
                std
            ))
            .size(12.0)
            .color(Color32::GRAY),
        );
    }
}
