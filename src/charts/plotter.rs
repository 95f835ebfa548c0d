//! Chart Plotter Module
//! Interactive bar chart of one pipeline run using egui_plot.

use crate::charts::PALETTE;
use crate::data::metrics::format_thousands;
use crate::pipeline::RenderResult;
use egui::{Align2, Color32, RichText};
use egui_plot::{Bar, BarChart, Plot, PlotPoint, Text};

/// Fraction of the bar height at which the in-bar label sits.
pub const LABEL_HEIGHT_RATIO: f64 = 0.02;
const BAR_WIDTH: f64 = 0.6;

/// Creates bar chart visualizations using egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Bar color for the i-th bar; cycles through the palette.
    pub fn bar_color(index: usize) -> Color32 {
        let (r, g, b) = PALETTE[index % PALETTE.len()];
        Color32::from_rgb(r, g, b)
    }

    /// Plain axis tick text, never in scientific notation.
    pub fn format_axis_value(value: f64) -> String {
        let magnitude = value.abs();
        let decimals = if magnitude >= 100.0 || magnitude == 0.0 {
            0
        } else if magnitude >= 1.0 {
            2
        } else {
            4
        };

        let text = format_thousands(value, decimals);
        if text.contains('.') {
            text.trim_end_matches('0').trim_end_matches('.').to_string()
        } else {
            text
        }
    }

    /// Draw one bar per state, with optional in-bar labels.
    pub fn draw_bar_chart(ui: &mut egui::Ui, result: &RenderResult, height: f32) {
        let states: Vec<String> = result.bars.iter().map(|b| b.state.clone()).collect();
        let show_labels = result.show_value_labels();

        let bars: Vec<Bar> = result
            .bars
            .iter()
            .enumerate()
            .map(|(i, bar)| {
                Bar::new(i as f64, bar.value)
                    .width(BAR_WIDTH)
                    .fill(Self::bar_color(i))
                    .name(&bar.state)
            })
            .collect();

        ui.label(RichText::new(&result.title).size(16.0).strong());

        Plot::new(format!("bar_chart_{}_{}", result.metric.column, result.year))
            .height(height)
            .allow_zoom(false)
            .allow_drag(false)
            .allow_scroll(false)
            .include_y(0.0)
            .x_axis_label(result.x_label.clone())
            .y_axis_label(result.y_label.clone())
            .x_axis_formatter(move |mark, _range| {
                let idx = mark.value.round();
                if (mark.value - idx).abs() > f64::EPSILON || idx < 0.0 {
                    return String::new();
                }
                states.get(idx as usize).cloned().unwrap_or_default()
            })
            .y_axis_formatter(|mark, _range| Self::format_axis_value(mark.value))
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).name(&result.metric.label));

                if show_labels {
                    for (i, bar) in result.bars.iter().enumerate() {
                        if let Some(label) = &bar.label {
                            plot_ui.text(
                                Text::new(
                                    PlotPoint::new(i as f64, bar.value * LABEL_HEIGHT_RATIO),
                                    RichText::new(label).strong(),
                                )
                                .color(Color32::BLACK)
                                .anchor(Align2::CENTER_BOTTOM),
                            );
                        }
                    }
                }
            });
    }
}
