//! Static Chart Renderer
//! Draws the bar chart of one pipeline run to a PNG with plotters.
//!
//! Layout:
//! 1. Title: "{metric} ({year})" centered
//! 2. One colored bar per state, state codes on the x-axis
//! 3. Bold value label near the base of each bar, unless labels are hidden

use crate::charts::plotter::{ChartPlotter, LABEL_HEIGHT_RATIO};
use crate::charts::PALETTE;
use crate::pipeline::{BarDatum, RenderResult};
use image::{ImageFormat, RgbImage};
use log::info;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

/// Default export size in pixels.
pub const DEFAULT_WIDTH: u32 = 1200;
pub const DEFAULT_HEIGHT: u32 = 700;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Chart drawing failed: {0}")]
    Draw(String),
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error("Invalid image size {0}x{1}")]
    InvalidSize(u32, u32),
    #[error("Failed to write image: {0}")]
    Io(#[from] std::io::Error),
}

fn draw_err(e: impl std::fmt::Display) -> RenderError {
    RenderError::Draw(e.to_string())
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render the chart into PNG bytes.
    pub fn render_png(
        result: &RenderResult,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidSize(width, height));
        }

        let mut buffer = vec![0u8; width as usize * height as usize * 3];
        Self::draw(result, &mut buffer, width, height)?;

        let img = RgbImage::from_raw(width, height, buffer)
            .ok_or(RenderError::InvalidSize(width, height))?;
        let mut png = Cursor::new(Vec::new());
        img.write_to(&mut png, ImageFormat::Png)?;
        Ok(png.into_inner())
    }

    /// Render and write the PNG to `path`.
    pub fn save_png(
        result: &RenderResult,
        path: &Path,
        width: u32,
        height: u32,
    ) -> Result<(), RenderError> {
        let png = Self::render_png(result, width, height)?;
        std::fs::write(path, &png)?;
        info!("Chart written to {} ({} bytes)", path.display(), png.len());
        Ok(())
    }

    fn draw(
        result: &RenderResult,
        buffer: &mut [u8],
        width: u32,
        height: u32,
    ) -> Result<(), RenderError> {
        let root = BitMapBackend::with_buffer(buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let n = result.bars.len();
        let (y_min, y_max) = Self::value_range(&result.bars);
        let states: Vec<&str> = result.bars.iter().map(|b| b.state.as_str()).collect();

        let mut chart = ChartBuilder::on(&root)
            .caption(
                &result.title,
                ("sans-serif", 26).into_font().style(FontStyle::Bold),
            )
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(110)
            .build_cartesian_2d((0..n).into_segmented(), y_min..y_max)
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n)
            .x_desc(result.x_label.as_str())
            .y_desc(result.y_label.as_str())
            .axis_desc_style(("sans-serif", 18))
            .label_style(("sans-serif", 15))
            .x_label_formatter(&|x: &SegmentValue<usize>| match x {
                SegmentValue::CenterOf(i) => {
                    states.get(*i).map(|s| s.to_string()).unwrap_or_default()
                }
                _ => String::new(),
            })
            .y_label_formatter(&|v: &f64| ChartPlotter::format_axis_value(*v))
            .draw()
            .map_err(draw_err)?;

        chart
            .draw_series(result.bars.iter().enumerate().map(|(i, bar)| {
                let (r, g, b) = PALETTE[i % PALETTE.len()];
                let mut rect = Rectangle::new(
                    [
                        (SegmentValue::Exact(i), 0.0),
                        (SegmentValue::Exact(i + 1), bar.value),
                    ],
                    RGBColor(r, g, b).filled(),
                );
                rect.set_margin(0, 0, 15, 15);
                rect
            }))
            .map_err(draw_err)?;

        if result.show_value_labels() {
            let style = TextStyle::from(("sans-serif", 16).into_font().style(FontStyle::Bold))
                .pos(Pos::new(HPos::Center, VPos::Bottom));

            chart
                .draw_series(result.bars.iter().enumerate().filter_map(|(i, bar)| {
                    bar.label.as_ref().map(|label| {
                        Text::new(
                            label.clone(),
                            (SegmentValue::CenterOf(i), bar.value * LABEL_HEIGHT_RATIO),
                            style.clone(),
                        )
                    })
                }))
                .map_err(draw_err)?;
        }

        root.present().map_err(draw_err)?;
        Ok(())
    }

    /// Y range that always contains zero, padded above the tallest bar.
    fn value_range(bars: &[BarDatum]) -> (f64, f64) {
        let min = bars.iter().map(|b| b.value).fold(0.0_f64, f64::min);
        let max = bars.iter().map(|b| b.value).fold(0.0_f64, f64::max);

        if (max - min).abs() < f64::EPSILON {
            return (0.0, 1.0);
        }

        let pad = (max - min) * 0.1;
        (
            if min < 0.0 { min - pad } else { 0.0 },
            if max > 0.0 { max + pad } else { 0.0 },
        )
    }
}
