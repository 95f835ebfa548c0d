//! Statistics Calculator Module
//! Descriptive statistics over the bar values of one chart.

use statrs::statistics::{Data, Distribution, Max, Median, Min};

/// Summary of the values shown in a chart.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    /// Sample standard deviation; `None` for a single value
    pub std: Option<f64>,
}

impl MetricSummary {
    /// Compute the summary, ignoring non-finite values. `None` when nothing is left.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        let count = finite.len();
        if count == 0 {
            return None;
        }

        let data = Data::new(finite);
        let mean = data.mean()?;
        let std = if count > 1 { data.std_dev() } else { None };

        Some(Self {
            count,
            mean,
            median: data.median(),
            min: data.min(),
            max: data.max(),
            std,
        })
    }
}
