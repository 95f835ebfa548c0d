//! Stats module - Summary statistics of the charted values

mod calculator;

pub use calculator::MetricSummary;
