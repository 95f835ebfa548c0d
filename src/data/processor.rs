//! Data Processor Module
//! Year/state filtering and value extraction over a loaded dataset.

use polars::prelude::*;
use std::cmp::Ordering;

/// Number of states pre-selected when nothing has been chosen yet.
pub const DEFAULT_STATE_COUNT: usize = 2;

/// Text form of a cell, `None` for nulls.
///
/// Candidate lists and filters both go through this, so a value offered to
/// the user always matches the rows it came from.
pub fn cell_text(value: &AnyValue) -> Option<String> {
    match value {
        AnyValue::Null => None,
        AnyValue::String(s) => Some(s.trim().to_string()),
        AnyValue::StringOwned(s) => Some(s.as_str().trim().to_string()),
        other => Some(other.to_string().trim_matches('"').to_string()),
    }
}

/// Numeric-aware ordering: numbers ascending, then text ascending.
pub fn compare_values(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x
            .partial_cmp(&y)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Handles row filtering and column extraction.
pub struct DataProcessor;

impl DataProcessor {
    /// Distinct non-null values of a column, sorted ascending.
    pub fn distinct_values(df: &DataFrame, column: &str) -> PolarsResult<Vec<String>> {
        let unique = df.column(column)?.unique()?;
        let series = unique.as_materialized_series();

        let mut values: Vec<String> = (0..series.len())
            .filter_map(|i| series.get(i).ok().and_then(|v| cell_text(&v)))
            .collect();
        values.sort_by(|a, b| compare_values(a, b));
        values.dedup();
        Ok(values)
    }

    /// Years available for selection.
    pub fn year_candidates(df: &DataFrame, year_col: &str) -> PolarsResult<Vec<String>> {
        Self::distinct_values(df, year_col)
    }

    /// States available within already year-filtered rows.
    pub fn state_candidates(year_rows: &DataFrame, state_col: &str) -> PolarsResult<Vec<String>> {
        Self::distinct_values(year_rows, state_col)
    }

    /// Rows whose year column equals `year`.
    pub fn select_year(df: &DataFrame, year_col: &str, year: &str) -> PolarsResult<DataFrame> {
        Self::filter_rows(df, year_col, |value| value == year)
    }

    /// Rows whose state column is one of `states`.
    pub fn select_states(
        rows: &DataFrame,
        state_col: &str,
        states: &[String],
    ) -> PolarsResult<DataFrame> {
        Self::filter_rows(rows, state_col, |value| states.iter().any(|s| s == value))
    }

    /// Initial state selection: the first sorted candidates.
    pub fn default_states(candidates: &[String]) -> Vec<String> {
        candidates
            .iter()
            .take(DEFAULT_STATE_COUNT)
            .cloned()
            .collect()
    }

    /// Metric values as floats; nulls and NaN become `None`.
    pub fn metric_values(df: &DataFrame, column: &str) -> PolarsResult<Vec<Option<f64>>> {
        let value_f64 = df.column(column)?.cast(&DataType::Float64)?;
        let value_ca = value_f64.f64()?;

        Ok((0..value_ca.len())
            .map(|i| value_ca.get(i).filter(|v| !v.is_nan()))
            .collect())
    }

    /// Cell text for every row of a column.
    pub fn text_values(df: &DataFrame, column: &str) -> PolarsResult<Vec<Option<String>>> {
        let col = df.column(column)?;
        Ok((0..col.len())
            .map(|i| col.get(i).ok().and_then(|v| cell_text(&v)))
            .collect())
    }

    fn filter_rows<F>(df: &DataFrame, column: &str, keep: F) -> PolarsResult<DataFrame>
    where
        F: Fn(&str) -> bool,
    {
        let col = df.column(column)?;
        let mask: BooleanChunked = (0..df.height())
            .map(|i| {
                col.get(i)
                    .ok()
                    .and_then(|v| cell_text(&v))
                    .is_some_and(|text| keep(&text))
            })
            .collect();

        df.filter(&mask)
    }
}
