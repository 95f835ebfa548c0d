//! Metric Catalog Module
//! Metric menus (fixed or auto-discovered) and per-metric display transforms.

use crate::data::loader::{ColumnKind, Dataset};
use crate::data::resolver::ResolvedColumns;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Divisor of the billions rule.
pub const BILLIONS_DIVISOR: f64 = 1_000_000_000.0;
/// Vertical axis title used whenever the billions rule applies.
pub const BILLIONS_AXIS_LABEL: &str = "Expense in billions";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetricError {
    #[error("Metric '{0}' is not part of the metric catalog")]
    UnknownMetric(String),
    #[error("Column '{0}' was not found in the CSV file")]
    ColumnNotFound(String),
    #[error("Column '{0}' does not hold numeric values")]
    NotNumeric(String),
    #[error("No numeric columns available for comparison")]
    NoNumericColumns,
}

/// Multiplicative rescaling applied to raw metric values.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "by", rename_all = "snake_case")]
pub enum Scale {
    #[default]
    Identity,
    Times(f64),
    /// Division keeps round divisors such as 1e9 exact.
    Per(f64),
}

impl Scale {
    pub fn apply(self, value: f64) -> f64 {
        match self {
            Scale::Identity => value,
            Scale::Times(factor) => value * factor,
            Scale::Per(divisor) => value / divisor,
        }
    }
}

/// How the in-bar value label is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LabelFormat {
    /// `1,234.56` with the given number of decimals
    Fixed { decimals: usize },
    /// `12.34%`
    Percent { decimals: usize },
    /// No in-bar labels; the axis carries plain (non-scientific) numbers
    Hidden,
}

impl Default for LabelFormat {
    fn default() -> Self {
        LabelFormat::Fixed { decimals: 2 }
    }
}

impl LabelFormat {
    pub fn format(self, value: f64) -> Option<String> {
        match self {
            LabelFormat::Fixed { decimals } => Some(format_thousands(value, decimals)),
            LabelFormat::Percent { decimals } => {
                Some(format!("{}%", format_thousands(value, decimals)))
            }
            LabelFormat::Hidden => None,
        }
    }
}

/// Format with a comma thousands separator, e.g. `450,000.00`.
pub fn format_thousands(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (formatted.as_str(), None),
    };

    let mut out = String::with_capacity(formatted.len() + int_part.len() / 3 + 1);
    let is_zero = formatted.chars().all(|c| c == '0' || c == '.');
    if value.is_sign_negative() && !is_zero {
        out.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if let Some(frac_part) = frac_part {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

/// One selectable metric and its display transform.
///
/// Bar height and label text are scaled independently: `value_scale` drives
/// the bar geometry, `label_scale` + `label_format` drive the text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSpec {
    pub label: String,
    pub column: String,
    #[serde(default)]
    pub value_scale: Scale,
    #[serde(default)]
    pub label_scale: Scale,
    #[serde(default)]
    pub label_format: LabelFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axis_label: Option<String>,
}

impl MetricSpec {
    pub fn new(label: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            column: column.into(),
            value_scale: Scale::Identity,
            label_scale: Scale::Identity,
            label_format: LabelFormat::default(),
            axis_label: None,
        }
    }

    pub fn with_value_scale(mut self, scale: Scale) -> Self {
        self.value_scale = scale;
        self
    }

    pub fn with_label_scale(mut self, scale: Scale) -> Self {
        self.label_scale = scale;
        self
    }

    pub fn with_label_format(mut self, format: LabelFormat) -> Self {
        self.label_format = format;
        self
    }

    pub fn with_axis_label(mut self, label: impl Into<String>) -> Self {
        self.axis_label = Some(label.into());
        self
    }

    /// The billions rule: both bar and label divided by 1e9.
    pub fn in_billions(self) -> Self {
        self.with_value_scale(Scale::Per(BILLIONS_DIVISOR))
            .with_label_scale(Scale::Per(BILLIONS_DIVISOR))
            .with_axis_label(BILLIONS_AXIS_LABEL)
    }

    /// Bar height for a raw value.
    pub fn bar_value(&self, raw: f64) -> f64 {
        self.value_scale.apply(raw)
    }

    /// In-bar label for a raw value, `None` when labels are hidden.
    pub fn label_text(&self, raw: f64) -> Option<String> {
        self.label_format.format(self.label_scale.apply(raw))
    }

    /// Vertical axis title.
    pub fn axis_title(&self) -> &str {
        self.axis_label.as_deref().unwrap_or(&self.label)
    }
}

/// The three curated expense metrics.
pub fn default_metrics() -> Vec<MetricSpec> {
    vec![
        MetricSpec::new("Total Expense / GDP (%)", "despesa_total_pib")
            .with_label_scale(Scale::Times(100.0))
            .with_label_format(LabelFormat::Percent { decimals: 2 }),
        MetricSpec::new("Average Expense per Magistrate", "despesa_media_magistrado"),
        MetricSpec::new(
            "Total State Judiciary Expense",
            "despesa_total_justica_estadual",
        )
        .in_billions(),
    ]
}

/// Source of the metric menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum MetricCatalog {
    /// Hand-curated label -> column mapping
    Fixed { metrics: Vec<MetricSpec> },
    /// Every numeric column except the year; `overrides` supply transforms
    /// for known column names
    AutoDiscover {
        #[serde(default)]
        overrides: Vec<MetricSpec>,
    },
}

impl Default for MetricCatalog {
    fn default() -> Self {
        Self::fixed_default()
    }
}

impl MetricCatalog {
    pub fn fixed_default() -> Self {
        MetricCatalog::Fixed {
            metrics: default_metrics(),
        }
    }

    pub fn auto_default() -> Self {
        MetricCatalog::AutoDiscover {
            overrides: default_metrics()
                .into_iter()
                .filter(|m| m.axis_label.is_some())
                .collect(),
        }
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, MetricCatalog::AutoDiscover { .. })
    }

    /// Metrics to offer in the menu.
    ///
    /// Fixed catalogs list every entry, present in the file or not; a missing
    /// column only fails once that metric is selected.
    pub fn options(
        &self,
        dataset: &Dataset,
        columns: &ResolvedColumns,
    ) -> Result<Vec<MetricSpec>, MetricError> {
        match self {
            MetricCatalog::Fixed { metrics } => Ok(metrics.clone()),
            MetricCatalog::AutoDiscover { overrides } => {
                let options: Vec<MetricSpec> = dataset
                    .numeric_columns()
                    .into_iter()
                    .filter(|name| *name != columns.year && *name != columns.state)
                    .map(|name| match overrides.iter().find(|o| o.column == name) {
                        Some(rule) => MetricSpec {
                            label: name.clone(),
                            ..rule.clone()
                        },
                        None => MetricSpec::new(name.clone(), name),
                    })
                    .collect();

                if options.is_empty() {
                    return Err(MetricError::NoNumericColumns);
                }
                Ok(options)
            }
        }
    }

    /// Resolve a menu label to a metric whose column exists and is numeric.
    pub fn resolve(
        &self,
        label: &str,
        dataset: &Dataset,
        columns: &ResolvedColumns,
    ) -> Result<MetricSpec, MetricError> {
        let options = self.options(dataset, columns)?;
        let metric = match options.into_iter().find(|m| m.label == label) {
            Some(metric) => metric,
            None if self.is_auto() => return Err(MetricError::ColumnNotFound(label.to_string())),
            None => return Err(MetricError::UnknownMetric(label.to_string())),
        };

        match dataset.column_kind(&metric.column) {
            None => Err(MetricError::ColumnNotFound(metric.column)),
            Some(ColumnKind::Numeric) => Ok(metric),
            Some(_) => Err(MetricError::NotNumeric(metric.column)),
        }
    }
}
