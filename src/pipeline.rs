//! CSV-to-Chart Pipeline
//! Resolves columns once per upload, then turns each filter selection into a
//! chart-ready [`RenderResult`] or a specific error.

use crate::config::PipelineConfig;
use crate::data::loader::{DataLoader, Dataset, LoaderError};
use crate::data::metrics::{LabelFormat, MetricError, MetricSpec};
use crate::data::processor::DataProcessor;
use crate::data::resolver::{resolve_columns, ResolvedColumns, SchemaError};
use crate::stats::MetricSummary;
use log::{debug, info, warn};
use polars::prelude::*;
use std::sync::Arc;
use thiserror::Error;

/// Horizontal axis title of every chart.
pub const STATE_AXIS_LABEL: &str = "State";

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Load(#[from] LoaderError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Metric(#[from] MetricError),
    #[error("No data found for year {year} and the selected states")]
    EmptySelection { year: String, states: Vec<String> },
    #[error("Data processing failed: {0}")]
    Polars(#[from] PolarsError),
}

/// What the user picked in the controls.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterSelection {
    pub year: String,
    pub states: Vec<String>,
    /// Metric menu label
    pub metric: String,
}

/// One bar of the chart.
#[derive(Debug, Clone, PartialEq)]
pub struct BarDatum {
    pub state: String,
    /// Untransformed metric value
    pub raw: f64,
    /// Bar height after the metric's value scale
    pub value: f64,
    pub label: Option<String>,
}

/// Everything a renderer needs for one run.
#[derive(Debug, Clone)]
pub struct RenderResult {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub year: String,
    pub metric: MetricSpec,
    pub bars: Vec<BarDatum>,
    /// Filtered rows restricted to year, state and metric columns
    pub table: DataFrame,
    pub summary: Option<MetricSummary>,
}

impl RenderResult {
    pub fn show_value_labels(&self) -> bool {
        self.metric.label_format != LabelFormat::Hidden
    }
}

/// A loaded dataset bound to resolved columns and a metric catalog.
///
/// Loading and resolution happen once; [`Pipeline::run`] is pure and can be
/// called on every control change.
#[derive(Debug, Clone)]
pub struct Pipeline {
    dataset: Arc<Dataset>,
    columns: ResolvedColumns,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(dataset: Arc<Dataset>, config: PipelineConfig) -> Result<Self, PipelineError> {
        let columns = resolve_columns(&dataset, config.policy)?;
        info!(
            "Pipeline ready: {} rows, year='{}', state='{}'",
            dataset.height(),
            columns.year,
            columns.state
        );
        Ok(Self {
            dataset,
            columns,
            config,
        })
    }

    pub fn from_bytes(bytes: Vec<u8>, config: PipelineConfig) -> Result<Self, PipelineError> {
        let dataset = DataLoader::load_bytes(bytes)?;
        Self::new(Arc::new(dataset), config)
    }

    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    pub fn columns(&self) -> &ResolvedColumns {
        &self.columns
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn year_candidates(&self) -> Result<Vec<String>, PipelineError> {
        Ok(DataProcessor::year_candidates(
            self.dataset.frame(),
            &self.columns.year,
        )?)
    }

    /// States present in the rows of `year`.
    pub fn state_candidates(&self, year: &str) -> Result<Vec<String>, PipelineError> {
        let rows = DataProcessor::select_year(self.dataset.frame(), &self.columns.year, year)?;
        Ok(DataProcessor::state_candidates(&rows, &self.columns.state)?)
    }

    pub fn metric_options(&self) -> Result<Vec<MetricSpec>, PipelineError> {
        Ok(self.config.catalog.options(&self.dataset, &self.columns)?)
    }

    /// First year, first two states of that year, first metric.
    pub fn default_selection(&self) -> Result<FilterSelection, PipelineError> {
        let year = self.year_candidates()?.into_iter().next().unwrap_or_default();
        let states = DataProcessor::default_states(&self.state_candidates(&year)?);
        let metric = self
            .metric_options()?
            .into_iter()
            .next()
            .map(|m| m.label)
            .unwrap_or_default();

        Ok(FilterSelection {
            year,
            states,
            metric,
        })
    }

    /// Metric check, year filter, state filter, transform.
    pub fn run(&self, selection: &FilterSelection) -> Result<RenderResult, PipelineError> {
        debug!(
            "Run: year={} states={:?} metric='{}'",
            selection.year, selection.states, selection.metric
        );

        // A column's type only matters once rows remain; zero-row columns parse as text.
        let metric = match self
            .config
            .catalog
            .resolve(&selection.metric, &self.dataset, &self.columns)
        {
            Ok(metric) => Ok(metric),
            Err(e @ MetricError::NotNumeric(_)) => Err(e),
            Err(e) => return Err(e.into()),
        };

        let year_rows = DataProcessor::select_year(
            self.dataset.frame(),
            &self.columns.year,
            &selection.year,
        )?;
        let view =
            DataProcessor::select_states(&year_rows, &self.columns.state, &selection.states)?;

        if view.height() == 0 {
            return Err(Self::empty_selection(selection, 0));
        }
        let metric = metric?;

        let states = DataProcessor::text_values(&view, &self.columns.state)?;
        let raws = DataProcessor::metric_values(&view, &metric.column)?;

        let bars: Vec<BarDatum> = states
            .into_iter()
            .zip(raws)
            .filter_map(|(state, raw)| {
                let (state, raw) = (state?, raw?);
                Some(BarDatum {
                    state,
                    raw,
                    value: metric.bar_value(raw),
                    label: metric.label_text(raw),
                })
            })
            .collect();

        if bars.is_empty() {
            return Err(Self::empty_selection(selection, view.height()));
        }

        let table = view.select([
            self.columns.year.as_str(),
            self.columns.state.as_str(),
            metric.column.as_str(),
        ])?;

        let values: Vec<f64> = bars.iter().map(|b| b.value).collect();
        let summary = MetricSummary::from_values(&values);

        Ok(RenderResult {
            title: format!("{} ({})", metric.label, selection.year),
            x_label: STATE_AXIS_LABEL.to_string(),
            y_label: metric.axis_title().to_string(),
            year: selection.year.clone(),
            metric,
            bars,
            table,
            summary,
        })
    }

    fn empty_selection(selection: &FilterSelection, matching_rows: usize) -> PipelineError {
        warn!(
            "Empty selection: year={} states={:?} ({} matching rows)",
            selection.year, selection.states, matching_rows
        );
        PipelineError::EmptySelection {
            year: selection.year.clone(),
            states: selection.states.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::metrics::{MetricCatalog, BILLIONS_AXIS_LABEL};
    use crate::data::resolver::ResolutionPolicy;

    const CSV: &str = "\
ano,sigla_uf,despesa_total_pib,despesa_media_magistrado,despesa_total_justica_estadual
2021,SP,0.0110,440000.00,14000000000
2022,SP,0.0123,450000.00,15000000000
2022,AM,0.0200,300000.00,1200000000
2022,BA,0.0150,350000.00,3000000000
";

    fn pipeline(config: PipelineConfig) -> Pipeline {
        Pipeline::from_bytes(CSV.as_bytes().to_vec(), config).unwrap()
    }

    fn selection(year: &str, states: &[&str], metric: &str) -> FilterSelection {
        FilterSelection {
            year: year.into(),
            states: states.iter().map(|s| s.to_string()).collect(),
            metric: metric.into(),
        }
    }

    #[test]
    fn default_selection_uses_first_year_states_and_metric() {
        let p = pipeline(PipelineConfig::default());
        let sel = p.default_selection().unwrap();
        assert_eq!(sel.year, "2021");
        assert_eq!(sel.states, vec!["SP"]);
        assert_eq!(sel.metric, "Total Expense / GDP (%)");

        let states = p.state_candidates("2022").unwrap();
        assert_eq!(states, vec!["AM", "BA", "SP"]);
        assert_eq!(DataProcessor::default_states(&states), vec!["AM", "BA"]);
    }

    #[test]
    fn run_applies_billions_rule() {
        let p = pipeline(PipelineConfig::default());
        let result = p
            .run(&selection("2022", &["SP"], "Total State Judiciary Expense"))
            .unwrap();

        assert_eq!(result.bars.len(), 1);
        assert_eq!(result.bars[0].value, 15.0);
        assert_eq!(result.bars[0].raw, 15_000_000_000.0);
        assert_eq!(result.y_label, BILLIONS_AXIS_LABEL);
        assert_eq!(result.title, "Total State Judiciary Expense (2022)");
        assert_eq!(result.x_label, STATE_AXIS_LABEL);
    }

    #[test]
    fn run_builds_table_of_year_state_metric() {
        let p = pipeline(PipelineConfig::default());
        let result = p
            .run(&selection("2022", &["SP", "BA"], "Average Expense per Magistrate"))
            .unwrap();

        assert_eq!(result.table.height(), 2);
        let names: Vec<String> = result
            .table
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(names, vec!["ano", "sigla_uf", "despesa_media_magistrado"]);
        assert_eq!(result.summary.as_ref().unwrap().count, 2);
        assert_eq!(result.bars[0].label.as_deref(), Some("450,000.00"));
    }

    #[test]
    fn absent_year_is_empty_selection() {
        let p = pipeline(PipelineConfig::default());
        let err = p
            .run(&selection("2020", &["SP"], "Average Expense per Magistrate"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::EmptySelection { ref year, .. } if year == "2020"));
    }

    #[test]
    fn no_states_selected_is_empty_selection() {
        let p = pipeline(PipelineConfig::default());
        let err = p
            .run(&selection("2022", &[], "Average Expense per Magistrate"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::EmptySelection { .. }));
    }

    #[test]
    fn header_only_upload_is_empty_selection() {
        let csv = "ano,sigla_uf,despesa_total_pib,despesa_media_magistrado,despesa_total_justica_estadual\n";
        let p = Pipeline::from_bytes(csv.as_bytes().to_vec(), PipelineConfig::default()).unwrap();
        assert!(p.year_candidates().unwrap().is_empty());

        let err = p
            .run(&selection("2022", &["SP"], "Total Expense / GDP (%)"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::EmptySelection { ref year, .. } if year == "2022"));
        assert!(err.to_string().contains("No data found"));
    }

    #[test]
    fn text_metric_column_is_rejected_once_rows_match() {
        let csv = "ano,sigla_uf,despesa_total_pib\n2022,SP,n/d\n";
        let p = Pipeline::from_bytes(csv.as_bytes().to_vec(), PipelineConfig::default()).unwrap();
        let err = p
            .run(&selection("2022", &["SP"], "Total Expense / GDP (%)"))
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Metric(MetricError::NotNumeric(ref c)) if c == "despesa_total_pib"
        ));
    }

    #[test]
    fn missing_metric_column_fails_before_filtering() {
        let csv = "ano,sigla_uf,despesa_total_pib\n2022,SP,0.01\n";
        let p = Pipeline::from_bytes(csv.as_bytes().to_vec(), PipelineConfig::default()).unwrap();
        let err = p
            .run(&selection("1999", &["XX"], "Total State Judiciary Expense"))
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Metric(MetricError::ColumnNotFound(ref c)) if c == "despesa_total_justica_estadual"
        ));
    }

    #[test]
    fn exact_policy_rejects_missing_state_column() {
        let csv = "ano,estado,valor\n2022,SP,1\n";
        let config = PipelineConfig {
            policy: ResolutionPolicy::Exact,
            ..PipelineConfig::default()
        };
        let err = Pipeline::from_bytes(csv.as_bytes().to_vec(), config).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Schema(SchemaError::MissingColumns(ref m)) if m == &vec!["sigla_uf".to_string()]
        ));
    }

    #[test]
    fn auto_catalog_offers_numeric_columns() {
        let p = pipeline(PipelineConfig {
            policy: ResolutionPolicy::Exact,
            catalog: MetricCatalog::auto_default(),
        });
        let labels: Vec<String> = p
            .metric_options()
            .unwrap()
            .into_iter()
            .map(|m| m.label)
            .collect();
        assert_eq!(
            labels,
            vec![
                "despesa_total_pib",
                "despesa_media_magistrado",
                "despesa_total_justica_estadual"
            ]
        );

        let result = p
            .run(&selection("2022", &["AM"], "despesa_total_justica_estadual"))
            .unwrap();
        assert_eq!(result.bars[0].value, 1.2);
    }

    #[test]
    fn unparseable_upload_surfaces_load_error() {
        let err = Pipeline::from_bytes(Vec::new(), PipelineConfig::default()).unwrap_err();
        assert!(matches!(err, PipelineError::Load(LoaderError::Empty)));
    }
}
