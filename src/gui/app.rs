//! Judiciary Chart Main Application
//! Main window with control panel and chart viewer.

use crate::charts::{StaticChartRenderer, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::config::PipelineConfig;
use crate::data::{DataLoader, DataProcessor, Dataset, MetricCatalog};
use crate::gui::control_panel::CatalogMode;
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction};
use crate::pipeline::{Pipeline, PipelineError, RenderResult};
use anyhow::{Context, Result};
use egui::SidePanel;
use log::{error, info, warn};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;
use std::thread;

/// CSV loading result from background thread
enum LoadResult {
    Progress(String),
    Complete(Dataset),
    Error(String),
}

/// Main application window.
pub struct JudiciaryApp {
    config: PipelineConfig,
    /// Parsed once per upload; policy or catalog changes reuse it
    dataset: Option<Arc<Dataset>>,
    pipeline: Option<Pipeline>,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,

    // Async CSV loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
}

impl JudiciaryApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let config = PipelineConfig::default();
        let mut control_panel = ControlPanel::new();
        control_panel.settings.policy = config.policy;

        Self {
            config,
            dataset: None,
            pipeline: None,
            control_panel,
            chart_viewer: ChartViewer::new(),
            load_rx: None,
            is_loading: false,
        }
    }

    /// Handle CSV file selection; parsing runs in the background
    fn handle_browse_csv(&mut self) {
        if self.is_loading {
            return;
        }

        let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .pick_file()
        else {
            return;
        };

        self.chart_viewer.clear();
        self.control_panel.reset_filters();
        self.control_panel.settings.csv_path = Some(path.clone());
        self.control_panel.set_status("Loading CSV file...");
        self.is_loading = true;

        let (tx, rx) = channel();
        self.load_rx = Some(rx);

        thread::spawn(move || {
            let _ = tx.send(LoadResult::Progress("Reading CSV file...".to_string()));

            match DataLoader::load_path(&path) {
                Ok(dataset) => {
                    let _ = tx.send(LoadResult::Complete(dataset));
                }
                Err(e) => {
                    let _ = tx.send(LoadResult::Error(e.to_string()));
                }
            }
        });
    }

    /// Check for CSV loading results
    fn check_load_results(&mut self) {
        let Some(rx) = self.load_rx.take() else {
            return;
        };
        let mut should_keep_receiver = true;

        while let Ok(result) = rx.try_recv() {
            match result {
                LoadResult::Progress(status) => {
                    self.control_panel.set_status(&status);
                }
                LoadResult::Complete(dataset) => {
                    let status = format!(
                        "Loaded {} rows, {} columns",
                        dataset.height(),
                        dataset.column_names().len()
                    );
                    self.control_panel.update_columns(dataset.column_names());
                    self.dataset = Some(Arc::new(dataset));
                    self.control_panel.set_status(&status);
                    self.rebuild_pipeline();
                    self.is_loading = false;
                    should_keep_receiver = false;
                }
                LoadResult::Error(message) => {
                    error!("CSV load failed: {}", message);
                    self.dataset = None;
                    self.pipeline = None;
                    self.control_panel.update_columns(Vec::new());
                    self.control_panel.set_status(&format!("Error: {}", message));
                    self.chart_viewer.set_error(message);
                    self.is_loading = false;
                    should_keep_receiver = false;
                }
            }
        }

        if should_keep_receiver {
            self.load_rx = Some(rx);
        }
    }

    /// Resolve columns against the loaded dataset and reset the filters
    fn rebuild_pipeline(&mut self) {
        let Some(dataset) = self.dataset.clone() else {
            return;
        };
        self.control_panel.reset_filters();

        let pipeline = match Pipeline::new(dataset, self.config.clone()) {
            Ok(pipeline) => pipeline,
            Err(e) => {
                self.pipeline = None;
                self.report_failure(e);
                return;
            }
        };

        let choices = pipeline.default_selection().and_then(|selection| {
            let years = pipeline.year_candidates()?;
            let states = pipeline.state_candidates(&selection.year)?;
            let metrics: Vec<String> = pipeline
                .metric_options()?
                .into_iter()
                .map(|m| m.label)
                .collect();
            Ok((years, states, metrics, selection))
        });

        match choices {
            Ok((years, states, metrics, selection)) => {
                self.control_panel
                    .apply_selection(years, states, metrics, &selection);
                self.pipeline = Some(pipeline);
                self.rerun();
            }
            Err(e) => {
                self.pipeline = Some(pipeline);
                self.report_failure(e);
            }
        }
    }

    /// Refresh state choices for the newly selected year
    fn handle_year_changed(&mut self) {
        let Some(pipeline) = &self.pipeline else {
            return;
        };

        match pipeline.state_candidates(&self.control_panel.settings.year) {
            Ok(states) => {
                let previous = self.control_panel.get_selected_states();
                let mut keep: Vec<String> = previous
                    .into_iter()
                    .filter(|s| states.contains(s))
                    .collect();
                if keep.is_empty() {
                    keep = DataProcessor::default_states(&states);
                }
                self.control_panel.update_states(states, &keep);
                self.rerun();
            }
            Err(e) => self.report_failure(e),
        }
    }

    /// Run the pipeline for the current selection
    fn rerun(&mut self) {
        let Some(pipeline) = &self.pipeline else {
            return;
        };
        let outcome = pipeline.run(&self.control_panel.selection());
        self.control_panel.export_enabled = outcome.is_ok();
        self.chart_viewer.set_outcome(outcome);
    }

    fn report_failure(&mut self, e: PipelineError) {
        warn!("Pipeline error: {}", e);
        self.control_panel.export_enabled = false;
        self.chart_viewer.set_outcome(Err(e));
    }

    fn handle_catalog_changed(&mut self) {
        self.config.catalog = match self.control_panel.settings.catalog_mode {
            CatalogMode::Fixed => MetricCatalog::fixed_default(),
            CatalogMode::Auto => MetricCatalog::auto_default(),
        };
        self.rebuild_pipeline();
    }

    fn handle_load_config(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON", &["json"])
            .pick_file()
        else {
            return;
        };

        match PipelineConfig::load(&path) {
            Ok(config) => {
                self.control_panel.settings.policy = config.policy;
                self.control_panel.settings.catalog_mode = if config.catalog.is_auto() {
                    CatalogMode::Auto
                } else {
                    CatalogMode::Fixed
                };
                self.config = config;
                self.control_panel.set_status("Config loaded");
                self.rebuild_pipeline();
            }
            Err(e) => {
                error!("Config load failed: {}", e);
                self.control_panel.set_status(&format!("Error: {}", e));
            }
        }
    }

    fn handle_save_config(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON", &["json"])
            .set_file_name("judiciary_chart.json")
            .save_file()
        else {
            return;
        };

        match self.config.save(&path) {
            Ok(()) => self.control_panel.set_status("Config saved"),
            Err(e) => self.control_panel.set_status(&format!("Error: {}", e)),
        }
    }

    fn handle_export_png(&mut self) {
        let Some(result) = self.chart_viewer.result() else {
            self.control_panel.set_status("No chart to export");
            return;
        };
        let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG", &["png"])
            .set_file_name("judiciary_chart.png")
            .save_file()
        else {
            return;
        };

        match export_png(result, &path) {
            Ok(()) => {
                if let Err(e) = open::that(&path) {
                    warn!("Could not open {}: {}", path.display(), e);
                }
                self.control_panel
                    .set_status(&format!("Exported {}", path.display()));
            }
            Err(e) => self.control_panel.set_status(&format!("Error: {:#}", e)),
        }
    }

    fn handle_export_table(&mut self) {
        let Some(result) = self.chart_viewer.result() else {
            self.control_panel.set_status("No table to export");
            return;
        };
        let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .set_file_name("judiciary_table.csv")
            .save_file()
        else {
            return;
        };

        match export_table(&result.table, &path) {
            Ok(()) => self
                .control_panel
                .set_status(&format!("Exported {}", path.display())),
            Err(e) => self.control_panel.set_status(&format!("Error: {:#}", e)),
        }
    }
}

/// Render the chart of `result` to a PNG file.
pub fn export_png(result: &RenderResult, path: &Path) -> Result<()> {
    StaticChartRenderer::save_png(result, path, DEFAULT_WIDTH, DEFAULT_HEIGHT)
        .with_context(|| format!("Rendering chart to {}", path.display()))
}

/// Write the filtered table as CSV.
pub fn export_table(table: &DataFrame, path: &Path) -> Result<()> {
    let mut df = table.clone();
    let mut file =
        File::create(path).with_context(|| format!("Creating {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)
        .with_context(|| format!("Writing table to {}", path.display()))?;
    info!("Table written to {} ({} rows)", path.display(), df.height());
    Ok(())
}

impl eframe::App for JudiciaryApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_load_results();

        if self.is_loading {
            ctx.request_repaint();
        }

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(300.0)
            .max_width(350.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let action = self.control_panel.show(ui);

                    match action {
                        ControlPanelAction::BrowseCsv => self.handle_browse_csv(),
                        ControlPanelAction::PolicyChanged => {
                            self.config.policy = self.control_panel.settings.policy;
                            self.rebuild_pipeline();
                        }
                        ControlPanelAction::CatalogChanged => self.handle_catalog_changed(),
                        ControlPanelAction::LoadConfig => self.handle_load_config(),
                        ControlPanelAction::SaveConfig => self.handle_save_config(),
                        ControlPanelAction::YearChanged => self.handle_year_changed(),
                        ControlPanelAction::SelectionChanged => self.rerun(),
                        ControlPanelAction::ExportPng => self.handle_export_png(),
                        ControlPanelAction::ExportTable => self.handle_export_table(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - Chart Viewer
        egui::CentralPanel::default().show(ctx, |ui| {
            self.chart_viewer.show(ui);
        });
    }
}
